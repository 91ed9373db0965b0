//! Booking-curve reconstruction for selected exemplars.
//!
//! A curve covers the observation days from the early-booking cutoff onward.
//! Units sold before the cutoff are folded into the starting level so the
//! cumulative line ends at the stay date's total sales.

use crate::selector::{Exemplar, SelectionMode};
use chrono::{NaiveDate, NaiveDateTime};
use curve_core::{ListingKey, PriceTier, SaleEvent, Units};
use curve_features::PaceWindows;
use serde::Serialize;
use std::collections::BTreeMap;

/// One observation day of a booking curve.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurvePoint {
    /// Observation day.
    pub day: NaiveDate,
    /// Units sold up to and including this day.
    pub cumulative_sold: Units,
    /// Mean quoted price across the day's snapshots.
    pub avg_price: f64,
}

/// Chart-ready series for one exemplar.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookingCurve {
    pub mode: SelectionMode,
    pub tier: PriceTier,
    pub listing: ListingKey,
    pub stay_date: NaiveDate,
    pub rev_par: f64,
    pub last_30_days_booking_ratio: f64,
    /// Full-house line.
    pub capacity: Units,
    /// Start of the plotted window.
    pub window_start: NaiveDateTime,
    /// Units sold before `window_start`.
    pub sold_before_window: Units,
    pub points: Vec<CurvePoint>,
    pub title: String,
}

/// Builds [`BookingCurve`]s from the sale-event table.
pub struct CurveBuilder {
    windows: PaceWindows,
}

impl CurveBuilder {
    /// Create a new builder. The plotted window starts at the early cutoff.
    pub fn new(windows: PaceWindows) -> Self {
        Self { windows }
    }

    /// Reconstruct the daily series behind an exemplar.
    pub fn build(&self, exemplar: &Exemplar, events: &[SaleEvent]) -> BookingCurve {
        let kpi = &exemplar.kpi;
        let window_start = self.windows.early_cutoff(kpi.stay_date);

        let mut sold_before_window: Units = 0;
        // day -> (sold, price sum, snapshot count)
        let mut days: BTreeMap<NaiveDate, (Units, f64, u32)> = BTreeMap::new();

        for event in events
            .iter()
            .filter(|e| e.listing == kpi.listing && e.stay_date == kpi.stay_date)
        {
            if event.observed_at < window_start {
                sold_before_window = sold_before_window.saturating_add(event.sold);
                continue;
            }
            let day = days.entry(event.observed_at.date()).or_insert((0, 0.0, 0));
            day.0 = day.0.saturating_add(event.sold);
            day.1 += event.price;
            day.2 += 1;
        }

        let mut cumulative = sold_before_window;
        let points = days
            .into_iter()
            .map(|(day, (sold, price_sum, count))| {
                cumulative = cumulative.saturating_add(sold);
                CurvePoint {
                    day,
                    cumulative_sold: cumulative,
                    avg_price: price_sum / f64::from(count),
                }
            })
            .collect();

        BookingCurve {
            mode: exemplar.mode,
            tier: exemplar.tier,
            listing: kpi.listing.clone(),
            stay_date: kpi.stay_date,
            rev_par: kpi.rev_par,
            last_30_days_booking_ratio: kpi.last_30_days_booking_ratio,
            capacity: kpi.max_stock,
            window_start,
            sold_before_window,
            points,
            title: chart_title(exemplar),
        }
    }

    /// Build a curve for every exemplar, in order.
    pub fn build_all(&self, exemplars: &[Exemplar], events: &[SaleEvent]) -> Vec<BookingCurve> {
        exemplars.iter().map(|e| self.build(e, events)).collect()
    }
}

/// Three-line chart title with listing identity, stay date, RevPAR and pace.
pub fn chart_title(exemplar: &Exemplar) -> String {
    let kpi = &exemplar.kpi;
    let heading = match exemplar.mode {
        SelectionMode::Global => {
            format!("Last-minute booking curve (stay date: {})", kpi.stay_date)
        }
        SelectionMode::PeerGroup => format!(
            "{} tier best practice (stay date: {})",
            exemplar.tier, kpi.stay_date
        ),
    };
    format!(
        "{}\nHotel: {}, Plan: {}, Room: {}\nRevPAR: {} | Last-30-day booking ratio: {:.1}%",
        heading,
        kpi.listing.hotel_id,
        kpi.listing.plan_id,
        kpi.listing.room_type_id,
        group_thousands(kpi.rev_par),
        kpi.last_30_days_booking_ratio * 100.0
    )
}

/// Round to a whole number and insert thousands separators.
pub fn group_thousands(value: f64) -> String {
    let rounded = format!("{:.0}", value);
    let (sign, digits) = match rounded.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", rounded.as_str()),
    };
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    format!("{sign}{out}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::Duration;
    use curve_core::{days_before, DailyKpi};

    fn stay() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 10, 1).unwrap()
    }

    fn make_event(days_out: i64, hour: u32, stock: Units, sold: Units, price: f64) -> SaleEvent {
        SaleEvent {
            listing: ListingKey::new("H1", "P1", "R1"),
            stay_date: stay(),
            observed_at: days_before(stay(), days_out) + Duration::hours(i64::from(hour)),
            stock,
            price,
            max_stock: 40,
            sold,
            restocked: 0,
            revenue: sold as f64 * price,
        }
    }

    fn make_exemplar(mode: SelectionMode) -> Exemplar {
        Exemplar {
            mode,
            tier: PriceTier::new(2, 3),
            kpi: DailyKpi {
                listing: ListingKey::new("H1", "P1", "R1"),
                stay_date: stay(),
                max_stock: 40,
                snapshots: 6,
                total_sold: 25,
                total_restocked: 0,
                total_revenue: 1234567.0,
                rev_par: 30864.175,
                adr: 49382.68,
                sold_before_120: 5,
                booking_rate_at_120_days: 0.125,
                sold_last_30: 15,
                last_30_days_booking_ratio: 0.6,
            },
        }
    }

    #[test]
    fn test_curve_points() {
        let events = vec![
            make_event(150, 9, 40, 0, 100.0),
            make_event(130, 9, 35, 5, 100.0),
            make_event(60, 9, 30, 5, 120.0),
            make_event(10, 9, 25, 5, 150.0),
            make_event(10, 18, 20, 5, 170.0),
            make_event(2, 9, 15, 5, 200.0),
        ];
        let builder = CurveBuilder::new(PaceWindows::default());
        let curve = builder.build(&make_exemplar(SelectionMode::Global), &events);

        assert_eq!(curve.sold_before_window, 5);
        assert_eq!(curve.capacity, 40);
        assert_eq!(curve.points.len(), 3);
        assert_eq!(curve.points[0].cumulative_sold, 10);
        assert_eq!(curve.points[1].cumulative_sold, 20);
        assert_relative_eq!(curve.points[1].avg_price, 160.0);
        assert_eq!(curve.points[2].cumulative_sold, 25);
        assert_eq!(curve.points[2].day, stay() - Duration::days(2));
    }

    #[test]
    fn test_other_streams_are_ignored() {
        let mut foreign = make_event(5, 9, 10, 9, 999.0);
        foreign.listing = ListingKey::new("H1", "P2", "R1");
        let events = vec![make_event(5, 9, 30, 3, 100.0), foreign];
        let curve = CurveBuilder::new(PaceWindows::default())
            .build(&make_exemplar(SelectionMode::Global), &events);
        assert_eq!(curve.points.len(), 1);
        assert_eq!(curve.points[0].cumulative_sold, 3);
    }

    #[test]
    fn test_cumulative_sold_saturates() {
        let events = vec![
            make_event(150, 9, 0, 3_000_000_000, 1.0),
            make_event(10, 9, 0, 3_000_000_000, 1.0),
            make_event(2, 9, 0, 3_000_000_000, 1.0),
        ];
        let curve = CurveBuilder::new(PaceWindows::default())
            .build(&make_exemplar(SelectionMode::Global), &events);
        assert_eq!(curve.sold_before_window, 3_000_000_000);
        assert_eq!(curve.points[0].cumulative_sold, Units::MAX);
        assert_eq!(curve.points[1].cumulative_sold, Units::MAX);
    }

    #[test]
    fn test_titles() {
        let global = chart_title(&make_exemplar(SelectionMode::Global));
        assert_eq!(
            global,
            "Last-minute booking curve (stay date: 2024-10-01)\n\
             Hotel: H1, Plan: P1, Room: R1\n\
             RevPAR: 30,864 | Last-30-day booking ratio: 60.0%"
        );

        let peer = chart_title(&make_exemplar(SelectionMode::PeerGroup));
        assert!(peer.starts_with("High tier best practice (stay date: 2024-10-01)"));
    }

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands(0.0), "0");
        assert_eq!(group_thousands(999.4), "999");
        assert_eq!(group_thousands(1000.0), "1,000");
        assert_eq!(group_thousands(1234567.8), "1,234,568");
        assert_eq!(group_thousands(-12345.0), "-12,345");
    }
}
