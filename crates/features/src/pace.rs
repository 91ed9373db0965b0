//! Booking-pace windows.
//!
//! Both windows are anchored on each event's own stay date, so the cutoff
//! moves with the row rather than being a single global date.

use chrono::{NaiveDate, NaiveDateTime};
use curve_core::{days_before, ListingKey, PaceConfig, SaleEvent, Units};
use std::collections::HashMap;

/// Grouping key for one (listing, stay date) stream.
pub type StayKey = (ListingKey, NaiveDate);

/// Early and late booking windows relative to a stay date.
#[derive(Debug, Clone, Copy)]
pub struct PaceWindows {
    early_days: i64,
    late_days: i64,
}

impl PaceWindows {
    /// Create windows from configuration.
    pub fn new(config: &PaceConfig) -> Self {
        Self {
            early_days: config.early_window_days,
            late_days: config.late_window_days,
        }
    }

    /// Events observed strictly before this instant are early bookings.
    #[inline]
    pub fn early_cutoff(&self, stay_date: NaiveDate) -> NaiveDateTime {
        days_before(stay_date, self.early_days)
    }

    /// Events observed at or after this instant are late bookings.
    #[inline]
    pub fn late_start(&self, stay_date: NaiveDate) -> NaiveDateTime {
        days_before(stay_date, self.late_days)
    }

    #[inline]
    pub fn is_early(&self, event: &SaleEvent) -> bool {
        event.observed_at < self.early_cutoff(event.stay_date)
    }

    #[inline]
    pub fn is_late(&self, event: &SaleEvent) -> bool {
        event.observed_at >= self.late_start(event.stay_date)
    }

    /// Units sold before the early cutoff, per stream. Streams with no early
    /// sales are absent.
    pub fn early_join(&self, events: &[SaleEvent]) -> HashMap<StayKey, Units> {
        sum_sold_where(events, |e| self.is_early(e))
    }

    /// Units sold inside the late window, per stream. Streams with no late
    /// sales are absent.
    pub fn late_join(&self, events: &[SaleEvent]) -> HashMap<StayKey, Units> {
        sum_sold_where(events, |e| self.is_late(e))
    }
}

impl Default for PaceWindows {
    fn default() -> Self {
        Self::new(&PaceConfig::default())
    }
}

fn sum_sold_where<F>(events: &[SaleEvent], keep: F) -> HashMap<StayKey, Units>
where
    F: Fn(&SaleEvent) -> bool,
{
    let mut sums: HashMap<StayKey, Units> = HashMap::new();
    for event in events.iter().filter(|e| e.sold > 0 && keep(e)) {
        let sum = sums
            .entry((event.listing.clone(), event.stay_date))
            .or_insert(0);
        *sum = sum.saturating_add(event.sold);
    }
    sums
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn make_event(stay_date: NaiveDate, days_out: i64, sold: Units) -> SaleEvent {
        SaleEvent {
            listing: ListingKey::new("H1", "P1", "R1"),
            stay_date,
            observed_at: days_before(stay_date, days_out) + Duration::hours(12),
            stock: 10,
            price: 100.0,
            max_stock: 30,
            sold,
            restocked: 0,
            revenue: sold as f64 * 100.0,
        }
    }

    #[test]
    fn test_window_boundaries() {
        let windows = PaceWindows::default();
        let stay = NaiveDate::from_ymd_opt(2024, 9, 1).unwrap();

        let mut at_late_start = make_event(stay, 30, 1);
        at_late_start.observed_at = windows.late_start(stay);
        assert!(windows.is_late(&at_late_start));

        let mut just_before_late = make_event(stay, 30, 1);
        just_before_late.observed_at = windows.late_start(stay) - Duration::seconds(1);
        assert!(!windows.is_late(&just_before_late));

        let mut at_early_cutoff = make_event(stay, 120, 1);
        at_early_cutoff.observed_at = windows.early_cutoff(stay);
        assert!(!windows.is_early(&at_early_cutoff));

        let mut before_early_cutoff = make_event(stay, 120, 1);
        before_early_cutoff.observed_at = windows.early_cutoff(stay) - Duration::seconds(1);
        assert!(windows.is_early(&before_early_cutoff));
    }

    #[test]
    fn test_cutoff_follows_each_stay_date() {
        let windows = PaceWindows::default();
        let june = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let december = NaiveDate::from_ymd_opt(2024, 12, 1).unwrap();

        // Same observation instant: late for June, early for December.
        let observed = days_before(june, 10);
        let mut a = make_event(june, 10, 4);
        a.observed_at = observed;
        let mut b = make_event(december, 10, 6);
        b.observed_at = observed;

        let events = vec![a, b];
        let early = windows.early_join(&events);
        let late = windows.late_join(&events);

        let key = |d| (ListingKey::new("H1", "P1", "R1"), d);
        assert_eq!(late.get(&key(june)), Some(&4));
        assert_eq!(late.get(&key(december)), None);
        assert_eq!(early.get(&key(december)), Some(&6));
        assert_eq!(early.get(&key(june)), None);
    }

    #[test]
    fn test_joins_sum_per_stream() {
        let windows = PaceWindows::default();
        let stay = NaiveDate::from_ymd_opt(2024, 9, 1).unwrap();
        let events = vec![
            make_event(stay, 200, 3),
            make_event(stay, 150, 2),
            make_event(stay, 60, 5),
            make_event(stay, 20, 7),
            make_event(stay, 1, 1),
        ];
        let key = (ListingKey::new("H1", "P1", "R1"), stay);
        assert_eq!(windows.early_join(&events)[&key], 5);
        assert_eq!(windows.late_join(&events)[&key], 8);
    }
}
