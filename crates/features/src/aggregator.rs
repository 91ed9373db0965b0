//! Daily KPI aggregation.
//!
//! Rolls sale events up to one row per (listing, stay date), then joins the
//! early and late booking-pace sums computed over the full event table.

use crate::pace::{PaceWindows, StayKey};
use curve_core::{ratio_or_zero, DailyKpi, PaceConfig, SaleEvent, Units};
use std::collections::BTreeMap;
use tracing::info;

/// Running totals for one (listing, stay date) stream.
#[derive(Debug, Clone, Default)]
struct StayTotals {
    max_stock: Units,
    snapshots: u32,
    sold: Units,
    restocked: Units,
    revenue: f64,
}

/// Aggregates sale events into [`DailyKpi`] rows.
pub struct KpiAggregator {
    windows: PaceWindows,
}

impl KpiAggregator {
    /// Create a new aggregator.
    pub fn new(config: &PaceConfig) -> Self {
        Self {
            windows: PaceWindows::new(config),
        }
    }

    /// Pace windows used by this aggregator.
    pub fn windows(&self) -> PaceWindows {
        self.windows
    }

    /// Compute KPIs. Streams that sold nothing are dropped; the rest come out
    /// in (listing, stay date) order.
    pub fn aggregate(&self, events: &[SaleEvent]) -> Vec<DailyKpi> {
        let mut totals: BTreeMap<StayKey, StayTotals> = BTreeMap::new();
        for event in events {
            let entry = totals
                .entry((event.listing.clone(), event.stay_date))
                .or_default();
            entry.max_stock = event.max_stock;
            entry.snapshots += 1;
            entry.sold = entry.sold.saturating_add(event.sold);
            entry.restocked = entry.restocked.saturating_add(event.restocked);
            entry.revenue += event.revenue;
        }

        let early = self.windows.early_join(events);
        let late = self.windows.late_join(events);

        let streams = totals.len();
        let kpis: Vec<DailyKpi> = totals
            .into_iter()
            .filter(|(_, t)| t.sold > 0)
            .map(|(key, t)| {
                let sold_before_120 = early.get(&key).copied().unwrap_or(0);
                let sold_last_30 = late.get(&key).copied().unwrap_or(0);
                let max_stock = f64::from(t.max_stock);
                let total_sold = f64::from(t.sold);
                let (listing, stay_date) = key;

                DailyKpi {
                    listing,
                    stay_date,
                    max_stock: t.max_stock,
                    snapshots: t.snapshots,
                    total_sold: t.sold,
                    total_restocked: t.restocked,
                    total_revenue: t.revenue,
                    rev_par: ratio_or_zero(t.revenue, max_stock),
                    adr: ratio_or_zero(t.revenue, total_sold),
                    sold_before_120,
                    booking_rate_at_120_days: ratio_or_zero(f64::from(sold_before_120), max_stock),
                    sold_last_30,
                    last_30_days_booking_ratio: ratio_or_zero(f64::from(sold_last_30), total_sold),
                }
            })
            .collect();

        info!(
            streams,
            kpi_rows = kpis.len(),
            zero_sale_streams = streams - kpis.len(),
            "daily KPIs aggregated"
        );
        kpis
    }
}

impl Default for KpiAggregator {
    fn default() -> Self {
        Self::new(&PaceConfig::default())
    }
}
