//! Characteristic price per listing.

use curve_core::{DailyKpi, ListingKey};
use statrs::statistics::{Data, Median};
use std::collections::BTreeMap;

/// Median ADR across each listing's KPI rows.
pub fn characteristic_prices(kpis: &[DailyKpi]) -> BTreeMap<ListingKey, f64> {
    let mut adrs: BTreeMap<ListingKey, Vec<f64>> = BTreeMap::new();
    for kpi in kpis {
        adrs.entry(kpi.listing.clone()).or_default().push(kpi.adr);
    }

    adrs.into_iter()
        .map(|(listing, values)| (listing, Data::new(values).median()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn make_kpi(plan: &str, day: u32, adr: f64) -> DailyKpi {
        DailyKpi {
            listing: ListingKey::new("H1", plan, "R1"),
            stay_date: NaiveDate::from_ymd_opt(2024, 7, day).unwrap(),
            max_stock: 30,
            snapshots: 2,
            total_sold: 1,
            total_restocked: 0,
            total_revenue: adr,
            rev_par: adr / 30.0,
            adr,
            sold_before_120: 0,
            booking_rate_at_120_days: 0.0,
            sold_last_30: 1,
            last_30_days_booking_ratio: 1.0,
        }
    }

    #[test]
    fn test_median_odd_and_even() {
        let kpis = vec![
            make_kpi("P1", 1, 100.0),
            make_kpi("P1", 2, 300.0),
            make_kpi("P1", 3, 200.0),
            make_kpi("P2", 1, 10.0),
            make_kpi("P2", 2, 20.0),
        ];
        let prices = characteristic_prices(&kpis);
        assert_eq!(prices.len(), 2);
        assert_relative_eq!(prices[&ListingKey::new("H1", "P1", "R1")], 200.0);
        assert_relative_eq!(prices[&ListingKey::new("H1", "P2", "R1")], 15.0);
    }

    #[test]
    fn test_empty() {
        assert!(characteristic_prices(&[]).is_empty());
    }
}
