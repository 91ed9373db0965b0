//! Price-tier segmentation.
//!
//! Listings are binned by characteristic price into equal-frequency tiers.
//! Edges are linearly interpolated quantiles; bins are right-closed with the
//! lowest edge included. When the prices cannot support the requested number
//! of distinct edges, every listing falls into one group.

use curve_core::{ListingKey, PriceTier};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{info, warn};

/// Tier assigned to one listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TierAssignment {
    pub listing: ListingKey,
    pub characteristic_price: f64,
    pub tier: PriceTier,
}

/// Outcome of segmentation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Segmentation {
    /// Listings split into `edges.len() - 1` tiers.
    Segmented {
        edges: Vec<f64>,
        assignments: Vec<TierAssignment>,
    },
    /// Segmentation was degenerate; all listings share one group.
    SingleGroup { reason: String },
}

impl Segmentation {
    /// Bin characteristic prices into `num_tiers` tiers.
    pub fn from_prices(prices: &BTreeMap<ListingKey, f64>, num_tiers: usize) -> Self {
        if prices.is_empty() {
            return Self::single_group("no priced listings to segment".to_string());
        }
        if num_tiers == 0 {
            return Self::single_group("zero tiers requested".to_string());
        }

        let mut sorted: Vec<f64> = prices.values().copied().collect();
        sorted.sort_by(f64::total_cmp);

        if num_tiers > 1 {
            let mut distinct = sorted.clone();
            distinct.dedup();
            if distinct.len() < num_tiers {
                return Self::single_group(format!(
                    "{} distinct characteristic price(s) cannot form {} tiers",
                    distinct.len(),
                    num_tiers
                ));
            }
        }

        let edges = quantile_edges(&sorted, num_tiers);
        if num_tiers > 1 && edges.windows(2).any(|w| w[0] >= w[1]) {
            return Self::single_group(format!(
                "quantile edges {edges:?} are not distinct for {num_tiers} tiers"
            ));
        }

        let assignments: Vec<TierAssignment> = prices
            .iter()
            .map(|(listing, &price)| TierAssignment {
                listing: listing.clone(),
                characteristic_price: price,
                tier: PriceTier::new(bin_index(price, &edges), num_tiers),
            })
            .collect();

        info!(tiers = num_tiers, listings = assignments.len(), ?edges, "listings segmented");
        Segmentation::Segmented { edges, assignments }
    }

    fn single_group(reason: String) -> Self {
        warn!(%reason, "price segmentation degenerate, using a single group");
        Segmentation::SingleGroup { reason }
    }

    /// Tier of a listing. Every listing is in the single tier when degenerate.
    pub fn tier_of(&self, listing: &ListingKey) -> Option<PriceTier> {
        match self {
            Segmentation::Segmented { assignments, .. } => assignments
                .iter()
                .find(|a| &a.listing == listing)
                .map(|a| a.tier),
            Segmentation::SingleGroup { .. } => Some(PriceTier::single()),
        }
    }

    /// Listing to tier lookup table. Empty when degenerate.
    pub fn tier_map(&self) -> BTreeMap<&ListingKey, PriceTier> {
        match self {
            Segmentation::Segmented { assignments, .. } => {
                assignments.iter().map(|a| (&a.listing, a.tier)).collect()
            }
            Segmentation::SingleGroup { .. } => BTreeMap::new(),
        }
    }

    /// Number of tiers actually in use.
    pub fn tier_count(&self) -> usize {
        match self {
            Segmentation::Segmented { edges, .. } => edges.len().saturating_sub(1),
            Segmentation::SingleGroup { .. } => 1,
        }
    }

    pub fn is_degenerate(&self) -> bool {
        matches!(self, Segmentation::SingleGroup { .. })
    }
}

/// Quantile edges at `k / num_tiers` for `k = 0..=num_tiers`, using linear
/// interpolation between order statistics. `sorted` must be ascending and
/// non-empty.
pub fn quantile_edges(sorted: &[f64], num_tiers: usize) -> Vec<f64> {
    (0..=num_tiers)
        .map(|k| quantile(sorted, k as f64 / num_tiers as f64))
        .collect()
}

fn quantile(sorted: &[f64], q: f64) -> f64 {
    let last = sorted.len() - 1;
    let pos = q * last as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    if lo == hi {
        sorted[lo]
    } else {
        sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
    }
}

/// Index of the right-closed bin containing `value`; the first bin includes
/// its lower edge.
fn bin_index(value: f64, edges: &[f64]) -> usize {
    let bins = edges.len().saturating_sub(1);
    (0..bins)
        .find(|&i| value <= edges[i + 1])
        .unwrap_or(bins.saturating_sub(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn prices(values: &[f64]) -> BTreeMap<ListingKey, f64> {
        values
            .iter()
            .enumerate()
            .map(|(i, &v)| (ListingKey::new("H1", format!("P{i:02}"), "R1"), v))
            .collect()
    }

    #[test]
    fn test_quantile_edges_interpolate() {
        let edges = quantile_edges(&[10.0, 20.0, 30.0, 40.0], 3);
        assert_eq!(edges.len(), 4);
        assert_relative_eq!(edges[0], 10.0);
        assert_relative_eq!(edges[1], 20.0);
        assert_relative_eq!(edges[2], 30.0);
        assert_relative_eq!(edges[3], 40.0);

        let edges = quantile_edges(&[1.0, 2.0, 3.0, 4.0, 5.0], 2);
        assert_relative_eq!(edges[1], 3.0);

        let edges = quantile_edges(&[0.0, 10.0], 4);
        assert_relative_eq!(edges[1], 2.5);
    }

    #[test]
    fn test_three_tiers() {
        let seg =
            Segmentation::from_prices(&prices(&[100.0, 200.0, 300.0, 400.0, 500.0, 600.0]), 3);
        let Segmentation::Segmented { assignments, edges } = &seg else {
            panic!("expected segmented result");
        };
        assert_eq!(edges.len(), 4);
        let tiers: Vec<usize> = assignments.iter().map(|a| a.tier.index).collect();
        assert_eq!(tiers, vec![0, 0, 1, 1, 2, 2]);
        assert_eq!(assignments[0].tier.label(), "Low");
        assert_eq!(assignments[5].tier.label(), "High");
        assert_eq!(seg.tier_count(), 3);
        assert!(!seg.is_degenerate());
    }

    #[test]
    fn test_lowest_edge_is_included_and_bins_are_right_closed() {
        let edges = vec![10.0, 20.0, 30.0];
        assert_eq!(bin_index(10.0, &edges), 0);
        assert_eq!(bin_index(20.0, &edges), 0);
        assert_eq!(bin_index(20.5, &edges), 1);
        assert_eq!(bin_index(30.0, &edges), 1);
    }

    #[test]
    fn test_two_distinct_prices_for_three_tiers_collapses() {
        let seg = Segmentation::from_prices(&prices(&[100.0, 100.0, 200.0, 200.0]), 3);
        assert!(seg.is_degenerate());
        assert_eq!(seg.tier_count(), 1);
        let listing = ListingKey::new("H1", "P00", "R1");
        assert_eq!(seg.tier_of(&listing), Some(PriceTier::single()));
    }

    #[test]
    fn test_colliding_edges_collapse() {
        // Three distinct prices, but the mass at 100 makes the first two edges equal.
        let seg =
            Segmentation::from_prices(&prices(&[100.0, 100.0, 100.0, 100.0, 150.0, 200.0]), 3);
        assert!(seg.is_degenerate());
    }

    #[test]
    fn test_single_tier_requested() {
        let seg = Segmentation::from_prices(&prices(&[50.0, 50.0]), 1);
        assert!(!seg.is_degenerate());
        assert_eq!(seg.tier_count(), 1);
        assert_eq!(
            seg.tier_of(&ListingKey::new("H1", "P01", "R1")),
            Some(PriceTier::new(0, 1))
        );
    }

    #[test]
    fn test_empty_prices() {
        let seg = Segmentation::from_prices(&BTreeMap::new(), 3);
        assert!(seg.is_degenerate());
    }

    #[test]
    fn test_serializes_with_kind_tag() {
        let seg = Segmentation::from_prices(&prices(&[1.0]), 3);
        let json = serde_json::to_value(&seg).unwrap();
        assert_eq!(json["kind"], "single_group");
    }
}
