//! Exemplar selection.
//!
//! Candidates are the KPI rows at or above the last-minute threshold. They are
//! stable-sorted by RevPAR descending and the first row per grouping key wins,
//! so ties go to the row that came first in (listing, stay date) order.

use crate::segmentation::Segmentation;
use curve_core::{DailyKpi, PriceTier, SelectionConfig};
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Grouping used to pick exemplars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionMode {
    /// One exemplar per listing.
    Global,
    /// One exemplar per price tier.
    PeerGroup,
}

/// A selected best-practice KPI row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Exemplar {
    pub mode: SelectionMode,
    /// Price tier of the exemplar's listing.
    pub tier: PriceTier,
    #[serde(flatten)]
    pub kpi: DailyKpi,
}

/// Picks best-in-class last-minute rows.
pub struct ExemplarSelector {
    threshold: f64,
}

impl ExemplarSelector {
    /// Create a new selector.
    pub fn new(config: &SelectionConfig) -> Self {
        Self {
            threshold: config.last_minute_threshold,
        }
    }

    /// Threshold-qualifying rows, sorted by RevPAR descending. The sort is
    /// stable, so equal RevPAR keeps input order.
    pub fn candidates<'a>(&self, kpis: &'a [DailyKpi]) -> Vec<&'a DailyKpi> {
        let mut candidates: Vec<&DailyKpi> = kpis
            .iter()
            .filter(|k| k.is_last_minute(self.threshold))
            .collect();
        candidates.sort_by(|a, b| OrderedFloat(b.rev_par).cmp(&OrderedFloat(a.rev_par)));
        candidates
    }

    /// Best candidate per listing, ordered by listing.
    pub fn select_global(&self, kpis: &[DailyKpi], segmentation: &Segmentation) -> Vec<Exemplar> {
        let tiers = segmentation.tier_map();
        let best = first_per_key(self.candidates(kpis), |k| k.listing.clone());

        let exemplars: Vec<Exemplar> = best
            .into_values()
            .map(|kpi| Exemplar {
                mode: SelectionMode::Global,
                tier: tiers
                    .get(&kpi.listing)
                    .copied()
                    .unwrap_or_else(PriceTier::single),
                kpi: kpi.clone(),
            })
            .collect();

        info!(exemplars = exemplars.len(), "global exemplars selected");
        exemplars
    }

    /// Best candidate per price tier, ordered from the lowest tier up.
    pub fn select_peer_group(
        &self,
        kpis: &[DailyKpi],
        segmentation: &Segmentation,
    ) -> Vec<Exemplar> {
        let tiers = segmentation.tier_map();
        let tier_of = |kpi: &DailyKpi| {
            tiers
                .get(&kpi.listing)
                .copied()
                .unwrap_or_else(PriceTier::single)
        };
        let best = first_per_key(self.candidates(kpis), tier_of);

        let exemplars: Vec<Exemplar> = best
            .into_iter()
            .map(|(tier, kpi)| {
                debug!(%tier, listing = %kpi.listing, rev_par = kpi.rev_par, "tier exemplar");
                Exemplar {
                    mode: SelectionMode::PeerGroup,
                    tier,
                    kpi: kpi.clone(),
                }
            })
            .collect();

        info!(
            exemplars = exemplars.len(),
            tiers = segmentation.tier_count(),
            "peer-group exemplars selected"
        );
        exemplars
    }
}

impl Default for ExemplarSelector {
    fn default() -> Self {
        Self::new(&SelectionConfig::default())
    }
}

/// First row per key, in the order the rows are given.
fn first_per_key<'a, K, F>(rows: Vec<&'a DailyKpi>, key: F) -> BTreeMap<K, &'a DailyKpi>
where
    K: Ord,
    F: Fn(&DailyKpi) -> K,
{
    let mut best = BTreeMap::new();
    for row in rows {
        best.entry(key(row)).or_insert(row);
    }
    best
}
