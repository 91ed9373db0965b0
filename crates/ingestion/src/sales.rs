//! Sale reconstruction from successive inventory snapshots.
//!
//! Each (listing, stay date) pair is an independent stream of snapshots. Within
//! a stream the units sold at a snapshot are the stock decrease since the
//! previous snapshot, clamped at zero; a stock increase is reported separately
//! as a restock.

use curve_core::{
    CapacityConfig, Error, ListingCapacity, ListingKey, Result, SaleEvent, SnapshotRow, Units,
};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Statistics about sale derivation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SalesStats {
    /// Distinct listings in the input.
    pub listings_total: u64,
    /// Listings dropped for being under capacity.
    pub listings_excluded: u64,
    /// Snapshot rows dropped with those listings.
    pub rows_excluded: u64,
    /// (listing, stay date) streams processed.
    pub stay_groups: u64,
    /// Sale events emitted (one per retained snapshot).
    pub events: u64,
    /// Events where stock went up.
    pub restock_events: u64,
}

/// Output of the sales stage.
#[derive(Debug, Clone)]
pub struct DerivedSales {
    /// One event per retained snapshot, in (listing, stay date, observed at) order.
    pub events: Vec<SaleEvent>,
    /// Capacity of every listing seen, including excluded ones.
    pub capacities: Vec<ListingCapacity>,
    pub stats: SalesStats,
}

/// Compute the maximum observed stock per listing.
pub fn listing_capacities(rows: &[SnapshotRow]) -> BTreeMap<ListingKey, Units> {
    let mut capacities: BTreeMap<ListingKey, Units> = BTreeMap::new();
    for row in rows {
        capacities
            .entry(row.listing.clone())
            .and_modify(|max| *max = (*max).max(row.stock))
            .or_insert(row.stock);
    }
    capacities
}

/// Sort snapshots by listing, stay date, then observation time.
///
/// This is the ordering [`derive_events`] requires.
pub fn sort_snapshots(rows: &mut [SnapshotRow]) {
    rows.sort_by(|a, b| a.order_key().cmp(&b.order_key()));
}

/// Whether `rows` are already in [`sort_snapshots`] order.
pub fn is_sorted(rows: &[SnapshotRow]) -> bool {
    rows.windows(2).all(|w| w[0].order_key() <= w[1].order_key())
}

/// Derive one sale event per snapshot.
///
/// `rows` must be sorted with [`sort_snapshots`]; an out-of-order pair is a
/// data error rather than a silently wrong delta. Every listing in `rows` must
/// have an entry in `capacities`.
pub fn derive_events(
    rows: &[SnapshotRow],
    capacities: &BTreeMap<ListingKey, Units>,
) -> Result<Vec<SaleEvent>> {
    let mut events = Vec::with_capacity(rows.len());
    let mut prev: Option<&SnapshotRow> = None;

    for row in rows {
        let max_stock = *capacities
            .get(&row.listing)
            .ok_or_else(|| Error::data(format!("no capacity for listing {}", row.listing)))?;

        let prev_stock = match prev {
            Some(p) if p.listing == row.listing && p.stay_date == row.stay_date => {
                if p.observed_at > row.observed_at {
                    return Err(Error::data(format!(
                        "snapshots for {} on {} are not sorted by observation time ({} after {})",
                        row.listing, row.stay_date, row.observed_at, p.observed_at
                    )));
                }
                Some(p.stock)
            }
            Some(p) if p.order_key() > row.order_key() => {
                return Err(Error::data(format!(
                    "snapshot groups are not contiguous: {} on {} follows {} on {}",
                    row.listing, row.stay_date, p.listing, p.stay_date
                )));
            }
            _ => None,
        };

        let (sold, restocked) = match prev_stock {
            Some(before) => (before.saturating_sub(row.stock), row.stock.saturating_sub(before)),
            None => (0, 0),
        };

        events.push(SaleEvent {
            listing: row.listing.clone(),
            stay_date: row.stay_date,
            observed_at: row.observed_at,
            stock: row.stock,
            price: row.price,
            max_stock,
            sold,
            restocked,
            revenue: sold as f64 * row.price,
        });
        prev = Some(row);
    }

    Ok(events)
}

/// Capacity filter plus sale derivation.
pub struct SalesDeriver {
    min_capacity: Units,
}

impl SalesDeriver {
    /// Create a new deriver.
    pub fn new(config: &CapacityConfig) -> Self {
        Self {
            min_capacity: config.min_capacity,
        }
    }

    /// Run the stage: capacities, filter, sort, derive.
    pub fn derive(&self, rows: Vec<SnapshotRow>) -> Result<DerivedSales> {
        let capacities = listing_capacities(&rows);
        let mut stats = SalesStats {
            listings_total: capacities.len() as u64,
            ..SalesStats::default()
        };

        let mut retained: Vec<SnapshotRow> = Vec::with_capacity(rows.len());
        for row in rows {
            let max_stock = capacities.get(&row.listing).copied().unwrap_or(0);
            if max_stock >= self.min_capacity {
                retained.push(row);
            } else {
                stats.rows_excluded += 1;
            }
        }
        stats.listings_excluded = capacities
            .values()
            .filter(|&&max| max < self.min_capacity)
            .count() as u64;

        sort_snapshots(&mut retained);
        let events = derive_events(&retained, &capacities)?;

        stats.events = events.len() as u64;
        stats.restock_events = events.iter().filter(|e| e.restocked > 0).count() as u64;
        stats.stay_groups = events
            .windows(2)
            .filter(|w| w[0].listing != w[1].listing || w[0].stay_date != w[1].stay_date)
            .count() as u64
            + u64::from(!events.is_empty());

        if stats.restock_events > 0 {
            debug!(restock_events = stats.restock_events, "stock increases observed");
        }
        info!(
            listings = stats.listings_total,
            excluded = stats.listings_excluded,
            events = stats.events,
            stay_groups = stats.stay_groups,
            "sales derived"
        );

        let capacities = capacities
            .into_iter()
            .map(|(listing, max_stock)| ListingCapacity { listing, max_stock })
            .collect();

        Ok(DerivedSales {
            events,
            capacities,
            stats,
        })
    }
}
