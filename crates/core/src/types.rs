//! Core data types for the booking-curve system.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Units of inventory (rooms).
pub type Units = u32;

/// Composite listing identity: one (hotel, plan, room type) combination.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ListingKey {
    pub hotel_id: String,
    pub plan_id: String,
    pub room_type_id: String,
}

impl ListingKey {
    pub fn new(
        hotel_id: impl Into<String>,
        plan_id: impl Into<String>,
        room_type_id: impl Into<String>,
    ) -> Self {
        Self {
            hotel_id: hotel_id.into(),
            plan_id: plan_id.into(),
            room_type_id: room_type_id.into(),
        }
    }
}

impl fmt::Display for ListingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.hotel_id, self.plan_id, self.room_type_id)
    }
}

/// Midnight at the start of a stay date, used as the origin for pace windows.
#[inline]
pub fn stay_start(stay_date: NaiveDate) -> NaiveDateTime {
    stay_date.and_time(NaiveTime::default())
}

/// Timestamp `days` before the start of `stay_date`.
#[inline]
pub fn days_before(stay_date: NaiveDate, days: i64) -> NaiveDateTime {
    stay_start(stay_date) - Duration::days(days)
}

/// A single observation of a listing's remaining inventory and price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotRow {
    /// Listing identity.
    pub listing: ListingKey,
    /// Calendar date being booked.
    pub stay_date: NaiveDate,
    /// When the snapshot was taken.
    pub observed_at: NaiveDateTime,
    /// Remaining unsold inventory.
    pub stock: Units,
    /// Quoted price at `observed_at`.
    pub price: f64,
}

impl SnapshotRow {
    /// Sort key that orders snapshots by group, then by observation time.
    #[inline]
    pub fn order_key(&self) -> (&ListingKey, NaiveDate, NaiveDateTime) {
        (&self.listing, self.stay_date, self.observed_at)
    }
}

/// Maximum observed stock for a listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingCapacity {
    pub listing: ListingKey,
    pub max_stock: Units,
}

/// Units sold (and restocked) between a snapshot and its predecessor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleEvent {
    pub listing: ListingKey,
    pub stay_date: NaiveDate,
    pub observed_at: NaiveDateTime,
    /// Stock at this snapshot.
    pub stock: Units,
    /// Price at this snapshot.
    pub price: f64,
    /// Capacity of the listing.
    pub max_stock: Units,
    /// Stock decrease since the previous snapshot, clamped at zero.
    pub sold: Units,
    /// Stock increase since the previous snapshot, clamped at zero.
    pub restocked: Units,
    /// `sold * price`.
    pub revenue: f64,
}

/// Per (listing, stay date) KPIs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyKpi {
    pub listing: ListingKey,
    pub stay_date: NaiveDate,
    pub max_stock: Units,
    /// Number of snapshots observed for this stay date.
    pub snapshots: u32,
    pub total_sold: Units,
    pub total_restocked: Units,
    pub total_revenue: f64,
    /// Revenue per available room: `total_revenue / max_stock`.
    pub rev_par: f64,
    /// Average daily rate: `total_revenue / total_sold`.
    pub adr: f64,
    /// Units sold before the early-booking cutoff.
    pub sold_before_120: Units,
    /// `sold_before_120 / max_stock`.
    pub booking_rate_at_120_days: f64,
    /// Units sold inside the late-booking window.
    pub sold_last_30: Units,
    /// `sold_last_30 / total_sold`.
    pub last_30_days_booking_ratio: f64,
}

impl DailyKpi {
    /// Whether this row qualifies as a last-minute case.
    #[inline]
    pub fn is_last_minute(&self, threshold: f64) -> bool {
        self.last_30_days_booking_ratio >= threshold
    }
}

/// Price segment a listing belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PriceTier {
    /// Zero-based tier index, ascending with price.
    pub index: usize,
    /// Total number of tiers in the segmentation.
    pub count: usize,
}

impl PriceTier {
    pub fn new(index: usize, count: usize) -> Self {
        Self { index, count }
    }

    /// The tier every listing falls into when segmentation is degenerate.
    pub fn single() -> Self {
        Self { index: 0, count: 1 }
    }

    /// Human-readable tier label.
    pub fn label(&self) -> String {
        match (self.count, self.index) {
            (1, _) => "Single group".to_string(),
            (3, 0) => "Low".to_string(),
            (3, 1) => "Mid".to_string(),
            (3, 2) => "High".to_string(),
            (n, i) => format!("Tier {}/{}", i + 1, n),
        }
    }
}

impl fmt::Display for PriceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// Divide, returning zero when the denominator is zero.
#[inline]
pub fn ratio_or_zero(numerator: f64, denominator: f64) -> f64 {
    if denominator != 0.0 {
        numerator / denominator
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_days_before() {
        let stay = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let cutoff = days_before(stay, 30);
        assert_eq!(
            cutoff,
            NaiveDate::from_ymd_opt(2024, 5, 2).unwrap().and_hms_opt(0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_listing_ordering() {
        let a = ListingKey::new("h1", "p1", "r1");
        let b = ListingKey::new("h1", "p1", "r2");
        let c = ListingKey::new("h2", "p0", "r0");
        assert!(a < b);
        assert!(b < c);
        assert_eq!(a.to_string(), "h1/p1/r1");
    }

    #[test]
    fn test_ratio_or_zero() {
        assert_eq!(ratio_or_zero(10.0, 0.0), 0.0);
        assert!((ratio_or_zero(10.0, 4.0) - 2.5).abs() < 1e-10);
    }

    #[test]
    fn test_tier_labels() {
        assert_eq!(PriceTier::new(0, 3).label(), "Low");
        assert_eq!(PriceTier::new(2, 3).label(), "High");
        assert_eq!(PriceTier::new(1, 4).label(), "Tier 2/4");
        assert_eq!(PriceTier::single().label(), "Single group");
        assert!(PriceTier::new(0, 3) < PriceTier::new(1, 3));
    }
}
