//! KPI computation for the booking-curve system.
//!
//! This crate handles:
//! - Early and late booking-pace windows
//! - Per (listing, stay date) KPI aggregation (RevPAR, ADR, pace ratios)
//! - Characteristic price per listing

pub mod pace;
pub mod aggregator;
pub mod characteristic;

pub use pace::{PaceWindows, StayKey};
pub use aggregator::KpiAggregator;
pub use characteristic::characteristic_prices;
