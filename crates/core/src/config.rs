//! Configuration structures for the booking-curve system.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Main configuration for an analysis run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Listing capacity filter.
    pub capacity: CapacityConfig,
    /// Booking-pace window configuration.
    pub pace: PaceConfig,
    /// Exemplar selection configuration.
    pub selection: SelectionConfig,
}

impl Config {
    /// Build a configuration with the two analyst-facing run parameters.
    pub fn with_selection(last_minute_threshold: f64, num_tiers: usize) -> Self {
        Self {
            selection: SelectionConfig {
                last_minute_threshold,
                num_tiers,
            },
            ..Self::default()
        }
    }

    /// Check that all parameters are usable.
    pub fn validate(&self) -> Result<()> {
        let threshold = self.selection.last_minute_threshold;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(Error::config(format!(
                "last_minute_threshold must be within [0, 1], got {threshold}"
            )));
        }
        if self.selection.num_tiers == 0 {
            return Err(Error::config("num_tiers must be at least 1"));
        }
        if self.pace.early_window_days <= 0 || self.pace.late_window_days <= 0 {
            return Err(Error::config(format!(
                "pace windows must be positive, got early={} late={}",
                self.pace.early_window_days, self.pace.late_window_days
            )));
        }
        Ok(())
    }
}

/// Listing capacity configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapacityConfig {
    /// Listings whose max stock is below this are excluded.
    pub min_capacity: u32,
}

impl Default for CapacityConfig {
    fn default() -> Self {
        Self { min_capacity: 30 }
    }
}

/// Booking-pace window configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaceConfig {
    /// Sales observed strictly before `stay_date - early_window_days` count as early.
    pub early_window_days: i64,
    /// Sales observed at or after `stay_date - late_window_days` count as late.
    pub late_window_days: i64,
}

impl Default for PaceConfig {
    fn default() -> Self {
        Self {
            early_window_days: 120,
            late_window_days: 30,
        }
    }
}

/// Exemplar selection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionConfig {
    /// Minimum last-30-day booking ratio for a row to be a candidate.
    pub last_minute_threshold: f64,
    /// Number of price tiers for peer-group selection.
    pub num_tiers: usize,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            last_minute_threshold: 0.5,
            num_tiers: 3,
        }
    }
}
