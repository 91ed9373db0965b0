//! Core types and configuration for the booking-curve analytics system.
//!
//! This crate provides shared types used across all other crates:
//! - Listing identity and snapshot/sale/KPI records
//! - Configuration structures
//! - Common error types

pub mod config;
pub mod error;
pub mod types;

pub use config::{CapacityConfig, Config, PaceConfig, SelectionConfig};
pub use error::{Error, Result};
pub use types::*;
