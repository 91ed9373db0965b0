//! Data ingestion and normalization for the booking-curve system.
//!
//! This crate handles:
//! - CSV snapshot loading and row validation
//! - Listing capacity computation and filtering
//! - Sale reconstruction from successive inventory snapshots

pub mod normalizer;
pub mod sales;

pub use normalizer::{load_snapshots, load_snapshots_file, NormalizationStats, NormalizedTable};
pub use sales::{DerivedSales, SalesDeriver, SalesStats};
