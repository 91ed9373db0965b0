//! Exemplar selection for the booking-curve system.
//!
//! This crate provides:
//! - Price-tier segmentation by characteristic price
//! - Global and peer-group exemplar selection
//! - Booking-curve reconstruction for selected exemplars
//! - The end-to-end analysis pipeline and chart rendering seam

pub mod segmentation;
pub mod selector;
pub mod curve;
pub mod render;
pub mod pipeline;

pub use segmentation::{Segmentation, TierAssignment};
pub use selector::{Exemplar, ExemplarSelector, SelectionMode};
pub use curve::{BookingCurve, CurveBuilder, CurvePoint};
pub use render::{render_all, ChartRenderer, JsonLinesRenderer};
pub use pipeline::{AnalysisReport, Pipeline};
