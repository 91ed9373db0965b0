//! End-to-end analysis pipeline.
//!
//! Stages run strictly forward and each one fully materializes its output:
//! normalize -> derive sales -> aggregate KPIs -> segment -> select -> curves.

use crate::curve::{BookingCurve, CurveBuilder};
use crate::segmentation::Segmentation;
use crate::selector::{Exemplar, ExemplarSelector};
use curve_core::{Config, DailyKpi, Result, SnapshotRow};
use curve_features::{characteristic_prices, KpiAggregator};
use curve_ingestion::{
    load_snapshots, load_snapshots_file, NormalizationStats, SalesDeriver, SalesStats,
};
use serde::Serialize;
use std::io::Read;
use std::path::Path;
use tracing::info;

/// Everything one run produces.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub config: Config,
    /// Present when the run started from CSV.
    pub normalization: Option<NormalizationStats>,
    pub sales: SalesStats,
    /// Number of (listing, stay date) rows with at least one sale.
    pub kpi_rows: usize,
    /// Rows meeting the last-minute threshold.
    pub candidates: usize,
    pub segmentation: Segmentation,
    pub global_exemplars: Vec<Exemplar>,
    pub peer_exemplars: Vec<Exemplar>,
    pub global_curves: Vec<BookingCurve>,
    pub peer_curves: Vec<BookingCurve>,
    /// Full KPI table, kept for callers that want to inspect it.
    #[serde(skip)]
    pub kpis: Vec<DailyKpi>,
}

/// Configured analysis run.
pub struct Pipeline {
    config: Config,
}

impl Pipeline {
    /// Create a pipeline, rejecting unusable configuration.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run on already-normalized snapshot rows.
    pub fn run(&self, rows: Vec<SnapshotRow>) -> Result<AnalysisReport> {
        let sales = SalesDeriver::new(&self.config.capacity).derive(rows)?;

        let aggregator = KpiAggregator::new(&self.config.pace);
        let kpis = aggregator.aggregate(&sales.events);

        let prices = characteristic_prices(&kpis);
        let segmentation = Segmentation::from_prices(&prices, self.config.selection.num_tiers);

        let selector = ExemplarSelector::new(&self.config.selection);
        let candidates = selector.candidates(&kpis).len();
        let global_exemplars = selector.select_global(&kpis, &segmentation);
        let peer_exemplars = selector.select_peer_group(&kpis, &segmentation);

        let curves = CurveBuilder::new(aggregator.windows());
        let global_curves = curves.build_all(&global_exemplars, &sales.events);
        let peer_curves = curves.build_all(&peer_exemplars, &sales.events);

        info!(
            kpi_rows = kpis.len(),
            candidates,
            global = global_exemplars.len(),
            peer = peer_exemplars.len(),
            "analysis complete"
        );

        Ok(AnalysisReport {
            config: self.config.clone(),
            normalization: None,
            sales: sales.stats,
            kpi_rows: kpis.len(),
            candidates,
            segmentation,
            global_exemplars,
            peer_exemplars,
            global_curves,
            peer_curves,
            kpis,
        })
    }

    /// Normalize CSV from a reader, then run.
    pub fn run_reader<R: Read>(&self, reader: R) -> Result<AnalysisReport> {
        let table = load_snapshots(reader)?;
        let mut report = self.run(table.rows)?;
        report.normalization = Some(table.stats);
        Ok(report)
    }

    /// Normalize a CSV file, then run.
    pub fn run_file(&self, path: impl AsRef<Path>) -> Result<AnalysisReport> {
        let table = load_snapshots_file(path)?;
        let mut report = self.run(table.rows)?;
        report.normalization = Some(table.stats);
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use curve_core::Error;

    #[test]
    fn test_rejects_invalid_config() {
        let result = Pipeline::new(Config::with_selection(-0.1, 3));
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_empty_input_produces_empty_report() {
        let report = Pipeline::new(Config::default()).unwrap().run(Vec::new()).unwrap();
        assert_eq!(report.kpi_rows, 0);
        assert!(report.global_exemplars.is_empty());
        assert!(report.peer_exemplars.is_empty());
        assert!(report.segmentation.is_degenerate());
    }

    #[test]
    fn test_missing_file_halts_before_computation() {
        let pipeline = Pipeline::new(Config::default()).unwrap();
        let err = pipeline.run_file("/no/such/dir/hotel_prices.csv").unwrap_err();
        assert!(matches!(err, Error::SourceUnavailable(_)));
    }
}
