//! Booking-curve analytics CLI.
//!
//! Reads one snapshot CSV, runs the analysis pipeline and writes the result
//! to stdout: the full JSON report by default, or one JSON line per booking
//! curve with `--charts`.

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use curve_core::Config;
use curve_selection::{render_all, AnalysisReport, JsonLinesRenderer, Pipeline};

/// Which exemplar sets to emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// Best last-minute stay date per listing.
    Global,
    /// Best last-minute stay date per price tier.
    Peer,
    /// Both of the above.
    Both,
}

/// Booking-curve analytics - finds best-practice last-minute booking curves
#[derive(Parser, Debug)]
#[command(name = "booking-curve")]
#[command(about = "Derives booking-curve KPIs from inventory snapshots and selects exemplars")]
struct Args {
    /// Snapshot CSV (hotel_id, plan_id, room_type_id, date, created_at, stock, price)
    csv: PathBuf,

    /// Minimum share of sales in the last 30 days for a last-minute case
    #[arg(long, default_value = "0.5")]
    threshold: f64,

    /// Number of price tiers for peer-group selection
    #[arg(long, default_value = "3")]
    num_tiers: usize,

    /// Exemplar sets to emit
    #[arg(long, value_enum, default_value = "both")]
    mode: Mode,

    /// Emit booking curves as JSON lines instead of the report
    #[arg(long)]
    charts: bool,
}

fn main() -> Result<()> {
    // Logs go to stderr so stdout stays machine-readable
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    let config = Config::with_selection(args.threshold, args.num_tiers);
    let pipeline = Pipeline::new(config).context("Invalid run parameters")?;

    info!(path = %args.csv.display(), "Starting analysis");
    let mut report = pipeline
        .run_file(&args.csv)
        .with_context(|| format!("Analysis of '{}' failed", args.csv.display()))?;

    restrict_to_mode(&mut report, args.mode);

    let stdout = io::stdout();
    let mut out = stdout.lock();

    if args.charts {
        let mut renderer = JsonLinesRenderer::new(&mut out);
        let mut rendered = render_all(&mut renderer, &report.global_curves)?;
        rendered += render_all(&mut renderer, &report.peer_curves)?;
        info!(curves = rendered, "Booking curves written");
    } else {
        serde_json::to_writer_pretty(&mut out, &report).context("Failed to write report")?;
        writeln!(out)?;
    }

    out.flush()?;
    Ok(())
}

/// Drop the exemplar sets the caller did not ask for.
fn restrict_to_mode(report: &mut AnalysisReport, mode: Mode) {
    match mode {
        Mode::Global => {
            report.peer_exemplars.clear();
            report.peer_curves.clear();
        }
        Mode::Peer => {
            report.global_exemplars.clear();
            report.global_curves.clear();
        }
        Mode::Both => {}
    }
}
