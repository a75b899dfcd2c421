//! CLI argument parsing for veredicto

use crate::model::MetricType;
use chrono::NaiveDate;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "veredicto")]
#[command(version)]
#[command(about = "Causally-aware protocol verdicts for health-metric time series", long_about = None)]
pub struct Cli {
    /// JSON document with samples, notes, events, protocols and biomarkers
    #[arg(short, long, value_name = "FILE")]
    pub input: PathBuf,

    /// User whose protocol is evaluated
    #[arg(short, long)]
    pub user: String,

    /// Protocol id to evaluate
    #[arg(short, long)]
    pub protocol: String,

    /// Evaluation date (YYYY-MM-DD)
    #[arg(long = "as-of", value_name = "DATE")]
    pub as_of: NaiveDate,

    /// TOML engine configuration (defaults apply to missing fields)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Use the strict preset: alpha 0.01 and at least 10 baseline points
    #[arg(long, conflicts_with = "config")]
    pub strict: bool,

    /// JSON-lines evidence ledger to load, append to and save
    #[arg(long, value_name = "FILE")]
    pub ledger: Option<PathBuf>,

    /// Restrict the analysis to these metrics (e.g., --metric hrv_rmssd)
    #[arg(short, long = "metric", value_name = "METRIC")]
    pub metrics: Vec<MetricType>,

    /// Pretty-print the JSON output
    #[arg(long)]
    pub pretty: bool,

    /// Enable debug tracing output to stderr
    #[arg(long)]
    pub debug: bool,
}
