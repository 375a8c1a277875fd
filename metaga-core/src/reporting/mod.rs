//! Report artifacts — narrative markdown, tabular CSV, and a JSON summary.
//!
//! All three renderers consume the same [`SummaryReport`]. Artifacts are
//! built as in-memory strings and written in one call each, so a failure
//! while computing statistics never leaves a half-written report behind.
//! The JSON summary carries a `schema_version`; newer versions are rejected
//! on load.

pub mod narrative;
pub mod tabular;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::record::Metric;
use crate::stats::{TestKind, TestOutcome};

/// Bumped whenever the JSON summary layout changes.
pub const SCHEMA_VERSION: u32 = 1;

/// One statistical test's result inside a report.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TestRow {
    pub kind: TestKind,
    pub statistic: f64,
    pub p_value: f64,
    pub significant: bool,
}

impl TestRow {
    pub fn new(kind: TestKind, outcome: TestOutcome) -> Self {
        Self {
            kind,
            statistic: outcome.statistic,
            p_value: outcome.p_value,
            significant: outcome.significant,
        }
    }
}

/// All test results for one metric within one aggregation scope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricComparison {
    pub metric: Metric,
    pub tests: Vec<TestRow>,
}

/// Per-k-value comparison block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KSummary {
    pub num_tours: u32,
    pub metrics: Vec<MetricComparison>,
}

/// Per-(k, instance) comparison block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairSummary {
    pub num_tours: u32,
    pub instance: String,
    pub metrics: Vec<MetricComparison>,
}

/// The complete comparison summary at all three aggregation levels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryReport {
    pub schema_version: u32,
    pub generated_at: String,
    /// BLAKE3 fingerprint of the filtered input records.
    pub dataset_hash: String,
    pub overall: Vec<MetricComparison>,
    pub per_k: Vec<KSummary>,
    pub per_instance: Vec<PairSummary>,
}

/// Errors from report rendering and I/O.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to serialize summary report: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported schema version {found} (max supported: {max})")]
    UnsupportedSchema { found: u32, max: u32 },

    #[error("failed to build tabular report: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to write report: {0}")]
    Io(#[from] std::io::Error),
}

/// Serialize a summary report to pretty JSON.
pub fn export_json(report: &SummaryReport) -> Result<String, ReportError> {
    Ok(serde_json::to_string_pretty(report)?)
}

/// Deserialize a summary report, rejecting unknown schema versions.
pub fn import_json(json: &str) -> Result<SummaryReport, ReportError> {
    let report: SummaryReport = serde_json::from_str(json)?;
    if report.schema_version > SCHEMA_VERSION {
        return Err(ReportError::UnsupportedSchema {
            found: report.schema_version,
            max: SCHEMA_VERSION,
        });
    }
    Ok(report)
}
