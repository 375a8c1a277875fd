//! Pipeline orchestration: one batch pass over one run table.
//!
//! load -> validity filter -> group -> balance validation -> compare at the
//! three aggregation levels -> write artifacts. All report text is built in
//! memory first; files are only touched once every comparison has succeeded.

use std::path::PathBuf;

use thiserror::Error;

use crate::aggregate::{overall_samples, per_k_samples, per_pair_samples, MetricTable};
use crate::balance::{validate_balance, BalanceReport};
use crate::breakdown::InstanceBreakdown;
use crate::data_loader::{dataset_hash, load_records, LoadError};
use crate::grouping::{GroupError, GroupedIndex};
use crate::record::retain_completed;
use crate::reporting::{
    export_json, narrative, tabular, KSummary, MetricComparison, PairSummary, ReportError,
    SummaryReport, TestRow, SCHEMA_VERSION,
};
use crate::stats::{compare_samples, ComparisonError};

/// Where the pipeline reads from and writes to.
#[derive(Debug, Clone)]
pub struct SummaryConfig {
    /// The input run table (CSV).
    pub input: PathBuf,
    /// Narrative markdown report, opened in append mode.
    pub narrative_path: PathBuf,
    /// Tabular CSV report, truncated each invocation.
    pub tabular_path: PathBuf,
    /// Optional JSON summary artifact.
    pub json_path: Option<PathBuf>,
}

impl SummaryConfig {
    pub fn new(input: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            narrative_path: "results.md".into(),
            tabular_path: "per_instance.csv".into(),
            json_path: None,
        }
    }
}

/// Errors from any stage of the pipeline.
#[derive(Debug, Error)]
pub enum SummaryError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Group(#[from] GroupError),

    #[error(transparent)]
    Comparison(#[from] ComparisonError),

    #[error(transparent)]
    Report(#[from] ReportError),
}

/// Everything one invocation produced, for the caller to display.
#[derive(Debug, Clone)]
pub struct SummaryOutcome {
    pub report: SummaryReport,
    pub balance: BalanceReport,
    pub breakdown: InstanceBreakdown,
    /// Records in the input table.
    pub loaded: usize,
    /// Records discarded by the validity filter.
    pub discarded: usize,
}

fn compare_table(table: &MetricTable) -> Result<Vec<MetricComparison>, ComparisonError> {
    table
        .iter()
        .map(|(metric, samples)| {
            let tests = compare_samples(samples)?
                .into_iter()
                .map(|(kind, outcome)| TestRow::new(kind, outcome))
                .collect();
            Ok(MetricComparison {
                metric: *metric,
                tests,
            })
        })
        .collect()
}

/// Run the three-level comparison over a balance-validated index.
pub fn build_report(
    index: &GroupedIndex,
    dataset_hash: String,
) -> Result<SummaryReport, ComparisonError> {
    let overall = compare_table(&overall_samples(index))?;

    let per_k = per_k_samples(index)
        .into_iter()
        .map(|(num_tours, table)| {
            Ok(KSummary {
                num_tours,
                metrics: compare_table(&table)?,
            })
        })
        .collect::<Result<Vec<_>, ComparisonError>>()?;

    let per_instance = per_pair_samples(index)
        .into_iter()
        .map(|(pair, table)| {
            Ok(PairSummary {
                num_tours: pair.num_tours,
                instance: pair.instance,
                metrics: compare_table(&table)?,
            })
        })
        .collect::<Result<Vec<_>, ComparisonError>>()?;

    Ok(SummaryReport {
        schema_version: SCHEMA_VERSION,
        generated_at: chrono::Local::now().to_rfc3339(),
        dataset_hash,
        overall,
        per_k,
        per_instance,
    })
}

/// Execute the full pipeline for one input table.
pub fn run_summary(config: &SummaryConfig) -> Result<SummaryOutcome, SummaryError> {
    let records = load_records(&config.input)?;
    let loaded = records.len();

    let records = retain_completed(records);
    let discarded = loaded - records.len();

    let hash = dataset_hash(&records);
    let mut index = GroupedIndex::from_records(records)?;
    let balance = validate_balance(&mut index);
    let breakdown = InstanceBreakdown::from_index(&index);

    let report = build_report(&index, hash)?;

    let narrative_text = narrative::render_narrative(&report);
    let tabular_text = tabular::render_tabular(&report.per_instance)?;

    narrative::append_narrative(&config.narrative_path, &narrative_text)
        .map_err(ReportError::Io)?;
    tabular::write_tabular(&config.tabular_path, &tabular_text).map_err(ReportError::Io)?;
    if let Some(json_path) = &config.json_path {
        std::fs::write(json_path, export_json(&report)?).map_err(ReportError::Io)?;
    }

    Ok(SummaryOutcome {
        report,
        balance,
        breakdown,
        loaded,
        discarded,
    })
}
