//! MetaGA summary pipeline — post-processing for heuristic-comparison trials.
//!
//! Takes the flat run table produced by repeated MetaGA trials (two heuristic
//! groups, RR and MMMR, across k-values, problem instances and random seeds)
//! and turns it into significance reports:
//! - Validity filtering of killed/crashed runs
//! - A typed grouped index keyed by (num_tours, instance, group, seed)
//! - Balance validation with per-pair exclusion diagnostics
//! - Mann-Whitney U, paired t and two-sample t tests at three aggregation
//!   levels (overall, per k-value, per instance)
//! - Narrative markdown, tabular CSV and JSON summary artifacts

pub mod aggregate;
pub mod balance;
pub mod breakdown;
pub mod data_loader;
pub mod grouping;
pub mod record;
pub mod reporting;
pub mod runner;
pub mod stats;

pub use aggregate::{overall_samples, per_k_samples, per_pair_samples, MetricSamples, MetricTable};
pub use balance::{validate_balance, BalanceReport, Exclusion, ExclusionReason};
pub use breakdown::{FamilyCounts, InstanceBreakdown};
pub use data_loader::{
    dataset_hash, load_records, records_from_reader, synthetic_records, write_records_csv,
    LoadError,
};
pub use grouping::{GroupError, GroupedIndex, MetricBucket, PairKey, RunKey};
pub use record::{instance_family, retain_completed, HeuristicGroup, Metric, RunRecord, RunState};
pub use reporting::narrative::{append_narrative, render_narrative};
pub use reporting::tabular::{render_tabular, write_tabular, TABULAR_HEADER};
pub use reporting::{
    export_json, import_json, KSummary, MetricComparison, PairSummary, ReportError, SummaryReport,
    TestRow, SCHEMA_VERSION,
};
pub use runner::{build_report, run_summary, SummaryConfig, SummaryError, SummaryOutcome};
pub use stats::{
    compare_samples, mann_whitney_u, paired_t_test, two_sample_t_test, ComparisonError, TestKind,
    TestOutcome, ALPHA,
};
