//! Run records — one row per MetaGA trial, plus the validity filter.
//!
//! The wire column names (`State`, `routing.num_tours`, `instance.name`, …)
//! follow the experiment tracker's table export, so a downloaded table
//! deserializes without a mapping layer.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Termination status of a single run.
///
/// Tables can contain states this crate does not know about; those are kept
/// (`Unknown`) and only `killed`/`crashed` runs are ever discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Finished,
    Running,
    Failed,
    Killed,
    Crashed,
    Unknown,
}

impl RunState {
    pub fn from_wire(value: &str) -> Self {
        match value {
            "finished" => RunState::Finished,
            "running" => RunState::Running,
            "failed" => RunState::Failed,
            "killed" => RunState::Killed,
            "crashed" => RunState::Crashed,
            _ => RunState::Unknown,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RunState::Finished => "finished",
            RunState::Running => "running",
            RunState::Failed => "failed",
            RunState::Killed => "killed",
            RunState::Crashed => "crashed",
            RunState::Unknown => "unknown",
        }
    }

    /// True for runs that terminated abnormally and carry no usable metrics.
    pub fn is_abnormal(self) -> bool {
        matches!(self, RunState::Killed | RunState::Crashed)
    }
}

impl Serialize for RunState {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for RunState {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        Ok(RunState::from_wire(&value))
    }
}

/// The heuristic configuration a run belongs to. Exactly two groups exist;
/// the comparator relies on that.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum HeuristicGroup {
    #[serde(rename = "RR")]
    Rr,
    #[serde(rename = "MMMR")]
    Mmmr,
}

impl HeuristicGroup {
    pub const ALL: [HeuristicGroup; 2] = [HeuristicGroup::Rr, HeuristicGroup::Mmmr];

    pub fn as_str(self) -> &'static str {
        match self {
            HeuristicGroup::Rr => "RR",
            HeuristicGroup::Mmmr => "MMMR",
        }
    }
}

impl fmt::Display for HeuristicGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The per-run metrics the pipeline compares.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Metric {
    #[serde(rename = "run best obj")]
    BestObjective,
    #[serde(rename = "run best gen")]
    BestGeneration,
    #[serde(rename = "run best eval")]
    BestEvaluation,
}

impl Metric {
    pub const ALL: [Metric; 3] = [
        Metric::BestObjective,
        Metric::BestGeneration,
        Metric::BestEvaluation,
    ];

    /// Report label, matching the metric names in the source table.
    pub fn label(self) -> &'static str {
        match self {
            Metric::BestObjective => "run best obj",
            Metric::BestGeneration => "run best gen",
            Metric::BestEvaluation => "run best eval",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One row of the input table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    #[serde(rename = "State")]
    pub state: RunState,

    #[serde(rename = "routing.num_tours")]
    pub num_tours: u32,

    #[serde(rename = "instance.name")]
    pub instance: String,

    #[serde(rename = "routing.heuristic_group")]
    pub group: HeuristicGroup,

    #[serde(rename = "ga.random_seed")]
    pub seed: u64,

    #[serde(rename = "run best obj")]
    pub best_objective: f64,

    #[serde(rename = "run best generation")]
    pub best_generation: f64,

    #[serde(rename = "run best evaluation")]
    pub best_evaluation: f64,
}

impl RunRecord {
    pub fn metric(&self, metric: Metric) -> f64 {
        match metric {
            Metric::BestObjective => self.best_objective,
            Metric::BestGeneration => self.best_generation,
            Metric::BestEvaluation => self.best_evaluation,
        }
    }
}

/// Drop runs that terminated abnormally (`killed` or `crashed`).
///
/// Pure and total: preserves the relative order of every other record and
/// maps an empty input to an empty output.
pub fn retain_completed(records: Vec<RunRecord>) -> Vec<RunRecord> {
    records
        .into_iter()
        .filter(|r| !r.state.is_abnormal())
        .collect()
}

/// Instance family: the instance name with any trailing decimal suffix
/// stripped. Names that are all digits keep their original form.
pub fn instance_family(instance: &str) -> &str {
    let stripped = instance.trim_end_matches(|c: char| c.is_ascii_digit());
    if stripped.is_empty() {
        instance
    } else {
        stripped
    }
}
