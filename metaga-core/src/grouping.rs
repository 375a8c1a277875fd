//! The grouped run index.
//!
//! A fixed-depth, typed replacement for the free-form nested maps the
//! experimental design implies: every run is keyed by the composite
//! [`RunKey`] `(num_tours, instance, heuristic group, seed)` and mapped to
//! its [`MetricBucket`]. The `BTreeMap` key order — exactly the key's field
//! order — gives deterministic traversal, which the aggregator relies on to
//! keep the two groups' sample arrays aligned.
//!
//! Two runs with the same key are a hard error: the key is supposed to
//! identify a run uniquely, so a collision means the input table is broken.

use std::collections::BTreeMap;
use std::fmt;
use std::ops::Bound;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::record::{HeuristicGroup, Metric, RunRecord};

/// Composite key identifying one run.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RunKey {
    pub num_tours: u32,
    pub instance: String,
    pub group: HeuristicGroup,
    pub seed: u64,
}

impl fmt::Display for RunKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "num_tours={} instance={} group={} seed={}",
            self.num_tours, self.instance, self.group, self.seed
        )
    }
}

/// One experimental cell: a `(num_tours, instance)` pair.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PairKey {
    pub num_tours: u32,
    pub instance: String,
}

impl PairKey {
    fn min_key(&self) -> RunKey {
        RunKey {
            num_tours: self.num_tours,
            instance: self.instance.clone(),
            group: HeuristicGroup::ALL[0],
            seed: 0,
        }
    }

    fn max_key(&self) -> RunKey {
        RunKey {
            num_tours: self.num_tours,
            instance: self.instance.clone(),
            group: HeuristicGroup::ALL[HeuristicGroup::ALL.len() - 1],
            seed: u64::MAX,
        }
    }
}

impl fmt::Display for PairKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "k={} instance={}", self.num_tours, self.instance)
    }
}

/// The metric values of a single run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricBucket {
    pub best_objective: f64,
    pub best_generation: f64,
    pub best_evaluation: f64,
}

impl MetricBucket {
    pub fn get(&self, metric: Metric) -> f64 {
        match metric {
            Metric::BestObjective => self.best_objective,
            Metric::BestGeneration => self.best_generation,
            Metric::BestEvaluation => self.best_evaluation,
        }
    }
}

/// Errors from index construction.
#[derive(Debug, Error)]
pub enum GroupError {
    #[error("duplicate run for {key}: the (num_tours, instance, group, seed) key must be unique")]
    DuplicateRun { key: RunKey },
}

/// Typed index over all runs, ordered by [`RunKey`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupedIndex {
    runs: BTreeMap<RunKey, MetricBucket>,
}

impl GroupedIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the index from filtered records, rejecting duplicate keys.
    pub fn from_records(records: Vec<RunRecord>) -> Result<Self, GroupError> {
        let mut index = Self::new();
        for record in records {
            index.insert(record)?;
        }
        Ok(index)
    }

    /// Insert one record; errors if its key is already present.
    pub fn insert(&mut self, record: RunRecord) -> Result<(), GroupError> {
        let key = RunKey {
            num_tours: record.num_tours,
            instance: record.instance,
            group: record.group,
            seed: record.seed,
        };
        let bucket = MetricBucket {
            best_objective: record.best_objective,
            best_generation: record.best_generation,
            best_evaluation: record.best_evaluation,
        };
        if self.runs.contains_key(&key) {
            return Err(GroupError::DuplicateRun { key });
        }
        self.runs.insert(key, bucket);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.runs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    pub fn contains(&self, key: &RunKey) -> bool {
        self.runs.contains_key(key)
    }

    /// All runs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&RunKey, &MetricBucket)> {
        self.runs.iter()
    }

    /// Distinct `(num_tours, instance)` pairs in key order.
    pub fn pairs(&self) -> Vec<PairKey> {
        let mut pairs: Vec<PairKey> = Vec::new();
        for key in self.runs.keys() {
            let pair = PairKey {
                num_tours: key.num_tours,
                instance: key.instance.clone(),
            };
            if pairs.last() != Some(&pair) {
                pairs.push(pair);
            }
        }
        pairs
    }

    /// Distinct k-values in ascending order.
    pub fn k_values(&self) -> Vec<u32> {
        let mut ks: Vec<u32> = Vec::new();
        for key in self.runs.keys() {
            if ks.last() != Some(&key.num_tours) {
                ks.push(key.num_tours);
            }
        }
        ks
    }

    /// Runs belonging to one pair, in key order.
    pub fn pair_runs<'a>(
        &'a self,
        pair: &PairKey,
    ) -> impl Iterator<Item = (&'a RunKey, &'a MetricBucket)> + 'a {
        self.runs.range(pair.min_key()..=pair.max_key())
    }

    /// Runs for one k-value, in key order.
    pub fn k_runs(&self, num_tours: u32) -> impl Iterator<Item = (&RunKey, &MetricBucket)> + '_ {
        let low = RunKey {
            num_tours,
            instance: String::new(),
            group: HeuristicGroup::ALL[0],
            seed: 0,
        };
        self.runs
            .range((Bound::Included(low), Bound::Unbounded))
            .take_while(move |(key, _)| key.num_tours == num_tours)
    }

    /// Per-group seed counts within one pair.
    pub fn seed_counts(&self, pair: &PairKey) -> BTreeMap<HeuristicGroup, usize> {
        let mut counts = BTreeMap::new();
        for (key, _) in self.pair_runs(pair) {
            *counts.entry(key.group).or_insert(0) += 1;
        }
        counts
    }

    /// Remove every run of a pair; returns how many runs were removed.
    pub fn remove_pair(&mut self, pair: &PairKey) -> usize {
        let keys: Vec<RunKey> = self
            .pair_runs(pair)
            .map(|(key, _)| key.clone())
            .collect();
        for key in &keys {
            self.runs.remove(key);
        }
        keys.len()
    }
}
