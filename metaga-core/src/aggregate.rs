//! Sample extraction at the three aggregation granularities.
//!
//! Every function walks the index in key order, so for a given granularity
//! the RR and MMMR arrays are aligned by (num_tours, instance, seed rank).
//! On a balance-validated index that alignment is exactly the pairing the
//! paired t-test needs.

use std::collections::BTreeMap;

use crate::grouping::{GroupedIndex, MetricBucket, PairKey, RunKey};
use crate::record::{HeuristicGroup, Metric};

/// The two groups' sample arrays for one metric.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricSamples {
    pub rr: Vec<f64>,
    pub mmmr: Vec<f64>,
}

impl MetricSamples {
    fn push(&mut self, group: HeuristicGroup, value: f64) {
        match group {
            HeuristicGroup::Rr => self.rr.push(value),
            HeuristicGroup::Mmmr => self.mmmr.push(value),
        }
    }
}

/// Per-metric samples for one aggregation scope.
pub type MetricTable = BTreeMap<Metric, MetricSamples>;

fn collect<'a>(runs: impl Iterator<Item = (&'a RunKey, &'a MetricBucket)>) -> MetricTable {
    let mut table = MetricTable::new();
    for (key, bucket) in runs {
        for metric in Metric::ALL {
            table
                .entry(metric)
                .or_default()
                .push(key.group, bucket.get(metric));
        }
    }
    table
}

/// All k-values, all instances, all seeds.
pub fn overall_samples(index: &GroupedIndex) -> MetricTable {
    collect(index.iter())
}

/// One table per k-value.
pub fn per_k_samples(index: &GroupedIndex) -> BTreeMap<u32, MetricTable> {
    index
        .k_values()
        .into_iter()
        .map(|k| (k, collect(index.k_runs(k))))
        .collect()
}

/// One table per `(num_tours, instance)` pair.
pub fn per_pair_samples(index: &GroupedIndex) -> BTreeMap<PairKey, MetricTable> {
    index
        .pairs()
        .into_iter()
        .map(|pair| {
            let table = collect(index.pair_runs(&pair));
            (pair, table)
        })
        .collect()
}
