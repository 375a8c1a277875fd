//! Per-k instance-family breakdown for console diagnostics.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::grouping::GroupedIndex;
use crate::record::instance_family;

/// Instance counts for one k-value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FamilyCounts {
    /// Distinct instances with data for this k-value.
    pub total: usize,
    /// Distinct instances per family (name with trailing digits stripped).
    pub families: BTreeMap<String, usize>,
}

/// Instance-family counts per k-value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InstanceBreakdown {
    pub per_k: BTreeMap<u32, FamilyCounts>,
}

impl InstanceBreakdown {
    /// Count each retained `(num_tours, instance)` pair once.
    pub fn from_index(index: &GroupedIndex) -> Self {
        let mut per_k: BTreeMap<u32, FamilyCounts> = BTreeMap::new();
        for pair in index.pairs() {
            let counts = per_k.entry(pair.num_tours).or_default();
            counts.total += 1;
            *counts
                .families
                .entry(instance_family(&pair.instance).to_string())
                .or_insert(0) += 1;
        }
        Self { per_k }
    }

    /// Render the console block, one line per k-value.
    pub fn render(&self) -> String {
        let mut out = String::from("Breaking down the number of instances and k-values:\n");
        for (num_tours, counts) in &self.per_k {
            let families: Vec<String> = counts
                .families
                .iter()
                .map(|(family, count)| format!("{count} {family}"))
                .collect();
            out.push_str(&format!(
                " - k={} we ran on {} total unique instances ({})\n",
                num_tours,
                counts.total,
                families.join(", ")
            ));
        }
        out
    }
}
