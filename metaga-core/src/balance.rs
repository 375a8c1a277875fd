//! Balance validation over the grouped index.
//!
//! A `(num_tours, instance)` pair is only comparable when both heuristic
//! groups ran on it with the same seeds. Pairs that miss a group, or whose
//! groups have unequal seed counts, are removed from the index before any
//! statistics run. The caller prints one diagnostic line per removal.

use serde::{Deserialize, Serialize};

use crate::grouping::{GroupedIndex, PairKey};
use crate::record::HeuristicGroup;

/// Why a pair was excluded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExclusionReason {
    /// Fewer heuristic groups than the maximum observed across the table.
    MissingGroups { present: usize, expected: usize },
    /// All groups present but with unequal seed counts.
    UnevenSeeds { counts: Vec<(HeuristicGroup, usize)> },
}

/// One removed pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exclusion {
    pub pair: PairKey,
    pub reason: ExclusionReason,
}

/// Outcome of a validation pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceReport {
    /// Pairs removed from the index, in key order.
    pub excluded: Vec<Exclusion>,
    /// The maximum number of distinct heuristic groups observed per pair
    /// before removal.
    pub max_groups: usize,
    /// Minimum per-group seed count across the retained pairs.
    pub min_seeds: Option<usize>,
}

/// Remove unbalanced pairs from the index, in place.
///
/// Pass one establishes `max_groups`, the group-set size every pair must
/// match. Pass two excludes pairs that fall short of it or whose per-group
/// seed counts differ. Idempotent: validating the output again removes
/// nothing, since every retained pair already satisfies both rules.
pub fn validate_balance(index: &mut GroupedIndex) -> BalanceReport {
    let pairs = index.pairs();

    let max_groups = pairs
        .iter()
        .map(|pair| index.seed_counts(pair).len())
        .max()
        .unwrap_or(0);

    let mut excluded = Vec::new();
    let mut min_seeds: Option<usize> = None;

    for pair in &pairs {
        let counts = index.seed_counts(pair);

        if counts.len() < max_groups {
            excluded.push(Exclusion {
                pair: pair.clone(),
                reason: ExclusionReason::MissingGroups {
                    present: counts.len(),
                    expected: max_groups,
                },
            });
            continue;
        }

        let mut values = counts.values().copied();
        let first = values.next().unwrap_or(0);
        if values.any(|count| count != first) {
            excluded.push(Exclusion {
                pair: pair.clone(),
                reason: ExclusionReason::UnevenSeeds {
                    counts: counts.into_iter().collect(),
                },
            });
            continue;
        }

        min_seeds = Some(match min_seeds {
            Some(current) => current.min(first),
            None => first,
        });
    }

    for exclusion in &excluded {
        index.remove_pair(&exclusion.pair);
    }

    BalanceReport {
        excluded,
        max_groups,
        min_seeds,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{RunRecord, RunState};

    fn record(k: u32, instance: &str, group: HeuristicGroup, seed: u64) -> RunRecord {
        RunRecord {
            state: RunState::Finished,
            num_tours: k,
            instance: instance.into(),
            group,
            seed,
            best_objective: 100.0,
            best_generation: 10.0,
            best_evaluation: 1000.0,
        }
    }

    fn index_of(records: Vec<RunRecord>) -> GroupedIndex {
        GroupedIndex::from_records(records).unwrap()
    }

    #[test]
    fn balanced_table_keeps_everything() {
        let mut index = index_of(vec![
            record(0, "gdb1", HeuristicGroup::Rr, 1),
            record(0, "gdb1", HeuristicGroup::Rr, 2),
            record(0, "gdb1", HeuristicGroup::Mmmr, 1),
            record(0, "gdb1", HeuristicGroup::Mmmr, 2),
        ]);
        let report = validate_balance(&mut index);
        assert!(report.excluded.is_empty());
        assert_eq!(report.max_groups, 2);
        assert_eq!(report.min_seeds, Some(2));
        assert_eq!(index.len(), 4);
    }

    #[test]
    fn pair_missing_a_group_is_removed() {
        // k=0 balanced, k=1 has RR seed {1} and no MMMR at all
        let mut index = index_of(vec![
            record(0, "gdb1", HeuristicGroup::Rr, 1),
            record(0, "gdb1", HeuristicGroup::Rr, 2),
            record(0, "gdb1", HeuristicGroup::Mmmr, 1),
            record(0, "gdb1", HeuristicGroup::Mmmr, 2),
            record(1, "gdb1", HeuristicGroup::Rr, 1),
        ]);
        let report = validate_balance(&mut index);

        assert_eq!(report.excluded.len(), 1);
        let exclusion = &report.excluded[0];
        assert_eq!(exclusion.pair.num_tours, 1);
        assert_eq!(exclusion.pair.instance, "gdb1");
        assert_eq!(
            exclusion.reason,
            ExclusionReason::MissingGroups {
                present: 1,
                expected: 2
            }
        );
        assert_eq!(index.len(), 4);
        assert_eq!(index.k_values(), vec![0]);
    }

    #[test]
    fn uneven_seed_counts_are_removed() {
        let mut index = index_of(vec![
            record(0, "gdb1", HeuristicGroup::Rr, 1),
            record(0, "gdb1", HeuristicGroup::Rr, 2),
            record(0, "gdb1", HeuristicGroup::Rr, 3),
            record(0, "gdb1", HeuristicGroup::Mmmr, 1),
            record(0, "bier127", HeuristicGroup::Rr, 1),
            record(0, "bier127", HeuristicGroup::Mmmr, 1),
        ]);
        let report = validate_balance(&mut index);

        assert_eq!(report.excluded.len(), 1);
        assert_eq!(report.excluded[0].pair.instance, "gdb1");
        match &report.excluded[0].reason {
            ExclusionReason::UnevenSeeds { counts } => {
                assert_eq!(
                    counts,
                    &vec![(HeuristicGroup::Rr, 3), (HeuristicGroup::Mmmr, 1)]
                );
            }
            other => panic!("expected UnevenSeeds, got {other:?}"),
        }
        assert_eq!(index.len(), 2);
        assert_eq!(report.min_seeds, Some(1));
    }

    #[test]
    fn uneven_but_divisible_counts_are_still_removed() {
        // 2 vs 4 seeds passes the original modulo check but not the strict rule
        let mut index = index_of(vec![
            record(0, "gdb1", HeuristicGroup::Rr, 1),
            record(0, "gdb1", HeuristicGroup::Rr, 2),
            record(0, "gdb1", HeuristicGroup::Mmmr, 1),
            record(0, "gdb1", HeuristicGroup::Mmmr, 2),
            record(0, "gdb1", HeuristicGroup::Mmmr, 3),
            record(0, "gdb1", HeuristicGroup::Mmmr, 4),
        ]);
        let report = validate_balance(&mut index);
        assert_eq!(report.excluded.len(), 1);
        assert!(index.is_empty());
    }

    #[test]
    fn single_group_table_has_max_groups_one() {
        let mut index = index_of(vec![
            record(0, "gdb1", HeuristicGroup::Rr, 1),
            record(1, "gdb1", HeuristicGroup::Rr, 1),
        ]);
        let report = validate_balance(&mut index);
        assert!(report.excluded.is_empty());
        assert_eq!(report.max_groups, 1);
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn empty_index_yields_empty_report() {
        let mut index = GroupedIndex::new();
        let report = validate_balance(&mut index);
        assert!(report.excluded.is_empty());
        assert_eq!(report.max_groups, 0);
        assert_eq!(report.min_seeds, None);
    }

    #[test]
    fn validation_is_idempotent() {
        let mut index = index_of(vec![
            record(0, "gdb1", HeuristicGroup::Rr, 1),
            record(0, "gdb1", HeuristicGroup::Mmmr, 1),
            record(0, "bier127", HeuristicGroup::Rr, 1),
            record(1, "gdb2", HeuristicGroup::Mmmr, 1),
            record(1, "gdb2", HeuristicGroup::Mmmr, 2),
        ]);
        let first = validate_balance(&mut index);
        assert!(!first.excluded.is_empty());

        let snapshot = index.clone();
        let second = validate_balance(&mut index);
        assert!(second.excluded.is_empty());
        assert_eq!(index, snapshot);
    }
}
