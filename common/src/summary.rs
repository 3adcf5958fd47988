//! Grouped reduction of benchmark runs into per-group means.

use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::run::BenchmarkRun;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Algorithm {
    Rendezvous,
    Memento,
}

impl Algorithm {
    /// Display order, also the order bars are drawn in
    pub const ALL: [Algorithm; 2] = [Algorithm::Rendezvous, Algorithm::Memento];

    pub fn name(&self) -> &'static str {
        match self {
            Algorithm::Rendezvous => "Rendezvous",
            Algorithm::Memento => "Memento",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Configuration dimension runs are grouped by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Dimension {
    Nodes,
    Partitions,
}

impl Dimension {
    pub const ALL: [Dimension; 2] = [Dimension::Nodes, Dimension::Partitions];

    pub fn key(&self, run: &BenchmarkRun) -> u32 {
        match self {
            Dimension::Nodes => run.node_count,
            Dimension::Partitions => run.partition_count,
        }
    }

    /// Axis title
    pub fn label(&self) -> &'static str {
        match self {
            Dimension::Nodes => "Node Count",
            Dimension::Partitions => "Partition Count",
        }
    }

    /// Unit used in textual summaries, ie. "3 nodes"
    pub fn unit(&self) -> &'static str {
        match self {
            Dimension::Nodes => "nodes",
            Dimension::Partitions => "partitions",
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SummaryError {
    #[error("Invalid input at run {index}: {reason}")]
    InvalidInput { index: usize, reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupSummary {
    pub group_key: u32,
    pub mean_rendezvous_ms: f64,
    pub mean_memento_ms: f64,
    pub best_algorithm: Algorithm,
    /// Number of runs sharing `group_key`
    pub runs: usize,
}

impl GroupSummary {
    pub fn mean_ms(&self, algorithm: Algorithm) -> f64 {
        match algorithm {
            Algorithm::Rendezvous => self.mean_rendezvous_ms,
            Algorithm::Memento => self.mean_memento_ms,
        }
    }

    pub fn best_mean_ms(&self) -> f64 {
        self.mean_ms(self.best_algorithm)
    }
}

/// Rendezvous only wins when strictly faster
///
/// Exact ties go to Memento. The Python reporting script picked the first
/// column on ties, so it printed Rendezvous for the same input.
pub fn best_of(mean_rendezvous_ms: f64, mean_memento_ms: f64) -> Algorithm {
    if mean_rendezvous_ms < mean_memento_ms {
        Algorithm::Rendezvous
    } else {
        Algorithm::Memento
    }
}

#[derive(Default)]
struct Accumulator {
    rendezvous_ms: f64,
    memento_ms: f64,
    count: usize,
}

impl Accumulator {
    fn push(&mut self, run: &BenchmarkRun) {
        self.rendezvous_ms += run.rendezvous_latency_ms;
        self.memento_ms += run.memento_latency_ms;
        self.count += 1;
    }

    fn finish(self, group_key: u32) -> GroupSummary {
        let mean_rendezvous_ms = self.rendezvous_ms / self.count as f64;
        let mean_memento_ms = self.memento_ms / self.count as f64;
        GroupSummary {
            group_key,
            mean_rendezvous_ms,
            mean_memento_ms,
            best_algorithm: best_of(mean_rendezvous_ms, mean_memento_ms),
            runs: self.count,
        }
    }
}

fn validate(index: usize, run: &BenchmarkRun, key: u32) -> Result<(), SummaryError> {
    let invalid = |reason: String| SummaryError::InvalidInput { index, reason };
    if run.rendezvous_latency_ms.is_nan() || run.rendezvous_latency_ms < 0.0 {
        return Err(invalid(format!(
            "rendezvous latency {} is not a non-negative number",
            run.rendezvous_latency_ms
        )));
    }
    if run.memento_latency_ms.is_nan() || run.memento_latency_ms < 0.0 {
        return Err(invalid(format!(
            "memento latency {} is not a non-negative number",
            run.memento_latency_ms
        )));
    }
    if key == 0 {
        return Err(invalid("dimension value must be positive".to_owned()));
    }
    Ok(())
}

/// Groups `runs` by `selector` and averages each algorithm's latency per group
///
/// Every run is validated before any group is built, so an error never comes
/// with partial output. Groups are returned in ascending key order.
pub fn summarize_by<F>(runs: &[BenchmarkRun], selector: F) -> Result<Vec<GroupSummary>, SummaryError>
where
    F: Fn(&BenchmarkRun) -> u32,
{
    for (index, run) in runs.iter().enumerate() {
        validate(index, run, selector(run))?;
    }

    let mut groups: BTreeMap<u32, Accumulator> = BTreeMap::new();
    for run in runs {
        groups.entry(selector(run)).or_default().push(run);
    }

    Ok(groups
        .into_iter()
        .map(|(key, acc)| acc.finish(key))
        .collect())
}

pub fn summarize_by_dimension(
    runs: &[BenchmarkRun],
    dimension: Dimension,
) -> Result<Vec<GroupSummary>, SummaryError> {
    summarize_by(runs, |run| dimension.key(run))
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use proptest::prelude::*;

    use super::*;

    fn by_nodes(nodes: u32, rendezvous: f64, memento: f64) -> BenchmarkRun {
        BenchmarkRun::new(nodes, 1024, rendezvous, memento)
    }

    #[test]
    fn averages_a_single_group() {
        let runs = [by_nodes(3, 100.0, 80.0), by_nodes(3, 120.0, 90.0)];
        let summaries = summarize_by_dimension(&runs, Dimension::Nodes).unwrap();
        assert_eq!(
            summaries,
            vec![GroupSummary {
                group_key: 3,
                mean_rendezvous_ms: 110.0,
                mean_memento_ms: 85.0,
                best_algorithm: Algorithm::Memento,
                runs: 2,
            }]
        );
        assert_eq!(summaries[0].best_mean_ms(), 85.0);
    }

    #[test]
    fn negative_latency_is_rejected() {
        let runs = [by_nodes(3, 100.0, 80.0), by_nodes(5, -1.0, 80.0)];
        let err = summarize_by_dimension(&runs, Dimension::Nodes).unwrap_err();
        assert!(matches!(err, SummaryError::InvalidInput { index: 1, .. }));
    }

    #[test]
    fn nan_latency_is_rejected() {
        let runs = [by_nodes(3, 100.0, f64::NAN)];
        assert!(summarize_by_dimension(&runs, Dimension::Nodes).is_err());
    }

    #[test]
    fn zero_dimension_is_rejected() {
        let runs = [BenchmarkRun::new(3, 0, 1.0, 1.0)];
        assert!(summarize_by_dimension(&runs, Dimension::Nodes).is_ok());
        let err = summarize_by_dimension(&runs, Dimension::Partitions).unwrap_err();
        assert!(err.to_string().contains("dimension value must be positive"));
    }

    #[test]
    fn zero_latency_is_valid() {
        let runs = [by_nodes(3, 0.0, 0.0)];
        let summaries = summarize_by_dimension(&runs, Dimension::Nodes).unwrap();
        // tie goes to Memento
        assert_eq!(summaries[0].best_algorithm, Algorithm::Memento);
    }

    #[test]
    fn empty_input_yields_no_groups() {
        assert!(summarize_by_dimension(&[], Dimension::Partitions).unwrap().is_empty());
    }

    #[test]
    fn groups_are_sorted_by_key() {
        let runs = [
            BenchmarkRun::new(10, 4096, 5.0, 9.0),
            BenchmarkRun::new(3, 512, 5.0, 4.0),
            BenchmarkRun::new(5, 4096, 7.0, 6.0),
            BenchmarkRun::new(3, 1024, 3.0, 4.0),
        ];
        let nodes = summarize_by_dimension(&runs, Dimension::Nodes).unwrap();
        assert_eq!(nodes.iter().map(|s| s.group_key).collect::<Vec<_>>(), [3, 5, 10]);
        assert_eq!(nodes[0].best_algorithm, Algorithm::Memento);
        assert_eq!(nodes[2].best_algorithm, Algorithm::Rendezvous);

        let partitions = summarize_by_dimension(&runs, Dimension::Partitions).unwrap();
        assert_eq!(
            partitions.iter().map(|s| (s.group_key, s.runs)).collect::<Vec<_>>(),
            [(512, 1), (1024, 1), (4096, 2)]
        );
        assert_eq!(partitions[2].mean_rendezvous_ms, 6.0);
        assert_eq!(partitions[2].mean_memento_ms, 7.5);
    }

    #[test]
    fn custom_selector() {
        let runs = [
            BenchmarkRun::new(3, 16, 1.0, 2.0),
            BenchmarkRun::new(6, 16, 3.0, 2.0),
        ];
        let summaries = summarize_by(&runs, |run| run.node_count % 3 + 1).unwrap();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].mean_rendezvous_ms, 2.0);
    }

    fn arb_run() -> impl Strategy<Value = BenchmarkRun> {
        (1u32..8, 1u32..6, 0.0f64..1000.0, 0.0f64..1000.0)
            .prop_map(|(n, p, r, m)| BenchmarkRun::new(n, p * 256, r, m))
    }

    proptest! {
        #[test]
        fn prop_one_group_per_distinct_key(runs in prop::collection::vec(arb_run(), 0..64)) {
            for dimension in Dimension::ALL {
                let summaries = summarize_by_dimension(&runs, dimension).unwrap();
                let distinct = runs.iter().map(|r| dimension.key(r)).collect::<HashSet<_>>();
                prop_assert_eq!(summaries.len(), distinct.len());
                prop_assert_eq!(summaries.iter().map(|s| s.runs).sum::<usize>(), runs.len());
            }
        }

        #[test]
        fn prop_means_are_group_averages(runs in prop::collection::vec(arb_run(), 1..64)) {
            for summary in summarize_by_dimension(&runs, Dimension::Nodes).unwrap() {
                let group = runs.iter().filter(|r| r.node_count == summary.group_key).collect::<Vec<_>>();
                let size = group.len() as f64;
                let rendezvous = group.iter().map(|r| r.rendezvous_latency_ms).sum::<f64>() / size;
                let memento = group.iter().map(|r| r.memento_latency_ms).sum::<f64>() / size;
                prop_assert!((summary.mean_rendezvous_ms - rendezvous).abs() < 1e-9);
                prop_assert!((summary.mean_memento_ms - memento).abs() < 1e-9);
            }
        }

        #[test]
        fn prop_rendezvous_wins_only_when_strictly_faster(runs in prop::collection::vec(arb_run(), 1..64)) {
            for summary in summarize_by_dimension(&runs, Dimension::Partitions).unwrap() {
                let rendezvous_wins = summary.mean_rendezvous_ms < summary.mean_memento_ms;
                prop_assert_eq!(summary.best_algorithm == Algorithm::Rendezvous, rendezvous_wins);
            }
        }

        #[test]
        fn prop_negative_latency_fails(runs in prop::collection::vec(arb_run(), 0..16), at in 0usize..16, bad in -1000.0f64..-0.001) {
            let mut runs = runs;
            let at = at.min(runs.len());
            runs.insert(at, BenchmarkRun::new(3, 16, 1.0, bad));
            let result = summarize_by_dimension(&runs, Dimension::Nodes);
            prop_assert_eq!(result, Err(SummaryError::InvalidInput {
                index: at,
                reason: format!("memento latency {bad} is not a non-negative number"),
            }));
        }
    }
}
