use std::{fmt::Write, path::PathBuf};

use eyre::{Context, Result};

use crate::{
    discover::Scenario,
    run::RunSet,
    summary::{Dimension, GroupSummary, summarize_by_dimension},
};

/// Both groupings of one scenario's latest result file
#[derive(Debug, Clone)]
pub struct ScenarioReport {
    pub scenario: Scenario,
    pub source: PathBuf,
    pub rows: usize,
    pub test_types: Vec<String>,
    pub by_nodes: Vec<GroupSummary>,
    pub by_partitions: Vec<GroupSummary>,
}

impl ScenarioReport {
    pub fn build(scenario: Scenario, set: &RunSet) -> Result<Self> {
        let runs = set.runs();
        let by_nodes = summarize_by_dimension(&runs, Dimension::Nodes)
            .context(format!("Summarize {} by node count", set.file_name()))?;
        let by_partitions = summarize_by_dimension(&runs, Dimension::Partitions)
            .context(format!("Summarize {} by partition count", set.file_name()))?;

        Ok(Self {
            scenario,
            source: set.path.clone(),
            rows: set.len(),
            test_types: set.test_types().into_iter().map(str::to_owned).collect(),
            by_nodes,
            by_partitions,
        })
    }

    pub fn summaries(&self, dimension: Dimension) -> &[GroupSummary] {
        match dimension {
            Dimension::Nodes => &self.by_nodes,
            Dimension::Partitions => &self.by_partitions,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    /// Best algorithm per group, means rounded to whole milliseconds
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let file_name = self
            .source
            .file_name()
            .map(|x| x.to_string_lossy().into_owned())
            .unwrap_or_default();
        _ = writeln!(out, "{} ({file_name})", self.scenario);
        _ = writeln!(out, "  Rows: {}", self.rows);
        if !self.test_types.is_empty() {
            _ = writeln!(out, "  Test types: {}", self.test_types.join(", "));
        }

        for dimension in Dimension::ALL {
            _ = writeln!(out, "  Best time by {}:", dimension.label().to_lowercase());
            let summaries = self.summaries(dimension);
            if summaries.is_empty() {
                _ = writeln!(out, "    no data");
            }
            for summary in summaries {
                _ = writeln!(
                    out,
                    "    {} {}: {} ({:.0} ms)",
                    summary.group_key,
                    dimension.unit(),
                    summary.best_algorithm,
                    summary.best_mean_ms()
                );
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;

    const CSV: &str = "TestType,Nodes,Partitions,Replicas,MementoTime_ms,RendezvousTime_ms,ThreadSafeNoPreWarm_ms,ThreadSafeWithPreWarm_ms,BestTime_ms,Timestamp
FewReplicas,3,1024,2,90,100,85,80,80,2025-06-01 10:00:00
FewReplicas,3,2048,2,95,120,92,90,90,2025-06-01 10:00:01
FewReplicas,5,1024,3,60,40,55,50,40,2025-06-01 10:00:02
";

    fn report() -> ScenarioReport {
        let set = RunSet::parse(Path::new("performance_fewreplicas_1.csv"), CSV).unwrap();
        ScenarioReport::build(Scenario::FewReplicas, &set).unwrap()
    }

    #[test]
    fn builds_both_groupings() {
        let report = report();
        assert_eq!(report.rows, 3);
        assert_eq!(report.test_types, vec!["FewReplicas"]);
        assert_eq!(report.by_nodes.len(), 2);
        assert_eq!(report.by_nodes[0].mean_rendezvous_ms, 110.0);
        assert_eq!(report.by_nodes[0].mean_memento_ms, 85.0);
        assert_eq!(report.by_partitions.len(), 2);
        assert_eq!(report.by_partitions[0].group_key, 1024);
        assert_eq!(report.by_partitions[0].mean_rendezvous_ms, 70.0);
        assert_eq!(report.by_partitions[0].mean_memento_ms, 65.0);
    }

    #[test]
    fn renders_best_per_group() {
        let text = report().render_text();
        let expected = "Few Replicas (performance_fewreplicas_1.csv)
  Rows: 3
  Test types: FewReplicas
  Best time by node count:
    3 nodes: Memento (85 ms)
    5 nodes: Rendezvous (40 ms)
  Best time by partition count:
    1024 partitions: Memento (65 ms)
    2048 partitions: Memento (90 ms)
";
        assert_eq!(text, expected);
    }

    #[test]
    fn invalid_rows_fail_the_report() {
        let csv = "Nodes,Partitions,RendezvousTime_ms,ThreadSafeWithPreWarm_ms\n3,16,-1,4\n";
        let set = RunSet::parse(Path::new("bad.csv"), csv).unwrap();
        let err = ScenarioReport::build(Scenario::FullReplicas, &set).unwrap_err();
        assert!(err.downcast_ref::<crate::summary::SummaryError>().is_some());
    }

    #[test]
    fn empty_file_renders_no_data() {
        let set = RunSet::parse(Path::new("performance_fullreplicas_1.csv"), "Nodes,Partitions,RendezvousTime_ms,ThreadSafeWithPreWarm_ms\n").unwrap();
        let report = ScenarioReport::build(Scenario::FullReplicas, &set).unwrap();
        assert!(report.is_empty());
        assert!(report.render_text().contains("    no data"));
    }
}
