use std::{
    io::Read,
    path::{Path, PathBuf},
};

use chrono::NaiveDateTime;
use csv::{ReaderBuilder, Trim};
use eyre::{Context, Result};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// One measured configuration, reduced to what the aggregation needs
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkRun {
    pub node_count: u32,
    pub partition_count: u32,
    pub rendezvous_latency_ms: f64,
    /// Thread-safe Memento, timed after pre-warming
    pub memento_latency_ms: f64,
}

impl BenchmarkRun {
    pub fn new(
        node_count: u32,
        partition_count: u32,
        rendezvous_latency_ms: f64,
        memento_latency_ms: f64,
    ) -> Self {
        Self {
            node_count,
            partition_count,
            rendezvous_latency_ms,
            memento_latency_ms,
        }
    }
}

/// A full row of the performance test CSV
///
/// Only `Nodes`, `Partitions`, `RendezvousTime_ms` and `ThreadSafeWithPreWarm_ms`
/// are required, the remaining columns are kept when present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceRecord {
    #[serde(rename = "TestType", default)]
    pub test_type: Option<String>,
    #[serde(rename = "Nodes")]
    pub nodes: u32,
    #[serde(rename = "Partitions")]
    pub partitions: u32,
    #[serde(rename = "Replicas", default)]
    pub replicas: Option<u32>,
    #[serde(rename = "MementoTime_ms", default)]
    pub memento_ms: Option<f64>,
    #[serde(rename = "RendezvousTime_ms")]
    pub rendezvous_ms: f64,
    #[serde(rename = "ThreadSafeNoPreWarm_ms", default)]
    pub thread_safe_no_pre_warm_ms: Option<f64>,
    #[serde(rename = "ThreadSafeWithPreWarm_ms")]
    pub thread_safe_with_pre_warm_ms: f64,
    #[serde(rename = "BestTime_ms", default)]
    pub best_time_ms: Option<f64>,
    #[serde(rename = "Timestamp", default, with = "timestamp")]
    pub timestamp: Option<NaiveDateTime>,
}

impl PerformanceRecord {
    pub fn run(&self) -> BenchmarkRun {
        BenchmarkRun::new(
            self.nodes,
            self.partitions,
            self.rendezvous_ms,
            self.thread_safe_with_pre_warm_ms,
        )
    }
}

mod timestamp {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    use crate::TIMESTAMP_FORMAT;

    pub fn serialize<S: Serializer>(
        value: &Option<NaiveDateTime>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(ts) => serializer.serialize_str(&ts.format(TIMESTAMP_FORMAT).to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<NaiveDateTime>, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            Some(s) if !s.trim().is_empty() => {
                NaiveDateTime::parse_from_str(s.trim(), TIMESTAMP_FORMAT)
                    .map(Some)
                    .map_err(D::Error::custom)
            }
            _ => Ok(None),
        }
    }
}

/// Parses performance test CSV data
pub fn read_records<R: Read>(reader: R) -> Result<Vec<PerformanceRecord>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .from_reader(reader);

    let mut records = Vec::new();
    for (idx, row) in reader.deserialize().enumerate() {
        // header is line 1
        let record: PerformanceRecord = row.context(format!("Parse CSV line {}", idx + 2))?;
        records.push(record);
    }
    Ok(records)
}

/// The rows of one result file
#[derive(Debug, Clone)]
pub struct RunSet {
    pub path: PathBuf,
    pub records: Vec<PerformanceRecord>,
}

impl RunSet {
    pub fn parse(path: &Path, data: &str) -> Result<Self> {
        let records =
            read_records(data.as_bytes()).context(format!("Read results from {path:?}"))?;
        debug!("Parsed {} rows from {path:?}", records.len());
        Ok(Self {
            path: path.to_path_buf(),
            records,
        })
    }

    pub fn runs(&self) -> Vec<BenchmarkRun> {
        self.records.iter().map(PerformanceRecord::run).collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct `TestType` values, in order of first appearance
    pub fn test_types(&self) -> Vec<&str> {
        self.records
            .iter()
            .filter_map(|r| r.test_type.as_deref())
            .unique()
            .collect()
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|x| x.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}
