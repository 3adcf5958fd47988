use std::{
    cmp::Ordering,
    fmt, fs,
    path::{Path, PathBuf},
};

use chrono::{DateTime, Local};
use eyre::{Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Benchmark family, each written to its own timestamped CSV file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Scenario {
    FewReplicas,
    FullReplicas,
}

impl Scenario {
    pub const ALL: [Scenario; 2] = [Scenario::FewReplicas, Scenario::FullReplicas];

    pub fn title(&self) -> &'static str {
        match self {
            Scenario::FewReplicas => "Few Replicas",
            Scenario::FullReplicas => "Full Replicas",
        }
    }

    pub fn file_prefix(&self) -> &'static str {
        match self {
            Scenario::FewReplicas => "performance_fewreplicas_",
            Scenario::FullReplicas => "performance_fullreplicas_",
        }
    }

    /// Used to name generated files, ie. `comparison_few_replicas.png`
    pub fn slug(&self) -> String {
        self.title().to_lowercase().replace(' ', "_")
    }

    pub fn file_regex(&self) -> Result<Regex> {
        Ok(Regex::new(&format!(
            r"^{}.*\.csv$",
            regex::escape(self.file_prefix())
        ))?)
    }

    pub fn from_file_name(name: &str) -> Option<Scenario> {
        Scenario::ALL
            .into_iter()
            .find(|s| name.starts_with(s.file_prefix()) && name.ends_with(".csv"))
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.title())
    }
}

#[derive(Debug, Clone)]
pub struct ResultFile {
    pub path: PathBuf,
    pub scenario: Option<Scenario>,
    pub modified: DateTime<Local>,
}

impl ResultFile {
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|x| x.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Newest first, ties broken by path so the order is stable
fn newest_first(a: &ResultFile, b: &ResultFile) -> Ordering {
    b.modified
        .cmp(&a.modified)
        .then_with(|| b.path.cmp(&a.path))
}

/// Every CSV file directly inside `dir`
pub fn list_result_files(dir: &Path) -> Result<Vec<ResultFile>> {
    let entries = fs::read_dir(dir).context(format!("Read results directory {dir:?}"))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.context(format!("Read entry of {dir:?}"))?;
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("csv") {
            continue;
        }
        // follows symlinks
        let metadata = fs::metadata(&path).context(format!("Read metadata of {path:?}"))?;
        if !metadata.is_file() {
            continue;
        }
        let modified = metadata
            .modified()
            .context(format!("Read modification time of {path:?}"))?;
        let scenario = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(Scenario::from_file_name);
        files.push(ResultFile {
            path,
            scenario,
            modified: DateTime::<Local>::from(modified),
        });
    }
    files.sort_by(newest_first);
    Ok(files)
}

/// The most recently modified result file of `scenario`
pub fn latest_result_file(dir: &Path, scenario: Scenario) -> Result<Option<PathBuf>> {
    let pattern = scenario.file_regex()?;
    let latest = list_result_files(dir)?
        .into_iter()
        .filter(|f| pattern.is_match(&f.file_name()))
        .min_by(newest_first)
        .map(|f| f.path);
    debug!("Latest {scenario} file in {dir:?}: {latest:?}");
    Ok(latest)
}
