use std::path::{Path, PathBuf};

use common::{
    config::{ReportConfig, Settings},
    discover::latest_result_file,
    report::ScenarioReport,
    run::RunSet,
};
use comparison_bars::ComparisonBars;
use eyre::{Context, Result, bail};
use itertools::Itertools;
use tokio::fs::read_to_string;
use tracing::{debug, info, warn};

pub fn default_config() -> ReportConfig {
    ReportConfig {
        name: "partition-distribution".to_owned(),
        settings: Settings::default(),
        plots: vec![Box::new(ComparisonBars::default())],
    }
}

/// Reads `config_file`, falling back to [`default_config`] when it does not exist
pub async fn load_config(config_file: &Path) -> Result<ReportConfig> {
    if !config_file.exists() {
        debug!("{config_file:?} not found, using defaults");
        return Ok(default_config());
    }
    let config: ReportConfig = serde_yml::from_str(&read_to_string(config_file).await?)
        .context(format!("Parse {config_file:?}"))?;
    debug!("Loaded config {}", config.name);
    Ok(config)
}

/// Summarizes the latest result file of every configured scenario
///
/// A scenario without a result file is skipped, or fails the run if
/// `settings.strict` is set.
pub async fn collect_reports(settings: &Settings) -> Result<Vec<ScenarioReport>> {
    let mut reports = Vec::new();
    for scenario in settings.scenarios.iter().copied().unique() {
        let Some(path) = latest_result_file(&settings.results_dir, scenario)? else {
            if settings.strict {
                bail!(
                    "No {scenario} results found in {:?}",
                    settings.results_dir
                );
            }
            warn!(
                "No {scenario} results found in {:?}, skipping",
                settings.results_dir
            );
            println!("No {scenario} result file found, skipping");
            continue;
        };

        info!("Analyzing {scenario}: {path:?}");
        let data = read_to_string(&path)
            .await
            .context(format!("Read {path:?}"))?;
        let set = RunSet::parse(&path, &data)?;
        reports.push(ScenarioReport::build(scenario, &set)?);
    }
    Ok(reports)
}

/// Runs the configured plots on `reports`, returns the generated files
pub fn render(config: &ReportConfig, reports: &[ScenarioReport]) -> Result<Vec<PathBuf>> {
    let plot_dir = config.settings.output_dir.clone();
    for report in reports.iter().filter(|r| r.is_empty()) {
        warn!("{} has no rows, nothing to plot", report.scenario);
    }
    common::plot::plot(&config.plots, reports, &plot_dir, &config.settings)
}
