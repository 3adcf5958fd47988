use core::fmt::Debug;
use std::{
    fs,
    path::{Path, PathBuf},
};

use dyn_clone::{DynClone, clone_trait_object};
use eyre::{Context, Result};
use itertools::iproduct;
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use serde::Serialize;
use tracing::debug;

use crate::{
    config::Settings,
    discover::Scenario,
    report::ScenarioReport,
    summary::{Dimension, GroupSummary},
};

#[typetag::serde(tag = "type")]
pub trait Plot: Debug + DynClone + Send + Sync {
    /// Name of the plot, for logging
    fn name(&self) -> &'static str;
    /// Renders one scenario, returning the path of the generated file
    ///
    /// Arguments:
    /// * `ctx` - Summaries of the scenario and where to put the output
    fn plot(&self, ctx: &PlotContext<'_>) -> Result<PathBuf>;
}
clone_trait_object!(Plot);

#[derive(Debug, Clone, Copy)]
pub struct PlotContext<'a> {
    pub report: &'a ScenarioReport,
    /// The output directory, ie. plots/
    pub plot_dir: &'a Path,
    pub settings: &'a Settings,
}

impl<'a> PlotContext<'a> {
    pub fn scenario(&self) -> Scenario {
        self.report.scenario
    }

    pub fn summaries(&self, dimension: Dimension) -> &'a [GroupSummary] {
        self.report.summaries(dimension)
    }

    /// `<plot_dir>/<stem>.<ext>` for the configured image format
    pub fn output_path(&self, stem: &str) -> PathBuf {
        self.plot_dir
            .join(format!("{stem}.{}", self.settings.format.extension()))
    }
}

pub fn ensure_plot_dirs(dirs: &[PathBuf]) -> Result<()> {
    for dir in dirs {
        fs::create_dir_all(dir).context(format!("Create plot dir {dir:?}"))?;
    }
    Ok(())
}

/// Stores the data behind a chart as `<plot_dir>/plot_data/<stem>.json`
pub fn write_plot_data<T: Serialize + ?Sized>(
    plot_dir: &Path,
    stem: &str,
    data: &T,
) -> Result<PathBuf> {
    let plot_data_dir = plot_dir.join("plot_data");
    if !plot_data_dir.exists() {
        fs::create_dir_all(&plot_data_dir)?;
    }
    let data_path = plot_data_dir.join(format!("{stem}.json"));
    fs::write(&data_path, serde_json::to_string_pretty(data)?)
        .context(format!("Write plot data {data_path:?}"))?;
    Ok(data_path)
}

/// Runs every plot against every scenario report, in parallel
pub fn plot(
    plots: &[Box<dyn Plot>],
    reports: &[ScenarioReport],
    plot_dir: &Path,
    settings: &Settings,
) -> Result<Vec<PathBuf>> {
    if plots.is_empty() {
        debug!("No plots");
        return Ok(Vec::new());
    }
    ensure_plot_dirs(&[plot_dir.to_path_buf()])?;

    let jobs = iproduct!(plots, reports)
        .filter(|(_, report)| !report.is_empty())
        .map(|(plot, report)| {
            (
                plot,
                PlotContext {
                    report,
                    plot_dir,
                    settings,
                },
            )
        })
        .collect::<Vec<_>>();
    debug!("{} plot jobs", jobs.len());

    jobs.into_par_iter()
        .map(|(plot, ctx)| {
            plot.plot(&ctx)
                .context(format!("{} for {}", plot.name(), ctx.scenario()))
        })
        .collect()
}
