use std::path::PathBuf;

use common::{
    config::ImageFormat,
    discover::Scenario,
    plot::{Plot, PlotContext, write_plot_data},
    summary::{Algorithm, Dimension, GroupSummary},
};
use eyre::Result;
use plotters::{
    coord::Shift,
    prelude::*,
    style::text_anchor::{HPos, Pos, VPos},
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

const TITLE_FONT_SIZE: u32 = 32;
const PANEL_TITLE_FONT_SIZE: u32 = 24;
const AXIS_LABEL_FONT_SIZE: u32 = 18;
const TICK_LABEL_FONT_SIZE: u32 = 14;
const VALUE_LABEL_FONT_SIZE: u32 = 12;

/// Width of a single bar, two bars share one unit of the x axis
const BAR_WIDTH: f64 = 0.35;
/// Headroom above the tallest bar for its value label
const Y_HEADROOM: f64 = 1.15;

const SKY_BLUE: RGBColor = RGBColor(135, 206, 235);
const LIGHT_GREEN: RGBColor = RGBColor(144, 238, 144);

fn algorithm_color(algorithm: Algorithm) -> RGBColor {
    match algorithm {
        Algorithm::Rendezvous => SKY_BLUE,
        Algorithm::Memento => LIGHT_GREEN,
    }
}

/// Side by side bars of mean latency, one panel per grouping dimension
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ComparisonBars {
    /// Figure title prefix, the scenario title is appended
    title: String,
    /// Print the rounded mean on top of every bar
    value_labels: bool,
}

impl Default for ComparisonBars {
    fn default() -> Self {
        Self {
            title: "Performance Comparison".to_owned(),
            value_labels: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub algorithm: Algorithm,
    pub left: f64,
    pub right: f64,
    pub value: f64,
}

impl Bar {
    pub fn center(&self) -> f64 {
        (self.left + self.right) / 2.0
    }
}

/// Group `i` is centered on `x = i`, its bars placed left to right in [`Algorithm::ALL`] order
pub fn layout_bars(summaries: &[GroupSummary]) -> Vec<Bar> {
    let shift = (Algorithm::ALL.len() as f64 - 1.0) / 2.0;
    summaries
        .iter()
        .enumerate()
        .flat_map(|(idx, summary)| {
            Algorithm::ALL
                .into_iter()
                .enumerate()
                .map(move |(slot, algorithm)| {
                    let center = idx as f64 + (slot as f64 - shift) * BAR_WIDTH;
                    Bar {
                        algorithm,
                        left: center - BAR_WIDTH / 2.0,
                        right: center + BAR_WIDTH / 2.0,
                        value: summary.mean_ms(algorithm),
                    }
                })
        })
        .collect()
}

pub fn y_upper_bound(summaries: &[GroupSummary]) -> f64 {
    let max = summaries
        .iter()
        .flat_map(|s| [s.mean_rendezvous_ms, s.mean_memento_ms])
        .fold(0.0_f64, f64::max);
    if max > 0.0 { max * Y_HEADROOM } else { 1.0 }
}

/// Tick label for `x`, only integer positions map to a group key
pub fn key_label(keys: &[u32], x: f64) -> String {
    let idx = x.round();
    if idx < 0.0 || (x - idx).abs() >= 0.3 {
        return String::new();
    }
    keys.get(idx as usize)
        .map(|k| k.to_string())
        .unwrap_or_default()
}

#[derive(Serialize)]
struct PlotData<'a> {
    scenario: Scenario,
    by_nodes: &'a [GroupSummary],
    by_partitions: &'a [GroupSummary],
}

#[typetag::serde]
impl Plot for ComparisonBars {
    fn name(&self) -> &'static str {
        "ComparisonBars"
    }

    fn plot(&self, ctx: &PlotContext<'_>) -> Result<PathBuf> {
        let stem = format!("comparison_{}", ctx.scenario().slug());
        let filepath = ctx.output_path(&stem);
        let size = (ctx.settings.width, ctx.settings.height);
        debug!("Drawing {filepath:?} at {size:?}");

        match ctx.settings.format {
            ImageFormat::Png => {
                self.draw(BitMapBackend::new(&filepath, size).into_drawing_area(), ctx)?
            }
            ImageFormat::Svg => {
                self.draw(SVGBackend::new(&filepath, size).into_drawing_area(), ctx)?
            }
        }

        write_plot_data(
            ctx.plot_dir,
            &stem,
            &PlotData {
                scenario: ctx.scenario(),
                by_nodes: ctx.summaries(Dimension::Nodes),
                by_partitions: ctx.summaries(Dimension::Partitions),
            },
        )?;
        info!("Generated {filepath:?}");
        Ok(filepath)
    }
}

impl ComparisonBars {
    fn draw<DB>(&self, root: DrawingArea<DB, Shift>, ctx: &PlotContext<'_>) -> Result<()>
    where
        DB: DrawingBackend,
        DB::ErrorType: 'static,
    {
        root.fill(&WHITE)?;
        let figure = root.titled(
            &format!("{}: {}", self.title, ctx.scenario().title()),
            ("sans-serif", TITLE_FONT_SIZE).into_font().style(FontStyle::Bold),
        )?;

        let panels = figure.split_evenly((1, 2));
        for (panel, dimension) in panels.iter().zip(Dimension::ALL) {
            self.draw_panel(panel, dimension, ctx.summaries(dimension))?;
        }

        root.present()?;
        Ok(())
    }

    fn draw_panel<DB>(
        &self,
        area: &DrawingArea<DB, Shift>,
        dimension: Dimension,
        summaries: &[GroupSummary],
    ) -> Result<()>
    where
        DB: DrawingBackend,
        DB::ErrorType: 'static,
    {
        let keys = summaries.iter().map(|s| s.group_key).collect::<Vec<_>>();
        let groups = keys.len().max(1);
        let y_max = y_upper_bound(summaries);

        let mut chart = ChartBuilder::on(area)
            .caption(
                format!("Performance vs {}", dimension.label()),
                ("sans-serif", PANEL_TITLE_FONT_SIZE).into_font().style(FontStyle::Bold),
            )
            .margin(20)
            .x_label_area_size(50)
            .y_label_area_size(70)
            .build_cartesian_2d(-0.5..(groups as f64 - 0.5), 0f64..y_max)?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .bold_line_style(BLACK.mix(0.3))
            .light_line_style(WHITE)
            .x_labels(groups)
            .x_label_formatter(&|x| key_label(&keys, *x))
            .y_label_formatter(&|y| format!("{y:.0}"))
            .x_desc(dimension.label())
            .y_desc("Mean Time (ms)")
            .label_style(("sans-serif", TICK_LABEL_FONT_SIZE))
            .axis_desc_style(("sans-serif", AXIS_LABEL_FONT_SIZE))
            .draw()?;

        let bars = layout_bars(summaries);
        for algorithm in Algorithm::ALL {
            let color = algorithm_color(algorithm);
            chart
                .draw_series(
                    bars.iter()
                        .filter(|bar| bar.algorithm == algorithm)
                        .map(|bar| {
                            Rectangle::new(
                                [(bar.left, 0.0), (bar.right, bar.value)],
                                color.mix(0.8).filled(),
                            )
                        }),
                )?
                .label(algorithm.name())
                .legend(move |(x, y)| {
                    Rectangle::new([(x, y - 5), (x + 20, y + 5)], color.mix(0.8).filled())
                });
        }

        // outlines go on top of both fills
        chart.draw_series(bars.iter().map(|bar| {
            Rectangle::new([(bar.left, 0.0), (bar.right, bar.value)], BLACK.stroke_width(1))
        }))?;

        if self.value_labels {
            let label_style = TextStyle::from(("sans-serif", VALUE_LABEL_FONT_SIZE).into_font())
                .pos(Pos::new(HPos::Center, VPos::Bottom));
            chart.draw_series(bars.iter().map(|bar| {
                Text::new(
                    format!("{:.0}", bar.value),
                    (bar.center(), bar.value + bar.value * 0.01),
                    label_style.clone(),
                )
            }))?;
        }

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperLeft)
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .label_font(("sans-serif", TICK_LABEL_FONT_SIZE))
            .draw()?;

        Ok(())
    }
}
