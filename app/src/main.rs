use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use common::{config::ReportConfig, discover::list_result_files, report::ScenarioReport};
use eyre::Result;
use tracing::error;
use tracing_subscriber::{
    EnvFilter,
    fmt::{layer, time::ChronoLocal},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

mod report;

/// Workspace crates that log, each gets `RUST_LOG` unless overridden with `--log`
const MODULES: &[&str] = &["common", "comparison_bars"];

#[derive(Parser)]
#[command(about = "Compare Rendezvous and Memento partition distribution benchmarks")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    #[arg(short, long)]
    log: Vec<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// List result files
    Ls {
        #[command(flatten)]
        source: SourceArgs,
    },
    /// Print the best algorithm per node and partition count
    Summary {
        #[command(flatten)]
        source: SourceArgs,
    },
    /// Generate comparison charts, then print the summaries
    Plot {
        #[command(flatten)]
        source: SourceArgs,
        /// Where charts are written, overrides the config
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },
}

#[derive(Args)]
struct SourceArgs {
    #[arg(short, long, default_value = "report.yaml")]
    config_file: PathBuf,
    /// Directory holding the benchmark CSV files, overrides the config
    #[arg(short, long)]
    results_dir: Option<PathBuf>,
}

impl SourceArgs {
    /// `--results-dir` if given, otherwise the configured one
    async fn results_dir(&self) -> Result<PathBuf> {
        match &self.results_dir {
            Some(results_dir) => Ok(results_dir.clone()),
            None => Ok(self.config().await?.settings.results_dir),
        }
    }

    async fn config(&self) -> Result<ReportConfig> {
        let mut config = report::load_config(&self.config_file).await?;
        if let Some(results_dir) = &self.results_dir {
            config.settings.results_dir = results_dir.clone();
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let log_level = std::env::var("RUST_LOG").unwrap_or("warn".to_owned());
    let args = Cli::parse();
    let file_appender = tracing_appender::rolling::never(".", "log.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    let mut env_filter = EnvFilter::new(format!("partition_report={log_level}"));

    if !args.log.is_empty() {
        for log in &args.log {
            env_filter = env_filter.add_directive(log.parse()?);
        }
    }

    for module in MODULES {
        if !args.log.iter().any(|x| x.starts_with(module)) {
            env_filter = env_filter.add_directive(format!("{module}={log_level}").parse()?);
        }
    }

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            layer()
                .with_timer(ChronoLocal::new("%v %k:%M:%S %z".to_owned()))
                .compact(),
        )
        .with(layer().with_ansi(false).with_writer(non_blocking))
        .init();

    let result = match args.command {
        Commands::Ls { source } => list(source).await,
        Commands::Summary { source } => summary(source).await,
        Commands::Plot { source, output_dir } => plot(source, output_dir).await,
    };
    if let Err(err) = &result {
        error!("{err:#?}");
    }
    result
}

async fn list(source: SourceArgs) -> Result<()> {
    for file in list_result_files(&source.results_dir().await?)? {
        println!(
            "{} -> {} ({})",
            file.file_name(),
            file.scenario
                .map(|s| s.title().to_owned())
                .unwrap_or("-".to_owned()),
            file.modified.format("%Y-%m-%d %H:%M:%S")
        );
    }
    Ok(())
}

fn print_summaries(reports: &[ScenarioReport]) {
    for report in reports {
        println!("\n{}", report.render_text());
    }
}

async fn summary(source: SourceArgs) -> Result<()> {
    let config = source.config().await?;
    let reports = report::collect_reports(&config.settings).await?;
    print_summaries(&reports);
    Ok(())
}

async fn plot(source: SourceArgs, output_dir: Option<PathBuf>) -> Result<()> {
    let mut config = source.config().await?;
    if let Some(output_dir) = output_dir {
        config.settings.output_dir = output_dir;
    }
    println!("Partition distribution comparison: {}", config.name);

    let reports = report::collect_reports(&config.settings).await?;
    for path in report::render(&config, &reports)? {
        println!("Chart saved: {}", path.display());
    }
    print_summaries(&reports);
    Ok(())
}
