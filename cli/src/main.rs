use std::process;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod data;
mod output;

use commands::{
    AdaptersArgs, ChartsArgs, CompareArgs, RecommendArgs, RenderArgs, StatsArgs, TrendArgs,
};
use multiviz_core::{register_builtin_adapters, AdapterRegistry, PerformanceMonitor, VizConfig};
use output::{OutputFormat, OutputManager};

#[derive(Parser)]
#[command(name = "vizctl")]
#[command(about = "Multiviz CLI - render charts and inspect rendering back-ends")]
#[command(version)]
#[command(long_about = "
vizctl renders charts from CSV data through the Multiviz adapter registry
and reports the performance telemetry collected along the way.

Examples:
  vizctl adapters                                     # List registered adapters
  vizctl render --adapter svg --chart-type bar --input sales.csv --output chart.svg
  vizctl compare --chart-type line --input sales.csv  # Render with every capable adapter
  vizctl recommend pie                                # Rank adapters for pie charts
")]
struct Cli {
    /// Configuration file path
    #[arg(long, global = true, env = "MULTIVIZ_CONFIG")]
    config: Option<String>,

    /// Output format
    #[arg(long, global = true, value_enum, default_value = "table")]
    format: OutputFormatArg,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum OutputFormatArg {
    Table,
    Json,
}

impl From<OutputFormatArg> for OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Table => OutputFormat::Table,
            OutputFormatArg::Json => OutputFormat::Json,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// List registered adapters and their capabilities
    Adapters(AdaptersArgs),

    /// List supported chart types, per adapter or for all of them
    Charts(ChartsArgs),

    /// Render a chart from a CSV file through one adapter
    Render(RenderArgs),

    /// Render the same chart through every capable adapter
    Compare(CompareArgs),

    /// Show aggregated render statistics
    Stats(StatsArgs),

    /// Rank adapters for a chart type
    Recommend(RecommendArgs),

    /// Classify the recent render-time trend for an adapter
    Trend(TrendArgs),
}

/// Shared state every subcommand runs against
pub struct CliContext {
    pub config: VizConfig,
    pub registry: Arc<AdapterRegistry>,
    pub output: OutputManager,
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run_command(cli) {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = VizConfig::load_with_fallback(cli.config.as_deref())?;
    init_logging(&cli, &config.logging);

    let monitor = Arc::new(PerformanceMonitor::new(config.monitor.clone()));
    let registry = Arc::new(AdapterRegistry::with_render_config(monitor, &config.render));
    register_builtin_adapters(&registry)?;
    info!(adapters = registry.adapter_count(), "registry initialized");

    let ctx = CliContext {
        config,
        registry,
        output: OutputManager::new(OutputFormat::from(cli.format)),
    };

    match cli.command {
        Commands::Adapters(args) => commands::adapters::run(args, &ctx),
        Commands::Charts(args) => commands::charts::run(args, &ctx),
        Commands::Render(args) => commands::render::run(args, &ctx),
        Commands::Compare(args) => commands::compare::run(args, &ctx),
        Commands::Stats(args) => commands::stats::run(args, &ctx),
        Commands::Recommend(args) => commands::recommend::run(args, &ctx),
        Commands::Trend(args) => commands::trend::run(args, &ctx),
    }
}

fn init_logging(cli: &Cli, logging: &multiviz_core::config::LoggingConfig) {
    // Verbosity flags override the configured level.
    let level = if cli.debug {
        "debug".to_string()
    } else if cli.verbose {
        "info".to_string()
    } else if cli.quiet {
        "error".to_string()
    } else {
        logging.level.clone()
    };

    if !logging.console {
        return;
    }

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("vizctl={level},multiviz_core={level}", level = level).into());

    let registry = tracing_subscriber::registry().with(filter);
    if logging.format == "json" {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}
