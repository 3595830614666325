use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Args;
use tracing::info;

use multiviz_core::{ChartConfig, ChartRequest, ChartType};

use crate::data::load_dataset;
use crate::CliContext;

#[derive(Args, Debug)]
pub struct RenderArgs {
    /// Adapter to render with
    #[arg(long)]
    pub adapter: String,

    /// Chart type to render
    #[arg(long, value_parser = parse_chart_type)]
    pub chart_type: ChartType,

    /// CSV file with the chart data
    #[arg(long)]
    pub input: PathBuf,

    /// Write the rendered payload here instead of stdout
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Restrict rendering to these columns, in order
    #[arg(long, value_delimiter = ',')]
    pub columns: Vec<String>,

    /// Chart title
    #[arg(long)]
    pub title: Option<String>,

    /// Chart width in pixels
    #[arg(long)]
    pub width: Option<u32>,

    /// Chart height in pixels
    #[arg(long)]
    pub height: Option<u32>,

    /// Render deadline in milliseconds, overriding the configured default
    #[arg(long)]
    pub timeout_ms: Option<u64>,
}

pub fn parse_chart_type(s: &str) -> Result<ChartType, String> {
    s.parse()
}

pub fn run(args: RenderArgs, ctx: &CliContext) -> anyhow::Result<()> {
    let mut data = load_dataset(&args.input)?;
    if !args.columns.is_empty() {
        data = data.project(&args.columns).map_err(anyhow::Error::msg)?;
    }

    let config = ChartConfig {
        title: args.title.clone(),
        width: args.width,
        height: args.height,
        ..Default::default()
    };
    let request = ChartRequest::new(args.chart_type, data, config);

    let artifact = match args.timeout_ms {
        Some(ms) => ctx.registry.render_with_timeout(
            &args.adapter,
            &request,
            Some(Duration::from_millis(ms)),
        )?,
        None => ctx.registry.render(&args.adapter, &request)?,
    };

    let perf = &artifact.metadata.performance;
    info!(
        adapter = %args.adapter,
        render_time_ms = perf.render_time_ms,
        output_size = perf.output_size,
        "render completed"
    );

    match &args.output {
        Some(path) => {
            fs::write(path, &artifact.payload)
                .with_context(|| format!("failed to write {}", path.display()))?;
            if ctx.output.is_json() {
                ctx.output.print_json(&artifact.metadata)?;
            } else {
                ctx.output.print_message(&format!(
                    "Rendered {} chart with '{}' to {} ({} bytes, {:.1}ms)",
                    args.chart_type,
                    args.adapter,
                    path.display(),
                    perf.output_size,
                    perf.render_time_ms
                ));
            }
        }
        None => {
            if ctx.output.is_json() {
                ctx.output.print_json(&artifact)?;
            } else {
                print!("{}", artifact.payload);
            }
        }
    }

    Ok(())
}
