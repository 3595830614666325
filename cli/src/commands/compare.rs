use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use clap::Args;

use multiviz_core::{ChartConfig, ChartRequest, ChartType};

use crate::commands::render::parse_chart_type;
use crate::data::load_dataset;
use crate::CliContext;

#[derive(Args, Debug)]
pub struct CompareArgs {
    /// Chart type to render
    #[arg(long, value_parser = parse_chart_type)]
    pub chart_type: ChartType,

    /// CSV file with the chart data
    #[arg(long)]
    pub input: PathBuf,

    /// Only compare these adapters; defaults to every capable adapter
    #[arg(long, value_delimiter = ',')]
    pub adapters: Vec<String>,

    /// Write each rendered payload into this directory
    #[arg(long)]
    pub output_dir: Option<PathBuf>,
}

pub fn run(args: CompareArgs, ctx: &CliContext) -> anyhow::Result<()> {
    let data = load_dataset(&args.input)?;
    let request = ChartRequest::new(args.chart_type, data, ChartConfig::default());

    let names = (!args.adapters.is_empty()).then_some(args.adapters.as_slice());
    let results = ctx.registry.render_across_adapters(&request, names);

    if results.is_empty() {
        anyhow::bail!("no adapter supports chart type '{}'", args.chart_type);
    }

    if let Some(dir) = &args.output_dir {
        fs::create_dir_all(dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;
    }

    let mut rows = Vec::new();
    for (adapter, result) in &results {
        match result {
            Ok(artifact) => {
                let perf = &artifact.metadata.performance;
                let mut location = "-".to_string();
                if let Some(dir) = &args.output_dir {
                    let path = dir.join(format!("{}.{}", adapter, artifact.format));
                    fs::write(&path, &artifact.payload)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    location = path.display().to_string();
                }
                rows.push(vec![
                    adapter.clone(),
                    "ok".to_string(),
                    format!("{:.1}", perf.render_time_ms),
                    perf.output_size.to_string(),
                    location,
                ]);
            }
            Err(e) => {
                rows.push(vec![
                    adapter.clone(),
                    format!("failed: {}", e),
                    "-".to_string(),
                    "-".to_string(),
                    "-".to_string(),
                ]);
            }
        }
    }

    if ctx.output.is_json() {
        let report: serde_json::Map<String, serde_json::Value> = results
            .iter()
            .map(|(adapter, result)| {
                let value = match result {
                    Ok(artifact) => serde_json::json!({
                        "status": "ok",
                        "metadata": artifact.metadata,
                    }),
                    Err(e) => serde_json::json!({
                        "status": "failed",
                        "error": e.to_string(),
                        "category": e.category(),
                    }),
                };
                (adapter.clone(), value)
            })
            .collect();
        return ctx.output.print_json(&report);
    }

    ctx.output.print_table(
        &["ADAPTER", "STATUS", "TIME (MS)", "SIZE (B)", "OUTPUT"],
        &rows,
    );
    Ok(())
}
