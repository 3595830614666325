use clap::Args;

use multiviz_core::{AggregatedStats, ChartType};

use crate::commands::render::parse_chart_type;
use crate::CliContext;

#[derive(Args, Debug)]
pub struct StatsArgs {
    /// Limit to one adapter
    #[arg(long)]
    pub adapter: Option<String>,

    /// Scope statistics to one chart type
    #[arg(long, value_parser = parse_chart_type)]
    pub chart_type: Option<ChartType>,

    /// Show the most recent outcomes instead of aggregates
    #[arg(long)]
    pub recent: Option<usize>,
}

pub fn run(args: StatsArgs, ctx: &CliContext) -> anyhow::Result<()> {
    let monitor = ctx.registry.monitor();

    if let Some(limit) = args.recent {
        let outcomes = monitor.recent_outcomes(limit);
        if ctx.output.is_json() {
            return ctx.output.print_json(&outcomes);
        }
        let rows: Vec<Vec<String>> = outcomes
            .iter()
            .map(|o| {
                vec![
                    o.timestamp.format("%H:%M:%S").to_string(),
                    o.adapter.clone(),
                    o.chart_type.to_string(),
                    if o.success { "ok" } else { "failed" }.to_string(),
                    format!("{:.1}", o.render_time_ms()),
                    o.output_bytes.to_string(),
                ]
            })
            .collect();
        ctx.output.print_table(
            &["TIME", "ADAPTER", "CHART", "STATUS", "TIME (MS)", "SIZE (B)"],
            &rows,
        );
        return Ok(());
    }

    let adapters = match &args.adapter {
        Some(name) => vec![name.clone()],
        None => monitor.known_adapters(),
    };

    if adapters.is_empty() {
        ctx.output
            .print_message("No render telemetry recorded in this session.");
        return Ok(());
    }

    let stats: Vec<(String, AggregatedStats)> = adapters
        .into_iter()
        .map(|name| {
            let s = monitor.aggregate(&name, args.chart_type);
            (name, s)
        })
        .collect();

    if ctx.output.is_json() {
        let map: serde_json::Map<String, serde_json::Value> = stats
            .iter()
            .map(|(name, s)| (name.clone(), serde_json::json!(s)))
            .collect();
        return ctx.output.print_json(&map);
    }

    let rows: Vec<Vec<String>> = stats
        .iter()
        .map(|(name, s)| {
            if s.is_empty() {
                return vec![name.clone(), "no data".to_string()];
            }
            vec![
                name.clone(),
                s.count.to_string(),
                format!("{:.0}%", s.success_rate() * 100.0),
                format!("{:.1}", s.mean_render_time_ms),
                format!("{:.1}", s.median_render_time_ms),
                format!("{:.1}", s.stddev_render_time_ms),
                format!("{:.0}", s.mean_output_bytes),
            ]
        })
        .collect();

    ctx.output.print_table(
        &[
            "ADAPTER",
            "RENDERS",
            "SUCCESS",
            "MEAN (MS)",
            "MEDIAN (MS)",
            "STDDEV",
            "MEAN SIZE (B)",
        ],
        &rows,
    );
    Ok(())
}
