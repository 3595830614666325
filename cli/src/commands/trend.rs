use std::time::Duration;

use clap::Args;

use multiviz_core::Trend;

use crate::CliContext;

#[derive(Args, Debug)]
pub struct TrendArgs {
    /// Adapter to analyze
    #[arg(long)]
    pub adapter: String,

    /// Analysis window in seconds
    #[arg(long, default_value = "3600")]
    pub window_secs: u64,
}

pub fn run(args: TrendArgs, ctx: &CliContext) -> anyhow::Result<()> {
    let trend = ctx
        .registry
        .monitor()
        .analyze_trend(&args.adapter, Duration::from_secs(args.window_secs));

    if ctx.output.is_json() {
        return ctx.output.print_json(&serde_json::json!({
            "adapter": args.adapter,
            "window_secs": args.window_secs,
            "trend": trend,
        }));
    }

    let description = match trend {
        Trend::Improving => "render times are improving",
        Trend::Degrading => "render times are degrading",
        Trend::Stable => "render times are stable",
        Trend::InsufficientData => "not enough samples in the window",
    };
    ctx.output.print_message(&format!(
        "Adapter '{}' over the last {}s: {}",
        args.adapter, args.window_secs, description
    ));
    Ok(())
}
