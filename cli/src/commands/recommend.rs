use std::sync::Arc;

use clap::Args;

use multiviz_core::{ChartType, RecommendationEngine, ScoreWeights};

use crate::commands::render::parse_chart_type;
use crate::CliContext;

#[derive(Args, Debug)]
pub struct RecommendArgs {
    /// Chart type to rank adapters for
    #[arg(value_parser = parse_chart_type)]
    pub chart_type: ChartType,

    /// Weight for mean render time
    #[arg(long)]
    pub weight_time: Option<f64>,

    /// Weight for mean memory delta
    #[arg(long)]
    pub weight_memory: Option<f64>,

    /// Weight for mean output size
    #[arg(long)]
    pub weight_output: Option<f64>,
}

pub fn run(args: RecommendArgs, ctx: &CliContext) -> anyhow::Result<()> {
    let engine = RecommendationEngine::new(
        Arc::clone(&ctx.registry),
        ctx.config.scoring.clone(),
    );

    let mut weights = ctx.config.scoring.weights;
    if let Some(w) = args.weight_time {
        weights.render_time = w;
    }
    if let Some(w) = args.weight_memory {
        weights.memory = w;
    }
    if let Some(w) = args.weight_output {
        weights.output_size = w;
    }
    validate_weights(&weights)?;

    let recommendations = engine.recommend_with_weights(args.chart_type, &weights);
    if recommendations.is_empty() {
        anyhow::bail!("no adapter supports chart type '{}'", args.chart_type);
    }

    if ctx.output.is_json() {
        return ctx.output.print_json(&recommendations);
    }

    let rows: Vec<Vec<String>> = recommendations
        .iter()
        .enumerate()
        .map(|(i, rec)| {
            vec![
                (i + 1).to_string(),
                rec.adapter.clone(),
                format!("{:.1}", rec.score),
                rec.reasons.join("; "),
            ]
        })
        .collect();

    ctx.output
        .print_table(&["RANK", "ADAPTER", "SCORE", "REASONS"], &rows);
    Ok(())
}

fn validate_weights(weights: &ScoreWeights) -> anyhow::Result<()> {
    if weights.render_time < 0.0 || weights.memory < 0.0 || weights.output_size < 0.0 {
        anyhow::bail!("scoring weights must be non-negative");
    }
    if weights.total() <= 0.0 {
        anyhow::bail!("at least one scoring weight must be positive");
    }
    Ok(())
}
