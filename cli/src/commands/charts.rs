use clap::Args;

use crate::CliContext;

#[derive(Args, Debug)]
pub struct ChartsArgs {
    /// Limit the listing to one adapter
    #[arg(long)]
    pub adapter: Option<String>,
}

pub fn run(args: ChartsArgs, ctx: &CliContext) -> anyhow::Result<()> {
    let supported = ctx
        .registry
        .supported_chart_types(args.adapter.as_deref())?;

    if ctx.output.is_json() {
        return ctx.output.print_json(&supported);
    }

    let rows: Vec<Vec<String>> = supported
        .iter()
        .map(|(adapter, types)| {
            vec![
                adapter.clone(),
                types
                    .iter()
                    .map(|ct| ct.to_string())
                    .collect::<Vec<_>>()
                    .join(", "),
            ]
        })
        .collect();

    ctx.output.print_table(&["ADAPTER", "CHART TYPES"], &rows);
    Ok(())
}
