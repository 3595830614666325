use clap::Args;

use crate::CliContext;

#[derive(Args, Debug)]
pub struct AdaptersArgs {
    /// Show feature strings alongside capabilities
    #[arg(long)]
    pub detailed: bool,
}

pub fn run(args: AdaptersArgs, ctx: &CliContext) -> anyhow::Result<()> {
    let descriptors = ctx.registry.list_adapters();

    if ctx.output.is_json() {
        return ctx.output.print_json(&descriptors);
    }

    let mut headers = vec!["ADAPTER", "CHART TYPES", "FORMATS"];
    if args.detailed {
        headers.push("FEATURES");
    }

    let rows: Vec<Vec<String>> = descriptors
        .iter()
        .map(|d| {
            let mut row = vec![
                d.name.clone(),
                d.chart_types
                    .iter()
                    .map(|ct| ct.to_string())
                    .collect::<Vec<_>>()
                    .join(", "),
                d.export_formats
                    .iter()
                    .map(|f| f.to_string())
                    .collect::<Vec<_>>()
                    .join(", "),
            ];
            if args.detailed {
                row.push(d.features.join("; "));
            }
            row
        })
        .collect();

    ctx.output.print_table(&headers, &rows);
    Ok(())
}
