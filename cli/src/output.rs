//! Terminal output formatting for vizctl

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
}

pub struct OutputManager {
    format: OutputFormat,
}

impl OutputManager {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn is_json(&self) -> bool {
        self.format == OutputFormat::Json
    }

    pub fn print_json<T: Serialize>(&self, value: &T) -> anyhow::Result<()> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }

    /// Print a padded column-aligned table with a header row
    pub fn print_table(&self, headers: &[&str], rows: &[Vec<String>]) {
        let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
        for row in rows {
            for (i, cell) in row.iter().enumerate() {
                if i < widths.len() {
                    widths[i] = widths[i].max(cell.len());
                }
            }
        }

        println!("{}", format_row(headers.iter().map(|s| s.to_string()), &widths));
        println!(
            "{}",
            widths
                .iter()
                .map(|w| "-".repeat(*w))
                .collect::<Vec<_>>()
                .join("  ")
        );
        for row in rows {
            println!("{}", format_row(row.iter().cloned(), &widths));
        }
    }

    pub fn print_message(&self, message: &str) {
        println!("{}", message);
    }
}

fn format_row(cells: impl Iterator<Item = String>, widths: &[usize]) -> String {
    cells
        .enumerate()
        .map(|(i, cell)| {
            let width = widths.get(i).copied().unwrap_or(0);
            format!("{:<width$}", cell, width = width)
        })
        .collect::<Vec<_>>()
        .join("  ")
        .trim_end()
        .to_string()
}
