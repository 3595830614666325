//! CSV to dataset loading
//!
//! Columns are typed by inference: a column whose every non-empty cell
//! parses as a number becomes numeric, everything else stays text. Empty
//! cells become nulls either way.

use std::path::Path;

use anyhow::Context;
use multiviz_core::{Column, Dataset, Value};

pub fn load_dataset(path: &Path) -> anyhow::Result<Dataset> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("failed to open CSV file {}", path.display()))?;

    let headers: Vec<String> = reader
        .headers()
        .context("failed to read CSV headers")?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut cells: Vec<Vec<String>> = vec![Vec::new(); headers.len()];
    for (row_index, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("failed to read CSV row {}", row_index + 1))?;
        if record.len() != headers.len() {
            anyhow::bail!(
                "CSV row {} has {} fields, expected {}",
                row_index + 1,
                record.len(),
                headers.len()
            );
        }
        for (column, field) in cells.iter_mut().zip(record.iter()) {
            column.push(field.trim().to_string());
        }
    }

    let columns = headers
        .into_iter()
        .zip(cells)
        .map(|(name, raw)| Column::new(name, infer_values(&raw)))
        .collect();

    Ok(Dataset::new(columns))
}

fn infer_values(raw: &[String]) -> Vec<Value> {
    let numeric = raw
        .iter()
        .filter(|s| !s.is_empty())
        .all(|s| s.parse::<f64>().is_ok())
        && raw.iter().any(|s| !s.is_empty());

    raw.iter()
        .map(|s| {
            if s.is_empty() {
                Value::Null
            } else if numeric {
                // Parse cannot fail here, every non-empty cell was checked.
                s.parse::<f64>().map(Value::Number).unwrap_or(Value::Null)
            } else {
                Value::Text(s.clone())
            }
        })
        .collect()
}
