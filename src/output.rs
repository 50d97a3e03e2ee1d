use std::fs;
use std::path::Path;

use serde::Serialize;
use tabled::{builder::Builder, settings::Style};

use crate::error::{PipelineError, Result};
use crate::types::WideTable;
use crate::util::format_float;

/// Write a wide table with the month index as the first column.
///
/// Missing cells are written as empty fields.
pub fn write_wide_csv(path: &Path, table: &WideTable, index_label: &str) -> Result<()> {
    ensure_parent(path)?;
    let mut wtr = csv::Writer::from_path(path).map_err(|e| PipelineError::csv(path, e))?;

    let mut header = Vec::with_capacity(table.regions.len() + 1);
    header.push(index_label.to_string());
    header.extend(table.regions.iter().cloned());
    wtr.write_record(&header)
        .map_err(|e| PipelineError::csv(path, e))?;

    for (month, row) in table.months.iter().zip(&table.cells) {
        let mut record = Vec::with_capacity(row.len() + 1);
        record.push(month.clone());
        record.extend(row.iter().map(|v| v.map(format_float).unwrap_or_default()));
        wtr.write_record(&record)
            .map_err(|e| PipelineError::csv(path, e))?;
    }
    wtr.flush().map_err(|e| PipelineError::io(path, e))?;
    Ok(())
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    ensure_parent(path)?;
    let s = serde_json::to_string_pretty(value)?;
    fs::write(path, s).map_err(|e| PipelineError::io(path, e))?;
    Ok(())
}

pub fn ensure_parent(path: &Path) -> Result<()> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => {
            fs::create_dir_all(dir).map_err(|e| PipelineError::io(dir, e))
        }
        _ => Ok(()),
    }
}

/// Print the first `max_rows` rows (and at most `max_cols` regions) as a
/// markdown table.
pub fn preview_wide(table: &WideTable, max_rows: usize, max_cols: usize) {
    if table.months.is_empty() {
        println!("(no rows)\n");
        return;
    }
    let cols = table.regions.len().min(max_cols);
    let mut builder = Builder::default();
    let mut header = vec!["month".to_string()];
    header.extend(table.regions.iter().take(cols).cloned());
    builder.push_record(header);
    for (month, row) in table.months.iter().zip(&table.cells).take(max_rows) {
        let mut record = vec![month.clone()];
        record.extend(
            row.iter()
                .take(cols)
                .map(|v| v.map(|x| format!("{:.2}", x)).unwrap_or_else(|| "NaN".to_string())),
        );
        builder.push_record(record);
    }
    let table_str = builder.build().with(Style::markdown()).to_string();
    println!("{}", table_str);
    if table.regions.len() > cols {
        println!("({} more regions not shown)", table.regions.len() - cols);
    }
    println!();
}
