use std::collections::HashMap;

use log::warn;

use crate::config::Aggregation;
use crate::error::Result;
use crate::types::{TallTable, WideTable};
use crate::util::{average, format_int, median, parse_cell, Cell};

/// Which columns of a tall table feed the pivot.
#[derive(Debug, Clone, Copy)]
pub struct PivotSpec<'a> {
    pub month_column: &'a str,
    pub region_column: &'a str,
    pub value_column: &'a str,
}

/// Reduce (month, region, value) observations into a month x region table.
///
/// `months` and `regions` must already be sorted; they become the row and
/// column order. Cells with no numeric observation stay missing. Unparsable
/// values are skipped and reported once.
pub fn build_pivot(
    table: &TallTable,
    spec: PivotSpec<'_>,
    months: &[String],
    regions: &[String],
    aggregation: Aggregation,
) -> Result<WideTable> {
    let month_idx = table.require_column(spec.month_column)?;
    let region_idx = table.require_column(spec.region_column)?;
    let value_idx = table.require_column(spec.value_column)?;

    let mut groups: HashMap<(&str, &str), Vec<f64>> = HashMap::new();
    let mut invalid = 0usize;
    for row in &table.rows {
        match parse_cell(field(row, value_idx)) {
            Cell::Number(v) => groups
                .entry((field(row, month_idx), field(row, region_idx)))
                .or_default()
                .push(v),
            Cell::Missing => {}
            Cell::Invalid => invalid += 1,
        }
    }
    if invalid > 0 {
        warn!(
            "{}: skipped {} non-numeric values in '{}'",
            table.name,
            format_int(invalid),
            spec.value_column
        );
    }

    let mut wide = WideTable::empty(months.to_vec(), regions.to_vec());
    for (r, month) in months.iter().enumerate() {
        for (c, region) in regions.iter().enumerate() {
            let Some(values) = groups.get(&(month.as_str(), region.as_str())) else {
                continue;
            };
            wide.cells[r][c] = match aggregation {
                Aggregation::Median => median(values.clone()),
                Aggregation::Mean => average(values),
            };
        }
    }
    Ok(wide)
}

pub(crate) fn field(row: &[String], idx: usize) -> &str {
    row.get(idx).map(String::as_str).unwrap_or("")
}
