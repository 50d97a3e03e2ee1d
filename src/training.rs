// Training table from the imputation team's supercoarse file.
//
// Every non-identifier column is an item price already scaled by its basket
// weight, so SMEB for a (month, region) is the sum of all item prices times
// the float multiplier.
use std::collections::HashMap;

use log::warn;

use crate::config::EmptyGroupPolicy;
use crate::error::{PipelineError, Result};
use crate::pivot::field;
use crate::types::{TallTable, WideTable};
use crate::util::{format_int, parse_cell, Cell};

pub struct TrainingSpec<'a> {
    pub month_column: &'a str,
    pub region_column: &'a str,
    pub multiplier: f64,
    pub empty_group_policy: EmptyGroupPolicy,
}

pub fn synthesize_training(
    table: &TallTable,
    spec: &TrainingSpec<'_>,
    months: &[String],
    regions: &[String],
) -> Result<WideTable> {
    let month_idx = table.require_column(spec.month_column)?;
    let region_idx = table.require_column(spec.region_column)?;
    let item_cols: Vec<usize> = (0..table.headers.len())
        .filter(|&i| i != month_idx && i != region_idx)
        .collect();

    let mut sums: HashMap<(&str, &str), f64> = HashMap::new();
    for row in &table.rows {
        let month = field(row, month_idx);
        let region = field(row, region_idx);
        let mut row_sum = 0.0;
        for &i in &item_cols {
            match parse_cell(field(row, i)) {
                Cell::Number(v) => row_sum += v,
                Cell::Missing => {}
                Cell::Invalid => {
                    return Err(PipelineError::InvalidNumber {
                        column: table.headers[i].clone(),
                        value: field(row, i).to_string(),
                        month: month.to_string(),
                        region: region.to_string(),
                    })
                }
            }
        }
        *sums.entry((month, region)).or_insert(0.0) += row_sum;
    }

    let mut wide = WideTable::empty(months.to_vec(), regions.to_vec());
    let mut empty_groups = 0usize;
    for (r, month) in months.iter().enumerate() {
        for (c, region) in regions.iter().enumerate() {
            wide.cells[r][c] = match sums.get(&(month.as_str(), region.as_str())) {
                Some(total) => Some(total * spec.multiplier),
                None => {
                    empty_groups += 1;
                    match spec.empty_group_policy {
                        EmptyGroupPolicy::Zero => Some(0.0 * spec.multiplier),
                        EmptyGroupPolicy::Missing => None,
                    }
                }
            };
        }
    }
    if empty_groups > 0 {
        match spec.empty_group_policy {
            EmptyGroupPolicy::Zero => warn!(
                "{}: {} (month, region) pairs have no rows; written as 0.0, which looks like a real zero price",
                table.name,
                format_int(empty_groups)
            ),
            EmptyGroupPolicy::Missing => warn!(
                "{}: {} (month, region) pairs have no rows; left missing",
                table.name,
                format_int(empty_groups)
            ),
        }
    }
    Ok(wide)
}
