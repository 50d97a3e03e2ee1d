use log::info;

use crate::types::{FillSummary, WideTable};

/// Linearly fill interior gaps of one column, using row position as x.
///
/// Leading and trailing missing runs have only one neighbour and stay
/// missing. Present values are never touched.
pub fn fill_column(values: &[Option<f64>]) -> Vec<Option<f64>> {
    let mut out = values.to_vec();
    let mut prev: Option<(usize, f64)> = None;
    for (i, value) in values.iter().enumerate() {
        let Some(v) = *value else { continue };
        if let Some((j, pv)) = prev {
            let span = (i - j) as f64;
            for k in (j + 1)..i {
                out[k] = Some(pv + (v - pv) * (k - j) as f64 / span);
            }
        }
        prev = Some((i, v));
    }
    out
}

/// Gap-fill every region column of `table` into a new table.
pub fn interpolate(table: &WideTable, debug_output: bool) -> (WideTable, Vec<FillSummary>) {
    let mut filled = table.clone();
    let mut summaries = Vec::with_capacity(table.regions.len());
    for (col, region) in table.regions.iter().enumerate() {
        let before = table.column_values(col);
        let after = fill_column(&before);
        let count = before
            .iter()
            .zip(&after)
            .filter(|(b, a)| b.is_none() && a.is_some())
            .count();
        filled.set_column(col, &after);

        let summary = FillSummary {
            region: region.clone(),
            filled: count,
            non_missing: filled.non_missing(col),
        };
        if debug_output {
            info!(
                "{}: Interpolated {} values out of {}",
                summary.region, summary.filled, summary.non_missing
            );
        }
        summaries.push(summary);
    }
    (filled, summaries)
}
