// Discovery of the month and region index sets.
//
// A dataset contributes its values only if every value in the column passes
// the substring check; otherwise the whole dataset is skipped. Nothing here
// returns an error: skips are reported as typed outcomes and logged.
use std::collections::BTreeSet;
use std::fmt;

use log::warn;
use serde::Serialize;

use crate::types::TallTable;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SkipReason {
    MissingColumn { column: String },
    InvalidValue { value: String, checker: String },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::MissingColumn { column } => {
                write!(f, "could not query column '{}'", column)
            }
            SkipReason::InvalidValue { value, checker } => {
                write!(f, "value '{}' does not contain '{}'", value, checker)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatasetOutcome {
    Accepted(BTreeSet<String>),
    Skipped(SkipReason),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedDataset {
    pub index: usize,
    pub column: String,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, Default)]
pub struct UniqueValues {
    /// Sorted ascending; the month axis relies on this order.
    pub values: BTreeSet<String>,
    pub skipped: Vec<SkippedDataset>,
}

impl UniqueValues {
    pub fn sorted(&self) -> Vec<String> {
        self.values.iter().cloned().collect()
    }
}

pub fn scan_dataset(table: &TallTable, column: &str, checker: &str) -> DatasetOutcome {
    let Some(cells) = table.column(column) else {
        return DatasetOutcome::Skipped(SkipReason::MissingColumn {
            column: column.to_string(),
        });
    };
    let distinct: BTreeSet<String> = cells.into_iter().map(str::to_string).collect();
    if let Some(bad) = distinct.iter().find(|v| !v.contains(checker)) {
        return DatasetOutcome::Skipped(SkipReason::InvalidValue {
            value: bad.clone(),
            checker: checker.to_string(),
        });
    }
    DatasetOutcome::Accepted(distinct)
}

/// Union of the distinct values of `column` over every dataset that passes.
pub fn unique_values(datasets: &[&TallTable], column: &str, checker: &str) -> UniqueValues {
    let mut out = UniqueValues::default();
    for (index, table) in datasets.iter().enumerate() {
        match scan_dataset(table, column, checker) {
            DatasetOutcome::Accepted(values) => out.values.extend(values),
            DatasetOutcome::Skipped(reason) => {
                warn!("Skipping dataset {} ({}): {}", index, table.name, reason);
                out.skipped.push(SkippedDataset {
                    index,
                    column: column.to_string(),
                    reason,
                });
            }
        }
    }
    out
}
