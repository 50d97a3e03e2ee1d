use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors that stop a pipeline stage.
///
/// Per-dataset problems found while collecting unique values are not errors;
/// see `unique::SkipReason`.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("I/O error on '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("CSV error on '{}': {source}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("failed to read workbook '{}': {source}", .path.display())]
    Workbook {
        path: PathBuf,
        #[source]
        source: calamine::Error,
    },

    #[error("sheet '{sheet}' not found in '{}'", .path.display())]
    SheetNotFound { path: PathBuf, sheet: String },

    #[error("column '{column}' not found in {table}")]
    MissingColumn { table: String, column: String },

    #[error("region '{0}' is not a column of the interpolated table")]
    MissingRegion(String),

    #[error("month '{0}' is not in the table index")]
    MissingMonth(String),

    #[error("non-numeric value '{value}' in column '{column}' (month {month}, region {region})")]
    InvalidNumber {
        column: String,
        value: String,
        month: String,
        region: String,
    },

    #[error("failed to serialize run summary: {0}")]
    Json(#[from] serde_json::Error),
}

impl PipelineError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn csv(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        Self::Csv {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
