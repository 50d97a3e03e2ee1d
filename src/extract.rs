// Spreadsheet sheet -> CSV conversion, and the guard that owns the resulting
// intermediate file.
use std::fs;
use std::path::{Path, PathBuf};

use calamine::{open_workbook_auto, Data, Range, Reader};
use csv::WriterBuilder;
use log::{info, warn};

use crate::error::{PipelineError, Result};
use crate::util::format_float;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractReport {
    pub rows: usize,
    pub columns: usize,
}

/// Copy one named sheet verbatim into a CSV file, without an index column.
pub fn extract_sheet(workbook_path: &Path, sheet: &str, output: &Path) -> Result<ExtractReport> {
    // calamine picks the format (xlsx, xls, xlsb, ods) from the extension.
    let mut workbook = open_workbook_auto(workbook_path).map_err(|e| PipelineError::Workbook {
        path: workbook_path.to_path_buf(),
        source: e,
    })?;

    if !workbook.sheet_names().iter().any(|name| name == sheet) {
        return Err(PipelineError::SheetNotFound {
            path: workbook_path.to_path_buf(),
            sheet: sheet.to_string(),
        });
    }

    let range = workbook
        .worksheet_range(sheet)
        .map_err(|e| PipelineError::Workbook {
            path: workbook_path.to_path_buf(),
            source: e,
        })?;

    let columns = range.width();
    let float_cols = float_columns(&range);
    let mut wtr = WriterBuilder::new()
        .flexible(true)
        .from_path(output)
        .map_err(|e| PipelineError::csv(output, e))?;

    let mut rows = 0usize;
    for row in range.rows() {
        let mut record: Vec<String> = row
            .iter()
            .zip(&float_cols)
            .map(|(cell, &float_col)| cell_text(cell, float_col))
            .collect();
        record.resize(columns, String::new());
        wtr.write_record(&record)
            .map_err(|e| PipelineError::csv(output, e))?;
        rows += 1;
    }
    wtr.flush().map_err(|e| PipelineError::io(output, e))?;

    Ok(ExtractReport { rows, columns })
}

/// Columns whose whole numbers keep a trailing `.0`: a column with a
/// fractional value, or with blanks among otherwise numeric cells, reads as a
/// float column. The header row is not counted.
fn float_columns(range: &Range<Data>) -> Vec<bool> {
    let width = range.width();
    let (mut fraction, mut blank, mut number, mut other) =
        (vec![false; width], vec![false; width], vec![false; width], vec![false; width]);
    for row in range.rows().skip(1) {
        for (c, cell) in row.iter().enumerate() {
            match cell {
                Data::Float(f) if f.fract() != 0.0 => fraction[c] = true,
                Data::Float(_) | Data::Int(_) => number[c] = true,
                Data::Empty => blank[c] = true,
                _ => other[c] = true,
            }
        }
    }
    (0..width)
        .map(|c| fraction[c] || (blank[c] && number[c] && !other[c]))
        .collect()
}

fn cell_text(cell: &Data, float_col: bool) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(i) if float_col => format_float(*i as f64),
        Data::Int(i) => i.to_string(),
        Data::Float(f) if !float_col && f.fract() == 0.0 && f.abs() < 1e15 => {
            (*f as i64).to_string()
        }
        Data::Float(f) => format_float(*f),
        Data::Bool(true) => "True".to_string(),
        Data::Bool(false) => "False".to_string(),
        Data::DateTime(d) => match d.as_datetime() {
            Some(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
            None => cell.to_string(),
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Owns an intermediate file and removes it when dropped.
///
/// Stages that read the file borrow its path from the guard, so it outlives
/// every reader, and removal also happens when a later stage bails out early.
#[derive(Debug)]
pub struct IntermediateFile {
    path: PathBuf,
}

impl IntermediateFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for IntermediateFile {
    fn drop(&mut self) {
        match fs::remove_file(&self.path) {
            Ok(()) => info!("Removed temporary file {}", self.path.display()),
            // Extraction failed before the file was written.
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("Could not remove {}: {}", self.path.display(), e),
        }
    }
}
