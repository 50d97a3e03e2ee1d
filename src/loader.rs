use std::path::Path;

use csv::ReaderBuilder;
use log::info;

use crate::error::{PipelineError, Result};
use crate::types::TallTable;
use crate::util::format_int;

/// Read a comma-separated file with a header row into a `TallTable`.
///
/// Rows may be ragged; short rows read as empty trailing cells. Cell text is
/// kept exactly as written.
pub fn load_csv(path: &Path) -> Result<TallTable> {
    let mut rdr = ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(|e| PipelineError::csv(path, e))?;

    let headers: Vec<String> = rdr
        .headers()
        .map_err(|e| PipelineError::csv(path, e))?
        .iter()
        .map(str::to_string)
        .collect();

    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result.map_err(|e| PipelineError::csv(path, e))?;
        rows.push(record.iter().map(str::to_string).collect());
    }

    info!(
        "Loaded {} ({} rows, {} columns)",
        path.display(),
        format_int(rows.len()),
        headers.len()
    );
    Ok(TallTable::new(path.display().to_string(), headers, rows))
}
