use serde::Serialize;

use crate::error::{PipelineError, Result};

/// A CSV file held as text: header names plus one `Vec<String>` per row.
///
/// Cells stay untyped; each stage parses the columns it needs.
#[derive(Debug, Clone)]
pub struct TallTable {
    /// Human-readable origin used in error messages (usually the file path).
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl TallTable {
    pub fn new(name: impl Into<String>, headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self {
            name: name.into(),
            headers,
            rows,
        }
    }

    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == column)
    }

    pub fn require_column(&self, column: &str) -> Result<usize> {
        self.column_index(column)
            .ok_or_else(|| PipelineError::MissingColumn {
                table: self.name.clone(),
                column: column.to_string(),
            })
    }

    /// Cells of one column, `None` when the column does not exist.
    ///
    /// Short rows yield empty strings for the missing trailing cells.
    pub fn column(&self, column: &str) -> Option<Vec<&str>> {
        let idx = self.column_index(column)?;
        Some(
            self.rows
                .iter()
                .map(|row| row.get(idx).map(String::as_str).unwrap_or(""))
                .collect(),
        )
    }
}

/// Month-indexed, region-columned table. `None` is the missing marker.
///
/// `months` are kept in ascending string order; for `YYYY-MM` tokens that is
/// chronological order.
#[derive(Debug, Clone, PartialEq)]
pub struct WideTable {
    pub months: Vec<String>,
    pub regions: Vec<String>,
    /// Row-major: `cells[month][region]`.
    pub cells: Vec<Vec<Option<f64>>>,
}

impl WideTable {
    /// Every cell starts out missing.
    pub fn empty(months: Vec<String>, regions: Vec<String>) -> Self {
        let cells = vec![vec![None; regions.len()]; months.len()];
        Self {
            months,
            regions,
            cells,
        }
    }

    #[cfg(test)]
    pub fn get(&self, month: &str, region: &str) -> Option<f64> {
        let r = self.months.iter().position(|m| m == month)?;
        let c = self.regions.iter().position(|g| g == region)?;
        self.cells[r][c]
    }

    pub fn column_values(&self, col: usize) -> Vec<Option<f64>> {
        self.cells.iter().map(|row| row[col]).collect()
    }

    pub fn set_column(&mut self, col: usize, values: &[Option<f64>]) {
        for (row, value) in self.cells.iter_mut().zip(values) {
            row[col] = *value;
        }
    }

    pub fn non_missing(&self, col: usize) -> usize {
        self.cells.iter().filter(|row| row[col].is_some()).count()
    }

    /// Remove the given month rows. Every listed month must be present, so
    /// applying the same list to two aligned tables keeps them aligned.
    pub fn drop_months(&mut self, months: &[String]) -> Result<()> {
        if let Some(absent) = months.iter().find(|m| !self.months.contains(m)) {
            return Err(PipelineError::MissingMonth(absent.clone()));
        }
        let keep: Vec<bool> = self.months.iter().map(|m| !months.contains(m)).collect();
        let mut flags = keep.iter();
        self.months.retain(|_| *flags.next().unwrap_or(&true));
        let mut flags = keep.iter();
        self.cells.retain(|_| *flags.next().unwrap_or(&true));
        Ok(())
    }

    /// New table holding exactly `regions`, in that order. Fails on the first
    /// region that is not a column of `self`.
    pub fn select_regions(&self, regions: &[String]) -> Result<WideTable> {
        let indices = regions
            .iter()
            .map(|region| {
                self.regions
                    .iter()
                    .position(|r| r == region)
                    .ok_or_else(|| PipelineError::MissingRegion(region.clone()))
            })
            .collect::<Result<Vec<usize>>>()?;
        let cells = self
            .cells
            .iter()
            .map(|row| indices.iter().map(|&i| row[i]).collect())
            .collect();
        Ok(WideTable {
            months: self.months.clone(),
            regions: regions.to_vec(),
            cells,
        })
    }
}

/// Per-region result of gap filling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FillSummary {
    pub region: String,
    /// Cells that were missing before and hold a value after.
    pub filled: usize,
    /// Cells holding a value after filling.
    pub non_missing: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn sample() -> WideTable {
        let mut t = WideTable::empty(
            strings(&["2016-11", "2016-12", "2017-01", "2017-02"]),
            strings(&["SY01", "SY02"]),
        );
        for (i, row) in t.cells.iter_mut().enumerate() {
            row[0] = Some(i as f64);
        }
        t
    }

    #[test]
    fn empty_table_is_all_missing() {
        let t = WideTable::empty(strings(&["2018-01"]), strings(&["SY01", "SY02"]));
        assert_eq!(t.cells, vec![vec![None, None]]);
    }

    #[test]
    fn drop_months_keeps_tables_aligned() {
        let mut raw = sample();
        let mut filled = raw.clone();
        filled.cells[1][1] = Some(4.0);
        let drop = strings(&["2016-11", "2017-01"]);
        raw.drop_months(&drop).unwrap();
        filled.drop_months(&drop).unwrap();
        assert_eq!(raw.months, filled.months);
        assert_eq!(raw.months, strings(&["2016-12", "2017-02"]));
        assert_eq!(raw.cells, vec![vec![Some(1.0), None], vec![Some(3.0), None]]);
        assert_eq!(filled.get("2016-12", "SY02"), Some(4.0));
    }

    #[test]
    fn drop_unknown_month_fails() {
        let mut t = sample();
        let err = t.drop_months(&strings(&["2015-01"])).unwrap_err();
        assert!(matches!(err, PipelineError::MissingMonth(m) if m == "2015-01"));
        assert_eq!(t.months.len(), 4);
    }

    #[test]
    fn select_regions_follows_requested_order() {
        let t = sample();
        let sel = t.select_regions(&strings(&["SY02", "SY01"])).unwrap();
        assert_eq!(sel.regions, strings(&["SY02", "SY01"]));
        assert_eq!(sel.cells[2], vec![None, Some(2.0)]);
    }

    #[test]
    fn select_absent_region_fails() {
        let t = sample();
        let err = t.select_regions(&strings(&["SY01", "SY99"])).unwrap_err();
        assert!(matches!(err, PipelineError::MissingRegion(r) if r == "SY99"));
    }

    #[test]
    fn column_reads_short_rows_as_empty() {
        let t = TallTable::new(
            "t",
            strings(&["a", "b"]),
            vec![strings(&["1", "2"]), strings(&["3"])],
        );
        assert_eq!(t.column("b"), Some(vec!["2", ""]));
        assert!(t.column("c").is_none());
        assert!(t.require_column("c").is_err());
    }
}
