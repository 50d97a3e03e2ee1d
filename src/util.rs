// Utility helpers for parsing cells and basic statistics.
//
// This module centralizes the "dirty" number/month handling so the stages can
// work with typed values.
use chrono::NaiveDate;
use num_format::{Locale, ToFormattedString};

/// What a numeric CSV cell turned out to be.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Cell {
    Number(f64),
    /// Empty or an explicit NaN marker; pandas reads these as missing.
    Missing,
    /// Text that is not a number.
    Invalid,
}

/// Parse a numeric CSV cell the way a pandas numeric column would read it.
///
/// - Trims whitespace.
/// - Empty strings and the usual NaN spellings are missing, not zero.
/// - Anything else must parse as `f64`.
pub fn parse_cell(s: &str) -> Cell {
    let s = s.trim();
    if s.is_empty() {
        return Cell::Missing;
    }
    if matches!(s, "NaN" | "nan" | "NA" | "N/A" | "null" | "NULL") {
        return Cell::Missing;
    }
    match s.parse::<f64>() {
        Ok(v) if v.is_nan() => Cell::Missing,
        Ok(v) => Cell::Number(v),
        Err(_) => Cell::Invalid,
    }
}

/// `true` if `token` is a `YYYY-MM` month. Only such tokens sort
/// chronologically as plain strings.
pub fn is_year_month(token: &str) -> bool {
    token.len() == 7 && NaiveDate::parse_from_str(&format!("{}-01", token), "%Y-%m-%d").is_ok()
}

/// Arithmetic mean; `None` for an empty slice.
pub fn average(v: &[f64]) -> Option<f64> {
    if v.is_empty() {
        return None;
    }
    let sum: f64 = v.iter().copied().sum();
    Some(sum / v.len() as f64)
}

/// Median; even-sized inputs average the two central values. `None` for an
/// empty input. Takes the `Vec` by value so it can sort in place.
pub fn median(mut v: Vec<f64>) -> Option<f64> {
    if v.is_empty() {
        return None;
    }
    v.sort_by(|a, b| a.total_cmp(b));
    let mid = v.len() / 2;
    if v.len() % 2 == 1 {
        Some(v[mid])
    } else {
        Some((v[mid - 1] + v[mid]) / 2.0)
    }
}

/// Render a float the way pandas writes it to CSV: shortest round-trip
/// digits, with `.0` kept on integral values.
pub fn format_float(v: f64) -> String {
    let s = format!("{}", v);
    if v.is_finite() && !s.contains('.') && !s.contains('e') {
        format!("{}.0", s)
    } else {
        s
    }
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    // Counts in console messages, e.g. `9,855 rows`.
    n.to_formatted_string(&Locale::en)
}
