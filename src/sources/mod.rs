//! Source adapters: one raw report in, per-(agent, date) records out.
//!
//! Each adapter binds its column schema against the normalized headers up
//! front. Identity columns are required; everything else degrades to nulls.

pub mod audits;
pub mod inspections;
pub mod performance;
pub mod sales;

use crate::error::{ConsolidateError, Result};
use crate::identity::canonical_email;
use crate::models::{Cell, RawTable, SourceKind};

pub(crate) fn require_column(
    table: &RawTable,
    report: SourceKind,
    column: &'static str,
) -> Result<usize> {
    table
        .column_index(column)
        .ok_or(ConsolidateError::MissingColumn { report, column })
}

pub(crate) fn optional_column(table: &RawTable, report: SourceKind, column: &str) -> Option<usize> {
    let index = table.column_index(column);
    if index.is_none() {
        tracing::warn!(%report, column, "column missing, treating as empty");
    }
    index
}

/// `None` for absent or zero-row sources.
pub(crate) fn present(table: Option<&RawTable>, report: SourceKind) -> Option<&RawTable> {
    match table {
        Some(t) if !t.is_empty() => Some(t),
        _ => {
            tracing::info!(%report, "source absent or empty");
            None
        }
    }
}

/// Email-like values of the given columns, for the name index.
pub(crate) fn emails_in(table: Option<&RawTable>, columns: &[&str]) -> Vec<String> {
    let Some(table) = table else {
        return Vec::new();
    };
    let indices: Vec<usize> = columns
        .iter()
        .filter_map(|c| table.column_index(c))
        .collect();
    let indices = &indices;
    table
        .rows
        .iter()
        .flat_map(move |row| indices.iter().map(move |i| RawTable::cell(row, Some(*i))))
        .filter_map(|cell| cell.as_text().and_then(|v| canonical_email(&v)))
        .collect()
}

/// Lenient numeric coercion for scores and rates: `87,5`, `1,234.5`, `92%`, ` 4 `.
/// A lone comma is a decimal separator; otherwise commas group thousands.
pub fn coerce_number(cell: &Cell) -> Option<f64> {
    let parsed = match cell {
        Cell::Empty => None,
        Cell::Number(v) => Some(*v),
        Cell::Text(raw) => {
            let value = raw.trim().trim_end_matches('%').trim();
            let value = if value.matches(',').count() == 1 && !value.contains('.') {
                value.replace(',', ".")
            } else {
                value.replace(',', "")
            };
            value.parse::<f64>().ok()
        }
    };
    parsed.filter(|v| v.is_finite())
}

/// Currency amounts: thousands separators and currency symbols stripped,
/// anything unparseable counts as zero.
pub fn coerce_amount(cell: &Cell) -> f64 {
    match cell {
        Cell::Number(v) if v.is_finite() => *v,
        Cell::Text(raw) => {
            let cleaned: String = raw
                .chars()
                .filter(|c| !matches!(c, ',' | '$' | '€' | '£') && !c.is_whitespace())
                .collect();
            cleaned.parse::<f64>().ok().filter(|v| v.is_finite()).unwrap_or(0.0)
        }
        _ => 0.0,
    }
}
