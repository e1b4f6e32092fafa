//! File decoding at the edge of a run: CSV (UTF-8, falling back to Latin-1,
//! any of `,` `;` `\t` `|`) or the first sheet of a spreadsheet workbook.

use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};

use crate::error::{ConsolidateError, Result};
use crate::models::{Cell, RawTable, SourceKind};

const DELIMITERS: [u8; 4] = [b',', b';', b'\t', b'|'];
const WORKBOOK_EXTENSIONS: [&str; 5] = ["xlsx", "xlsm", "xlsb", "xls", "ods"];

pub fn load_table(path: &Path, report: SourceKind) -> Result<RawTable> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    let table = if WORKBOOK_EXTENSIONS.contains(&extension.as_str()) {
        load_workbook(path, report)?
    } else {
        let bytes = std::fs::read(path).map_err(|source| ConsolidateError::Read {
            report,
            path: path.to_path_buf(),
            source,
        })?;
        parse_delimited(&bytes, report)?
    };

    tracing::info!(
        %report,
        path = %path.display(),
        columns = table.headers.len(),
        rows = table.len(),
        "report loaded"
    );
    Ok(table)
}

/// UTF-8 (BOM stripped) when valid, Latin-1 otherwise.
pub fn decode(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => {
            tracing::debug!("input is not UTF-8, decoding as Latin-1");
            bytes.iter().map(|&b| char::from(b)).collect()
        }
    }
}

/// Picks the candidate delimiter that occurs most often, outside quotes, in the header line.
pub fn sniff_delimiter(text: &str) -> u8 {
    let header = text.lines().find(|l| !l.trim().is_empty()).unwrap_or("");
    let mut counts = [0usize; DELIMITERS.len()];
    let mut quoted = false;
    for byte in header.bytes() {
        if byte == b'"' {
            quoted = !quoted;
            continue;
        }
        if quoted {
            continue;
        }
        if let Some(i) = DELIMITERS.iter().position(|d| *d == byte) {
            counts[i] += 1;
        }
    }
    counts
        .iter()
        .enumerate()
        .max_by_key(|(i, count)| (**count, std::cmp::Reverse(*i)))
        .filter(|(_, count)| **count > 0)
        .map_or(b',', |(i, _)| DELIMITERS[i])
}

pub fn parse_delimited(bytes: &[u8], report: SourceKind) -> Result<RawTable> {
    let text = decode(bytes);
    let delimiter = sniff_delimiter(&text);
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .has_headers(true)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| ConsolidateError::Decode {
            report,
            reason: e.to_string(),
        })?
        .iter()
        .map(str::to_string)
        .collect();
    if headers.iter().all(|h| h.trim().is_empty()) {
        return Err(ConsolidateError::EmptyColumns { report });
    }

    let mut rows = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record = record.map_err(|e| ConsolidateError::Decode {
            report,
            reason: format!("line {}: {e}", line + 2),
        })?;
        if record.iter().all(|v| v.trim().is_empty()) {
            continue;
        }
        rows.push(record.iter().map(Cell::text).collect());
    }
    Ok(RawTable::new(headers, rows))
}

fn load_workbook(path: &Path, report: SourceKind) -> Result<RawTable> {
    let decode_error = |e: calamine::Error| ConsolidateError::Decode {
        report,
        reason: e.to_string(),
    };
    std::fs::metadata(path).map_err(|source| ConsolidateError::Read {
        report,
        path: path.to_path_buf(),
        source,
    })?;
    let mut workbook = open_workbook_auto(path).map_err(decode_error)?;
    let Some(sheet) = workbook.sheet_names().first().cloned() else {
        return Err(ConsolidateError::EmptyColumns { report });
    };
    let range = workbook.worksheet_range(&sheet).map_err(decode_error)?;

    let mut rows = range.rows();
    let Some(header) = rows.next() else {
        return Err(ConsolidateError::EmptyColumns { report });
    };
    let headers: Vec<String> = header
        .iter()
        .map(|c| workbook_cell(c).as_text().unwrap_or_default())
        .collect();
    if headers.iter().all(|h| h.is_empty()) {
        return Err(ConsolidateError::EmptyColumns { report });
    }

    let rows = rows
        .map(|row| row.iter().map(workbook_cell).collect::<Vec<_>>())
        .filter(|row| row.iter().any(|c| !c.is_blank()))
        .collect();
    Ok(RawTable::new(headers, rows))
}

fn workbook_cell(cell: &Data) -> Cell {
    match cell {
        Data::Empty | Data::Error(_) => Cell::Empty,
        Data::String(s) => Cell::text(s.as_str()),
        Data::Int(n) => Cell::Number(*n as f64),
        Data::Float(f) => Cell::Number(*f),
        Data::Bool(b) => Cell::Text(b.to_string()),
        Data::DateTime(dt) => Cell::Number(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::text(s.as_str()),
    }
}
