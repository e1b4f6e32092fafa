use std::path::PathBuf;

use chrono::NaiveDate;
use thiserror::Error;

use crate::models::SourceKind;

#[derive(Error, Debug)]
pub enum ConsolidateError {
    #[error("{report} report is missing required column `{column}`")]
    MissingColumn {
        report: SourceKind,
        column: &'static str,
    },

    #[error("{report} report has no columns")]
    EmptyColumns { report: SourceKind },

    #[error("{report} report could not be decoded: {reason}")]
    Decode { report: SourceKind, reason: String },

    #[error("failed to read {report} report at {}: {source}", .path.display())]
    Read {
        report: SourceKind,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid date range: {from} is after {to}")]
    InvalidRange { from: NaiveDate, to: NaiveDate },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ConsolidateError>;
