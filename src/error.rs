use std::path::PathBuf;

use thiserror::Error;

use crate::parser::rules::Field;

pub type Result<T> = std::result::Result<T, ScrapeError>;

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{url} answered {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("parser backend '{0}' is not available (supported: html5ever)")]
    UnknownBackend(String),

    #[error("invalid selector '{selector}': {reason}")]
    Selector { selector: String, reason: String },

    #[error("row {row}: no {what} for field '{field}'")]
    MissingNode {
        field: Field,
        row: usize,
        what: String,
    },

    #[error("row {row}: cannot read '{text}' as a number for field '{field}'")]
    Coerce {
        field: Field,
        row: usize,
        text: String,
    },

    #[error("column '{field}' has {actual} values, expected {expected}")]
    LengthMismatch {
        field: Field,
        expected: usize,
        actual: usize,
    },

    #[error("column '{0}' was not extracted")]
    MissingColumn(Field),

    #[error("row {row}: unexpected value type in column '{field}'")]
    ColumnType { field: Field, row: usize },

    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("csv: {0}")]
    Csv(#[from] csv::Error),

    #[error("xlsx: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),
}

impl ScrapeError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ScrapeError::Io {
            path: path.into(),
            source,
        }
    }
}
