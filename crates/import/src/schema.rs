use std::path::Path;
use thiserror::Error;

use crate::read;

/// Title cell of the fixed export header band. The bank export puts the
/// sheet title in the first cell of a merged band and leaves the rest blank.
pub const HEADER_TITLE: &str = "Account transactions";

/// Exact width of the export header band.
pub const HEADER_WIDTH: usize = 36;

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("spreadsheet error: {0}")]
    Sheet(String),
    #[error("unsupported upload format: {0}")]
    UnsupportedFormat(String),
    #[error("header mismatch: {0}")]
    HeaderMismatch(String),
    #[error("too few rows: found {found}, need at least {min}")]
    TooFewRows { found: usize, min: usize },
    #[error("too few columns: found {found}, need at least {min}")]
    TooFewColumns { found: usize, min: usize },
}

/// Boundary gate: checks that an upload carries the expected export header
/// band before any job is created. Only the first row is inspected.
pub fn validate_header(path: &Path) -> Result<(), SchemaError> {
    let grid = read::read_grid(path)?;
    let first = grid
        .first()
        .ok_or_else(|| SchemaError::HeaderMismatch("upload is empty".to_string()))?;
    check_first_row(first)
}

pub(crate) fn check_first_row(row: &[String]) -> Result<(), SchemaError> {
    if row.len() != HEADER_WIDTH {
        return Err(SchemaError::HeaderMismatch(format!(
            "expected {} header cells, found {}",
            HEADER_WIDTH,
            row.len()
        )));
    }
    if row[0] != HEADER_TITLE {
        return Err(SchemaError::HeaderMismatch(format!(
            "expected title cell {HEADER_TITLE:?}, found {:?}",
            row[0]
        )));
    }
    if let Some(cell) = row[1..].iter().find(|c| !c.is_empty()) {
        return Err(SchemaError::HeaderMismatch(format!(
            "unexpected non-empty header cell {cell:?}"
        )));
    }
    Ok(())
}
