use calamine::{open_workbook_auto, Data, Reader};
use std::path::Path;

use crate::schema::SchemaError;

/// Reads a raw upload into a rectangular grid of trimmed cell strings.
/// Dispatches on extension: xlsx/xls via calamine, csv via the csv crate.
pub(crate) fn read_grid(path: &Path) -> Result<Vec<Vec<String>>, SchemaError> {
    match extension(path).as_deref() {
        Some("xlsx") | Some("xls") => read_workbook(path),
        Some("csv") => read_csv(path),
        other => Err(SchemaError::UnsupportedFormat(
            other.unwrap_or("none").to_string(),
        )),
    }
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
}

fn read_workbook(path: &Path) -> Result<Vec<Vec<String>>, SchemaError> {
    let mut workbook =
        open_workbook_auto(path).map_err(|e| SchemaError::Sheet(e.to_string()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| SchemaError::Sheet("workbook has no sheets".to_string()))?
        .map_err(|e| SchemaError::Sheet(e.to_string()))?;

    Ok(range
        .rows()
        .map(|row| row.iter().map(cell_to_string).collect())
        .collect())
}

fn read_csv(path: &Path) -> Result<Vec<Vec<String>>, SchemaError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)?;

    let mut grid = Vec::new();
    for record in reader.records() {
        let record = record?;
        grid.push(record.iter().map(|s| s.trim().to_string()).collect());
    }
    // Pad ragged CSV rows so downstream column arithmetic holds.
    let width = grid.iter().map(|r: &Vec<String>| r.len()).max().unwrap_or(0);
    for row in &mut grid {
        row.resize(width, String::new());
    }
    Ok(grid)
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.trim().to_string(),
        Data::Float(f) => {
            if f.fract() == 0.0 {
                format!("{}", *f as i64)
            } else {
                format!("{f}")
            }
        }
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default(),
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Error(_) | Data::Empty => String::new(),
    }
}
