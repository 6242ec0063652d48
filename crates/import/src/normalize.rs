use std::path::{Path, PathBuf};

use crate::read;
use crate::schema::SchemaError;

// Fixed layout of the raw export: a merged title band and service columns
// surround the actual data block.
const MIN_ROWS: usize = 14;
const MIN_COLS: usize = 21;
/// Interior service row carrying a non-data marker.
const MARKER_ROW: usize = 13;
/// Leading rows of title/merged-header noise.
const LEAD_ROWS: usize = 10;
/// Leading columns of structural noise.
const LEAD_COLS: usize = 11;
/// Trailing descriptive columns (indices after the lead trim) not needed
/// downstream.
const TRAIL_DROP: std::ops::Range<usize> = 8..10;

/// A spreadsheet reduced to its canonical shape: one header row, data rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedTable {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Strips the export's structural noise from a raw grid.
pub fn normalize_grid(grid: Vec<Vec<String>>) -> Result<NormalizedTable, SchemaError> {
    let width = grid.iter().map(|r| r.len()).max().unwrap_or(0);
    if grid.len() < MIN_ROWS {
        return Err(SchemaError::TooFewRows { found: grid.len(), min: MIN_ROWS });
    }
    if width < MIN_COLS {
        return Err(SchemaError::TooFewColumns { found: width, min: MIN_COLS });
    }

    let mut rows: Vec<Vec<String>> = grid
        .into_iter()
        .enumerate()
        .filter(|(i, _)| *i != MARKER_ROW)
        .map(|(_, mut row)| {
            row.resize(width, String::new());
            row.drain(..LEAD_COLS);
            row
        })
        .collect();
    rows.drain(..LEAD_ROWS);

    // First remaining row becomes the header; it and the units sub-header
    // right below it are then discarded.
    let mut header = rows.remove(0);
    rows.remove(0);

    strip_columns(&mut header);
    for row in &mut rows {
        strip_columns(row);
    }

    rows.retain(|row| row.iter().any(|cell| !cell.trim().is_empty()));

    Ok(NormalizedTable { header, rows })
}

fn strip_columns(row: &mut Vec<String>) {
    row.drain(TRAIL_DROP);
}

/// Reads a raw upload, normalizes it, and writes the result as a CSV
/// (`prepared_<stem>.csv` beside the input). Returns the derived path.
pub fn prepare_table(path: &Path) -> Result<PathBuf, SchemaError> {
    let grid = read::read_grid(path)?;
    let table = normalize_grid(grid)?;

    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("upload");
    let output = path.with_file_name(format!("prepared_{stem}.csv"));

    let mut writer = csv::Writer::from_path(&output)?;
    writer.write_record(&table.header)?;
    for row in &table.rows {
        writer.write_record(row)?;
    }
    writer.flush()?;

    tracing::info!(output = %output.display(), rows = table.rows.len(), "normalized upload");
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Builds a raw grid in the export layout: each body row is ten cells
    /// (eight retained, two trailing descriptive placeholders), wrapped in
    /// the lead noise the normalizer must strip.
    fn raw_grid(header: &[&str], subheader: &[&str], data: &[Vec<&str>]) -> Vec<Vec<String>> {
        let width = (LEAD_COLS + header.len() + TRAIL_DROP.len()).max(MIN_COLS);
        let pad = |cells: &[&str]| -> Vec<String> {
            let mut row = vec![String::new(); LEAD_COLS];
            row.extend(cells.iter().map(|c| c.to_string()));
            row.extend(std::iter::repeat(String::from("x")).take(TRAIL_DROP.len()));
            row.resize(width, String::new());
            row
        };

        let mut grid: Vec<Vec<String>> = Vec::new();
        for i in 0..LEAD_ROWS {
            grid.push(vec![format!("noise {i}"); width]);
        }
        grid.push(pad(header));
        grid.push(pad(subheader));
        for row in data {
            grid.push(pad(row));
        }
        // Marker row sits inside the data block at its fixed absolute index.
        if grid.len() > MARKER_ROW {
            grid.insert(MARKER_ROW, vec![String::from("marker"); width]);
        } else {
            grid.resize(MARKER_ROW, vec![String::new(); width]);
            grid.push(vec![String::from("marker"); width]);
        }
        grid
    }

    #[test]
    fn strips_noise_and_promotes_header() {
        let grid = raw_grid(
            &["Date", "Name", "Id", "Debit", "Memo", "A", "B", "C"],
            &["d", "", "", "RUB", "", "", "", ""],
            &[
                vec!["2024-01-15", "ACME", "123456789", "10.00", "rent", "", "", ""],
                vec!["2024-01-16", "GLOBEX", "987654321", "20.00", "fees", "", "", ""],
            ],
        );
        let table = normalize_grid(grid).unwrap();
        assert_eq!(table.header[..4], ["Date", "Name", "Id", "Debit"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0][1], "ACME");
        assert_eq!(table.rows[1][3], "20.00");
        // Trailing descriptive placeholders are gone.
        assert!(table.rows.iter().all(|r| !r.contains(&"x".to_string())));
    }

    #[test]
    fn drops_fully_empty_rows() {
        let grid = raw_grid(
            &["Date", "Name", "Id", "Debit", "Memo", "A", "B", "C"],
            &["", "", "", "", "", "", "", ""],
            &[
                vec!["2024-01-15", "ACME", "123456789", "10.00", "", "", "", ""],
                vec!["", "", "", "", "", "", "", ""],
            ],
        );
        let table = normalize_grid(grid).unwrap();
        assert_eq!(table.rows.len(), 1);
    }

    #[test]
    fn rejects_grids_below_minimum_rows() {
        let grid = vec![vec![String::new(); MIN_COLS]; MIN_ROWS - 1];
        assert!(matches!(
            normalize_grid(grid),
            Err(SchemaError::TooFewRows { .. })
        ));
    }

    #[test]
    fn rejects_grids_below_minimum_columns() {
        let grid = vec![vec![String::new(); MIN_COLS - 1]; MIN_ROWS];
        assert!(matches!(
            normalize_grid(grid),
            Err(SchemaError::TooFewColumns { .. })
        ));
    }

    #[test]
    fn prepare_table_writes_csv_next_to_input() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("statement.csv");

        let grid = raw_grid(
            &["Date", "Name", "Id", "Debit", "Memo", "A", "B", "C"],
            &["", "", "", "", "", "", "", ""],
            &[vec!["2024-01-15", "ACME", "123456789", "10.00", "rent", "", "", ""]],
        );
        let text = grid
            .iter()
            .map(|r| r.join(","))
            .collect::<Vec<_>>()
            .join("\n");
        std::fs::write(&input, text).unwrap();

        let output = prepare_table(&input).unwrap();
        assert_eq!(output, dir.path().join("prepared_statement.csv"));
        let written = std::fs::read_to_string(&output).unwrap();
        assert!(written.starts_with("Date,Name,Id,Debit"));
        assert!(written.contains("ACME"));
    }
}
