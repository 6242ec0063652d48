use chrono::NaiveDate;
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use thiserror::Error;

use summa_core::{CounterpartyId, Money};

use crate::canonical::CanonicalNameMap;

// Canonical column names the normalizer guarantees in its output.
pub const COL_ACCOUNT: &str = "Account name";
pub const COL_COUNTERPARTY: &str = "Counterparty name";
pub const COL_COUNTERPARTY_ID: &str = "Counterparty tax id";
pub const COL_DEBIT: &str = "Debit";
pub const COL_DESCRIPTION: &str = "Payment description";
pub const COL_DATE: &str = "Operation date";

/// Separator between concatenated payment descriptions of one group.
/// Rendered verbatim by the HTML templates.
pub const DESCRIPTION_SEPARATOR: &str = "<br><br>";

#[derive(Debug, Error)]
pub enum AggregateError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("missing required column: {0}")]
    MissingColumn(&'static str),
    #[error("no rows left after filtering")]
    EmptyDataset,
}

/// One line of the report: all transactions of a distinct
/// (counterparty name, counterparty id) pair folded together.
#[derive(Debug, Clone)]
pub struct AggregatedRow {
    /// Date of the group's first transaction, when it parsed.
    pub date: Option<NaiveDate>,
    pub counterparty: String,
    pub counterparty_id: CounterpartyId,
    /// Sum of the group's amounts, two decimal places.
    pub amount: Money,
    pub descriptions: String,
}

/// Everything the downstream report stages need from one normalized table.
#[derive(Debug)]
pub struct AggregatedTable {
    pub account_name: String,
    pub rows: Vec<AggregatedRow>,
    /// Distinct counterparty names in first-seen order.
    pub counterparties: Vec<String>,
    /// Per-row counterparty names before grouping, for the breakdown.
    pub raw_labels: Vec<String>,
    /// Per-row amounts before grouping, parallel to `raw_labels`.
    pub raw_amounts: Vec<Money>,
}

pub fn aggregate_file(
    path: &Path,
    names: &CanonicalNameMap,
) -> Result<AggregatedTable, AggregateError> {
    let file = std::fs::File::open(path)?;
    aggregate_reader(file, names)
}

/// Validates and groups the normalized table.
///
/// Rows with a non-positive (or unparseable) amount are dropped. Bad dates,
/// odd-length counterparty ids, and empty names are logged and kept.
pub fn aggregate_reader<R: Read>(
    data: R,
    names: &CanonicalNameMap,
) -> Result<AggregatedTable, AggregateError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(data);
    let headers = reader.headers()?.clone();
    let col = |name: &'static str| {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or(AggregateError::MissingColumn(name))
    };
    let account_col = col(COL_ACCOUNT)?;
    let counterparty_col = col(COL_COUNTERPARTY)?;
    let id_col = col(COL_COUNTERPARTY_ID)?;
    let debit_col = col(COL_DEBIT)?;
    let description_col = col(COL_DESCRIPTION)?;
    let date_col = col(COL_DATE)?;

    let mut account_name: Option<String> = None;
    let mut raw_labels = Vec::new();
    let mut raw_amounts = Vec::new();
    let mut groups: HashMap<(String, String), usize> = HashMap::new();
    let mut rows: Vec<AggregatedRow> = Vec::new();

    for (line, record) in reader.records().enumerate() {
        let record = record?;
        let row_no = line + 1;
        let field = |i: usize| record.get(i).unwrap_or("").trim();

        let raw_amount = field(debit_col);
        let amount = match Money::parse(raw_amount) {
            Ok(a) => a,
            Err(_) => {
                if !raw_amount.is_empty() {
                    tracing::warn!(row = row_no, value = raw_amount, "unparseable amount");
                }
                continue;
            }
        };
        if !amount.is_positive() {
            continue;
        }

        let holder = names.apply(field(account_col));
        if account_name.is_none() && !holder.is_empty() {
            account_name = Some(holder);
        }

        let counterparty = names.apply(field(counterparty_col));
        if counterparty.is_empty() {
            tracing::warn!(row = row_no, "row has an empty counterparty name");
        }

        let counterparty_id = CounterpartyId::new(field(id_col));
        if !counterparty_id.is_well_formed() {
            tracing::warn!(
                row = row_no,
                id = %counterparty_id,
                "counterparty id has unexpected length"
            );
        }

        let raw_date = field(date_col);
        let date = parse_date(raw_date);
        if date.is_none() && !raw_date.is_empty() {
            tracing::warn!(row = row_no, value = raw_date, "unparseable operation date");
        }

        let description = field(description_col).to_string();

        raw_labels.push(counterparty.clone());
        raw_amounts.push(amount);

        let key = (counterparty.clone(), counterparty_id.0.clone());
        match groups.get(&key) {
            Some(&idx) => {
                let row = &mut rows[idx];
                row.amount += amount;
                if !description.is_empty() {
                    if !row.descriptions.is_empty() {
                        row.descriptions.push_str(DESCRIPTION_SEPARATOR);
                    }
                    row.descriptions.push_str(&description);
                }
            }
            None => {
                groups.insert(key, rows.len());
                rows.push(AggregatedRow {
                    date,
                    counterparty,
                    counterparty_id,
                    amount,
                    descriptions: description,
                });
            }
        }
    }

    if rows.is_empty() {
        return Err(AggregateError::EmptyDataset);
    }

    let mut counterparties: Vec<String> = Vec::new();
    for row in &rows {
        if !counterparties.contains(&row.counterparty) {
            counterparties.push(row.counterparty.clone());
        }
    }

    Ok(AggregatedTable {
        account_name: account_name.unwrap_or_else(|| "Unknown".to_string()),
        rows,
        counterparties,
        raw_labels,
        raw_amounts,
    })
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    if s.is_empty() {
        return None;
    }
    for fmt in &["%Y-%m-%d", "%d.%m.%Y", "%d/%m/%Y", "%Y/%m/%d"] {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return Some(date);
        }
    }
    for fmt in &["%Y-%m-%d %H:%M:%S", "%d.%m.%Y %H:%M:%S"] {
        if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_csv(data_rows: &[&str]) -> String {
        let mut out = format!(
            "{COL_ACCOUNT},{COL_COUNTERPARTY},{COL_COUNTERPARTY_ID},{COL_DEBIT},{COL_DESCRIPTION},{COL_DATE}\n"
        );
        for row in data_rows {
            out.push_str(row);
            out.push('\n');
        }
        out
    }

    fn aggregate(data_rows: &[&str]) -> Result<AggregatedTable, AggregateError> {
        aggregate_reader(table_csv(data_rows).as_bytes(), &CanonicalNameMap::empty())
    }

    #[test]
    fn groups_by_name_and_id() {
        let table = aggregate(&[
            "HOLDER,ACME,123456789,10.50,rent,2024-01-15",
            "HOLDER,GLOBEX,987654321,5.00,fees,2024-01-16",
            "HOLDER,ACME,123456789,4.50,supplies,2024-01-17",
        ])
        .unwrap();

        assert_eq!(table.rows.len(), 2);
        let acme = &table.rows[0];
        assert_eq!(acme.counterparty, "ACME");
        assert_eq!(acme.amount.to_string(), "15.00");
        assert_eq!(acme.date, NaiveDate::from_ymd_opt(2024, 1, 15));
        assert_eq!(acme.descriptions, format!("rent{DESCRIPTION_SEPARATOR}supplies"));
        assert_eq!(table.account_name, "HOLDER");
    }

    #[test]
    fn same_name_different_id_stays_separate() {
        let table = aggregate(&[
            "H,ACME,123456789,10.00,a,2024-01-15",
            "H,ACME,987654321,20.00,b,2024-01-16",
        ])
        .unwrap();
        assert_eq!(table.rows.len(), 2);
        // Distinct names still collapse to one roster entry.
        assert_eq!(table.counterparties, vec!["ACME"]);
    }

    #[test]
    fn non_positive_amounts_are_filtered() {
        let table = aggregate(&[
            "H,ACME,123456789,10.00,a,2024-01-15",
            "H,GLOBEX,987654321,0.00,b,2024-01-16",
            "H,INITECH,111222333,-5.00,c,2024-01-17",
        ])
        .unwrap();
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.raw_labels, vec!["ACME"]);
    }

    #[test]
    fn all_non_positive_is_an_empty_dataset() {
        let err = aggregate(&[
            "H,ACME,123456789,0.00,a,2024-01-15",
            "H,GLOBEX,987654321,-1.00,b,2024-01-16",
        ])
        .unwrap_err();
        assert!(matches!(err, AggregateError::EmptyDataset));
    }

    #[test]
    fn short_counterparty_id_is_kept() {
        let table = aggregate(&["H,ACME,1234567,10.00,a,2024-01-15"]).unwrap();
        assert_eq!(table.rows.len(), 1);
        assert!(!table.rows[0].counterparty_id.is_well_formed());
    }

    #[test]
    fn unparseable_date_becomes_none() {
        let table = aggregate(&["H,ACME,123456789,10.00,a,someday"]).unwrap();
        assert_eq!(table.rows[0].date, None);
    }

    #[test]
    fn tolerant_date_formats() {
        let table = aggregate(&[
            "H,ACME,123456789,10.00,a,15.01.2024",
            "H,GLOBEX,987654321,10.00,b,2024-01-16 09:30:00",
        ])
        .unwrap();
        assert_eq!(table.rows[0].date, NaiveDate::from_ymd_opt(2024, 1, 15));
        assert_eq!(table.rows[1].date, NaiveDate::from_ymd_opt(2024, 1, 16));
    }

    #[test]
    fn missing_column_is_an_error() {
        let data = "Account name,Counterparty name\nH,ACME\n";
        let err = aggregate_reader(data.as_bytes(), &CanonicalNameMap::empty()).unwrap_err();
        assert!(matches!(
            err,
            AggregateError::MissingColumn(COL_COUNTERPARTY_ID)
        ));
    }

    #[test]
    fn canonicalization_touches_both_name_columns() {
        let names = CanonicalNameMap::from_toml(
            r#"
            [[rules]]
            pattern = '\s+LLC$'
            replacement = ''
            "#,
        )
        .unwrap();
        let csv = table_csv(&["HOLDER LLC,ACME LLC,123456789,10.00,a,2024-01-15"]);
        let table = aggregate_reader(csv.as_bytes(), &names).unwrap();
        assert_eq!(table.account_name, "HOLDER");
        assert_eq!(table.rows[0].counterparty, "ACME");
    }

    #[test]
    fn grouped_sums_match_raw_total() {
        let table = aggregate(&[
            "H,ACME,123456789,10.10,a,2024-01-15",
            "H,ACME,123456789,0.20,b,2024-01-16",
            "H,GLOBEX,987654321,5.55,c,2024-01-17",
        ])
        .unwrap();
        let grouped: Money = table.rows.iter().map(|r| r.amount).sum();
        let raw: Money = table.raw_amounts.iter().copied().sum();
        assert_eq!(grouped, raw);
        assert_eq!(grouped.to_string(), "15.85");
    }
}
