//! Tabular normalizer
//!
//! Converts the raw header-plus-rows table from the row store into typed
//! records. The backing store is loosely typed (every cell is a string and
//! the sheet may have been hand-edited), so column location is semantic and
//! coercion is forgiving:
//!
//! - the amount column is found case-insensitively among
//!   {amount, price, cost, value}, the date column among
//!   {date, timestamp, time}; either missing fails the whole table
//! - amount cells accept a decimal comma; unparsable cells coerce to 0
//! - date cells are parsed by trying a fixed priority list of formats; the
//!   first format that parses at least one value is adopted for the column
//!
//! A record whose date cell does not parse under the adopted format is kept
//! with `date: None`: it participates in aggregates that do not filter by
//! date and is excluded from every date-filtered view. The `Option` makes
//! that split explicit instead of silently double-counting.

use std::collections::HashMap;

use chrono::{NaiveDate, NaiveDateTime};

use crate::error::{Error, Result};

/// Header labels accepted for the amount column, in priority order of the
/// header row (first match wins)
const AMOUNT_HEADERS: [&str; 4] = ["amount", "price", "cost", "value"];

/// Header labels accepted for the date column
const DATE_HEADERS: [&str; 3] = ["date", "timestamp", "time"];

/// Date formats tried in priority order. The first one that parses at least
/// one non-empty cell is adopted for the whole column.
const DATE_FORMATS: [DateFormat; 5] = [
    DateFormat::DateTime("%Y-%m-%d %H:%M"),
    DateFormat::Date("%Y-%m-%d"),
    DateFormat::Date("%d/%m/%Y"),
    DateFormat::Date("%d.%m.%Y"),
    DateFormat::Date("%m/%d/%Y"),
];

#[derive(Clone, Copy)]
enum DateFormat {
    DateTime(&'static str),
    Date(&'static str),
}

impl DateFormat {
    fn parse(&self, cell: &str) -> Option<NaiveDateTime> {
        match self {
            DateFormat::DateTime(fmt) => NaiveDateTime::parse_from_str(cell, fmt).ok(),
            DateFormat::Date(fmt) => NaiveDate::parse_from_str(cell, fmt)
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0)),
        }
    }
}

/// One normalized record
#[derive(Debug, Clone)]
pub struct Record {
    /// Absolute row index into the raw table, header included.
    /// Used by the mutator to address cells and rows.
    pub row_index: usize,
    /// None when the cell did not parse under the adopted column format
    pub date: Option<NaiveDateTime>,
    pub amount: f64,
    /// Every other column, keyed by its original header label
    fields: HashMap<String, String>,
}

impl Record {
    /// Look up a retained column by header label, empty string when absent
    pub fn field(&self, header: &str) -> &str {
        self.fields.get(header).map(String::as_str).unwrap_or("")
    }
}

/// A normalized table snapshot
#[derive(Debug, Clone, Default)]
pub struct NormalizedTable {
    pub headers: Vec<String>,
    pub records: Vec<Record>,
}

impl NormalizedTable {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Locate a column by case-insensitive membership in a candidate set
fn find_column(headers: &[String], candidates: &[&str]) -> Option<usize> {
    headers
        .iter()
        .position(|h| candidates.contains(&h.trim().to_lowercase().as_str()))
}

/// Coerce an amount cell: decimal comma to decimal point, unparsable to 0
fn coerce_amount(cell: &str) -> f64 {
    cell.trim().replace(',', ".").parse::<f64>().unwrap_or(0.0)
}

/// Normalize raw rows (row 0 = header) into typed records
pub fn normalize(rows: &[Vec<String>]) -> Result<NormalizedTable> {
    let Some(header) = rows.first() else {
        return Err(Error::NoUsableSchema("header"));
    };
    let headers: Vec<String> = header.iter().map(|h| h.trim().to_string()).collect();

    let amount_col =
        find_column(&headers, &AMOUNT_HEADERS).ok_or(Error::NoUsableSchema("amount"))?;
    let date_col = find_column(&headers, &DATE_HEADERS).ok_or(Error::NoUsableSchema("date"))?;

    let data = &rows[1..];
    if data.is_empty() {
        return Ok(NormalizedTable {
            headers,
            records: vec![],
        });
    }

    // Adopt the first format that parses at least one non-empty date cell
    fn cell_at(row: &[String], col: usize) -> &str {
        row.get(col).map(String::as_str).unwrap_or("").trim()
    }
    let format = DATE_FORMATS
        .iter()
        .find(|fmt| {
            data.iter().any(|row| {
                let cell = cell_at(row, date_col);
                !cell.is_empty() && fmt.parse(cell).is_some()
            })
        })
        .ok_or(Error::AllDatesInvalid)?;

    let records = data
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let date = format.parse(cell_at(row, date_col));
            let amount = coerce_amount(cell_at(row, amount_col));
            let fields = headers
                .iter()
                .enumerate()
                .filter(|(col, _)| *col != amount_col && *col != date_col)
                .map(|(col, h)| (h.clone(), cell_at(row, col).to_string()))
                .collect();
            Record {
                row_index: i + 1,
                date,
                amount,
                fields,
            }
        })
        .collect();

    Ok(NormalizedTable { headers, records })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(raw: &[&[&str]]) -> Vec<Vec<String>> {
        raw.iter()
            .map(|r| r.iter().map(|c| c.to_string()).collect())
            .collect()
    }

    #[test]
    fn test_decimal_comma_amount() {
        let table = normalize(&rows(&[
            &["Timestamp", "Amount", "Category"],
            &["2025-01-05 10:00", "12,50", "Groceries"],
        ]))
        .unwrap();
        assert_eq!(table.records[0].amount, 12.5);
    }

    #[test]
    fn test_unparsable_amount_coerces_to_zero() {
        let table = normalize(&rows(&[
            &["Date", "Price"],
            &["2025-01-05", "abc"],
        ]))
        .unwrap();
        assert_eq!(table.records[0].amount, 0.0);
    }

    #[test]
    fn test_column_match_is_case_insensitive() {
        let table = normalize(&rows(&[
            &["TIMESTAMP", "COST"],
            &["2025-01-05 10:00", "3"],
        ]))
        .unwrap();
        assert_eq!(table.records[0].amount, 3.0);
        assert!(table.records[0].date.is_some());
    }

    #[test]
    fn test_missing_amount_column_fails() {
        let err = normalize(&rows(&[&["Date", "Category"], &["2025-01-05", "x"]])).unwrap_err();
        assert!(matches!(err, Error::NoUsableSchema("amount")));
    }

    #[test]
    fn test_missing_date_column_fails() {
        let err = normalize(&rows(&[&["Amount", "Category"], &["5", "x"]])).unwrap_err();
        assert!(matches!(err, Error::NoUsableSchema("date")));
    }

    #[test]
    fn test_format_priority_iso_datetime_first() {
        let table = normalize(&rows(&[
            &["Timestamp", "Amount"],
            &["2025-01-05 10:00", "1"],
            &["2025-02-11 08:30", "2"],
        ]))
        .unwrap();
        let date = table.records[1].date.unwrap();
        assert_eq!(date.format("%Y-%m-%d %H:%M").to_string(), "2025-02-11 08:30");
    }

    #[test]
    fn test_european_date_format() {
        let table = normalize(&rows(&[
            &["Date", "Amount"],
            &["05.01.2025", "1"],
        ]))
        .unwrap();
        let date = table.records[0].date.unwrap().date();
        assert_eq!(date, NaiveDate::from_ymd_opt(2025, 1, 5).unwrap());
    }

    #[test]
    fn test_invalid_date_row_is_retained_without_date() {
        let table = normalize(&rows(&[
            &["Timestamp", "Amount"],
            &["2025-01-05 10:00", "45"],
            &["not a date", "10"],
        ]))
        .unwrap();
        assert_eq!(table.records.len(), 2);
        assert!(table.records[0].date.is_some());
        assert!(table.records[1].date.is_none());
        assert_eq!(table.records[1].amount, 10.0);
    }

    #[test]
    fn test_no_parseable_dates_fails() {
        let err = normalize(&rows(&[
            &["Date", "Amount"],
            &["garbage", "1"],
            &["more garbage", "2"],
        ]))
        .unwrap_err();
        assert!(matches!(err, Error::AllDatesInvalid));
    }

    #[test]
    fn test_header_only_table_is_empty_not_invalid() {
        let table = normalize(&rows(&[&["Date", "Amount"]])).unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn test_other_columns_retained_verbatim() {
        let table = normalize(&rows(&[
            &["Timestamp", "Amount", "Category", "Merchant", "User"],
            &["2025-01-05 10:00", "45", "Groceries", "Rewe", "Alice"],
        ]))
        .unwrap();
        let record = &table.records[0];
        assert_eq!(record.field("Category"), "Groceries");
        assert_eq!(record.field("Merchant"), "Rewe");
        assert_eq!(record.field("User"), "Alice");
        assert_eq!(record.field("Missing"), "");
        assert_eq!(record.row_index, 1);
    }
}
