//! # Tabular Snapshots
//!
//! A [`Table`] is exactly what the store persists: a header row plus data
//! rows of text cells, in column order. Nothing here knows what a product or
//! a ticket is; that mapping lives in [`crate::schema`].
//!
//! ## Cell Normalization
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  raw cell            parse_number     parse_count     parse_money       │
//! │  ──────────          ────────────     ───────────     ───────────       │
//! │  "20"                20.0             20              $20.00            │
//! │  "$1,234.50"         1234.5           1235            $1,234.50         │
//! │  " 8.5 "             8.5              9               $8.50             │
//! │  ""                  None → 0         None → 0        None → $0.00      │
//! │  "n/a"               None → 0         None → 0        None → $0.00      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use tamal_core::Money;

/// One full table snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    /// Creates an empty table with the given header.
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Table {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Builds a table from a header and rows, padding short rows with empty
    /// cells and dropping cells past the last column.
    pub fn from_parts(columns: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let mut table = Table {
            columns,
            rows: Vec::with_capacity(rows.len()),
        };
        for row in rows {
            table.push_row(row);
        }
        table
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn into_parts(self) -> (Vec<String>, Vec<Vec<String>>) {
        (self.columns, self.rows)
    }

    /// Number of data rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True when there are no data rows (a header alone is still empty).
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.trim() == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn push_row(&mut self, mut row: Vec<String>) {
        row.resize(self.columns.len(), String::new());
        self.rows.push(row);
    }

    /// Iterates rows as name-addressable records.
    pub fn records(&self) -> impl Iterator<Item = Record<'_>> {
        self.rows.iter().map(move |cells| Record {
            columns: &self.columns,
            cells,
        })
    }
}

/// A borrowed row with cells addressable by column name.
#[derive(Debug, Clone, Copy)]
pub struct Record<'a> {
    columns: &'a [String],
    cells: &'a [String],
}

impl<'a> Record<'a> {
    /// The trimmed cell under `column`, or `None` if the table has no such
    /// column.
    pub fn get(&self, column: &str) -> Option<&'a str> {
        let idx = self.columns.iter().position(|c| c.trim() == column)?;
        self.cells.get(idx).map(|cell| cell.trim())
    }

    /// The cell under `column`, or `None` if the column is absent or blank.
    pub fn non_empty(&self, column: &str) -> Option<&'a str> {
        self.get(column).filter(|cell| !cell.is_empty())
    }
}

// =============================================================================
// Cell Parsing
// =============================================================================

fn strip_currency(cell: &str) -> String {
    cell.chars()
        .filter(|c| !matches!(c, '$' | ',') && !c.is_whitespace())
        .collect()
}

/// Parses a numeric cell, ignoring `$`, `,` and whitespace.
pub fn parse_number(cell: &str) -> Option<f64> {
    let cleaned = strip_currency(cell);
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Parses a whole-unit count, rounding fractional values.
pub fn parse_count(cell: &str) -> Option<i64> {
    let cleaned = strip_currency(cell);
    if let Ok(n) = cleaned.parse::<i64>() {
        return Some(n);
    }
    parse_number(cell).map(|n| n.round() as i64)
}

/// Parses a currency cell into cents.
pub fn parse_money(cell: &str) -> Option<Money> {
    Money::parse(cell)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn menu() -> Table {
        Table::from_parts(
            vec!["Producto".into(), "Precio".into()],
            vec![
                vec!["Tamal Verde".into(), "$20".into()],
                vec!["Atole".into()],
            ],
        )
    }

    #[test]
    fn test_rows_are_padded_to_header() {
        let table = menu();
        assert_eq!(table.rows()[1], vec!["Atole".to_string(), String::new()]);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_record_lookup() {
        let table = menu();
        let records: Vec<_> = table.records().collect();
        assert_eq!(records[0].get("Precio"), Some("$20"));
        assert_eq!(records[0].get("Costo"), None);
        assert_eq!(records[1].non_empty("Precio"), None);
    }

    #[test]
    fn test_header_only_table_is_empty() {
        let table = Table::new(["Producto"]);
        assert!(table.is_empty());
        assert!(table.has_column("Producto"));
    }

    #[test]
    fn test_numeric_normalization() {
        assert_eq!(parse_number("$1,234.50"), Some(1234.5));
        assert_eq!(parse_number(" 8.5 "), Some(8.5));
        assert_eq!(parse_number(""), None);
        assert_eq!(parse_number("n/a"), None);
        assert_eq!(parse_number("NaN"), None);

        assert_eq!(parse_count("50"), Some(50));
        assert_eq!(parse_count("50.0"), Some(50));
        assert_eq!(parse_count("1,000"), Some(1000));
        assert_eq!(parse_count("abc"), None);

        assert_eq!(parse_money("$1,234.50"), parse_money("1234.5"));
    }
}
