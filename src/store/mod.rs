//! Tabular storage: the spreadsheet the quiz uses as its database.
//!
//! Every table is a grid of string cells addressed in A1 notation. Row 1 of each table holds the
//! header. Reads return "short" rows the way the Sheets API does: trailing empty cells are dropped.
//! There is no locking, so read-then-write callers race with each other.

pub mod auth;
pub mod memory;
pub mod sheets;

use std::{fmt, sync::Arc};

use async_trait::async_trait;

use crate::{
    config::{Config, StoreBackend},
    errors::{AppError, AppResult},
};

pub use memory::InMemoryStore;
pub use sheets::SheetsStore;

pub type Row = Vec<String>;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TabularStore: Send + Sync {
    async fn read(&self, table: &str, range: CellRange) -> AppResult<Vec<Row>>;
    /// Adds rows after the last non-empty row of the table.
    async fn append(&self, table: &str, rows: Vec<Row>) -> AppResult<()>;
    /// Overwrites exactly the cells addressed by `range`.
    async fn update(&self, table: &str, range: CellRange, rows: Vec<Row>) -> AppResult<()>;
    async fn health_check(&self) -> AppResult<()>;
}

/// A rectangular A1 range. Columns are zero based internally, rows are 1 based; an open row bound
/// means "to the edge of the data".
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CellRange {
    start_col: usize,
    start_row: Option<usize>,
    end_col: usize,
    end_row: Option<usize>,
}

impl CellRange {
    /// Whole columns, e.g. `A:G`.
    pub fn columns(first: char, last: char) -> Self {
        Self {
            start_col: column_index(first),
            start_row: None,
            end_col: column_index(last),
            end_row: None,
        }
    }

    /// From a given row down to the end of the data, e.g. `A2:F`.
    pub fn from_row(first: char, row: usize, last: char) -> Self {
        Self {
            start_col: column_index(first),
            start_row: Some(row),
            end_col: column_index(last),
            end_row: None,
        }
    }

    /// Part of a single row, e.g. `C5:G5`.
    pub fn row(first: char, last: char, row: usize) -> Self {
        Self {
            start_col: column_index(first),
            start_row: Some(row),
            end_col: column_index(last),
            end_row: Some(row),
        }
    }

    pub fn cell(col: char, row: usize) -> Self {
        Self::row(col, col, row)
    }

    pub fn start_col(&self) -> usize {
        self.start_col
    }

    pub fn end_col(&self) -> usize {
        self.end_col
    }

    pub fn start_row(&self) -> Option<usize> {
        self.start_row
    }

    pub fn end_row(&self) -> Option<usize> {
        self.end_row
    }

    pub fn width(&self) -> usize {
        self.end_col - self.start_col + 1
    }
}

impl fmt::Display for CellRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let start = column_name(self.start_col);
        let end = column_name(self.end_col);
        let row = |r: Option<usize>| r.map(|r| r.to_string()).unwrap_or_default();

        if self.start_col == self.end_col && self.start_row.is_some() && self.start_row == self.end_row
        {
            return write!(f, "{}{}", start, row(self.start_row));
        }

        write!(
            f,
            "{}{}:{}{}",
            start,
            row(self.start_row),
            end,
            row(self.end_row)
        )
    }
}

fn column_index(col: char) -> usize {
    (col.to_ascii_uppercase() as u8 - b'A') as usize
}

fn column_name(mut index: usize) -> String {
    let mut name = Vec::new();
    loop {
        name.push((b'A' + (index % 26) as u8) as char);
        if index < 26 {
            break;
        }
        index = index / 26 - 1;
    }
    name.iter().rev().collect()
}

/// Builds the store selected by configuration.
pub fn build_store(config: &Config) -> AppResult<Arc<dyn TabularStore>> {
    match config.store_backend {
        StoreBackend::Memory => {
            log::warn!("Using in-memory store, data will not survive a restart");
            Ok(Arc::new(InMemoryStore::with_headers(&config.sheets)))
        }
        StoreBackend::Sheets => {
            let store = SheetsStore::new(config)?;
            Ok(Arc::new(store))
        }
    }
}

/// Parses a counter cell; blank cells count as zero.
pub(crate) fn parse_count(cell: Option<&String>) -> AppResult<u64> {
    match cell.map(|c| c.trim()) {
        None | Some("") => Ok(0),
        Some(value) => value
            .parse::<u64>()
            .map_err(|_| AppError::MalformedData(format!("'{}' is not a valid count", value))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_notation() {
        assert_eq!(CellRange::columns('A', 'G').to_string(), "A:G");
        assert_eq!(CellRange::from_row('A', 2, 'F').to_string(), "A2:F");
        assert_eq!(CellRange::row('C', 'G', 5).to_string(), "C5:G5");
        assert_eq!(CellRange::cell('D', 12).to_string(), "D12");
    }

    #[test]
    fn test_range_width() {
        assert_eq!(CellRange::row('B', 'E', 3).width(), 4);
        assert_eq!(CellRange::cell('B', 3).width(), 1);
    }

    #[test]
    fn test_column_names_past_z() {
        assert_eq!(column_name(0), "A");
        assert_eq!(column_name(25), "Z");
        assert_eq!(column_name(26), "AA");
        assert_eq!(column_name(27), "AB");
    }

    #[test]
    fn test_parse_count() {
        assert_eq!(parse_count(None).unwrap(), 0);
        assert_eq!(parse_count(Some(&"".to_string())).unwrap(), 0);
        assert_eq!(parse_count(Some(&" 7 ".to_string())).unwrap(), 7);
        assert!(matches!(
            parse_count(Some(&"seven".to_string())),
            Err(AppError::MalformedData(_))
        ));
    }
}
