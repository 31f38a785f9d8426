//! # Spreadsheet Module
//!
//! Reads `.xlsx` workbooks into untyped [`RawSheet`] grids and writes the
//! canonical table back out as a single-sheet workbook. Cell values are kept
//! loosely typed ([`Value`]); the pipeline decides what they mean.
pub(crate) mod cell;
pub(crate) mod excel;
pub(crate) mod reference;
pub(crate) mod writer;
pub(crate) mod xlsx;

pub use cell::Value;
pub use writer::write_table;
pub use xlsx::XlsxSpreadsheet;

use crate::error::ReadingLogError;
use crate::spreadsheet::cell::Cell;
use std::path::Path;
use thiserror::Error;
use tracing::warn;

/// Errors raised while opening or decoding a workbook.
#[derive(Error, Debug)]
pub enum SpreadsheetError {
    #[error("Missing part '{0}' in spreadsheet package")]
    FileError(String),

    #[error("Worksheet '{0}' points to missing part '{1}'")]
    SheetPartMissingError(String, String),

    #[error("Spreadsheet '{0}' contains no worksheets")]
    SpreadsheetEmptyError(String),

    #[error("Spreadsheet '{0}' is password protected or not an .xlsx package")]
    SpreadsheetPasswordProtectedError(String),
}

/// Rows beyond this index are not laid out on a [`RawSheet`] grid.
pub const MAX_GRID_ROWS: usize = 100_000;
/// Columns beyond this index are not laid out on a [`RawSheet`] grid.
pub const MAX_GRID_COLS: usize = 1_024;

/// One worksheet as an untyped, dense grid of cell values.
///
/// The grid is anchored at A1, so leading empty rows and columns are kept and
/// row indexes match the worksheet's own row numbers minus one. Every row has
/// the same width.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RawSheet {
    name: String,
    rows: Vec<Vec<Value>>,
    width: usize,
}

impl RawSheet {
    /// Builds a sheet from rows of values, padding short rows with `Empty`.
    pub fn new(name: &str, mut rows: Vec<Vec<Value>>) -> Self {
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        for row in rows.iter_mut() {
            row.resize(width, Value::Empty);
        }
        // Trailing rows without any cell carry no data
        while rows.last().map(|row| row.iter().all(|value| *value == Value::Empty)).unwrap_or(false) {
            rows.pop();
        }
        let width = if rows.is_empty() { 0 } else { width };
        RawSheet {
            name: name.to_owned(),
            rows,
            width,
        }
    }

    /// Lays streamed cells out on a grid.
    ///
    /// Cells beyond [`MAX_GRID_ROWS`] or [`MAX_GRID_COLS`] are dropped.
    pub(crate) fn from_cells(name: &str, cells: &[Cell], shared_strings: &[String]) -> Self {
        let (inside, outside): (Vec<&Cell>, Vec<&Cell>) = cells
            .iter()
            .partition(|cell| cell.row < MAX_GRID_ROWS && cell.col < MAX_GRID_COLS);
        if let Some(cell) = outside.first() {
            warn!(sheet = name, cell = %cell.reference(), dropped = outside.len(), "Ignoring cells outside the readable grid");
        }
        let height = inside.iter().map(|cell| cell.row + 1).max().unwrap_or(0);
        let width = inside.iter().map(|cell| cell.col + 1).max().unwrap_or(0);
        let mut rows = vec![vec![Value::Empty; width]; height];
        for cell in inside {
            rows[cell.row][cell.col] = cell.to_value(shared_strings);
        }
        Self::new(name, rows)
    }

    /// Builds a sheet from text cells; blank strings become `Empty`.
    /// Intended for fixtures and callers that already hold stringly data.
    pub fn from_text_rows(name: &str, rows: &[&[&str]]) -> Self {
        let rows = rows
            .iter()
            .map(|row| row.iter().map(|text| Value::text(*text)).collect())
            .collect();
        Self::new(name, rows)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn col_count(&self) -> usize {
        self.width
    }

    /// True when the sheet has no rows or no columns.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() || self.width == 0
    }

    pub fn get(&self, row: usize, col: usize) -> Option<&Value> {
        self.rows.get(row).and_then(|cells| cells.get(col))
    }

    pub fn row(&self, row: usize) -> Option<&[Value]> {
        self.rows.get(row).map(Vec::as_slice)
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Value]> {
        self.rows.iter().map(Vec::as_slice)
    }
}

/// Reads every worksheet accepted by `accept` from an `.xlsx` file, in document order.
pub fn read_sheets<P, F>(path: P, accept: F) -> Result<Vec<RawSheet>, ReadingLogError>
where
    P: AsRef<Path>,
    F: Fn(&str) -> bool,
{
    let mut spreadsheet = XlsxSpreadsheet::open(path)?;
    spreadsheet.read_sheets(accept)
}
