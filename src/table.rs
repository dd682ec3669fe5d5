//! Table Model - In-memory export table
//!
//! A table is an ordered list of named columns of cells. Every column holds the
//! same number of rows, and row `i` of every column is the same logical record.
//! The row-count invariant is checked once, when the table is built, so the
//! rest of the pipeline can index columns by row without re-checking.

use crate::error::{CleanerError, Result};
use std::borrow::Cow;
use std::fmt;

/// A single cell value
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Int(i64),
    Float(f64),
}

impl Cell {
    /// Build a cell from raw text as it appears in an export file.
    /// Blank (whitespace-only) text becomes `Cell::Empty`.
    pub fn from_raw(raw: &str) -> Self {
        if raw.trim().is_empty() {
            Cell::Empty
        } else {
            Cell::Text(raw.to_string())
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            Cell::Int(_) | Cell::Float(_) => false,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Cell::Int(_) | Cell::Float(_))
    }

    /// Textual view of the cell; `None` for empty cells
    pub fn as_text(&self) -> Option<Cow<'_, str>> {
        match self {
            Cell::Empty => None,
            Cell::Text(s) => Some(Cow::Borrowed(s.as_str())),
            Cell::Int(i) => Some(Cow::Owned(i.to_string())),
            Cell::Float(f) => Some(Cow::Owned(f.to_string())),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Empty => Ok(()),
            Cell::Text(s) => write!(f, "{}", s),
            Cell::Int(i) => write!(f, "{}", i),
            Cell::Float(v) => write!(f, "{}", v),
        }
    }
}

impl From<&str> for Cell {
    fn from(raw: &str) -> Self {
        Cell::from_raw(raw)
    }
}

impl From<i64> for Cell {
    fn from(value: i64) -> Self {
        Cell::Int(value)
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Float(value)
    }
}

/// A named column of cells
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub cells: Vec<Cell>,
}

impl Column {
    pub fn new(name: impl Into<String>, cells: Vec<Cell>) -> Self {
        Self {
            name: name.into(),
            cells,
        }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Number of non-empty cells
    pub fn non_null_count(&self) -> usize {
        self.cells.iter().filter(|c| !c.is_empty()).count()
    }
}

/// Ordered set of equally long columns
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    columns: Vec<Column>,
    row_count: usize,
}

impl Table {
    /// Build a table, rejecting columns whose length differs from the first column
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        let row_count = columns.first().map(Column::len).unwrap_or(0);

        if let Some(bad) = columns.iter().find(|c| c.len() != row_count) {
            return Err(CleanerError::RaggedTable {
                column: bad.name.clone(),
                expected: row_count,
                found: bad.len(),
            });
        }

        Ok(Self { columns, row_count })
    }

    /// Build a table from a header list and row-major records
    pub fn from_rows<I, R>(headers: &[&str], rows: I) -> Result<Self>
    where
        I: IntoIterator<Item = R>,
        R: IntoIterator<Item = Cell>,
    {
        let mut columns: Vec<Column> = headers
            .iter()
            .map(|h| Column::new(*h, Vec::new()))
            .collect();

        for row in rows {
            let mut width = 0;
            for (idx, cell) in row.into_iter().enumerate() {
                if let Some(column) = columns.get_mut(idx) {
                    column.cells.push(cell);
                }
                width = idx + 1;
            }
            if width != headers.len() {
                let row_number = columns.first().map(Column::len).unwrap_or(0);
                return Err(CleanerError::RaggedTable {
                    column: format!("row {}", row_number),
                    expected: headers.len(),
                    found: width,
                });
            }
        }

        Self::new(columns)
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn headers(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, idx: usize) -> Option<&Column> {
        self.columns.get(idx)
    }

    /// First column with the given header
    pub fn column_by_name(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Cells of row `idx`, in column order
    pub fn row(&self, idx: usize) -> Option<Vec<&Cell>> {
        if idx >= self.row_count {
            return None;
        }
        Some(self.columns.iter().map(|c| &c.cells[idx]).collect())
    }

    /// New table holding only the rows whose mask entry is `true`, in original order.
    /// `mask` must have one entry per row.
    pub fn select_rows(&self, mask: &[bool]) -> Result<Self> {
        if mask.len() != self.row_count {
            return Err(CleanerError::RaggedTable {
                column: "<row mask>".to_string(),
                expected: self.row_count,
                found: mask.len(),
            });
        }

        let columns = self
            .columns
            .iter()
            .map(|column| {
                let cells = column
                    .cells
                    .iter()
                    .zip(mask)
                    .filter(|(_, keep)| **keep)
                    .map(|(cell, _)| cell.clone())
                    .collect();
                Column::new(column.name.clone(), cells)
            })
            .collect();

        Self::new(columns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        Table::from_rows(
            &["Query", "Clicks"],
            vec![
                vec![Cell::from("a"), Cell::from("1")],
                vec![Cell::from("b"), Cell::from("2")],
                vec![Cell::from("c"), Cell::from("3")],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_from_raw_blank_is_empty() {
        assert_eq!(Cell::from_raw("   "), Cell::Empty);
        assert_eq!(Cell::from_raw(""), Cell::Empty);
        assert_eq!(Cell::from_raw(" x "), Cell::Text(" x ".to_string()));
    }

    #[test]
    fn test_ragged_columns_rejected() {
        let err = Table::new(vec![
            Column::new("Query", vec![Cell::from("a"), Cell::from("b")]),
            Column::new("Clicks", vec![Cell::Int(1)]),
        ])
        .unwrap_err();

        match err {
            CleanerError::RaggedTable { column, expected, found } => {
                assert_eq!(column, "Clicks");
                assert_eq!(expected, 2);
                assert_eq!(found, 1);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_ragged_rows_rejected() {
        let result = Table::from_rows(
            &["Query", "Clicks"],
            vec![vec![Cell::from("a"), Cell::from("1")], vec![Cell::from("b")]],
        );
        assert!(matches!(result, Err(CleanerError::RaggedTable { .. })));
    }

    #[test]
    fn test_select_rows_keeps_order() {
        let table = sample();
        let selected = table.select_rows(&[true, false, true]).unwrap();

        assert_eq!(selected.row_count(), 2);
        assert_eq!(selected.headers(), vec!["Query", "Clicks"]);
        assert_eq!(selected.row(0).unwrap(), vec![&Cell::from("a"), &Cell::from("1")]);
        assert_eq!(selected.row(1).unwrap(), vec![&Cell::from("c"), &Cell::from("3")]);
    }

    #[test]
    fn test_select_rows_rejects_wrong_mask_length() {
        assert!(sample().select_rows(&[true]).is_err());
    }

    #[test]
    fn test_empty_table() {
        let table = Table::new(vec![]).unwrap();
        assert_eq!(table.row_count(), 0);
        assert_eq!(table.column_count(), 0);
    }
}
