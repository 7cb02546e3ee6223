//! In-memory workbook representation
//!
//! A workbook is read fully into memory before any processing starts. The
//! first row of each sheet is its header row.

use std::fmt;

/// One untyped spreadsheet cell
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    #[default]
    Empty,
    Int(i64),
    Float(f64),
    Text(String),
    Bool(bool),
}

impl CellValue {
    /// Blank cells and whitespace-only text both count as empty
    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Int(v) => write!(f, "{}", v),
            CellValue::Float(v) => write!(f, "{}", v),
            CellValue::Text(s) => f.write_str(s),
            CellValue::Bool(b) => write!(f, "{}", b),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Int(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Float(value)
    }
}

/// One sheet: a header row plus data rows
///
/// Each kept data row remembers its 1-based row number in the source so
/// ledgers can point back at it even after blank rows are dropped.
#[derive(Debug, Clone)]
pub struct Sheet {
    /// Sheet name, usually a year or batch label
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
    row_numbers: Vec<usize>,
    next_row: usize,
}

impl Sheet {
    /// Sheet whose header sits on row 1
    pub fn new(name: impl Into<String>, headers: Vec<String>) -> Self {
        Self::with_header_row(name, headers, 1)
    }

    /// Sheet whose header sits on `header_row` (1-based)
    pub fn with_header_row(
        name: impl Into<String>,
        headers: Vec<String>,
        header_row: usize,
    ) -> Self {
        Self {
            name: name.into(),
            headers,
            rows: Vec::new(),
            row_numbers: Vec::new(),
            next_row: header_row + 1,
        }
    }

    /// Append the next source row; entirely blank rows are dropped but
    /// still advance the row counter
    pub fn push_row(&mut self, row: Vec<CellValue>) {
        let row_number = self.next_row;
        self.push_row_at(row_number, row);
    }

    /// Append a row read from source row `row_number`
    pub fn push_row_at(&mut self, row_number: usize, row: Vec<CellValue>) {
        self.next_row = row_number + 1;
        if row.iter().any(|c| !c.is_empty()) {
            self.rows.push(row);
            self.row_numbers.push(row_number);
        }
    }

    /// Iterate data rows tagged with sheet name and source row number
    pub fn raw_rows(&self) -> impl Iterator<Item = RawRow<'_>> {
        self.rows
            .iter()
            .zip(&self.row_numbers)
            .map(move |(cells, &row_number)| RawRow {
                sheet: &self.name,
                row_number,
                cells,
            })
    }
}

/// A whole workbook
#[derive(Debug, Clone, Default)]
pub struct Workbook {
    pub sheets: Vec<Sheet>,
}

impl Workbook {
    /// Number of data rows across all sheets
    pub fn total_rows(&self) -> usize {
        self.sheets.iter().map(|s| s.rows.len()).sum()
    }
}

/// One data row borrowed from its sheet
#[derive(Debug, Clone, Copy)]
pub struct RawRow<'a> {
    pub sheet: &'a str,
    pub row_number: usize,
    pub cells: &'a [CellValue],
}

impl<'a> RawRow<'a> {
    /// Cell at `column`, `Empty` when the column is absent or the row short
    pub fn cell(&self, column: Option<usize>) -> &'a CellValue {
        static EMPTY: CellValue = CellValue::Empty;
        column.and_then(|i| self.cells.get(i)).unwrap_or(&EMPTY)
    }
}
