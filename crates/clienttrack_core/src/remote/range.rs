//! Typed A1-notation ranges.

use std::fmt;

/// One corner of a range. A missing row means the whole column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRef {
    /// Zero-based column index (`0` is column `A`).
    pub col: usize,
    /// One-based row number.
    pub row: Option<u32>,
}

/// A rectangular range on one sheet, rendered as A1 notation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct A1Range {
    pub sheet: String,
    pub first: CellRef,
    /// `None` for a single-cell range.
    pub last: Option<CellRef>,
}

impl A1Range {
    /// A single cell such as `Customers!D7`.
    pub fn cell(sheet: &str, col: usize, row: u32) -> Self {
        Self {
            sheet: sheet.to_string(),
            first: CellRef {
                col,
                row: Some(row),
            },
            last: None,
        }
    }

    /// Columns `first_col..=last_col` of one row, such as `Customers!B7:C7`.
    pub fn row_span(sheet: &str, first_col: usize, last_col: usize, row: u32) -> Self {
        Self {
            sheet: sheet.to_string(),
            first: CellRef {
                col: first_col,
                row: Some(row),
            },
            last: Some(CellRef {
                col: last_col,
                row: Some(row),
            }),
        }
    }

    /// Whole columns, such as `Customers!A:E`.
    pub fn columns(sheet: &str, first_col: usize, last_col: usize) -> Self {
        Self {
            sheet: sheet.to_string(),
            first: CellRef {
                col: first_col,
                row: None,
            },
            last: Some(CellRef {
                col: last_col,
                row: None,
            }),
        }
    }

    /// Columns from `first_row` downwards, such as `Customers!A2:E`.
    pub fn rows_from(sheet: &str, first_col: usize, last_col: usize, first_row: u32) -> Self {
        Self {
            sheet: sheet.to_string(),
            first: CellRef {
                col: first_col,
                row: Some(first_row),
            },
            last: Some(CellRef {
                col: last_col,
                row: None,
            }),
        }
    }

    /// Inclusive zero-based column bounds.
    pub fn col_bounds(&self) -> (usize, usize) {
        let last = self.last.map_or(self.first.col, |cell| cell.col);
        (self.first.col, last)
    }

    /// First row and inclusive last row (`None` means unbounded).
    pub fn row_bounds(&self) -> (u32, Option<u32>) {
        let first = self.first.row.unwrap_or(1);
        let last = match self.last {
            None => self.first.row,
            Some(cell) => cell.row,
        };
        (first, last)
    }
}

/// Column letters for a zero-based index (`0 -> A`, `26 -> AA`).
pub fn column_letters(mut index: usize) -> String {
    let mut letters = Vec::new();
    loop {
        letters.push(b'A' + (index % 26) as u8);
        if index < 26 {
            break;
        }
        index = index / 26 - 1;
    }
    letters.reverse();
    String::from_utf8_lossy(&letters).into_owned()
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&column_letters(self.col))?;
        if let Some(row) = self.row {
            write!(f, "{}", row)?;
        }
        Ok(())
    }
}

impl fmt::Display for A1Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}!{}", self.sheet, self.first)?;
        if let Some(last) = self.last {
            write!(f, ":{}", last)?;
        }
        Ok(())
    }
}
