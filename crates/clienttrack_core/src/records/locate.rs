//! Row lookup and range helpers for the customer sheet.

use crate::constants::SHEET_TITLE;
use crate::models::normalize_id;
use crate::models::record::{column, ROW_WIDTH};
use crate::remote::{A1Range, SheetProperties};

/// Last column cleared by the row-clear fallback (`Z`).
const CLEAR_LAST_COL: usize = 25;

/// Data rows below the header (`Customers!A2:E`).
pub(crate) fn data_range() -> A1Range {
    A1Range::rows_from(SHEET_TITLE, 0, ROW_WIDTH - 1, 2)
}

/// Whole table, used as the append target (`Customers!A:E`).
pub(crate) fn table_range() -> A1Range {
    A1Range::columns(SHEET_TITLE, 0, ROW_WIDTH - 1)
}

/// Identifier column (`Customers!A:A`).
pub(crate) fn id_column_range() -> A1Range {
    A1Range::columns(SHEET_TITLE, column::ID, column::ID)
}

/// Name and phone cells of one row (`Customers!B{n}:C{n}`).
pub(crate) fn contact_range(row: u32) -> A1Range {
    A1Range::row_span(SHEET_TITLE, column::NAME, column::PHONE, row)
}

/// Folder cell of one row (`Customers!D{n}`).
pub(crate) fn folder_cell(row: u32) -> A1Range {
    A1Range::cell(SHEET_TITLE, column::FOLDER, row)
}

/// Every cell of one row the clear fallback blanks (`Customers!A{n}:Z{n}`).
pub(crate) fn clear_range(row: u32) -> A1Range {
    A1Range::row_span(SHEET_TITLE, 0, CLEAR_LAST_COL, row)
}

/// One-based sheet row holding `id`, scanning the identifier column.
///
/// Cells are normalized before comparing. Row 1 is the header and never
/// matches.
pub(crate) fn locate_row(id_column: &[Vec<String>], id: &str) -> Option<u32> {
    id_column
        .iter()
        .enumerate()
        .skip(1)
        .find(|(_, cells)| cells.first().is_some_and(|cell| normalize_id(cell) == id))
        .map(|(index, _)| index as u32 + 1)
}

/// Numeric id of the customer sheet.
///
/// Prefers a sheet titled like [`SHEET_TITLE`] (trimmed, case-insensitive),
/// then the only sheet of a single-sheet store. A missing numeric id means the
/// first sheet, whose id is `0`.
pub(crate) fn resolve_sheet_id(sheets: &[SheetProperties]) -> Option<i64> {
    let titled = sheets
        .iter()
        .find(|sheet| sheet.title.trim().eq_ignore_ascii_case(SHEET_TITLE));
    let sheet = match (titled, sheets) {
        (Some(sheet), _) => sheet,
        (None, [only]) => only,
        (None, _) => return None,
    };
    Some(sheet.sheet_id.unwrap_or(0))
}
