//! In-memory [`TabularStore`].

use super::{lock, FaultPlan};
use crate::error::{RemoteError, RemoteResult};
use crate::remote::{A1Range, SheetProperties, TabularStore, ValueInput};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

/// Operations of [`MemoryTabular`] that can be counted or failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TabularOp {
    Find,
    Create,
    Read,
    Append,
    Update,
    Clear,
    DeleteRows,
    Metadata,
}

#[derive(Debug, Clone)]
struct Spreadsheet {
    name: String,
    sheets: Vec<SheetProperties>,
    /// Rows of the first sheet, row 1 first.
    rows: Vec<Vec<String>>,
}

#[derive(Debug, Default)]
struct Inner {
    stores: HashMap<String, Spreadsheet>,
    /// Creation order, so name lookups return the oldest match.
    order: Vec<String>,
    faults: FaultPlan<TabularOp>,
}

/// Spreadsheet-like store kept in memory.
#[derive(Debug, Default)]
pub struct MemoryTabular {
    inner: Mutex<Inner>,
}

fn missing(store: &str) -> RemoteError {
    RemoteError::NotFound(format!("spreadsheet {}", store))
}

fn row_is_blank(row: &[String]) -> bool {
    row.iter().all(|cell| cell.is_empty())
}

impl MemoryTabular {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a store holding `rows` (header included) and return its id.
    pub fn seed_store(&self, name: &str, sheet_title: &str, rows: Vec<Vec<String>>) -> String {
        let id = format!("sheet-{}", Uuid::new_v4());
        let mut inner = lock(&self.inner);
        inner.stores.insert(
            id.clone(),
            Spreadsheet {
                name: name.to_string(),
                sheets: vec![SheetProperties {
                    sheet_id: Some(0),
                    title: sheet_title.to_string(),
                }],
                rows,
            },
        );
        inner.order.push(id.clone());
        id
    }

    /// Replace the sheet list of a store (for sheet id resolution tests).
    pub fn set_sheets(&self, store: &str, sheets: Vec<SheetProperties>) {
        if let Some(doc) = lock(&self.inner).stores.get_mut(store) {
            doc.sheets = sheets;
        }
    }

    /// Delete a store entirely, as if the user removed the spreadsheet.
    pub fn drop_store(&self, store: &str) {
        let mut inner = lock(&self.inner);
        inner.stores.remove(store);
        inner.order.retain(|id| id != store);
    }

    /// Current rows of a store, header included.
    pub fn rows(&self, store: &str) -> Option<Vec<Vec<String>>> {
        lock(&self.inner).stores.get(store).map(|doc| doc.rows.clone())
    }

    /// Ids of all live stores, oldest first.
    pub fn store_ids(&self) -> Vec<String> {
        lock(&self.inner).order.clone()
    }

    pub fn fail_once(&self, op: TabularOp, err: RemoteError) {
        lock(&self.inner).faults.fail_once(op, err);
    }

    pub fn fail_always(&self, op: TabularOp, err: RemoteError) {
        lock(&self.inner).faults.fail_always(op, err);
    }

    pub fn heal(&self, op: TabularOp) {
        lock(&self.inner).faults.heal(op);
    }

    pub fn calls(&self, op: TabularOp) -> usize {
        lock(&self.inner).faults.calls(op)
    }

    fn with_store<T>(
        &self,
        op: TabularOp,
        store: &str,
        f: impl FnOnce(&mut Spreadsheet) -> RemoteResult<T>,
    ) -> RemoteResult<T> {
        let mut inner = lock(&self.inner);
        inner.faults.enter(op)?;
        let doc = inner.stores.get_mut(store).ok_or_else(|| missing(store))?;
        f(doc)
    }
}

fn write_cells(rows: &mut Vec<Vec<String>>, first_row: usize, first_col: usize, values: &[Vec<String>]) {
    for (offset, value_row) in values.iter().enumerate() {
        let row_index = first_row + offset;
        if rows.len() <= row_index {
            rows.resize(row_index + 1, Vec::new());
        }
        let row = &mut rows[row_index];
        for (col_offset, value) in value_row.iter().enumerate() {
            let col = first_col + col_offset;
            if row.len() <= col {
                row.resize(col + 1, String::new());
            }
            row[col] = value.clone();
        }
    }
}

#[async_trait]
impl TabularStore for MemoryTabular {
    async fn find_store(&self, name: &str) -> RemoteResult<Option<String>> {
        let mut inner = lock(&self.inner);
        inner.faults.enter(TabularOp::Find)?;
        let found = inner
            .order
            .iter()
            .find(|id| inner.stores.get(*id).is_some_and(|doc| doc.name == name))
            .cloned();
        Ok(found)
    }

    async fn create_store(
        &self,
        name: &str,
        sheet_title: &str,
        header: &[String],
    ) -> RemoteResult<String> {
        lock(&self.inner).faults.enter(TabularOp::Create)?;
        Ok(self.seed_store(name, sheet_title, vec![header.to_vec()]))
    }

    async fn read_range(&self, store: &str, range: &A1Range) -> RemoteResult<Vec<Vec<String>>> {
        self.with_store(TabularOp::Read, store, |doc| {
            let (first_row, last_row) = range.row_bounds();
            let (first_col, last_col) = range.col_bounds();
            let start = (first_row as usize).saturating_sub(1);
            let end = last_row.map_or(doc.rows.len(), |last| (last as usize).min(doc.rows.len()));
            let mut out: Vec<Vec<String>> = doc
                .rows
                .get(start..end.max(start))
                .unwrap_or(&[])
                .iter()
                .map(|row| {
                    let mut cells: Vec<String> = (first_col..=last_col)
                        .map(|col| row.get(col).cloned().unwrap_or_default())
                        .collect();
                    while cells.last().is_some_and(String::is_empty) {
                        cells.pop();
                    }
                    cells
                })
                .collect();
            while out.last().is_some_and(|row| row.is_empty()) {
                out.pop();
            }
            Ok(out)
        })
    }

    async fn append_row(
        &self,
        store: &str,
        _range: &A1Range,
        row: &[String],
        _input: ValueInput,
    ) -> RemoteResult<()> {
        self.with_store(TabularOp::Append, store, |doc| {
            let next = doc
                .rows
                .iter()
                .rposition(|existing| !row_is_blank(existing))
                .map_or(0, |last| last + 1);
            if next < doc.rows.len() {
                doc.rows[next] = row.to_vec();
            } else {
                doc.rows.push(row.to_vec());
            }
            Ok(())
        })
    }

    async fn update_range(
        &self,
        store: &str,
        range: &A1Range,
        values: &[Vec<String>],
        _input: ValueInput,
    ) -> RemoteResult<()> {
        self.with_store(TabularOp::Update, store, |doc| {
            let (first_row, _) = range.row_bounds();
            let (first_col, _) = range.col_bounds();
            write_cells(
                &mut doc.rows,
                (first_row as usize).saturating_sub(1),
                first_col,
                values,
            );
            Ok(())
        })
    }

    async fn clear_range(&self, store: &str, range: &A1Range) -> RemoteResult<()> {
        self.with_store(TabularOp::Clear, store, |doc| {
            let (first_row, last_row) = range.row_bounds();
            let (first_col, last_col) = range.col_bounds();
            let start = (first_row as usize).saturating_sub(1);
            let end = last_row.map_or(doc.rows.len(), |last| (last as usize).min(doc.rows.len()));
            for row in doc.rows.iter_mut().take(end).skip(start) {
                for col in first_col..=last_col.min(row.len().saturating_sub(1)) {
                    if let Some(cell) = row.get_mut(col) {
                        cell.clear();
                    }
                }
            }
            Ok(())
        })
    }

    async fn delete_rows(
        &self,
        store: &str,
        sheet_id: i64,
        start: u32,
        end: u32,
    ) -> RemoteResult<()> {
        self.with_store(TabularOp::DeleteRows, store, |doc| {
            let known = doc
                .sheets
                .iter()
                .any(|sheet| sheet.sheet_id.unwrap_or(0) == sheet_id);
            if !known {
                return Err(RemoteError::Status {
                    status: 400,
                    message: format!("No grid with id: {}", sheet_id),
                });
            }
            let start = start as usize;
            let end = (end as usize).min(doc.rows.len());
            if start < end {
                doc.rows.drain(start..end);
            }
            Ok(())
        })
    }

    async fn sheet_metadata(&self, store: &str) -> RemoteResult<Vec<SheetProperties>> {
        self.with_store(TabularOp::Metadata, store, |doc| Ok(doc.sheets.clone()))
    }
}
