//! Record lifecycle: store discovery, cache priming, and customer CRUD.

mod locate;

use self::locate::{
    clear_range, contact_range, data_range, folder_cell, id_column_range, locate_row,
    resolve_sheet_id, table_range,
};
use crate::cache::{Change, LocalCache, RefreshOutcome, Staged};
use crate::constants::{HEADER_ROW, SHEET_TITLE};
use crate::error::{AppError, RemoteError};
use crate::models::{normalize_id, CustomerRecord};
use crate::persist::{PersistKey, StateStore};
use crate::remote::{A1Range, BlobStore, SheetProperties, TabularStore, ValueInput};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// How a delete reached its goal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// The row was structurally removed.
    Removed,
    /// Structural removal failed; the row's cells were blanked instead.
    /// The customer no longer appears anywhere, but an empty row remains.
    Cleared,
}

impl DeleteOutcome {
    /// Whether the delete went through the fallback path.
    pub fn is_degraded(self) -> bool {
        matches!(self, Self::Cleared)
    }
}

/// One call against the tabular store.
enum SheetCall<'a> {
    Read(&'a A1Range),
    Append(&'a A1Range, &'a [String]),
    Update(&'a A1Range, &'a [Vec<String>], ValueInput),
    Clear(&'a A1Range),
    DeleteRows { sheet_id: i64, start: u32, end: u32 },
    Metadata,
}

enum SheetReply {
    Rows(Vec<Vec<String>>),
    Sheets(Vec<SheetProperties>),
    Done,
}

/// Run `$attempt`; if the store turned out to be missing, recover once and
/// run it again. A second store-not-found is returned to the caller.
macro_rules! with_store_recovery {
    ($this:ident, $attempt:expr) => {
        match $attempt {
            Err(AppError::StoreNotFound) => {
                $this.handle_store_not_found().await?;
                $attempt
            }
            other => other,
        }
    };
}

/// Owns the local cache and keeps it in step with the remote customer sheet.
pub struct RecordController {
    tabular: Arc<dyn TabularStore>,
    blobs: Arc<dyn BlobStore>,
    state: Arc<dyn StateStore>,
    store_name: String,
    locator: Option<String>,
    cache: LocalCache,
}

impl RecordController {
    /// Create a controller, rehydrating the cached store locator.
    ///
    /// # Errors
    /// Returns an error when the persisted state cannot be read.
    pub fn new(
        tabular: Arc<dyn TabularStore>,
        blobs: Arc<dyn BlobStore>,
        state: Arc<dyn StateStore>,
        store_name: impl Into<String>,
    ) -> Result<Self, AppError> {
        let locator = state.get(PersistKey::StoreLocator)?;
        Ok(Self {
            tabular,
            blobs,
            state,
            store_name: store_name.into(),
            locator,
            cache: LocalCache::new(),
        })
    }

    pub fn cache(&self) -> &LocalCache {
        &self.cache
    }

    /// Currently adopted store id, if any.
    pub fn locator(&self) -> Option<&str> {
        self.locator.as_deref()
    }

    /// Search the cache; see [`LocalCache::search`].
    pub fn search(&self, query: &str) -> Vec<CustomerRecord> {
        self.cache.search(query)
    }

    /// Make sure a backing store is adopted, then reload the cache.
    ///
    /// Without a cached locator the store is looked up by name and created
    /// (with the header row) when absent. Repeated calls only refresh.
    ///
    /// # Errors
    /// Returns remote failures from discovery or the refresh.
    pub async fn ensure_store_ready(&mut self) -> Result<RefreshOutcome, AppError> {
        if self.locator.is_none() {
            self.discover().await?;
        }
        self.refresh().await
    }

    /// Replace the cache with the current remote rows.
    ///
    /// A refresh requested while another one is in flight is skipped.
    pub async fn refresh(&mut self) -> Result<RefreshOutcome, AppError> {
        match self.try_reload().await {
            Err(AppError::StoreNotFound) => self.handle_store_not_found().await,
            other => other,
        }
    }

    /// Forget the cached locator and redo discovery plus a full reload.
    ///
    /// A store-not-found during the reload is fatal and returned as
    /// [`AppError::StoreNotFound`].
    pub async fn handle_store_not_found(&mut self) -> Result<RefreshOutcome, AppError> {
        warn!(
            "customer database {} not found, rediscovering",
            self.locator.as_deref().unwrap_or("<none>")
        );
        self.locator = None;
        self.state.remove(PersistKey::StoreLocator)?;
        self.discover().await?;
        self.try_reload().await
    }

    /// Add a customer.
    ///
    /// The id is trimmed and uppercased. Duplicates are detected against the
    /// local cache only. The record is appended locally first and removed
    /// again if the remote append fails.
    ///
    /// # Errors
    /// - [`AppError::InvalidInput`] for a blank id.
    /// - [`AppError::DuplicateIdentifier`] when the id is already cached.
    /// - Remote failures from the append.
    pub async fn create_record(
        &mut self,
        id: &str,
        name: &str,
        phone: &str,
    ) -> Result<CustomerRecord, AppError> {
        with_store_recovery!(self, self.try_create(id, name, phone).await)
    }

    /// Change a customer's name and phone.
    ///
    /// # Errors
    /// [`AppError::RecordNotFound`] when the id is not in the remote sheet.
    pub async fn update_record(
        &mut self,
        id: &str,
        name: &str,
        phone: &str,
    ) -> Result<CustomerRecord, AppError> {
        let id = normalize_id(id);
        with_store_recovery!(self, self.try_update(&id, name, phone).await)
    }

    /// Record `folder_ref` as the customer's photo folder.
    ///
    /// # Errors
    /// [`AppError::RecordNotFound`] when the id is not in the remote sheet.
    pub async fn assign_folder(
        &mut self,
        id: &str,
        folder_ref: &str,
    ) -> Result<CustomerRecord, AppError> {
        let id = normalize_id(id);
        with_store_recovery!(self, self.try_assign_folder(&id, folder_ref).await)
    }

    /// Remove a customer and trash its photo folder.
    ///
    /// Structural row removal is tried first; if it fails for any reason the
    /// row's cells are cleared and [`DeleteOutcome::Cleared`] is returned.
    /// Trashing the folder is best effort.
    ///
    /// # Errors
    /// [`AppError::RecordNotFound`] when the id is not in the remote sheet;
    /// the cache is left unchanged.
    pub async fn delete_record(&mut self, id: &str) -> Result<DeleteOutcome, AppError> {
        let id = normalize_id(id);
        let folder_ref = self.cache.get(&id).and_then(|record| record.folder_ref.clone());
        let outcome = with_store_recovery!(self, self.try_delete(&id).await)?;

        if let Some(folder) = folder_ref {
            if let Err(err) = self.blobs.trash_folder(&folder).await {
                warn!("failed to trash photo folder {} of {}: {}", folder, id, err);
            }
        }
        Ok(outcome)
    }

    async fn discover(&mut self) -> Result<String, AppError> {
        let locator = match self.tabular.find_store(&self.store_name).await? {
            Some(existing) => {
                info!("found customer database {}", existing);
                existing
            }
            None => {
                info!("creating customer database '{}'", self.store_name);
                let header: Vec<String> = HEADER_ROW.iter().map(|cell| cell.to_string()).collect();
                self.tabular
                    .create_store(&self.store_name, SHEET_TITLE, &header)
                    .await?
            }
        };
        self.state.set(PersistKey::StoreLocator, &locator)?;
        self.locator = Some(locator.clone());
        Ok(locator)
    }

    async fn try_reload(&mut self) -> Result<RefreshOutcome, AppError> {
        let Some(_ticket) = self.cache.refresh_gate().try_begin() else {
            debug!("refresh already in flight, skipping");
            return Ok(RefreshOutcome::Skipped);
        };
        let rows = self.read(&data_range()).await?;
        let records: Vec<CustomerRecord> = rows
            .iter()
            .filter_map(|row| CustomerRecord::from_row(row))
            .collect();
        let count = records.len();
        self.cache.replace_all(records);
        debug!("customer cache reloaded with {} records", count);
        Ok(RefreshOutcome::Reloaded { records: count })
    }

    async fn try_create(
        &mut self,
        id: &str,
        name: &str,
        phone: &str,
    ) -> Result<CustomerRecord, AppError> {
        let record = CustomerRecord::new(id, name, phone);
        if record.id.is_empty() {
            return Err(AppError::InvalidInput("customer id must not be blank".to_string()));
        }
        if self.cache.contains_id(&record.id) {
            return Err(AppError::DuplicateIdentifier(record.id));
        }

        let row = record.to_row();
        let staged = self.cache.stage(Change::Append(record.clone()));
        let outcome = self
            .call(SheetCall::Append(&table_range(), &row))
            .await
            .map(drop);
        self.cache.finish(staged, outcome)?;
        info!("created customer {}", record.id);
        Ok(record)
    }

    async fn try_update(
        &mut self,
        id: &str,
        name: &str,
        phone: &str,
    ) -> Result<CustomerRecord, AppError> {
        let row = self.require_row(id).await?;
        let staged = match self.cache.get(id).cloned() {
            Some(current) => self.cache.stage(Change::Replace(CustomerRecord {
                name: name.to_string(),
                phone: phone.to_string(),
                ..current
            })),
            None => Staged::Untouched,
        };
        let values = [vec![name.to_string(), phone.to_string()]];
        let outcome = self
            .call(SheetCall::Update(
                &contact_range(row),
                &values,
                ValueInput::UserEntered,
            ))
            .await
            .map(drop);
        self.cache.finish(staged, outcome)?;
        info!("updated customer {} (row {})", id, row);
        self.cached_or_reload(id).await
    }

    async fn try_assign_folder(
        &mut self,
        id: &str,
        folder_ref: &str,
    ) -> Result<CustomerRecord, AppError> {
        let row = self.require_row(id).await?;
        let staged = match self.cache.get(id).cloned() {
            Some(current) => self.cache.stage(Change::Replace(CustomerRecord {
                folder_ref: Some(folder_ref.to_string()),
                ..current
            })),
            None => Staged::Untouched,
        };
        let values = [vec![folder_ref.to_string()]];
        let outcome = self
            .call(SheetCall::Update(&folder_cell(row), &values, ValueInput::Raw))
            .await
            .map(drop);
        self.cache.finish(staged, outcome)?;
        self.cached_or_reload(id).await
    }

    async fn try_delete(&mut self, id: &str) -> Result<DeleteOutcome, AppError> {
        let row = self.require_row(id).await?;
        let staged = self.cache.stage(Change::Remove(id.to_string()));
        let outcome = match self.delete_row_structurally(row).await {
            Ok(()) => Ok(DeleteOutcome::Removed),
            Err(AppError::StoreNotFound) => Err(AppError::StoreNotFound),
            Err(err) => {
                warn!("row delete failed for {} (row {}), clearing instead: {}", id, row, err);
                self.call(SheetCall::Clear(&clear_range(row)))
                    .await
                    .map(|_| DeleteOutcome::Cleared)
            }
        };
        let outcome = self.cache.finish(staged, outcome)?;
        info!("deleted customer {} ({:?})", id, outcome);
        Ok(outcome)
    }

    async fn delete_row_structurally(&mut self, row: u32) -> Result<(), AppError> {
        let sheets = match self.call(SheetCall::Metadata).await? {
            SheetReply::Sheets(sheets) => sheets,
            _ => return Err(unexpected_reply("metadata")),
        };
        let sheet_id = resolve_sheet_id(&sheets).ok_or_else(|| {
            let titles: Vec<&str> = sheets.iter().map(|sheet| sheet.title.as_str()).collect();
            AppError::RemoteOperationFailed(format!(
                "could not identify the '{}' sheet among {:?}",
                SHEET_TITLE, titles
            ))
        })?;
        self.call(SheetCall::DeleteRows {
            sheet_id,
            start: row - 1,
            end: row,
        })
        .await
        .map(drop)
    }

    async fn require_row(&mut self, id: &str) -> Result<u32, AppError> {
        let column = self.read(&id_column_range()).await?;
        locate_row(&column, id).ok_or_else(|| AppError::RecordNotFound(id.to_string()))
    }

    async fn cached_or_reload(&mut self, id: &str) -> Result<CustomerRecord, AppError> {
        if let Some(record) = self.cache.get(id) {
            return Ok(record.clone());
        }
        self.try_reload().await?;
        self.cache
            .get(id)
            .cloned()
            .ok_or_else(|| AppError::RecordNotFound(id.to_string()))
    }

    async fn read(&mut self, range: &A1Range) -> Result<Vec<Vec<String>>, AppError> {
        match self.call(SheetCall::Read(range)).await? {
            SheetReply::Rows(rows) => Ok(rows),
            _ => Err(unexpected_reply("read")),
        }
    }

    /// Issue one call against the adopted store, discovering it first if
    /// needed. A not-found for the store maps to [`AppError::StoreNotFound`].
    async fn call(&mut self, call: SheetCall<'_>) -> Result<SheetReply, AppError> {
        let store = match self.locator.clone() {
            Some(store) => store,
            None => self.discover().await?,
        };
        let tabular = &self.tabular;
        let reply = match call {
            SheetCall::Read(range) => tabular.read_range(&store, range).await.map(SheetReply::Rows),
            SheetCall::Append(range, row) => tabular
                .append_row(&store, range, row, ValueInput::UserEntered)
                .await
                .map(|_| SheetReply::Done),
            SheetCall::Update(range, values, input) => tabular
                .update_range(&store, range, values, input)
                .await
                .map(|_| SheetReply::Done),
            SheetCall::Clear(range) => tabular
                .clear_range(&store, range)
                .await
                .map(|_| SheetReply::Done),
            SheetCall::DeleteRows {
                sheet_id,
                start,
                end,
            } => tabular
                .delete_rows(&store, sheet_id, start, end)
                .await
                .map(|_| SheetReply::Done),
            SheetCall::Metadata => tabular.sheet_metadata(&store).await.map(SheetReply::Sheets),
        };
        reply.map_err(|err| match err {
            RemoteError::NotFound(what) => {
                debug!("store call hit missing resource: {}", what);
                AppError::StoreNotFound
            }
            other => other.into(),
        })
    }
}

fn unexpected_reply(call: &str) -> AppError {
    AppError::RemoteOperationFailed(format!("unexpected reply to {} call", call))
}
