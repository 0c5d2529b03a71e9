//! [`StateStore`] backed by a redb file.

use super::{PersistKey, StateStore};
use crate::error::AppError;
use redb::{ReadableDatabase, ReadableTable, TableDefinition};
use std::path::Path;
use std::sync::Arc;

/// Client state rows keyed by [`PersistKey::as_str`].
const CLIENT_STATE: TableDefinition<&str, &str> = TableDefinition::new("client_state");

/// redb-backed persisted state.
#[derive(Clone)]
pub struct RedbState {
    db: Arc<redb::Database>,
}

impl RedbState {
    /// Open (or create) the state file, creating parent directories.
    ///
    /// # Errors
    /// Returns an error when the directory cannot be created or redb fails to
    /// open or initialize the table.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, AppError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|err| {
                    AppError::Persist(redb::Error::Io(err))
                })?;
            }
        }
        let db = redb::Database::create(path)?;
        let write_txn = db.begin_write()?;
        write_txn.open_table(CLIENT_STATE)?;
        write_txn.commit()?;
        Ok(Self { db: Arc::new(db) })
    }
}

impl StateStore for RedbState {
    fn get(&self, key: PersistKey) -> Result<Option<String>, AppError> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(CLIENT_STATE)?;
        let value = table.get(key.as_str())?.map(|guard| guard.value().to_string());
        Ok(value)
    }

    fn set(&self, key: PersistKey, value: &str) -> Result<(), AppError> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(CLIENT_STATE)?;
            table.insert(key.as_str(), value)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    fn remove(&self, key: PersistKey) -> Result<(), AppError> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(CLIENT_STATE)?;
            table.remove(key.as_str())?;
        }
        write_txn.commit()?;
        Ok(())
    }
}
