//! Persisted key/value state (store locator, master folder, session hints).

mod redb_state;

pub use redb_state::RedbState;

use crate::error::AppError;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

/// Keys of the persisted state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PersistKey {
    /// Resolved id of the backing tabular store.
    StoreLocator,
    /// Id of the shared parent folder for customer photo folders.
    MasterFolder,
    /// Set while a session should be silently restored on startup.
    LoggedIn,
    /// Unix seconds after which the current credential is assumed stale.
    TokenExpiry,
    /// Account email used as the silent reauthentication hint.
    AccountEmail,
}

impl PersistKey {
    pub const ALL: [PersistKey; 5] = [
        PersistKey::StoreLocator,
        PersistKey::MasterFolder,
        PersistKey::LoggedIn,
        PersistKey::TokenExpiry,
        PersistKey::AccountEmail,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PersistKey::StoreLocator => "store_locator",
            PersistKey::MasterFolder => "master_folder",
            PersistKey::LoggedIn => "logged_in",
            PersistKey::TokenExpiry => "token_expiry",
            PersistKey::AccountEmail => "account_email",
        }
    }
}

/// Key/value state that survives restarts.
pub trait StateStore: Send + Sync {
    fn get(&self, key: PersistKey) -> Result<Option<String>, AppError>;
    fn set(&self, key: PersistKey, value: &str) -> Result<(), AppError>;
    fn remove(&self, key: PersistKey) -> Result<(), AppError>;
}

/// Volatile [`StateStore`] used by tests and offline mode.
#[derive(Debug, Default)]
pub struct MemoryState {
    values: Mutex<HashMap<PersistKey, String>>,
}

impl MemoryState {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StateStore for MemoryState {
    fn get(&self, key: PersistKey) -> Result<Option<String>, AppError> {
        let values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(values.get(&key).cloned())
    }

    fn set(&self, key: PersistKey, value: &str) -> Result<(), AppError> {
        let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        values.insert(key, value.to_string());
        Ok(())
    }

    fn remove(&self, key: PersistKey) -> Result<(), AppError> {
        let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        values.remove(&key);
        Ok(())
    }
}
