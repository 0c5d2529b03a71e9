//! Shared test-only helpers for clienttrack_core.

use crate::app::{App, Backends};
use crate::config::Config;
use crate::constants::{
    DEFAULT_PHOTO_FOLDER_NAME, DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_STORE_NAME, HEADER_ROW,
    SHEET_TITLE,
};
use crate::memory::{MemoryBlob, MemoryIdentity, MemoryTabular};
use crate::navigation::SimulatedHistory;
use crate::persist::{MemoryState, PersistKey, StateStore};
use crate::photos::PhotoController;
use crate::records::RecordController;
use crate::remote::CredentialSlot;
use crate::session::SessionManager;
use std::sync::Arc;

/// In-memory backends shared by the controllers under test.
pub(crate) struct Fixture {
    pub tabular: Arc<MemoryTabular>,
    pub blobs: Arc<MemoryBlob>,
    pub identity: Arc<MemoryIdentity>,
    pub state: Arc<MemoryState>,
    pub credentials: CredentialSlot,
}

/// Build a row from string slices.
pub(crate) fn row(cells: &[&str]) -> Vec<String> {
    cells.iter().map(|cell| cell.to_string()).collect()
}

/// The header row as owned cells.
pub(crate) fn header() -> Vec<String> {
    row(&HEADER_ROW)
}

/// Configuration with default names and no state file.
pub(crate) fn config() -> Config {
    Config {
        state_path: String::new(),
        store_name: DEFAULT_STORE_NAME.to_string(),
        photo_folder_name: DEFAULT_PHOTO_FOLDER_NAME.to_string(),
        request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        offline: true,
    }
}

impl Fixture {
    pub fn new() -> Self {
        Self {
            tabular: Arc::new(MemoryTabular::new()),
            blobs: Arc::new(MemoryBlob::new()),
            identity: Arc::new(MemoryIdentity::default()),
            state: Arc::new(MemoryState::new()),
            credentials: CredentialSlot::new(),
        }
    }

    /// Seed a customer store named like the default and return its id.
    ///
    /// The header row is prepended to `rows`. The locator is not persisted.
    pub fn seed_store(&self, rows: &[&[&str]]) -> String {
        let mut all = vec![header()];
        all.extend(rows.iter().map(|cells| row(cells)));
        self.tabular.seed_store(DEFAULT_STORE_NAME, SHEET_TITLE, all)
    }

    /// Seed a store and persist its locator, as after a previous session.
    pub fn seed_known_store(&self, rows: &[&[&str]]) -> String {
        let id = self.seed_store(rows);
        self.state
            .set(PersistKey::StoreLocator, &id)
            .expect("persist locator");
        id
    }

    pub fn persisted(&self, key: PersistKey) -> Option<String> {
        self.state.get(key).expect("read state")
    }

    pub fn records(&self) -> RecordController {
        RecordController::new(
            self.tabular.clone(),
            self.blobs.clone(),
            self.state.clone(),
            DEFAULT_STORE_NAME,
        )
        .expect("record controller")
    }

    pub fn photos(&self) -> PhotoController {
        PhotoController::new(self.blobs.clone(), self.state.clone(), DEFAULT_PHOTO_FOLDER_NAME)
    }

    pub fn session(&self) -> SessionManager {
        SessionManager::new(
            self.identity.clone(),
            self.state.clone(),
            self.credentials.clone(),
        )
    }

    /// Controller over a known store that already loaded its cache.
    pub async fn ready_records(&self, rows: &[&[&str]]) -> (RecordController, String) {
        let store = self.seed_known_store(rows);
        let mut records = self.records();
        records.ensure_store_ready().await.expect("store ready");
        (records, store)
    }

    pub fn backends(&self) -> Backends {
        Backends {
            tabular: self.tabular.clone(),
            blobs: self.blobs.clone(),
            identity: self.identity.clone(),
            state: self.state.clone(),
            credentials: self.credentials.clone(),
        }
    }

    /// App on a freshly opened page.
    pub fn app(&self) -> App<SimulatedHistory> {
        App::new(&config(), self.backends(), SimulatedHistory::new()).expect("app")
    }
}
