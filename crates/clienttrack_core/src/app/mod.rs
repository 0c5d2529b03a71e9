//! Top-level application state.
//!
//! [`App`] owns the session, the record and photo controllers, navigation,
//! the current search and selection, and any pending confirmation. UI
//! surfaces send it [`AppCommand`]s and render the [`AppEvent`]s it returns.

mod protocol;

pub use protocol::{AppCommand, AppEvent, Prompt};

use crate::cache::RefreshOutcome;
use crate::config::Config;
use crate::error::AppError;
use crate::memory::{MemoryBlob, MemoryIdentity, MemoryTabular};
use crate::models::{normalize_id, CroppedImage, CustomerRecord};
use crate::navigation::{HistoryMode, HistoryPort, NavMode, NavigationController, View};
use crate::persist::StateStore;
use crate::photos::{PendingPhotoDelete, PhotoController};
use crate::records::RecordController;
use crate::remote::{BlobStore, CredentialSlot, IdentityProvider, TabularStore};
use crate::session::{ResumeOutcome, SessionManager};
use std::sync::Arc;
use tracing::{error, info};

/// Remote collaborators and local state the app is built from.
pub struct Backends {
    pub tabular: Arc<dyn TabularStore>,
    pub blobs: Arc<dyn BlobStore>,
    pub identity: Arc<dyn IdentityProvider>,
    pub state: Arc<dyn StateStore>,
    /// Shared with adapters that need the current access token.
    pub credentials: CredentialSlot,
}

impl Backends {
    /// Simulated remote services over the given local state.
    pub fn in_memory(state: Arc<dyn StateStore>) -> Self {
        Self {
            tabular: Arc::new(MemoryTabular::new()),
            blobs: Arc::new(MemoryBlob::new()),
            identity: Arc::new(MemoryIdentity::default()),
            state,
            credentials: CredentialSlot::new(),
        }
    }
}

enum Pending {
    DeleteRecord { id: String },
    DeletePhoto(PendingPhotoDelete),
}

pub struct App<H: HistoryPort> {
    session: SessionManager,
    records: RecordController,
    photos: PhotoController,
    nav: NavigationController<H>,
    query: String,
    selected: Option<String>,
    editing: bool,
    pending: Option<Pending>,
}

impl<H: HistoryPort> App<H> {
    /// Wire the controllers together.
    ///
    /// # Errors
    /// Returns an error when persisted state cannot be read.
    pub fn new(config: &Config, backends: Backends, history: H) -> Result<Self, AppError> {
        let records = RecordController::new(
            backends.tabular,
            backends.blobs.clone(),
            backends.state.clone(),
            config.store_name.clone(),
        )?;
        let photos = PhotoController::new(
            backends.blobs,
            backends.state.clone(),
            config.photo_folder_name.clone(),
        );
        let session = SessionManager::new(backends.identity, backends.state, backends.credentials);
        Ok(Self {
            session,
            records,
            photos,
            nav: NavigationController::new(history),
            query: String::new(),
            selected: None,
            editing: false,
            pending: None,
        })
    }

    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    pub fn records(&self) -> &RecordController {
        &self.records
    }

    pub fn navigation(&self) -> &NavigationController<H> {
        &self.nav
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    /// Currently opened customer.
    pub fn selected(&self) -> Option<&CustomerRecord> {
        self.selected
            .as_deref()
            .and_then(|id| self.records.cache().get(id))
    }

    pub fn is_editing(&self) -> bool {
        self.editing
    }

    /// The confirmation currently awaiting an answer, if any.
    pub fn pending_prompt(&self) -> Option<Prompt> {
        if self.nav.exit_prompt_visible() {
            return Some(Prompt::Exit);
        }
        match self.pending.as_ref()? {
            Pending::DeleteRecord { id } => Some(Prompt::DeleteRecord {
                id: id.clone(),
                name: self
                    .records
                    .cache()
                    .get(id)
                    .map(|record| record.name.clone())
                    .unwrap_or_default(),
            }),
            Pending::DeletePhoto(pending) => Some(Prompt::DeletePhoto {
                file_id: pending.file_id().to_string(),
            }),
        }
    }

    pub fn has_exited(&self) -> bool {
        self.nav.mode() == NavMode::Exited
    }

    /// Apply one command. Failures are reported as [`AppEvent::Error`].
    pub async fn handle(&mut self, cmd: AppCommand) -> Vec<AppEvent> {
        let mut events = Vec::new();
        if let Err(err) = self.dispatch(cmd, &mut events).await {
            error!("command failed: {}", err);
            let auth_lost = matches!(err, AppError::AuthRequired) && self.session.is_authenticated();
            events.push(AppEvent::Error {
                message: err.to_string(),
            });
            if auth_lost {
                self.session.invalidate();
                events.push(self.session_event());
                events.push(AppEvent::SignInRequired);
            }
        }
        events
    }

    async fn dispatch(&mut self, cmd: AppCommand, events: &mut Vec<AppEvent>) -> Result<(), AppError> {
        match cmd {
            AppCommand::Start => {
                let view = self.nav.init();
                events.push(AppEvent::ViewChanged { view });
                match self.session.resume().await? {
                    ResumeOutcome::Resumed => {
                        events.push(self.session_event());
                        self.open_store(events).await?;
                    }
                    ResumeOutcome::NoSavedSession | ResumeOutcome::SignInRequired => {
                        events.push(AppEvent::SignInRequired);
                    }
                }
            }
            AppCommand::SignIn => {
                self.session.sign_in().await?;
                events.push(self.session_event());
                self.open_store(events).await?;
            }
            AppCommand::SignOut => {
                self.session.logout()?;
                self.selected = None;
                self.editing = false;
                self.pending = None;
                events.push(self.session_event());
                events.push(AppEvent::SignInRequired);
            }
            AppCommand::Navigate { view } => {
                let view = self.nav.navigate(view, HistoryMode::Push);
                events.push(AppEvent::ViewChanged { view });
            }
            AppCommand::Back => {
                let mode = self.nav.back();
                self.push_nav_mode(mode, events);
            }
            AppCommand::HistoryPopped { state } => {
                let mode = self.nav.on_pop(state);
                self.push_nav_mode(mode, events);
            }
            AppCommand::ConfirmExit => {
                self.nav.confirm_exit()?;
                info!("exit confirmed");
                events.push(AppEvent::Exited);
            }
            AppCommand::CancelExit => {
                self.nav.cancel_exit()?;
                events.push(AppEvent::ViewChanged {
                    view: self.nav.current(),
                });
            }
            AppCommand::Search { query } => {
                self.session.require_auth()?;
                self.query = query;
                events.push(self.search_event());
            }
            AppCommand::Refresh => {
                self.session.require_auth()?;
                match self.records.refresh().await? {
                    RefreshOutcome::Reloaded { records } => {
                        events.push(AppEvent::StoreReady { records });
                    }
                    RefreshOutcome::Skipped => events.push(AppEvent::Notice {
                        message: "A refresh is already running".to_string(),
                    }),
                }
                events.push(self.search_event());
            }
            AppCommand::Open { id } => {
                self.session.require_auth()?;
                let id = normalize_id(&id);
                let record = self
                    .records
                    .cache()
                    .get(&id)
                    .cloned()
                    .ok_or_else(|| AppError::RecordNotFound(id.clone()))?;
                self.selected = Some(id);
                self.editing = false;
                let view = self.nav.navigate(View::Details, HistoryMode::Push);
                events.push(AppEvent::ViewChanged { view });
                let folder_ref = record.folder_ref.clone();
                events.push(AppEvent::RecordOpened { record });
                self.push_photos(folder_ref, events).await;
            }
            AppCommand::Create { id, name, phone } => {
                self.session.require_auth()?;
                let record = self.records.create_record(&id, &name, &phone).await?;
                events.push(AppEvent::RecordCreated { record });
                let view = self.nav.navigate(View::Search, HistoryMode::Push);
                events.push(AppEvent::ViewChanged { view });
                events.push(self.search_event());
            }
            AppCommand::BeginEdit => {
                self.session.require_auth()?;
                let record = self.require_selected()?;
                self.editing = true;
                let view = self.nav.navigate(View::Edit, HistoryMode::Push);
                events.push(AppEvent::ViewChanged { view });
                events.push(AppEvent::EditStarted { record });
            }
            AppCommand::SubmitEdit { name, phone } => {
                self.session.require_auth()?;
                if !self.editing {
                    return Err(AppError::InvalidInput("no edit in progress".to_string()));
                }
                let id = self.require_selected()?.id;
                let record = self.records.update_record(&id, &name, &phone).await?;
                self.editing = false;
                events.push(AppEvent::RecordUpdated {
                    record: record.clone(),
                });
                let view = self.nav.navigate(View::Details, HistoryMode::Push);
                events.push(AppEvent::ViewChanged { view });
                events.push(AppEvent::RecordOpened { record });
                events.push(self.search_event());
            }
            AppCommand::CancelEdit => {
                self.editing = false;
                let view = self.nav.navigate(View::Details, HistoryMode::Push);
                events.push(AppEvent::ViewChanged { view });
            }
            AppCommand::RequestDelete => {
                self.session.require_auth()?;
                let record = self.require_selected()?;
                self.pending = Some(Pending::DeleteRecord {
                    id: record.id.clone(),
                });
                events.push(AppEvent::ConfirmationRequested {
                    prompt: Prompt::DeleteRecord {
                        id: record.id,
                        name: record.name,
                    },
                });
            }
            AppCommand::ConfirmDelete => {
                self.session.require_auth()?;
                let id = match self.pending.take() {
                    Some(Pending::DeleteRecord { id }) => id,
                    other => {
                        self.pending = other;
                        return Err(AppError::Confirmation(
                            "no customer delete is awaiting confirmation".to_string(),
                        ));
                    }
                };
                let outcome = self.records.delete_record(&id).await?;
                if self.selected.as_deref() == Some(id.as_str()) {
                    self.selected = None;
                    self.editing = false;
                }
                events.push(AppEvent::RecordDeleted {
                    id,
                    degraded: outcome.is_degraded(),
                });
                let view = self.nav.navigate(View::Search, HistoryMode::Push);
                events.push(AppEvent::ViewChanged { view });
                events.push(self.search_event());
            }
            AppCommand::UploadPhoto { image } => {
                self.session.require_auth()?;
                self.upload(image, events).await?;
            }
            AppCommand::RequestPhotoDelete { file_id } => {
                self.session.require_auth()?;
                let record = self.require_selected()?;
                let pending = self
                    .photos
                    .request_photo_delete(&file_id, record.folder_ref.as_deref())?;
                events.push(AppEvent::ConfirmationRequested {
                    prompt: Prompt::DeletePhoto {
                        file_id: pending.file_id().to_string(),
                    },
                });
                self.pending = Some(Pending::DeletePhoto(pending));
            }
            AppCommand::ConfirmPhotoDelete => {
                self.session.require_auth()?;
                let pending = match self.pending.take() {
                    Some(Pending::DeletePhoto(pending)) => pending,
                    other => {
                        self.pending = other;
                        return Err(AppError::Confirmation(
                            "no photo delete is awaiting confirmation".to_string(),
                        ));
                    }
                };
                let file_id = pending.file_id().to_string();
                let folder_ref = pending.folder_ref().map(str::to_string);
                self.photos.delete_photo(pending).await?;
                events.push(AppEvent::PhotoDeleted { file_id });
                self.push_photos(folder_ref, events).await;
            }
            AppCommand::DismissPrompt => {
                self.pending = None;
                events.push(AppEvent::PromptDismissed);
            }
        }
        Ok(())
    }

    async fn open_store(&mut self, events: &mut Vec<AppEvent>) -> Result<(), AppError> {
        if let RefreshOutcome::Reloaded { records } = self.records.ensure_store_ready().await? {
            events.push(AppEvent::StoreReady { records });
        }
        events.push(self.search_event());
        Ok(())
    }

    async fn upload(&mut self, image: CroppedImage, events: &mut Vec<AppEvent>) -> Result<(), AppError> {
        let id = self.require_selected()?.id;
        let receipt = self
            .photos
            .upload_photo(&mut self.records, &id, image)
            .await?;
        if receipt.created_folder {
            if let Some(record) = self.records.cache().get(&id) {
                events.push(AppEvent::RecordUpdated {
                    record: record.clone(),
                });
            }
            events.push(self.search_event());
        }
        events.push(AppEvent::PhotoUploaded {
            file_id: receipt.file_id,
            folder_ref: receipt.folder_ref.clone(),
        });
        self.push_photos(Some(receipt.folder_ref), events).await;
        Ok(())
    }

    /// List photos for the details view. A listing failure is reported but
    /// does not fail the surrounding command.
    async fn push_photos(&self, folder_ref: Option<String>, events: &mut Vec<AppEvent>) {
        match self.photos.list_photos(folder_ref.as_deref()).await {
            Ok(photos) => events.push(AppEvent::Photos { folder_ref, photos }),
            Err(err) => {
                error!("photo listing failed: {}", err);
                events.push(AppEvent::Error {
                    message: format!("Error loading photos: {}", err),
                });
            }
        }
    }

    fn push_nav_mode(&self, mode: NavMode, events: &mut Vec<AppEvent>) {
        events.push(match mode {
            NavMode::Browsing => AppEvent::ViewChanged {
                view: self.nav.current(),
            },
            NavMode::ExitPrompt => AppEvent::ConfirmationRequested {
                prompt: Prompt::Exit,
            },
            NavMode::Exited => AppEvent::Exited,
        });
    }

    fn require_selected(&self) -> Result<CustomerRecord, AppError> {
        self.selected()
            .cloned()
            .ok_or_else(|| AppError::InvalidInput("no customer selected".to_string()))
    }

    fn search_event(&self) -> AppEvent {
        AppEvent::SearchResults {
            query: self.query.clone(),
            items: self.records.search(&self.query),
        }
    }

    fn session_event(&self) -> AppEvent {
        AppEvent::SessionChanged {
            phase: self.session.phase(),
            account: self.session.account_email().map(str::to_string),
        }
    }
}

#[cfg(test)]
mod tests;
