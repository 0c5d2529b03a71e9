//! Command/event protocol between UI surfaces and [`super::App`].

use crate::models::{CroppedImage, CustomerRecord, PhotoFile};
use crate::navigation::View;
use crate::session::AuthPhase;

#[derive(Debug)]
pub enum AppCommand {
    /// First load: set up navigation and try to resume the last session.
    Start,
    SignIn,
    SignOut,
    Navigate { view: View },
    /// The user pressed back inside the app.
    Back,
    /// The host's history moved to an entry carrying `state`.
    HistoryPopped { state: Option<View> },
    ConfirmExit,
    CancelExit,
    Search { query: String },
    Refresh,
    Open { id: String },
    Create { id: String, name: String, phone: String },
    BeginEdit,
    SubmitEdit { name: String, phone: String },
    CancelEdit,
    RequestDelete,
    ConfirmDelete,
    UploadPhoto { image: CroppedImage },
    RequestPhotoDelete { file_id: String },
    ConfirmPhotoDelete,
    DismissPrompt,
}

/// A question the user has to answer before anything destructive happens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Prompt {
    Exit,
    DeleteRecord { id: String, name: String },
    DeletePhoto { file_id: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    SessionChanged {
        phase: AuthPhase,
        account: Option<String>,
    },
    SignInRequired,
    StoreReady { records: usize },
    ViewChanged { view: View },
    SearchResults {
        query: String,
        items: Vec<CustomerRecord>,
    },
    RecordOpened { record: CustomerRecord },
    EditStarted { record: CustomerRecord },
    RecordCreated { record: CustomerRecord },
    RecordUpdated { record: CustomerRecord },
    RecordDeleted { id: String, degraded: bool },
    Photos {
        folder_ref: Option<String>,
        photos: Vec<PhotoFile>,
    },
    PhotoUploaded { file_id: String, folder_ref: String },
    PhotoDeleted { file_id: String },
    ConfirmationRequested { prompt: Prompt },
    PromptDismissed,
    Exited,
    Notice { message: String },
    Error { message: String },
}
