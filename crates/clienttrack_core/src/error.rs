//! Application error types for record, photo, and session logic.
use thiserror::Error;

/// Failure reported by a remote adapter (tabular store, blob store, identity).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    /// The addressed store, folder, or file does not exist remotely.
    #[error("Remote resource not found: {0}")]
    NotFound(String),

    #[error("Remote rejected the credential")]
    Unauthorized,

    #[error("Remote request failed ({status}): {message}")]
    Status { status: u16, message: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Unexpected remote response: {0}")]
    Decode(String),
}

/// Result alias for adapter calls.
pub type RemoteResult<T> = Result<T, RemoteError>;

/// Why the identity provider could not hand out a credential.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthFailure {
    /// A silent attempt needs the user to interact (consent, account choice).
    #[error("User interaction required")]
    InteractionRequired,

    /// No signed-in account is available for a silent attempt.
    #[error("Login required")]
    LoginRequired,

    #[error("Identity provider error: {0}")]
    Provider(String),
}

impl AuthFailure {
    /// Whether the failure only means "ask the user to sign in".
    pub fn needs_prompt(&self) -> bool {
        matches!(self, Self::InteractionRequired | Self::LoginRequired)
    }
}

/// Top-level application error type.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Sign in required")]
    AuthRequired,

    /// The backing store is still missing after one rediscovery attempt.
    #[error("Customer database could not be found or recreated")]
    StoreNotFound,

    #[error("Customer {0} not found in database")]
    RecordNotFound(String),

    #[error("Customer ID \"{0}\" already exists")]
    DuplicateIdentifier(String),

    #[error("Remote operation failed: {0}")]
    RemoteOperationFailed(String),

    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Nothing awaiting confirmation: {0}")]
    Confirmation(String),

    #[error("Local state error: {0}")]
    Persist(#[from] redb::Error),
}

impl From<RemoteError> for AppError {
    fn from(value: RemoteError) -> Self {
        match value {
            RemoteError::Unauthorized => Self::AuthRequired,
            other => Self::RemoteOperationFailed(other.to_string()),
        }
    }
}

impl From<redb::DatabaseError> for AppError {
    fn from(value: redb::DatabaseError) -> Self {
        Self::Persist(value.into())
    }
}

impl From<redb::TransactionError> for AppError {
    fn from(value: redb::TransactionError) -> Self {
        Self::Persist(value.into())
    }
}

impl From<redb::TableError> for AppError {
    fn from(value: redb::TableError) -> Self {
        Self::Persist(value.into())
    }
}

impl From<redb::StorageError> for AppError {
    fn from(value: redb::StorageError) -> Self {
        Self::Persist(value.into())
    }
}

impl From<redb::CommitError> for AppError {
    fn from(value: redb::CommitError) -> Self {
        Self::Persist(value.into())
    }
}
