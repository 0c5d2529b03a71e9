//! Remote store and identity provider seams.
//!
//! Controllers only talk to the outside world through these traits. The
//! Google adapters and the in-memory backends in [`crate::memory`] implement
//! them.

mod range;

pub use range::{column_letters, A1Range, CellRef};

use crate::error::{AuthFailure, RemoteResult};
use crate::models::{CroppedImage, PhotoFile};
use async_trait::async_trait;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

/// How the tabular store should interpret written cell values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueInput {
    /// Stored verbatim.
    Raw,
    /// Parsed as if typed by a user (numbers, dates).
    UserEntered,
}

/// Sheet metadata entry of a tabular store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetProperties {
    /// Numeric sheet id. Some backends omit it for the first sheet.
    pub sheet_id: Option<i64>,
    pub title: String,
}

/// Tabular remote store (a spreadsheet with one customer sheet).
///
/// A `NotFound` error from any call taking a `store` id means the store
/// itself is gone.
#[async_trait]
pub trait TabularStore: Send + Sync {
    /// Find a non-trashed store by exact name.
    async fn find_store(&self, name: &str) -> RemoteResult<Option<String>>;

    /// Create a store with one sheet and write `header` into its first row.
    async fn create_store(
        &self,
        name: &str,
        sheet_title: &str,
        header: &[String],
    ) -> RemoteResult<String>;

    /// Read a range. Trailing empty cells and rows may be omitted.
    async fn read_range(&self, store: &str, range: &A1Range) -> RemoteResult<Vec<Vec<String>>>;

    /// Append one row after the last non-empty row of `range`.
    async fn append_row(
        &self,
        store: &str,
        range: &A1Range,
        row: &[String],
        input: ValueInput,
    ) -> RemoteResult<()>;

    /// Overwrite the cells of `range` with `values`.
    async fn update_range(
        &self,
        store: &str,
        range: &A1Range,
        values: &[Vec<String>],
        input: ValueInput,
    ) -> RemoteResult<()>;

    /// Blank the cells of `range` without shifting rows.
    async fn clear_range(&self, store: &str, range: &A1Range) -> RemoteResult<()>;

    /// Structurally delete rows `start..end` (zero-based, end exclusive).
    async fn delete_rows(&self, store: &str, sheet_id: i64, start: u32, end: u32)
        -> RemoteResult<()>;

    async fn sheet_metadata(&self, store: &str) -> RemoteResult<Vec<SheetProperties>>;
}

/// Hierarchical remote file store holding photo folders.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Find a non-trashed folder by exact name.
    async fn find_folder(&self, name: &str) -> RemoteResult<Option<String>>;

    async fn create_folder(&self, name: &str, parent: Option<&str>) -> RemoteResult<String>;

    /// List non-trashed files directly inside `folder`.
    async fn list_children(&self, folder: &str) -> RemoteResult<Vec<PhotoFile>>;

    /// Upload `image` into `folder`, returning the new file id.
    async fn upload_file(&self, folder: &str, image: &CroppedImage) -> RemoteResult<String>;

    /// Permanently delete a file.
    async fn delete_file(&self, file_id: &str) -> RemoteResult<()>;

    /// Move a folder to the trash.
    async fn trash_folder(&self, folder_id: &str) -> RemoteResult<()>;
}

/// Opaque bearer credential. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn secret(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(<redacted>)")
    }
}

/// Credential handed out by the identity provider.
#[derive(Debug, Clone)]
pub struct TokenGrant {
    pub token: AccessToken,
    /// Lifetime in seconds, when the provider reports one.
    pub expires_in: Option<u64>,
}

/// Identity provider issuing access credentials.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Acquire a credential, prompting the user if needed.
    async fn acquire_interactive(&self) -> Result<TokenGrant, AuthFailure>;

    /// Acquire a credential without any prompt, hinting the expected account.
    async fn acquire_silent(&self, login_hint: Option<&str>) -> Result<TokenGrant, AuthFailure>;

    /// Look up the email of the account owning `token`.
    async fn account_email(&self, token: &AccessToken) -> RemoteResult<Option<String>>;
}

/// Shared holder of the current credential.
///
/// The session manager writes it; remote adapters read it per request.
#[derive(Clone, Default)]
pub struct CredentialSlot {
    inner: Arc<RwLock<Option<AccessToken>>>,
}

impl CredentialSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, token: AccessToken) {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = Some(token);
    }

    pub fn clear(&self) {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    pub fn current(&self) -> Option<AccessToken> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl fmt::Debug for CredentialSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialSlot")
            .field("present", &self.current().is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a1_ranges_render_like_the_sheets_api_expects() {
        assert_eq!(A1Range::cell("Customers", 3, 7).to_string(), "Customers!D7");
        assert_eq!(
            A1Range::row_span("Customers", 1, 2, 12).to_string(),
            "Customers!B12:C12"
        );
        assert_eq!(A1Range::columns("Customers", 0, 0).to_string(), "Customers!A:A");
        assert_eq!(
            A1Range::rows_from("Customers", 0, 4, 2).to_string(),
            "Customers!A2:E"
        );
    }

    #[test]
    fn column_letters_roll_over_past_z() {
        assert_eq!(column_letters(0), "A");
        assert_eq!(column_letters(25), "Z");
        assert_eq!(column_letters(26), "AA");
        assert_eq!(column_letters(27), "AB");
        assert_eq!(column_letters(701), "ZZ");
        assert_eq!(column_letters(702), "AAA");
    }

    #[test]
    fn range_bounds_cover_single_cells_and_open_ranges() {
        let cell = A1Range::cell("S", 3, 9);
        assert_eq!(cell.col_bounds(), (3, 3));
        assert_eq!(cell.row_bounds(), (9, Some(9)));

        let open = A1Range::rows_from("S", 0, 4, 2);
        assert_eq!(open.col_bounds(), (0, 4));
        assert_eq!(open.row_bounds(), (2, None));

        let columns = A1Range::columns("S", 0, 0);
        assert_eq!(columns.row_bounds(), (1, None));
    }

    #[test]
    fn credential_slot_is_shared_between_clones() {
        let slot = CredentialSlot::new();
        let reader = slot.clone();
        slot.set(AccessToken::new("abc"));
        assert_eq!(reader.current().map(|t| t.secret().to_string()), Some("abc".to_string()));
        assert_eq!(format!("{:?}", AccessToken::new("abc")), "AccessToken(<redacted>)");
        slot.clear();
        assert!(reader.current().is_none());
    }
}
