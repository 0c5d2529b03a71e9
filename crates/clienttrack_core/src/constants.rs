//! Shared constants used across clienttrack crates.

/// Default spreadsheet name searched for (and created) on first run.
pub const DEFAULT_STORE_NAME: &str = "CustomerTrackerDB";

/// Title of the sheet holding customer rows.
pub const SHEET_TITLE: &str = "Customers";

/// Fixed header row written when the store is created.
pub const HEADER_ROW: [&str; 5] = [
    "Identifier",
    "Name",
    "Phone",
    "PhotoFolderReference",
    "DateCreated",
];

/// Default name of the shared parent folder for customer photo folders.
pub const DEFAULT_PHOTO_FOLDER_NAME: &str = "Customer Photos";

/// Filename used when an upload arrives without one.
pub const DEFAULT_PHOTO_FILENAME: &str = "photo.jpg";

/// Token lifetime assumed when the identity provider omits `expires_in`.
pub const DEFAULT_TOKEN_LIFETIME_SECS: u64 = 3_599;

/// Safety margin subtracted from token lifetimes before persisting expiry.
pub const TOKEN_EXPIRY_BUFFER_SECS: u64 = 5 * 60;

/// Default request timeout for remote adapters.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Size suffix requested when expanding a thumbnail link to full size.
pub const FULL_SIZE_THUMBNAIL_EDGE: u32 = 2_000;

/// File name for the redb state file within the configured directory.
pub const STATE_FILE_NAME: &str = "state.redb";

/// Sheets v4 spreadsheets collection.
pub const SHEETS_API_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets";

/// Drive v3 files collection.
pub const DRIVE_API_BASE: &str = "https://www.googleapis.com/drive/v3/files";

/// Drive v3 media upload endpoint.
pub const DRIVE_UPLOAD_BASE: &str = "https://www.googleapis.com/upload/drive/v3/files";

/// OAuth profile lookup used for the account email hint.
pub const USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v3/userinfo";

pub const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";

pub const SPREADSHEET_MIME_TYPE: &str = "application/vnd.google-apps.spreadsheet";
