//! Configuration loading from environment variables.

use crate::constants::{
    DEFAULT_PHOTO_FOLDER_NAME, DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_STORE_NAME, STATE_FILE_NAME,
};
use serde::Deserialize;
use std::env;
use std::path::PathBuf;

/// Runtime configuration for clienttrack.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub state_path: String,
    pub store_name: String,
    pub photo_folder_name: String,
    pub request_timeout_secs: u64,
    pub offline: bool,
}

/// Expand tilde (~) in paths to the user's home directory
fn expand_tilde(path: String) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = resolve_home_dir() {
            return home.join(rest).to_string_lossy().to_string();
        }
    }
    path
}

fn resolve_home_dir() -> Option<PathBuf> {
    if let Ok(home) = env::var("HOME") {
        if !home.trim().is_empty() {
            return Some(PathBuf::from(home));
        }
    }

    // Windows USERPROFILE
    if let Ok(profile) = env::var("USERPROFILE") {
        if !profile.trim().is_empty() {
            return Some(PathBuf::from(profile));
        }
    }

    std::env::current_dir().ok()
}

/// Parse a boolean-like environment flag value.
///
/// # Supported Values
/// - Truthy: `1`, `true`, `yes`, `on`
/// - Falsy: `0`, `false`, `no`, `off`, empty string
///
/// Matching is case-insensitive and ignores surrounding whitespace.
///
/// # Returns
/// `Some(bool)` when the value is recognized, otherwise `None`.
pub fn parse_env_flag(value: &str) -> Option<bool> {
    let normalized = value.trim().to_ascii_lowercase();
    match normalized.as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "" | "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Read a boolean flag from the environment.
///
/// Missing or unrecognized values are treated as `false`.
pub fn env_flag_enabled(name: &str) -> bool {
    env::var(name)
        .ok()
        .and_then(|value| parse_env_flag(&value))
        .unwrap_or(false)
}

fn non_blank_env(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Returns
    /// A populated [`Config`] with defaults applied when env vars are missing.
    pub fn from_env() -> Self {
        Self {
            state_path: non_blank_env("CLIENTTRACK_STATE_PATH")
                .map(expand_tilde)
                .unwrap_or_else(|| {
                    let home = resolve_home_dir().unwrap_or_else(|| PathBuf::from("."));
                    home.join(".cache")
                        .join("clienttrack")
                        .join(STATE_FILE_NAME)
                        .to_string_lossy()
                        .to_string()
                }),
            store_name: non_blank_env("CLIENTTRACK_STORE_NAME")
                .unwrap_or_else(|| DEFAULT_STORE_NAME.to_string()),
            photo_folder_name: non_blank_env("CLIENTTRACK_PHOTO_FOLDER")
                .unwrap_or_else(|| DEFAULT_PHOTO_FOLDER_NAME.to_string()),
            request_timeout_secs: env::var("CLIENTTRACK_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|secs| *secs > 0)
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
            offline: env_flag_enabled("CLIENTTRACK_OFFLINE"),
        }
    }
}
