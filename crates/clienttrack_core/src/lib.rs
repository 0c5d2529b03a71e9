//! Core domain library for clienttrack (records, photos, session, navigation).

/// Top-level application state object and its command/event protocol.
pub mod app;
/// Local record cache and search index.
pub mod cache;
/// Configuration loading and defaults.
pub mod config;
/// Shared constants (store names, header layout, session timings).
pub mod constants;
/// Process-global environment mutation helpers.
pub mod env;
/// Application error types.
pub mod error;
/// In-memory backends for tests and offline mode.
pub mod memory;
/// Data models for records and photos.
pub mod models;
/// Navigation state machine over a browser-style history stack.
pub mod navigation;
/// Persisted key/value state surviving restarts.
pub mod persist;
/// Photo lifecycle controller.
pub mod photos;
/// Record lifecycle controller.
pub mod records;
/// Remote store and identity provider traits.
pub mod remote;
/// Session manager.
pub mod session;

#[cfg(test)]
pub(crate) mod test_support;

pub use app::{App, AppCommand, AppEvent};
pub use config::Config;
pub use constants::*;
pub use error::AppError;
