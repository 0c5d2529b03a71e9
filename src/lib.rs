//! Interactive line-oriented host for clienttrack.

/// Backend wiring and line execution.
pub mod host;
/// Command parsing and event rendering.
pub mod shell;

pub use host::{Flow, Host};
