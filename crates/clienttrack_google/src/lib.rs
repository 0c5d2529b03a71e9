//! Google Sheets, Drive and userinfo adapters for `clienttrack_core`.

/// Signed request plumbing and endpoint configuration.
pub mod client;
mod drive;
/// Token-based identity provider.
pub mod identity;
mod sheets;
mod wire;

#[cfg(test)]
mod stub;

pub use client::{Endpoints, GoogleClient};
pub use identity::TokenIdentity;
