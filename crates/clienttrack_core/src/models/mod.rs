//! Data models for customer records and photos.

/// Photo file and upload payload models.
pub mod photo;
/// Customer record model and row codec.
pub mod record;

pub use photo::{CroppedImage, PhotoFile};
pub use record::{normalize_id, CustomerRecord};
