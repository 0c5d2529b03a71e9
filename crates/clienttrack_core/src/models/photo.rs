//! Photo models exchanged with the blob store.

use crate::constants::{DEFAULT_PHOTO_FILENAME, FULL_SIZE_THUMBNAIL_EDGE};
use serde::{Deserialize, Serialize};

/// A photo file inside a customer's folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoFile {
    pub id: String,
    pub name: String,
    pub thumbnail_link: Option<String>,
    pub content_link: Option<String>,
}

impl PhotoFile {
    /// Link to a large rendition of the photo.
    ///
    /// Thumbnail links carry a `=s<edge>` size suffix which is widened to the
    /// full-size edge; without a thumbnail the raw content link is used.
    pub fn full_size_link(&self) -> Option<String> {
        match self.thumbnail_link.as_deref() {
            Some(link) => Some(widen_size_suffix(link, FULL_SIZE_THUMBNAIL_EDGE)),
            None => self.content_link.clone(),
        }
    }
}

fn widen_size_suffix(link: &str, edge: u32) -> String {
    let bytes = link.as_bytes();
    let mut search_from = 0;
    while let Some(offset) = link[search_from..].find("=s") {
        let start = search_from + offset;
        let digits_start = start + 2;
        let digits_end = bytes[digits_start..]
            .iter()
            .position(|b| !b.is_ascii_digit())
            .map_or(bytes.len(), |len| digits_start + len);
        if digits_end > digits_start {
            return format!("{}=s{}{}", &link[..start], edge, &link[digits_end..]);
        }
        search_from = digits_start;
    }
    link.to_string()
}

/// A cropped image handed over by the cropping widget, ready to upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CroppedImage {
    pub bytes: Vec<u8>,
    pub filename: String,
}

impl CroppedImage {
    /// Wrap cropped bytes, falling back to the default filename when blank.
    pub fn new(bytes: Vec<u8>, filename: &str) -> Self {
        let filename = filename.trim();
        Self {
            bytes,
            filename: if filename.is_empty() {
                DEFAULT_PHOTO_FILENAME.to_string()
            } else {
                filename.to_string()
            },
        }
    }

    /// MIME type inferred from the filename extension.
    pub fn mime_type(&self) -> &'static str {
        let extension = self
            .filename
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();
        match extension.as_str() {
            "jpg" | "jpeg" => "image/jpeg",
            "png" => "image/png",
            "webp" => "image/webp",
            "gif" => "image/gif",
            "heic" => "image/heic",
            _ => "application/octet-stream",
        }
    }
}
