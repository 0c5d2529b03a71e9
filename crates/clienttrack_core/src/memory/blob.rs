//! In-memory [`BlobStore`].

use super::{lock, FaultPlan};
use crate::error::{RemoteError, RemoteResult};
use crate::models::{CroppedImage, PhotoFile};
use crate::remote::BlobStore;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

/// Operations of [`MemoryBlob`] that can be counted or failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlobOp {
    FindFolder,
    CreateFolder,
    List,
    Upload,
    Delete,
    Trash,
}

#[derive(Debug, Clone)]
struct Entry {
    name: String,
    parent: Option<String>,
    is_folder: bool,
    trashed: bool,
    size: usize,
}

#[derive(Debug, Default)]
struct Inner {
    entries: HashMap<String, Entry>,
    order: Vec<String>,
    faults: FaultPlan<BlobOp>,
}

/// Folder/file store kept in memory.
#[derive(Debug, Default)]
pub struct MemoryBlob {
    inner: Mutex<Inner>,
}

impl Inner {
    fn insert(&mut self, prefix: &str, entry: Entry) -> String {
        let id = format!("{}-{}", prefix, Uuid::new_v4());
        self.entries.insert(id.clone(), entry);
        self.order.push(id.clone());
        id
    }

    fn live_folder(&self, id: &str) -> RemoteResult<&Entry> {
        match self.entries.get(id) {
            Some(entry) if entry.is_folder && !entry.trashed => Ok(entry),
            _ => Err(RemoteError::NotFound(format!("folder {}", id))),
        }
    }
}

impl MemoryBlob {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a folder directly, bypassing fault injection.
    pub fn seed_folder(&self, name: &str, parent: Option<&str>) -> String {
        lock(&self.inner).insert(
            "folder",
            Entry {
                name: name.to_string(),
                parent: parent.map(str::to_string),
                is_folder: true,
                trashed: false,
                size: 0,
            },
        )
    }

    /// Name and parent of a folder, if it exists (trashed or not).
    pub fn folder(&self, id: &str) -> Option<(String, Option<String>)> {
        lock(&self.inner)
            .entries
            .get(id)
            .filter(|entry| entry.is_folder)
            .map(|entry| (entry.name.clone(), entry.parent.clone()))
    }

    /// Names of the live files inside `folder`, in upload order.
    pub fn file_names(&self, folder: &str) -> Vec<String> {
        let inner = lock(&self.inner);
        inner
            .order
            .iter()
            .filter_map(|id| inner.entries.get(id))
            .filter(|entry| !entry.is_folder && !entry.trashed)
            .filter(|entry| entry.parent.as_deref() == Some(folder))
            .map(|entry| entry.name.clone())
            .collect()
    }

    pub fn is_trashed(&self, id: &str) -> bool {
        lock(&self.inner)
            .entries
            .get(id)
            .is_some_and(|entry| entry.trashed)
    }

    pub fn folder_count(&self) -> usize {
        lock(&self.inner)
            .entries
            .values()
            .filter(|entry| entry.is_folder)
            .count()
    }

    pub fn fail_once(&self, op: BlobOp, err: RemoteError) {
        lock(&self.inner).faults.fail_once(op, err);
    }

    pub fn fail_always(&self, op: BlobOp, err: RemoteError) {
        lock(&self.inner).faults.fail_always(op, err);
    }

    pub fn heal(&self, op: BlobOp) {
        lock(&self.inner).faults.heal(op);
    }

    pub fn calls(&self, op: BlobOp) -> usize {
        lock(&self.inner).faults.calls(op)
    }
}

#[async_trait]
impl BlobStore for MemoryBlob {
    async fn find_folder(&self, name: &str) -> RemoteResult<Option<String>> {
        let mut inner = lock(&self.inner);
        inner.faults.enter(BlobOp::FindFolder)?;
        let found = inner
            .order
            .iter()
            .find(|id| {
                inner
                    .entries
                    .get(*id)
                    .is_some_and(|entry| entry.is_folder && !entry.trashed && entry.name == name)
            })
            .cloned();
        Ok(found)
    }

    async fn create_folder(&self, name: &str, parent: Option<&str>) -> RemoteResult<String> {
        let mut inner = lock(&self.inner);
        inner.faults.enter(BlobOp::CreateFolder)?;
        if let Some(parent) = parent {
            inner.live_folder(parent)?;
        }
        Ok(inner.insert(
            "folder",
            Entry {
                name: name.to_string(),
                parent: parent.map(str::to_string),
                is_folder: true,
                trashed: false,
                size: 0,
            },
        ))
    }

    async fn list_children(&self, folder: &str) -> RemoteResult<Vec<PhotoFile>> {
        let mut inner = lock(&self.inner);
        inner.faults.enter(BlobOp::List)?;
        inner.live_folder(folder)?;
        let files = inner
            .order
            .iter()
            .filter_map(|id| inner.entries.get(id).map(|entry| (id, entry)))
            .filter(|(_, entry)| !entry.trashed && entry.parent.as_deref() == Some(folder))
            .map(|(id, entry)| PhotoFile {
                id: id.clone(),
                name: entry.name.clone(),
                thumbnail_link: (!entry.is_folder)
                    .then(|| format!("memory://thumbnails/{}=s220", id)),
                content_link: Some(format!("memory://files/{}?bytes={}", id, entry.size)),
            })
            .collect();
        Ok(files)
    }

    async fn upload_file(&self, folder: &str, image: &CroppedImage) -> RemoteResult<String> {
        let mut inner = lock(&self.inner);
        inner.faults.enter(BlobOp::Upload)?;
        inner.live_folder(folder)?;
        Ok(inner.insert(
            "file",
            Entry {
                name: image.filename.clone(),
                parent: Some(folder.to_string()),
                is_folder: false,
                trashed: false,
                size: image.bytes.len(),
            },
        ))
    }

    async fn delete_file(&self, file_id: &str) -> RemoteResult<()> {
        let mut inner = lock(&self.inner);
        inner.faults.enter(BlobOp::Delete)?;
        if inner.entries.remove(file_id).is_none() {
            return Err(RemoteError::NotFound(format!("file {}", file_id)));
        }
        inner.order.retain(|id| id != file_id);
        Ok(())
    }

    async fn trash_folder(&self, folder_id: &str) -> RemoteResult<()> {
        let mut inner = lock(&self.inner);
        inner.faults.enter(BlobOp::Trash)?;
        match inner.entries.get_mut(folder_id) {
            Some(entry) if entry.is_folder => {
                entry.trashed = true;
                Ok(())
            }
            _ => Err(RemoteError::NotFound(format!("folder {}", folder_id))),
        }
    }
}
