//! Photo lifecycle: per-customer folders, uploads, listing and deletion.

use crate::error::{AppError, RemoteError};
use crate::models::{normalize_id, CroppedImage, PhotoFile};
use crate::persist::{PersistKey, StateStore};
use crate::records::RecordController;
use crate::remote::BlobStore;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Where an uploaded photo ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReceipt {
    pub folder_ref: String,
    pub file_id: String,
    /// Whether the customer's folder was provisioned by this upload.
    pub created_folder: bool,
}

/// A photo deletion the user has been asked to confirm.
///
/// Only [`PhotoController::request_photo_delete`] hands these out, so a
/// delete cannot skip the confirmation step.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "a pending delete does nothing until confirmed"]
pub struct PendingPhotoDelete {
    file_id: String,
    folder_ref: Option<String>,
}

impl PendingPhotoDelete {
    pub fn file_id(&self) -> &str {
        &self.file_id
    }

    /// Folder to re-list once the file is gone.
    pub fn folder_ref(&self) -> Option<&str> {
        self.folder_ref.as_deref()
    }
}

/// Manages customer photo folders in the blob store.
pub struct PhotoController {
    blobs: Arc<dyn BlobStore>,
    state: Arc<dyn StateStore>,
    master_folder_name: String,
}

impl PhotoController {
    pub fn new(
        blobs: Arc<dyn BlobStore>,
        state: Arc<dyn StateStore>,
        master_folder_name: impl Into<String>,
    ) -> Self {
        Self {
            blobs,
            state,
            master_folder_name: master_folder_name.into(),
        }
    }

    /// Photos inside `folder_ref`. A customer without a folder has none.
    pub async fn list_photos(&self, folder_ref: Option<&str>) -> Result<Vec<PhotoFile>, AppError> {
        let Some(folder) = folder_ref.filter(|folder| !folder.trim().is_empty()) else {
            return Ok(Vec::new());
        };
        let files = self.blobs.list_children(folder).await?;
        debug!("listed {} photos in {}", files.len(), folder);
        Ok(files)
    }

    /// Upload an already cropped image for a customer.
    ///
    /// A customer without a folder gets one first: the shared master folder
    /// is resolved (or created), a `"{id} - {name}"` subfolder is created
    /// under it, and its reference is written to the record before any bytes
    /// are uploaded. A folder created here survives a failed upload and is
    /// reused by the next attempt.
    ///
    /// # Errors
    /// - [`AppError::InvalidInput`] for an empty image.
    /// - [`AppError::RecordNotFound`] when the customer is not cached.
    /// - [`AppError::AuthRequired`] when the credential was rejected.
    /// - [`AppError::UploadFailed`] for any other failure along the way.
    pub async fn upload_photo(
        &mut self,
        records: &mut RecordController,
        record_id: &str,
        image: CroppedImage,
    ) -> Result<UploadReceipt, AppError> {
        if image.bytes.is_empty() {
            return Err(AppError::InvalidInput("cropped image is empty".to_string()));
        }
        let id = normalize_id(record_id);
        let record = records
            .cache()
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::RecordNotFound(id.clone()))?;

        let (folder_ref, created_folder) = match record.folder_ref.clone() {
            Some(folder) => (folder, false),
            None => {
                let folder = self
                    .create_customer_folder(&record.folder_display_name())
                    .await
                    .map_err(upload_failed)?;
                records
                    .assign_folder(&id, &folder)
                    .await
                    .map_err(upload_failed)?;
                info!("created photo folder {} for customer {}", folder, id);
                (folder, true)
            }
        };

        let file_id = self
            .blobs
            .upload_file(&folder_ref, &image)
            .await
            .map_err(|err| upload_failed(err.into()))?;
        info!(
            "uploaded {} ({} bytes) for customer {}",
            image.filename,
            image.bytes.len(),
            id
        );
        Ok(UploadReceipt {
            folder_ref,
            file_id,
            created_folder,
        })
    }

    /// Ask for confirmation before deleting a photo.
    pub fn request_photo_delete(
        &self,
        file_id: &str,
        folder_ref: Option<&str>,
    ) -> Result<PendingPhotoDelete, AppError> {
        let file_id = file_id.trim();
        if file_id.is_empty() {
            return Err(AppError::InvalidInput("photo id must not be blank".to_string()));
        }
        Ok(PendingPhotoDelete {
            file_id: file_id.to_string(),
            folder_ref: folder_ref.map(str::to_string),
        })
    }

    /// Permanently delete a confirmed photo. Re-list the folder afterwards.
    pub async fn delete_photo(&self, pending: PendingPhotoDelete) -> Result<(), AppError> {
        self.blobs.delete_file(&pending.file_id).await?;
        info!("deleted photo {}", pending.file_id);
        Ok(())
    }

    /// Create a customer subfolder under the master folder.
    ///
    /// A persisted master folder id that no longer resolves is forgotten and
    /// the master folder resolved again once.
    async fn create_customer_folder(&self, name: &str) -> Result<String, AppError> {
        let master = self.master_folder().await?;
        match self.blobs.create_folder(name, Some(&master)).await {
            Err(RemoteError::NotFound(what)) => {
                warn!("master photo folder {} is gone ({}), resolving again", master, what);
                self.state.remove(PersistKey::MasterFolder)?;
                let master = self.master_folder().await?;
                Ok(self.blobs.create_folder(name, Some(&master)).await?)
            }
            other => Ok(other?),
        }
    }

    /// Shared parent of all customer folders: persisted id, else found by
    /// name, else created. The resolved id is persisted.
    async fn master_folder(&self) -> Result<String, AppError> {
        if let Some(id) = self.state.get(PersistKey::MasterFolder)? {
            return Ok(id);
        }
        let id = match self.blobs.find_folder(&self.master_folder_name).await? {
            Some(existing) => existing,
            None => {
                info!("creating master photo folder '{}'", self.master_folder_name);
                self.blobs
                    .create_folder(&self.master_folder_name, None)
                    .await?
            }
        };
        self.state.set(PersistKey::MasterFolder, &id)?;
        Ok(id)
    }
}

fn upload_failed(err: AppError) -> AppError {
    match err {
        AppError::AuthRequired | AppError::UploadFailed(_) => err,
        other => AppError::UploadFailed(other.to_string()),
    }
}
