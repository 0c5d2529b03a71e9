//! Google Drive files API behind [`BlobStore`].

use crate::client::GoogleClient;
use crate::wire::{api_url, children_query, named_query, CreatedFile, FileList};
use async_trait::async_trait;
use clienttrack_core::constants::FOLDER_MIME_TYPE;
use clienttrack_core::error::{RemoteError, RemoteResult};
use clienttrack_core::models::{CroppedImage, PhotoFile};
use clienttrack_core::remote::BlobStore;
use reqwest::multipart::{Form, Part};
use serde_json::json;
use tracing::{debug, info};

const CHILD_FIELDS: &str = "nextPageToken,files(id,name,thumbnailLink,webContentLink)";

#[async_trait]
impl BlobStore for GoogleClient {
    async fn find_folder(&self, name: &str) -> RemoteResult<Option<String>> {
        let query = named_query(name, FOLDER_MIME_TYPE);
        let list: FileList = self
            .send_json(
                self.http
                    .get(self.drive_url(&[])?)
                    .query(&[("q", query.as_str()), ("fields", "files(id)"), ("pageSize", "1")]),
            )
            .await?;
        Ok(list.files.into_iter().next().map(|file| file.id))
    }

    async fn create_folder(&self, name: &str, parent: Option<&str>) -> RemoteResult<String> {
        let mut body = json!({ "name": name, "mimeType": FOLDER_MIME_TYPE });
        if let Some(parent) = parent {
            body["parents"] = json!([parent]);
        }
        let created: CreatedFile = self
            .send_json(
                self.http
                    .post(self.drive_url(&[])?)
                    .query(&[("fields", "id")])
                    .json(&body),
            )
            .await?;
        info!("created folder '{}' ({})", name, created.id);
        Ok(created.id)
    }

    async fn list_children(&self, folder: &str) -> RemoteResult<Vec<PhotoFile>> {
        let query = children_query(folder);
        let mut photos = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let mut request = self
                .http
                .get(self.drive_url(&[])?)
                .query(&[("q", query.as_str()), ("fields", CHILD_FIELDS)]);
            if let Some(token) = page_token.as_deref() {
                request = request.query(&[("pageToken", token)]);
            }
            let page: FileList = self.send_json(request).await?;
            photos.extend(page.files.into_iter().map(PhotoFile::from));
            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }
        debug!("folder {} holds {} files", folder, photos.len());
        Ok(photos)
    }

    async fn upload_file(&self, folder: &str, image: &CroppedImage) -> RemoteResult<String> {
        let metadata = json!({ "name": image.filename, "parents": [folder] });
        let metadata = Part::text(metadata.to_string())
            .mime_str("application/json; charset=UTF-8")
            .map_err(|err| RemoteError::Transport(err.to_string()))?;
        let file = Part::bytes(image.bytes.clone())
            .file_name(image.filename.clone())
            .mime_str(image.mime_type())
            .map_err(|err| RemoteError::Transport(err.to_string()))?;
        let form = Form::new().part("metadata", metadata).part("file", file);

        let url = api_url(&self.endpoints.upload, &[])?;
        let created: CreatedFile = self
            .send_json(
                self.http
                    .post(url)
                    .query(&[("uploadType", "multipart"), ("fields", "id")])
                    .multipart(form),
            )
            .await?;
        info!("uploaded '{}' as {}", image.filename, created.id);
        Ok(created.id)
    }

    async fn delete_file(&self, file_id: &str) -> RemoteResult<()> {
        self.send(self.http.delete(self.drive_url(&[file_id])?)).await?;
        Ok(())
    }

    async fn trash_folder(&self, folder_id: &str) -> RemoteResult<()> {
        self.send(
            self.http
                .patch(self.drive_url(&[folder_id])?)
                .json(&json!({ "trashed": true })),
        )
        .await?;
        Ok(())
    }
}
