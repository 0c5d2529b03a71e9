//! Authenticated HTTP plumbing shared by the Sheets and Drive adapters.

use crate::wire::{api_url, status_error};
use clienttrack_core::constants::{DRIVE_API_BASE, DRIVE_UPLOAD_BASE, SHEETS_API_BASE};
use clienttrack_core::error::{RemoteError, RemoteResult};
use clienttrack_core::remote::CredentialSlot;
use reqwest::{RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

/// Base URLs of the Google APIs in use.
#[derive(Debug, Clone)]
pub struct Endpoints {
    pub sheets: String,
    pub drive: String,
    pub upload: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            sheets: SHEETS_API_BASE.to_string(),
            drive: DRIVE_API_BASE.to_string(),
            upload: DRIVE_UPLOAD_BASE.to_string(),
        }
    }
}

/// Google Sheets and Drive client.
///
/// Implements [`clienttrack_core::remote::TabularStore`] and
/// [`clienttrack_core::remote::BlobStore`]. Every request is signed with the
/// token currently held by the shared [`CredentialSlot`].
#[derive(Debug, Clone)]
pub struct GoogleClient {
    pub(crate) http: reqwest::Client,
    credentials: CredentialSlot,
    pub(crate) endpoints: Endpoints,
}

impl GoogleClient {
    /// # Errors
    /// Returns [`RemoteError::Transport`] when the HTTP client cannot be built.
    pub fn new(credentials: CredentialSlot, timeout: Duration) -> RemoteResult<Self> {
        Self::with_endpoints(credentials, timeout, Endpoints::default())
    }

    pub fn with_endpoints(
        credentials: CredentialSlot,
        timeout: Duration,
        endpoints: Endpoints,
    ) -> RemoteResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| RemoteError::Transport(err.to_string()))?;
        Ok(Self {
            http,
            credentials,
            endpoints,
        })
    }

    pub(crate) fn sheets_url(&self, segments: &[&str]) -> RemoteResult<Url> {
        api_url(&self.endpoints.sheets, segments)
    }

    pub(crate) fn drive_url(&self, segments: &[&str]) -> RemoteResult<Url> {
        api_url(&self.endpoints.drive, segments)
    }

    /// Sign and send `request`, turning error statuses into [`RemoteError`].
    pub(crate) async fn send(&self, request: RequestBuilder) -> RemoteResult<Response> {
        let token = self.credentials.current().ok_or(RemoteError::Unauthorized)?;
        let request = request
            .bearer_auth(token.secret())
            .build()
            .map_err(|err| RemoteError::Transport(err.to_string()))?;
        debug!("{} {}", request.method(), request.url().path());

        let response = self
            .http
            .execute(request)
            .await
            .map_err(|err| RemoteError::Transport(err.to_string()))?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = match response.text().await {
            Ok(body) => body,
            Err(err) => format!("failed to read error response body: {}", err),
        };
        Err(status_error(status, &body))
    }

    /// [`Self::send`] and decode the JSON body.
    pub(crate) async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> RemoteResult<T> {
        self.send(request)
            .await?
            .json::<T>()
            .await
            .map_err(|err| RemoteError::Decode(err.to_string()))
    }
}
