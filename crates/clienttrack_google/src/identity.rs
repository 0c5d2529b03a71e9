//! Identity provider backed by externally supplied access tokens.
//!
//! The browser consent flow lives outside this process; the host offers the
//! token it obtained (flag, environment, or pasted at the prompt) and this
//! provider hands it to the session manager.

use crate::client::GoogleClient;
use crate::wire::{api_url, status_error, UserInfo};
use async_trait::async_trait;
use clienttrack_core::constants::USERINFO_URL;
use clienttrack_core::error::{AuthFailure, RemoteError, RemoteResult};
use clienttrack_core::remote::{AccessToken, IdentityProvider, TokenGrant};
use std::sync::{Mutex, PoisonError};
use tracing::debug;

#[derive(Debug)]
pub struct TokenIdentity {
    http: reqwest::Client,
    userinfo_url: String,
    offered: Mutex<Option<TokenGrant>>,
}

impl TokenIdentity {
    pub fn new(client: &GoogleClient) -> Self {
        Self {
            http: client.http.clone(),
            userinfo_url: USERINFO_URL.to_string(),
            offered: Mutex::new(None),
        }
    }

    /// Make `token` available to the next sign-in or resume.
    pub fn offer(&self, token: AccessToken, expires_in: Option<u64>) {
        *self.offered.lock().unwrap_or_else(PoisonError::into_inner) =
            Some(TokenGrant { token, expires_in });
    }

    /// Drop the offered token, e.g. after sign-out.
    pub fn revoke(&self) {
        *self.offered.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }

    fn current(&self) -> Option<TokenGrant> {
        self.offered
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl IdentityProvider for TokenIdentity {
    async fn acquire_interactive(&self) -> Result<TokenGrant, AuthFailure> {
        self.current().ok_or_else(|| {
            AuthFailure::Provider(
                "no access token available; pass --token or set CLIENTTRACK_ACCESS_TOKEN"
                    .to_string(),
            )
        })
    }

    async fn acquire_silent(&self, login_hint: Option<&str>) -> Result<TokenGrant, AuthFailure> {
        debug!("silent token request (hint present: {})", login_hint.is_some());
        self.current().ok_or(AuthFailure::LoginRequired)
    }

    async fn account_email(&self, token: &AccessToken) -> RemoteResult<Option<String>> {
        let url = api_url(&self.userinfo_url, &[])?;
        let response = self
            .http
            .get(url)
            .bearer_auth(token.secret())
            .send()
            .await
            .map_err(|err| RemoteError::Transport(err.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, &body));
        }
        let info: UserInfo = response
            .json()
            .await
            .map_err(|err| RemoteError::Decode(err.to_string()))?;
        Ok(info.email.filter(|email| !email.trim().is_empty()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clienttrack_core::remote::CredentialSlot;
    use std::time::Duration;

    fn identity() -> TokenIdentity {
        let client = GoogleClient::new(CredentialSlot::new(), Duration::from_secs(5)).expect("client");
        TokenIdentity::new(&client)
    }

    #[tokio::test]
    async fn without_an_offer_silent_asks_for_login_and_interactive_fails() {
        let identity = identity();
        assert_eq!(
            identity.acquire_silent(Some("a@b.c")).await.unwrap_err(),
            AuthFailure::LoginRequired
        );
        assert!(matches!(
            identity.acquire_interactive().await,
            Err(AuthFailure::Provider(_))
        ));
    }

    #[tokio::test]
    async fn offered_tokens_are_granted_until_revoked() {
        let identity = identity();
        identity.offer(AccessToken::new("tok"), Some(120));
        let grant = identity.acquire_interactive().await.expect("grant");
        assert_eq!(grant.token.secret(), "tok");
        assert_eq!(grant.expires_in, Some(120));
        assert!(identity.acquire_silent(None).await.is_ok());

        identity.revoke();
        assert!(identity.acquire_silent(None).await.unwrap_err().needs_prompt());
    }
}
