//! Authentication state and the persisted hints that let a session resume
//! without prompting.

use crate::constants::{DEFAULT_TOKEN_LIFETIME_SECS, TOKEN_EXPIRY_BUFFER_SECS};
use crate::error::{AppError, AuthFailure};
use crate::persist::{PersistKey, StateStore};
use crate::remote::{CredentialSlot, IdentityProvider, TokenGrant};
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, warn};

const LOGGED_IN: &str = "true";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthPhase {
    Unauthenticated,
    Authenticating,
    Authenticated,
}

/// What [`SessionManager::resume`] achieved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResumeOutcome {
    /// A fresh credential was obtained silently.
    Resumed,
    /// Nobody was signed in last time.
    NoSavedSession,
    /// The provider wants the user to sign in again; hints were cleared.
    SignInRequired,
}

pub struct SessionManager {
    identity: Arc<dyn IdentityProvider>,
    state: Arc<dyn StateStore>,
    credentials: CredentialSlot,
    phase: AuthPhase,
    account_email: Option<String>,
    expires_at: Option<i64>,
}

impl SessionManager {
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        state: Arc<dyn StateStore>,
        credentials: CredentialSlot,
    ) -> Self {
        Self {
            identity,
            state,
            credentials,
            phase: AuthPhase::Unauthenticated,
            account_email: None,
            expires_at: None,
        }
    }

    pub fn phase(&self) -> AuthPhase {
        self.phase
    }

    pub fn is_authenticated(&self) -> bool {
        self.phase == AuthPhase::Authenticated
    }

    /// Account email of the current session, once known.
    pub fn account_email(&self) -> Option<&str> {
        self.account_email.as_deref()
    }

    /// Unix time after which the credential should be considered stale.
    pub fn expiry_estimate(&self) -> Option<i64> {
        self.expires_at
    }

    /// Fail with [`AppError::AuthRequired`] unless signed in.
    pub fn require_auth(&self) -> Result<(), AppError> {
        if self.is_authenticated() {
            Ok(())
        } else {
            Err(AppError::AuthRequired)
        }
    }

    /// Restore the previous session silently if one was recorded.
    ///
    /// # Errors
    /// Provider failures other than "sign in needed" are returned as
    /// [`AppError::RemoteOperationFailed`]; the hints are kept so a later
    /// start can try again.
    pub async fn resume(&mut self) -> Result<ResumeOutcome, AppError> {
        let logged_in = self.state.get(PersistKey::LoggedIn)?;
        if logged_in.as_deref() != Some(LOGGED_IN) {
            return Ok(ResumeOutcome::NoSavedSession);
        }
        let hint = self.state.get(PersistKey::AccountEmail)?;
        info!("restoring previous session");
        self.phase = AuthPhase::Authenticating;

        match self.identity.acquire_silent(hint.as_deref()).await {
            Ok(grant) => {
                self.complete(grant).await?;
                Ok(ResumeOutcome::Resumed)
            }
            Err(failure) if failure.needs_prompt() => {
                warn!("silent sign in refused ({}), sign in required", failure);
                self.phase = AuthPhase::Unauthenticated;
                self.clear_hints()?;
                Ok(ResumeOutcome::SignInRequired)
            }
            Err(failure) => {
                self.phase = AuthPhase::Unauthenticated;
                Err(auth_error(failure))
            }
        }
    }

    /// Interactive sign in.
    pub async fn sign_in(&mut self) -> Result<(), AppError> {
        self.phase = AuthPhase::Authenticating;
        match self.identity.acquire_interactive().await {
            Ok(grant) => self.complete(grant).await,
            Err(failure) => {
                warn!("sign in failed: {}", failure);
                self.phase = AuthPhase::Unauthenticated;
                Err(auth_error(failure))
            }
        }
    }

    /// Forget the session and every persisted hint.
    pub fn logout(&mut self) -> Result<(), AppError> {
        self.credentials.clear();
        self.phase = AuthPhase::Unauthenticated;
        self.account_email = None;
        self.expires_at = None;
        self.clear_hints()?;
        info!("signed out");
        Ok(())
    }

    /// Drop the in-memory credential after the remote rejected it.
    ///
    /// Persisted hints stay, so the next start can resume silently.
    pub fn invalidate(&mut self) {
        if self.phase != AuthPhase::Unauthenticated {
            warn!("credential rejected, sign in required");
        }
        self.credentials.clear();
        self.phase = AuthPhase::Unauthenticated;
    }

    async fn complete(&mut self, grant: TokenGrant) -> Result<(), AppError> {
        let lifetime = grant.expires_in.unwrap_or(DEFAULT_TOKEN_LIFETIME_SECS);
        let expires_at = Utc::now().timestamp() + lifetime as i64 - TOKEN_EXPIRY_BUFFER_SECS as i64;

        self.credentials.set(grant.token.clone());
        self.phase = AuthPhase::Authenticated;
        self.expires_at = Some(expires_at);
        self.state
            .set(PersistKey::TokenExpiry, &expires_at.to_string())?;
        self.state.set(PersistKey::LoggedIn, LOGGED_IN)?;

        match self.identity.account_email(&grant.token).await {
            Ok(Some(email)) => {
                self.state.set(PersistKey::AccountEmail, &email)?;
                info!("signed in as {}", email);
                self.account_email = Some(email);
            }
            Ok(None) => debug!("identity provider returned no account email"),
            Err(err) => warn!("could not fetch account email: {}", err),
        }
        Ok(())
    }

    fn clear_hints(&self) -> Result<(), AppError> {
        self.state.remove(PersistKey::LoggedIn)?;
        self.state.remove(PersistKey::TokenExpiry)?;
        self.state.remove(PersistKey::AccountEmail)?;
        Ok(())
    }
}

fn auth_error(failure: AuthFailure) -> AppError {
    match failure {
        AuthFailure::InteractionRequired | AuthFailure::LoginRequired => AppError::AuthRequired,
        AuthFailure::Provider(message) => AppError::RemoteOperationFailed(message),
    }
}
