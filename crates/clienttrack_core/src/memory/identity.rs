//! In-memory [`IdentityProvider`].

use super::lock;
use crate::error::{AuthFailure, RemoteError, RemoteResult};
use crate::remote::{AccessToken, IdentityProvider, TokenGrant};
use async_trait::async_trait;
use std::sync::Mutex;

#[derive(Debug)]
struct Inner {
    interactive_failure: Option<AuthFailure>,
    silent_failure: Option<AuthFailure>,
    email: Result<Option<String>, RemoteError>,
    expires_in: Option<u64>,
    issued: usize,
    silent_hints: Vec<Option<String>>,
}

/// Identity provider that grants tokens unless told otherwise.
#[derive(Debug)]
pub struct MemoryIdentity {
    inner: Mutex<Inner>,
}

impl Default for MemoryIdentity {
    fn default() -> Self {
        Self::new("owner@example.com")
    }
}

impl MemoryIdentity {
    /// Provider whose account reports `email`.
    pub fn new(email: &str) -> Self {
        Self {
            inner: Mutex::new(Inner {
                interactive_failure: None,
                silent_failure: None,
                email: Ok(Some(email.to_string())),
                expires_in: Some(3_600),
                issued: 0,
                silent_hints: Vec::new(),
            }),
        }
    }

    pub fn fail_interactive(&self, failure: Option<AuthFailure>) {
        lock(&self.inner).interactive_failure = failure;
    }

    pub fn fail_silent(&self, failure: Option<AuthFailure>) {
        lock(&self.inner).silent_failure = failure;
    }

    pub fn set_email_lookup(&self, result: Result<Option<String>, RemoteError>) {
        lock(&self.inner).email = result;
    }

    pub fn set_expires_in(&self, expires_in: Option<u64>) {
        lock(&self.inner).expires_in = expires_in;
    }

    /// Hints passed to each silent attempt, in order.
    pub fn silent_hints(&self) -> Vec<Option<String>> {
        lock(&self.inner).silent_hints.clone()
    }

    /// Number of tokens handed out so far.
    pub fn issued(&self) -> usize {
        lock(&self.inner).issued
    }
}

fn grant(inner: &mut Inner) -> TokenGrant {
    inner.issued += 1;
    TokenGrant {
        token: AccessToken::new(format!("memory-token-{}", inner.issued)),
        expires_in: inner.expires_in,
    }
}

#[async_trait]
impl IdentityProvider for MemoryIdentity {
    async fn acquire_interactive(&self) -> Result<TokenGrant, AuthFailure> {
        let mut inner = lock(&self.inner);
        match inner.interactive_failure.clone() {
            Some(failure) => Err(failure),
            None => Ok(grant(&mut inner)),
        }
    }

    async fn acquire_silent(&self, login_hint: Option<&str>) -> Result<TokenGrant, AuthFailure> {
        let mut inner = lock(&self.inner);
        inner.silent_hints.push(login_hint.map(str::to_string));
        match inner.silent_failure.clone() {
            Some(failure) => Err(failure),
            None => Ok(grant(&mut inner)),
        }
    }

    async fn account_email(&self, _token: &AccessToken) -> RemoteResult<Option<String>> {
        lock(&self.inner).email.clone()
    }
}
