//! Wires the app to its backends and runs parsed shell lines against it.

use crate::shell::{render_event, ShellLine, HELP};
use anyhow::{Context, Result};
use clienttrack_core::app::{App, AppCommand, Backends};
use clienttrack_core::models::CroppedImage;
use clienttrack_core::navigation::SimulatedHistory;
use clienttrack_core::persist::{MemoryState, RedbState, StateStore};
use clienttrack_core::remote::{AccessToken, CredentialSlot};
use clienttrack_core::Config;
use clienttrack_google::{GoogleClient, TokenIdentity};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// What the caller should do after a line ran.
#[derive(Debug, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct Host {
    app: App<SimulatedHistory>,
    /// Present when talking to Google.
    tokens: Option<Arc<TokenIdentity>>,
}

fn open_state(config: &Config) -> Result<Arc<dyn StateStore>> {
    if config.offline {
        return Ok(Arc::new(MemoryState::new()));
    }
    let state = RedbState::open(&config.state_path)
        .with_context(|| format!("failed to open state file {}", config.state_path))?;
    Ok(Arc::new(state))
}

impl Host {
    /// Build the app for `config`, offering `token` to the identity provider.
    ///
    /// # Errors
    /// Fails when the state file or HTTP client cannot be set up.
    pub fn build(config: &Config, token: Option<String>) -> Result<Self> {
        let state = open_state(config)?;
        let (backends, tokens) = if config.offline {
            info!("offline mode: using simulated remote services");
            (Backends::in_memory(state), None)
        } else {
            let credentials = CredentialSlot::new();
            let client = GoogleClient::new(
                credentials.clone(),
                Duration::from_secs(config.request_timeout_secs),
            )
            .context("failed to build HTTP client")?;
            let identity = Arc::new(TokenIdentity::new(&client));
            if let Some(token) = token.filter(|token| !token.trim().is_empty()) {
                identity.offer(AccessToken::new(token.trim()), None);
            }
            let client = Arc::new(client);
            let backends = Backends {
                tabular: client.clone(),
                blobs: client,
                identity: identity.clone(),
                state,
                credentials,
            };
            (backends, Some(identity))
        };
        let app = App::new(config, backends, SimulatedHistory::new())?;
        Ok(Self { app, tokens })
    }

    pub fn app(&self) -> &App<SimulatedHistory> {
        &self.app
    }

    async fn run_command(&mut self, command: AppCommand) -> Vec<String> {
        let signing_out = matches!(command, AppCommand::SignOut);
        let output: Vec<String> = self
            .app
            .handle(command)
            .await
            .iter()
            .map(render_event)
            .collect();
        if signing_out {
            if let Some(tokens) = &self.tokens {
                tokens.revoke();
            }
        }
        output
    }

    /// Run one parsed line, returning the text to print.
    ///
    /// # Errors
    /// Fails only for host-level problems such as an unreadable upload file.
    pub async fn execute(&mut self, line: ShellLine) -> Result<(Vec<String>, Flow)> {
        let output = match line {
            ShellLine::Empty => Vec::new(),
            ShellLine::Help => vec![HELP.to_string()],
            ShellLine::Quit => return Ok((Vec::new(), Flow::Quit)),
            ShellLine::Token(token) => match &self.tokens {
                Some(tokens) => {
                    tokens.offer(AccessToken::new(token), None);
                    vec!["token stored; use 'signin'".to_string()]
                }
                None => vec!["offline mode does not use access tokens".to_string()],
            },
            ShellLine::Upload(path) => {
                let bytes = tokio::fs::read(&path)
                    .await
                    .with_context(|| format!("failed to read {}", path.display()))?;
                let filename = path
                    .file_name()
                    .map(|name| name.to_string_lossy().to_string())
                    .unwrap_or_default();
                let image = CroppedImage::new(bytes, &filename);
                self.run_command(AppCommand::UploadPhoto { image }).await
            }
            ShellLine::Command(command) => self.run_command(command).await,
        };
        let flow = if self.app.has_exited() {
            Flow::Quit
        } else {
            Flow::Continue
        };
        Ok((output, flow))
    }
}
