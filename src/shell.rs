//! Line parsing and event rendering for the interactive host.

use anyhow::{bail, Result};
use clienttrack_core::app::{AppCommand, AppEvent, Prompt};
use clienttrack_core::models::CustomerRecord;
use clienttrack_core::navigation::View;
use clienttrack_core::session::AuthPhase;
use std::path::PathBuf;

pub const HELP: &str = "\
Commands:
  start                      resume the last session (runs automatically)
  signin | signout
  token <access-token>       offer an access token for the next sign-in
  go <search|add|details|edit|settings>
  back                       in-app back
  popstate                   browser back on the simulated page history
  leave | stay               answer the exit prompt
  search [text]              filter by ID, name or phone
  refresh
  open <id>
  add <id> | <name> | <phone>
  edit                       start editing the open customer
  save <name> | <phone>      submit the edit
  cancel                     abandon the edit
  delete                     ask to delete the open customer
  upload <path>              upload a cropped image for the open customer
  rmphoto <file-id>          ask to delete a photo
  yes | no                   answer the pending confirmation
  help | quit";

/// One parsed input line.
#[derive(Debug)]
pub enum ShellLine {
    Command(AppCommand),
    /// Read the file at `path` and upload it.
    Upload(PathBuf),
    Token(String),
    Help,
    Quit,
    Empty,
}

fn pipe_fields<const N: usize>(rest: &str, usage: &str) -> Result<[String; N]> {
    let fields: Vec<String> = rest.split('|').map(|part| part.trim().to_string()).collect();
    match <[String; N]>::try_from(fields) {
        Ok(fields) => Ok(fields),
        Err(_) => bail!("usage: {}", usage),
    }
}

fn required<'a>(rest: &'a str, usage: &str) -> Result<&'a str> {
    if rest.is_empty() {
        bail!("usage: {}", usage);
    }
    Ok(rest)
}

/// Parse one input line.
///
/// `yes` confirms whatever `pending` is; without a pending prompt it is an
/// error the app reports itself.
pub fn parse_line(line: &str, pending: Option<&Prompt>) -> Result<ShellLine> {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    let command = match word.to_ascii_lowercase().as_str() {
        "" => return Ok(ShellLine::Empty),
        "help" | "?" => return Ok(ShellLine::Help),
        "quit" | "exit" => return Ok(ShellLine::Quit),
        "token" => return Ok(ShellLine::Token(required(rest, "token <access-token>")?.to_string())),
        "upload" => return Ok(ShellLine::Upload(PathBuf::from(required(rest, "upload <path>")?))),
        "start" => AppCommand::Start,
        "signin" => AppCommand::SignIn,
        "signout" => AppCommand::SignOut,
        "go" => AppCommand::Navigate {
            view: View::parse(required(rest, "go <view>")?),
        },
        // The host owns a simulated page history, so a browser back is the
        // same history move as an in-app back; `HistoryPopped` is reserved for
        // hosts whose history moves outside the app.
        "back" | "popstate" => AppCommand::Back,
        "leave" => AppCommand::ConfirmExit,
        "stay" => AppCommand::CancelExit,
        "search" => AppCommand::Search {
            query: rest.to_string(),
        },
        "refresh" => AppCommand::Refresh,
        "open" => AppCommand::Open {
            id: required(rest, "open <id>")?.to_string(),
        },
        "add" => {
            let [id, name, phone] = pipe_fields::<3>(rest, "add <id> | <name> | <phone>")?;
            AppCommand::Create { id, name, phone }
        }
        "edit" => AppCommand::BeginEdit,
        "save" => {
            let [name, phone] = pipe_fields::<2>(rest, "save <name> | <phone>")?;
            AppCommand::SubmitEdit { name, phone }
        }
        "cancel" => AppCommand::CancelEdit,
        "delete" => AppCommand::RequestDelete,
        "rmphoto" => AppCommand::RequestPhotoDelete {
            file_id: required(rest, "rmphoto <file-id>")?.to_string(),
        },
        "yes" => match pending {
            Some(Prompt::Exit) => AppCommand::ConfirmExit,
            Some(Prompt::DeletePhoto { .. }) => AppCommand::ConfirmPhotoDelete,
            Some(Prompt::DeleteRecord { .. }) | None => AppCommand::ConfirmDelete,
        },
        "no" => match pending {
            Some(Prompt::Exit) => AppCommand::CancelExit,
            _ => AppCommand::DismissPrompt,
        },
        other => bail!("unknown command '{}' (try 'help')", other),
    };
    Ok(ShellLine::Command(command))
}

fn record_line(record: &CustomerRecord) -> String {
    let folder = if record.folder_ref.is_some() { " [photos]" } else { "" };
    format!(
        "{:<10} {:<24} {:<16} {}{}",
        record.id, record.name, record.phone, record.created_on, folder
    )
}

/// Render one event for the terminal.
pub fn render_event(event: &AppEvent) -> String {
    match event {
        AppEvent::SessionChanged { phase, account } => match (phase, account) {
            (AuthPhase::Authenticated, Some(account)) => format!("signed in as {}", account),
            (AuthPhase::Authenticated, None) => "signed in".to_string(),
            (AuthPhase::Authenticating, _) => "signing in...".to_string(),
            (AuthPhase::Unauthenticated, _) => "signed out".to_string(),
        },
        AppEvent::SignInRequired => "sign in required (use 'signin')".to_string(),
        AppEvent::StoreReady { records } => format!("customer database ready ({} records)", records),
        AppEvent::ViewChanged { view } => format!("-- {} --", view),
        AppEvent::SearchResults { query, items } => {
            let mut out = if query.is_empty() {
                format!("{} customers", items.len())
            } else {
                format!("{} matches for '{}'", items.len(), query)
            };
            for record in items {
                out.push_str("\n  ");
                out.push_str(&record_line(record));
            }
            out
        }
        AppEvent::RecordOpened { record } => format!(
            "customer {}\n  name:    {}\n  phone:   {}\n  created: {}",
            record.id, record.name, record.phone, record.created_on
        ),
        AppEvent::EditStarted { record } => {
            format!("editing {} (save <name> | <phone>)", record.id)
        }
        AppEvent::RecordCreated { record } => format!("added {}", record.id),
        AppEvent::RecordUpdated { record } => format!("updated {}", record.id),
        AppEvent::RecordDeleted { id, degraded } => {
            if *degraded {
                format!("deleted {} (row cleared, not removed)", id)
            } else {
                format!("deleted {}", id)
            }
        }
        AppEvent::Photos { folder_ref, photos } => match folder_ref {
            None => "no photos yet".to_string(),
            Some(_) if photos.is_empty() => "no photos yet".to_string(),
            Some(_) => {
                let mut out = format!("{} photos", photos.len());
                for photo in photos {
                    out.push_str(&format!("\n  {} {}", photo.id, photo.name));
                    if let Some(link) = photo.full_size_link() {
                        out.push_str(&format!(" <{}>", link));
                    }
                }
                out
            }
        },
        AppEvent::PhotoUploaded { file_id, .. } => format!("uploaded photo {}", file_id),
        AppEvent::PhotoDeleted { file_id } => format!("deleted photo {}", file_id),
        AppEvent::ConfirmationRequested { prompt } => match prompt {
            Prompt::Exit => "leave the app? (leave/stay)".to_string(),
            Prompt::DeleteRecord { id, name } => {
                format!("delete customer {} ({}) and their photos? (yes/no)", id, name)
            }
            Prompt::DeletePhoto { file_id } => format!("delete photo {}? (yes/no)", file_id),
        },
        AppEvent::PromptDismissed => "cancelled".to_string(),
        AppEvent::Exited => "bye".to_string(),
        AppEvent::Notice { message } => message.clone(),
        AppEvent::Error { message } => format!("error: {}", message),
    }
}
