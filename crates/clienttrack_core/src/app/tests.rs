use super::*;
use crate::error::RemoteError;
use crate::memory::{BlobOp, TabularOp};
use crate::navigation::SimulatedHistory;
use crate::persist::PersistKey;
use crate::session::AuthPhase;
use crate::test_support::Fixture;

const ALICE: &[&str] = &["A1", "Alice", "0700 111", "", "01/01/2026"];
const BOB: &[&str] = &["B2", "Bob", "0700 222", "", "02/01/2026"];

fn result_ids(events: &[AppEvent]) -> Option<Vec<String>> {
    events.iter().rev().find_map(|event| match event {
        AppEvent::SearchResults { items, .. } => {
            Some(items.iter().map(|record| record.id.clone()).collect())
        }
        _ => None,
    })
}

fn errors(events: &[AppEvent]) -> Vec<&str> {
    events
        .iter()
        .filter_map(|event| match event {
            AppEvent::Error { message } => Some(message.as_str()),
            _ => None,
        })
        .collect()
}

async fn signed_in(fx: &Fixture) -> App<SimulatedHistory> {
    let mut app = fx.app();
    app.handle(AppCommand::Start).await;
    let events = app.handle(AppCommand::SignIn).await;
    assert!(errors(&events).is_empty(), "{:?}", events);
    app
}

fn create(id: &str, name: &str) -> AppCommand {
    AppCommand::Create {
        id: id.to_string(),
        name: name.to_string(),
        phone: "0123".to_string(),
    }
}

fn open(id: &str) -> AppCommand {
    AppCommand::Open { id: id.to_string() }
}

#[tokio::test]
async fn start_without_saved_session_asks_to_sign_in() {
    let fx = Fixture::new();
    let mut app = fx.app();

    let events = app.handle(AppCommand::Start).await;

    assert_eq!(
        events,
        vec![
            AppEvent::ViewChanged { view: View::Search },
            AppEvent::SignInRequired
        ]
    );
    assert_eq!(
        app.navigation().history().entries(),
        &[None, Some(View::Search)]
    );
    assert_eq!(fx.tabular.calls(TabularOp::Find), 0);
}

#[tokio::test]
async fn record_commands_require_a_session() {
    let fx = Fixture::new();
    let mut app = fx.app();
    app.handle(AppCommand::Start).await;

    for cmd in [
        AppCommand::Search {
            query: String::new(),
        },
        AppCommand::Refresh,
        create("A1", "Alice"),
        open("A1"),
    ] {
        let events = app.handle(cmd).await;
        assert_eq!(errors(&events), vec!["Sign in required"]);
    }
    assert_eq!(fx.tabular.calls(TabularOp::Read), 0);
    assert_eq!(fx.tabular.calls(TabularOp::Append), 0);
}

#[tokio::test]
async fn sign_in_provisions_the_store() {
    let fx = Fixture::new();
    let mut app = fx.app();
    app.handle(AppCommand::Start).await;

    let events = app.handle(AppCommand::SignIn).await;

    assert_eq!(
        events,
        vec![
            AppEvent::SessionChanged {
                phase: AuthPhase::Authenticated,
                account: Some("owner@example.com".to_string()),
            },
            AppEvent::StoreReady { records: 0 },
            AppEvent::SearchResults {
                query: String::new(),
                items: Vec::new(),
            },
        ]
    );
    assert_eq!(fx.tabular.store_ids().len(), 1);
    assert!(fx.persisted(PersistKey::StoreLocator).is_some());
}

#[tokio::test]
async fn start_resumes_saved_session_and_lists_newest_first() {
    let fx = Fixture::new();
    fx.seed_known_store(&[ALICE, BOB]);
    fx.state.set(PersistKey::LoggedIn, "true").expect("flag");
    let mut app = fx.app();

    let events = app.handle(AppCommand::Start).await;

    assert!(events.contains(&AppEvent::StoreReady { records: 2 }), "{:?}", events);
    assert_eq!(result_ids(&events), Some(vec!["B2".to_string(), "A1".to_string()]));
    assert!(app.session().is_authenticated());
}

#[tokio::test]
async fn create_returns_to_search_with_fresh_results() {
    let fx = Fixture::new();
    let mut app = signed_in(&fx).await;
    app.handle(AppCommand::Navigate { view: View::Add }).await;

    let events = app.handle(create(" c3 ", "Carla")).await;

    assert!(matches!(
        &events[0],
        AppEvent::RecordCreated { record } if record.id == "C3"
    ));
    assert!(events.contains(&AppEvent::ViewChanged { view: View::Search }));
    assert_eq!(result_ids(&events), Some(vec!["C3".to_string()]));

    let events = app.handle(create("C3", "Someone")).await;
    assert_eq!(errors(&events), vec!["Customer ID \"C3\" already exists"]);
    assert_eq!(fx.tabular.calls(TabularOp::Append), 1);
}

#[tokio::test]
async fn search_filters_the_cache() {
    let fx = Fixture::new();
    let mut app = signed_in(&fx).await;
    app.handle(create("A1", "Alice")).await;
    app.handle(create("B2", "Bob")).await;

    let events = app
        .handle(AppCommand::Search {
            query: "ALI".to_string(),
        })
        .await;

    assert_eq!(result_ids(&events), Some(vec!["A1".to_string()]));
    assert_eq!(app.query(), "ALI");
}

#[tokio::test]
async fn open_shows_details_and_empty_photo_list() {
    let fx = Fixture::new();
    let mut app = signed_in(&fx).await;
    app.handle(create("A1", "Alice")).await;

    let events = app.handle(open("a1")).await;

    assert_eq!(events[0], AppEvent::ViewChanged { view: View::Details });
    assert!(matches!(&events[1], AppEvent::RecordOpened { record } if record.name == "Alice"));
    assert_eq!(
        events[2],
        AppEvent::Photos {
            folder_ref: None,
            photos: Vec::new()
        }
    );
    assert_eq!(app.selected().map(|record| record.id.as_str()), Some("A1"));

    let events = app.handle(open("nobody")).await;
    assert_eq!(errors(&events), vec!["Customer NOBODY not found in database"]);
}

#[tokio::test]
async fn edit_flow_updates_record_and_results() {
    let fx = Fixture::new();
    let mut app = signed_in(&fx).await;
    app.handle(create("A1", "Alice")).await;
    app.handle(open("A1")).await;

    let events = app
        .handle(AppCommand::SubmitEdit {
            name: "x".to_string(),
            phone: "y".to_string(),
        })
        .await;
    assert_eq!(errors(&events), vec!["Invalid input: no edit in progress"]);

    let events = app.handle(AppCommand::BeginEdit).await;
    assert_eq!(events[0], AppEvent::ViewChanged { view: View::Edit });
    assert!(app.is_editing());

    let events = app
        .handle(AppCommand::SubmitEdit {
            name: "Alicia".to_string(),
            phone: "0999".to_string(),
        })
        .await;

    assert!(matches!(
        &events[0],
        AppEvent::RecordUpdated { record } if record.name == "Alicia" && record.phone == "0999"
    ));
    assert!(events.contains(&AppEvent::ViewChanged { view: View::Details }));
    assert!(!app.is_editing());
    assert_eq!(app.selected().map(|record| record.name.as_str()), Some("Alicia"));
}

#[tokio::test]
async fn delete_needs_confirmation() {
    let fx = Fixture::new();
    let mut app = signed_in(&fx).await;
    app.handle(create("A1", "Alice")).await;
    app.handle(create("B2", "Bob")).await;
    app.handle(open("A1")).await;

    let events = app.handle(AppCommand::ConfirmDelete).await;
    assert_eq!(errors(&events).len(), 1);

    let events = app.handle(AppCommand::RequestDelete).await;
    let prompt = Prompt::DeleteRecord {
        id: "A1".to_string(),
        name: "Alice".to_string(),
    };
    assert_eq!(
        events,
        vec![AppEvent::ConfirmationRequested {
            prompt: prompt.clone()
        }]
    );
    assert_eq!(app.pending_prompt(), Some(prompt));
    assert_eq!(fx.tabular.calls(TabularOp::DeleteRows), 0);

    let events = app.handle(AppCommand::ConfirmDelete).await;

    assert_eq!(
        events[0],
        AppEvent::RecordDeleted {
            id: "A1".to_string(),
            degraded: false
        }
    );
    assert_eq!(result_ids(&events), Some(vec!["B2".to_string()]));
    assert!(app.selected().is_none());
    assert_eq!(app.pending_prompt(), None);
}

#[tokio::test]
async fn dismissed_prompt_cannot_be_confirmed() {
    let fx = Fixture::new();
    let mut app = signed_in(&fx).await;
    app.handle(create("A1", "Alice")).await;
    app.handle(open("A1")).await;
    app.handle(AppCommand::RequestDelete).await;

    assert_eq!(
        app.handle(AppCommand::DismissPrompt).await,
        vec![AppEvent::PromptDismissed]
    );
    let events = app.handle(AppCommand::ConfirmDelete).await;
    assert_eq!(errors(&events).len(), 1);
    assert_eq!(app.records().cache().len(), 1);
}

#[tokio::test]
async fn photo_upload_and_delete_round() {
    let fx = Fixture::new();
    let mut app = signed_in(&fx).await;
    app.handle(create("A1", "Alice")).await;
    app.handle(open("A1")).await;

    let events = app
        .handle(AppCommand::UploadPhoto {
            image: CroppedImage::new(vec![1, 2, 3], "front.png"),
        })
        .await;

    let folder = app
        .selected()
        .and_then(|record| record.folder_ref.clone())
        .expect("folder assigned");
    assert!(matches!(&events[0], AppEvent::RecordUpdated { record } if record.folder_ref.as_deref() == Some(folder.as_str())));
    let file_id = events
        .iter()
        .find_map(|event| match event {
            AppEvent::PhotoUploaded { file_id, .. } => Some(file_id.clone()),
            _ => None,
        })
        .expect("uploaded");
    assert!(matches!(
        events.last(),
        Some(AppEvent::Photos { photos, .. }) if photos.len() == 1
    ));

    let events = app
        .handle(AppCommand::RequestPhotoDelete {
            file_id: file_id.clone(),
        })
        .await;
    assert_eq!(
        events,
        vec![AppEvent::ConfirmationRequested {
            prompt: Prompt::DeletePhoto {
                file_id: file_id.clone()
            }
        }]
    );
    assert_eq!(fx.blobs.calls(BlobOp::Delete), 0);

    let events = app.handle(AppCommand::ConfirmPhotoDelete).await;
    assert_eq!(
        events,
        vec![
            AppEvent::PhotoDeleted { file_id },
            AppEvent::Photos {
                folder_ref: Some(folder),
                photos: Vec::new()
            }
        ]
    );
}

#[tokio::test]
async fn back_past_home_prompts_and_cancel_restores() {
    let fx = Fixture::new();
    let mut app = signed_in(&fx).await;

    let events = app.handle(AppCommand::Back).await;
    assert_eq!(
        events,
        vec![AppEvent::ConfirmationRequested {
            prompt: Prompt::Exit
        }]
    );
    assert_eq!(app.pending_prompt(), Some(Prompt::Exit));

    let events = app.handle(AppCommand::CancelExit).await;
    assert_eq!(events, vec![AppEvent::ViewChanged { view: View::Search }]);
    assert_eq!(
        app.navigation().history().entries(),
        &[None, Some(View::Search)]
    );

    app.handle(AppCommand::Back).await;
    let events = app.handle(AppCommand::ConfirmExit).await;
    assert_eq!(events, vec![AppEvent::Exited]);
    assert!(app.has_exited());
    assert!(app.navigation().history().has_left());
}

#[tokio::test]
async fn history_pop_with_state_replays_view() {
    let fx = Fixture::new();
    let mut app = signed_in(&fx).await;
    app.handle(AppCommand::Navigate { view: View::Settings }).await;

    let events = app
        .handle(AppCommand::HistoryPopped {
            state: Some(View::Search),
        })
        .await;

    assert_eq!(events, vec![AppEvent::ViewChanged { view: View::Search }]);
    assert_eq!(app.navigation().history().entries().len(), 3);
}

#[tokio::test]
async fn rejected_credential_signs_the_user_out() {
    let fx = Fixture::new();
    let mut app = signed_in(&fx).await;
    fx.tabular.fail_once(TabularOp::Read, RemoteError::Unauthorized);

    let events = app.handle(AppCommand::Refresh).await;

    assert_eq!(
        events,
        vec![
            AppEvent::Error {
                message: "Sign in required".to_string()
            },
            AppEvent::SessionChanged {
                phase: AuthPhase::Unauthenticated,
                account: Some("owner@example.com".to_string()),
            },
            AppEvent::SignInRequired,
        ]
    );
    assert!(fx.credentials.current().is_none());
}

#[tokio::test]
async fn refresh_recovers_from_a_deleted_store() {
    let fx = Fixture::new();
    let mut app = signed_in(&fx).await;
    app.handle(create("A1", "Alice")).await;
    let old = fx.persisted(PersistKey::StoreLocator).expect("locator");
    fx.tabular.drop_store(&old);

    let events = app.handle(AppCommand::Refresh).await;

    assert!(errors(&events).is_empty(), "{:?}", events);
    assert!(events.contains(&AppEvent::StoreReady { records: 0 }));
    assert_ne!(fx.persisted(PersistKey::StoreLocator), Some(old));
}

#[tokio::test]
async fn sign_out_clears_selection_and_session() {
    let fx = Fixture::new();
    let mut app = signed_in(&fx).await;
    app.handle(create("A1", "Alice")).await;
    app.handle(open("A1")).await;

    let events = app.handle(AppCommand::SignOut).await;

    assert_eq!(
        events,
        vec![
            AppEvent::SessionChanged {
                phase: AuthPhase::Unauthenticated,
                account: None,
            },
            AppEvent::SignInRequired,
        ]
    );
    assert!(app.selected().is_none());
    assert_eq!(fx.persisted(PersistKey::LoggedIn), None);
}
