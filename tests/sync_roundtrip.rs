// HttpSyncClient against a live in-process server

use std::sync::Arc;

use deadline_lib::api::{ApiServer, DocumentStore};
use deadline_lib::app::AppState;
use deadline_lib::error::SyncError;
use deadline_lib::models::{Category, Priority, Snapshot, Task};
use deadline_lib::render::LogRenderer;
use deadline_lib::storage::LocalSnapshotStore;
use deadline_lib::sync::{HttpSyncClient, RemoteSync};
use pretty_assertions::assert_eq;

async fn start_server() -> (ApiServer, Arc<DocumentStore>, HttpSyncClient) {
    let store = Arc::new(DocumentStore::memory());
    let server = ApiServer::new(store.clone(), Vec::new());
    let address = server.start("127.0.0.1:0").await.unwrap();
    let client = HttpSyncClient::new(format!("http://{address}/api"));
    (server, store, client)
}

#[tokio::test]
async fn push_fetch_delete_roundtrip() {
    let (server, _, client) = start_server().await;
    let tasks = vec![
        Task::new("Essay", Category::Study, Priority::High),
        Task::new("Gym", Category::Personal, Priority::Low),
    ];

    assert_eq!(client.fetch("42").await.unwrap(), Snapshot::new());

    client.push("42", "2024-06-01", &tasks).await.unwrap();
    let fetched = client.fetch("42").await.unwrap();
    assert_eq!(fetched["2024-06-01"], tasks);

    client.delete("42", "2024-06-01").await.unwrap();
    assert!(client.fetch("42").await.unwrap().is_empty());

    server.stop().await;
}

#[tokio::test]
async fn server_empty_days_are_pruned_on_fetch() {
    let (server, store, client) = start_server().await;
    store.put("42", "2024-06-01", Vec::new()).unwrap();

    assert!(client.fetch("42").await.unwrap().is_empty());
    server.stop().await;
}

#[tokio::test]
async fn session_reconciles_with_server_and_pushes_edits() {
    let (server, store, client) = start_server().await;
    store
        .put("42", "2024-06-02", vec![Task::new("From server", Category::Work, Priority::Medium)])
        .unwrap();

    let mut state = AppState::load(
        LocalSnapshotStore::in_memory(),
        client,
        Some("42".to_string()),
        Box::new(LogRenderer),
    )
    .await;
    assert_eq!(state.tasks_on("2024-06-02").len(), 1);

    let id = state
        .add_task("2024-06-03", "Local", Category::Personal, Priority::High)
        .await
        .unwrap();
    state.toggle_starred("2024-06-03", &id).await.unwrap();

    let document = store.get("42");
    assert_eq!(document.len(), 2);
    assert!(document["2024-06-03"][0].starred);

    state.delete_task("2024-06-03", &id).await.unwrap();
    assert!(!store.get("42").contains_key("2024-06-03"));

    server.stop().await;
}

#[tokio::test]
async fn stopped_server_is_a_transport_failure() {
    let (server, _, client) = start_server().await;
    server.stop().await;

    assert!(matches!(client.fetch("42").await, Err(SyncError::Transport(_))));
}

#[tokio::test]
async fn file_backed_session_survives_restart() {
    let (server, store, client) = start_server().await;
    let data = tempfile::tempdir().unwrap();
    let settings = deadline_lib::models::Settings {
        api_base: client.base_url().to_string(),
        user_id: Some("42".to_string()),
        data_dir: Some(data.path().to_string_lossy().into_owned()),
        ..Default::default()
    };

    let mut session = deadline_lib::open_session(&settings).await;
    session
        .add_task("2024-06-01", "Persisted", Category::Work, Priority::Medium)
        .await
        .unwrap();
    drop(session);

    let offline = deadline_lib::models::Settings {
        user_id: None,
        ..settings
    };
    let restored = deadline_lib::open_session(&offline).await;
    assert_eq!(restored.tasks_on("2024-06-01")[0].text, "Persisted");
    assert_eq!(store.get("42")["2024-06-01"][0].text, "Persisted");

    server.stop().await;
}

#[tokio::test]
async fn started_session_renders_deferred_frames() {
    let (server, _, client) = start_server().await;
    let data = tempfile::tempdir().unwrap();
    let settings = deadline_lib::models::Settings {
        api_base: client.base_url().to_string(),
        data_dir: Some(data.path().to_string_lossy().into_owned()),
        frame_millis: 5,
        ..Default::default()
    };

    let session = deadline_lib::start_session(&settings).await;
    let before = {
        let mut state = session.state.lock().await;
        state
            .add_task("2024-06-01", "Ticked", Category::Work, Priority::Low)
            .await
            .unwrap();
        state.frames_rendered()
    };
    tokio::time::sleep(std::time::Duration::from_millis(100)).await;

    assert_eq!(session.state.lock().await.frames_rendered(), before + 1);
    session.close().await;
    server.stop().await;
}
