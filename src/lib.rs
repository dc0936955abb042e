// Deadline: a personal task and deadline tracker
// Client state (collection, local snapshot, sync, views, render scheduling) plus the REST server

pub mod api;
pub mod app;
pub mod collection;
pub mod commands;
pub mod error;
pub mod merge;
pub mod models;
pub mod render;
pub mod storage;
pub mod sync;
pub mod view;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use api::{ApiServer, DocumentStore};
use app::AppState;
use error::AppError;
use models::{Settings, SettingsOverride};
use render::LogRenderer;
use storage::{FileSlots, LocalSnapshotStore};
use sync::HttpSyncClient;

pub fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,deadline_lib=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}

/// Config file settings with environment overrides applied
pub fn effective_settings() -> Result<Settings, AppError> {
    let path = storage::global_config_path();
    let settings = storage::load_settings(&path)?;
    let overrides = SettingsOverride::from_env()?;
    Ok(settings.with_override(&overrides))
}

/// Client session backed by slot files in the data directory and the configured API
pub async fn open_session(settings: &Settings) -> AppState<HttpSyncClient> {
    let slots = FileSlots::new(storage::data_dir(settings).join("client"));
    let mut state = AppState::load(
        LocalSnapshotStore::new(slots),
        HttpSyncClient::new(settings.api_base.clone()),
        settings.user_id.clone(),
        Box::new(LogRenderer),
    )
    .await;
    state.set_upcoming_limit(settings.upcoming_limit);
    state
}

/// A client session whose deferred renders are driven by a background frame loop
pub struct Session {
    pub state: Arc<Mutex<AppState<HttpSyncClient>>>,
    cancel: CancellationToken,
    frames: JoinHandle<()>,
}

impl Session {
    /// Stop the frame loop; pending renders are dropped
    pub async fn close(self) {
        self.cancel.cancel();
        if let Err(e) = self.frames.await {
            tracing::warn!(error = %e, "frame loop did not finish cleanly");
        }
    }
}

/// Open a session and tick it every `settings.frame_millis`
pub async fn start_session(settings: &Settings) -> Session {
    let state = Arc::new(Mutex::new(open_session(settings).await));
    let cancel = CancellationToken::new();
    let period = Duration::from_millis(settings.frame_millis.max(1));
    let frames = tokio::spawn(app::run_frame_loop(state.clone(), period, cancel.clone()));
    tracing::debug!(frame_millis = settings.frame_millis, "session started");
    Session { state, cancel, frames }
}

/// Serve the REST endpoint until ctrl-c
pub async fn serve(settings: Settings) -> Result<(), AppError> {
    let documents = storage::data_dir(&settings).join("server").join("documents.json");
    let store = Arc::new(DocumentStore::open(documents));
    let server = ApiServer::new(store, settings.allowed_origins.clone());

    let address = server.start(&settings.bind_address).await?;
    tracing::info!(%address, "Deadline backend listening");

    tokio::signal::ctrl_c().await?;
    server.stop().await;
    Ok(())
}

pub fn run() -> Result<(), AppError> {
    init_tracing();

    let settings = effective_settings()?;
    tracing::debug!(?settings, "effective settings");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(serve(settings))
}
