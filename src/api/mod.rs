// REST server for task documents
// Start/stop lifecycle around axum::serve with a cancellation token for graceful shutdown

pub mod routes;
pub mod store;

use std::net::SocketAddr;
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::AppError;

pub use routes::router;
pub use store::DocumentStore;

pub struct ApiServer {
    store: Arc<DocumentStore>,
    allowed_origins: Vec<String>,
    is_running: Arc<RwLock<bool>>,
    cancel_token: RwLock<Option<CancellationToken>>,
    handle: RwLock<Option<JoinHandle<()>>>,
}

impl ApiServer {
    pub fn new(store: Arc<DocumentStore>, allowed_origins: Vec<String>) -> Self {
        Self {
            store,
            allowed_origins,
            is_running: Arc::new(RwLock::new(false)),
            cancel_token: RwLock::new(None),
            handle: RwLock::new(None),
        }
    }

    pub fn is_running(&self) -> bool {
        *self.is_running.read()
    }

    /// Bind and serve in the background; returns the bound address (useful with port 0)
    pub async fn start(&self, bind_address: &str) -> Result<SocketAddr, AppError> {
        if self.is_running() {
            return Err(AppError::AlreadyRunning);
        }

        let listener = tokio::net::TcpListener::bind(bind_address).await?;
        let address = listener.local_addr()?;
        let router = router(self.store.clone(), &self.allowed_origins);

        let ct = CancellationToken::new();
        *self.cancel_token.write() = Some(ct.clone());
        *self.is_running.write() = true;
        tracing::info!(%address, "server started");

        let is_running = self.is_running.clone();
        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router)
                .with_graceful_shutdown(async move { ct.cancelled().await })
                .await
            {
                tracing::error!(error = %e, "server error");
            }
            *is_running.write() = false;
            tracing::info!("server stopped");
        });
        *self.handle.write() = Some(handle);

        Ok(address)
    }

    /// Signal shutdown and wait for in-flight requests to finish
    pub async fn stop(&self) {
        tracing::info!("stopping server");
        if let Some(ct) = self.cancel_token.write().take() {
            ct.cancel();
        }
        let handle = self.handle.write().take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                tracing::warn!(error = %e, "server task did not finish cleanly");
            }
        }
    }
}
