// Remote sync client for the task API
// Single best-effort attempt per call: no retry, no backoff, no request deduplication

use std::future::Future;

use serde::Serialize;

use crate::error::SyncError;
use crate::models::{Snapshot, Task, normalize_snapshot};

/// Remote task storage keyed by user identity, written one date at a time
pub trait RemoteSync: Send + Sync {
    /// Fetch the user's whole snapshot. Failure is distinct from an empty snapshot.
    fn fetch(&self, user_id: &str) -> impl Future<Output = Result<Snapshot, SyncError>> + Send;

    /// Upsert a single date's task list
    fn push(
        &self,
        user_id: &str,
        date: &str,
        tasks: &[Task],
    ) -> impl Future<Output = Result<(), SyncError>> + Send;

    /// Remove a single date's entry
    fn delete(&self, user_id: &str, date: &str) -> impl Future<Output = Result<(), SyncError>> + Send;
}

#[derive(Serialize)]
struct PushBody<'a> {
    date: &'a str,
    tasks: &'a [Task],
}

/// HTTP client for the `/api/tasks` routes
#[derive(Debug, Clone)]
pub struct HttpSyncClient {
    base_url: String,
    http: reqwest::Client,
}

impl HttpSyncClient {
    /// `base_url` is the API root, e.g. `http://127.0.0.1:3001/api`
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, reqwest::Client::new())
    }

    pub fn with_client(base_url: impl Into<String>, http: reqwest::Client) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { base_url, http }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn tasks_url(&self, user_id: &str) -> String {
        format!("{}/tasks/{}", self.base_url, urlencoding::encode(user_id))
    }

    fn date_url(&self, user_id: &str, date: &str) -> String {
        format!("{}/{}", self.tasks_url(user_id), urlencoding::encode(date))
    }
}

fn check_status(response: &reqwest::Response) -> Result<(), SyncError> {
    let status = response.status();
    if status.is_success() {
        Ok(())
    } else {
        Err(SyncError::Status(status.as_u16()))
    }
}

impl RemoteSync for HttpSyncClient {
    async fn fetch(&self, user_id: &str) -> Result<Snapshot, SyncError> {
        let url = self.tasks_url(user_id);
        tracing::debug!(%url, "fetching remote snapshot");

        let response = self.http.get(&url).send().await?;
        check_status(&response)?;
        let snapshot: Snapshot = response
            .json()
            .await
            .map_err(|e| SyncError::Decode(e.to_string()))?;
        Ok(normalize_snapshot(snapshot))
    }

    async fn push(&self, user_id: &str, date: &str, tasks: &[Task]) -> Result<(), SyncError> {
        let url = self.tasks_url(user_id);
        tracing::debug!(%url, date, count = tasks.len(), "pushing date");

        let response = self.http.post(&url).json(&PushBody { date, tasks }).send().await?;
        check_status(&response)
    }

    async fn delete(&self, user_id: &str, date: &str) -> Result<(), SyncError> {
        let url = self.date_url(user_id, date);
        tracing::debug!(%url, "deleting date");

        let response = self.http.delete(&url).send().await?;
        check_status(&response)
    }
}

/// Remote for sessions without a server; every call fails with [`SyncError::Offline`]
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineRemote;

impl RemoteSync for OfflineRemote {
    async fn fetch(&self, _user_id: &str) -> Result<Snapshot, SyncError> {
        Err(SyncError::Offline)
    }

    async fn push(&self, _user_id: &str, _date: &str, _tasks: &[Task]) -> Result<(), SyncError> {
        Err(SyncError::Offline)
    }

    async fn delete(&self, _user_id: &str, _date: &str) -> Result<(), SyncError> {
        Err(SyncError::Offline)
    }
}
