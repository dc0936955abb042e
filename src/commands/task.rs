// Task commands - add, edit, delete, toggle
// Failed validation leaves the collection, storage and remote untouched

use crate::app::AppState;
use crate::collection::{TaskEdit, canonical_key, normalize_date};
use crate::error::TaskError;
use crate::models::{Category, Priority, Task, TaskId};
use crate::sync::RemoteSync;

/// Form input as sent by a UI layer
#[derive(Debug, Clone, Default, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskInput {
    pub text: String,
    pub date: String,
    #[serde(default)]
    pub category: Category,
    #[serde(default)]
    pub priority: Priority,
}

impl<R: RemoteSync> AppState<R> {
    pub async fn add_task(
        &mut self,
        date: &str,
        text: &str,
        category: Category,
        priority: Priority,
    ) -> Result<TaskId, TaskError> {
        let date = normalize_date(date)?;
        let id = self.collection.add(&date, text, category, priority)?;
        tracing::info!(%date, %id, "task added");
        self.sync_dates(&[date]).await;
        Ok(id)
    }

    pub async fn submit_task(&mut self, input: TaskInput) -> Result<TaskId, TaskError> {
        self.add_task(&input.date, &input.text, input.category, input.priority)
            .await
    }

    /// Returns the dates the edit touched
    pub async fn edit_task(&mut self, date: &str, id: &str, edit: TaskEdit) -> Result<Vec<String>, TaskError> {
        let affected = self.collection.edit(date, id, edit)?;
        tracing::info!(date, id, ?affected, "task edited");
        self.sync_dates(&affected).await;
        Ok(affected)
    }

    pub async fn delete_task(&mut self, date: &str, id: &str) -> Result<Task, TaskError> {
        let removed = self.collection.delete(date, id)?;
        tracing::info!(date, id, "task deleted");
        self.sync_dates(&[canonical_key(date)]).await;
        Ok(removed)
    }

    pub async fn toggle_completed(&mut self, date: &str, id: &str) -> Result<bool, TaskError> {
        let completed = self.collection.toggle_completed(date, id)?;
        self.sync_dates(&[canonical_key(date)]).await;
        Ok(completed)
    }

    pub async fn toggle_starred(&mut self, date: &str, id: &str) -> Result<bool, TaskError> {
        let starred = self.collection.toggle_starred(date, id)?;
        self.sync_dates(&[canonical_key(date)]).await;
        Ok(starred)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::testing::{CountingRenderer, FakeRemote, RemoteCall, day};
    use crate::models::Snapshot;
    use crate::storage::LocalSnapshotStore;
    use crate::sync::OfflineRemote;
    use pretty_assertions::assert_eq;

    async fn signed_in() -> AppState<FakeRemote> {
        AppState::load(
            LocalSnapshotStore::in_memory(),
            FakeRemote::serving(Snapshot::new()),
            Some("42".into()),
            Box::new(CountingRenderer::default()),
        )
        .await
    }

    #[tokio::test]
    async fn add_writes_locally_and_pushes_only_that_date() {
        let mut state = signed_in().await;

        state
            .add_task("2024-06-01", "Essay", Category::Study, Priority::High)
            .await
            .unwrap();

        assert_eq!(state.store.read(), *state.snapshot());
        assert_eq!(
            state.remote.calls(),
            vec![RemoteCall::Push { date: "2024-06-01".into(), count: 1 }]
        );
    }

    #[tokio::test]
    async fn add_then_stats_and_due_today() {
        let mut state = signed_in().await;
        state.set_today(Some(day(1)));

        state
            .submit_task(TaskInput {
                text: "Essay".into(),
                date: "2024-06-01".into(),
                category: Category::Study,
                priority: Priority::High,
            })
            .await
            .unwrap();

        let stats = state.stats();
        assert_eq!((stats.total, stats.completed, stats.pending), (1, 0, 1));
        let due: Vec<String> = state.due_today().into_iter().map(|t| t.text).collect();
        assert_eq!(due, vec!["Essay"]);
    }

    #[tokio::test]
    async fn deleting_last_task_deletes_remote_date() {
        let mut state = signed_in().await;
        let id = state
            .add_task("2024-06-01", "Only", Category::Work, Priority::Low)
            .await
            .unwrap();

        let removed = state.delete_task("2024-06-01", &id).await.unwrap();

        assert_eq!(removed.text, "Only");
        assert!(state.snapshot().is_empty());
        assert!(state.store.read().is_empty());
        assert_eq!(
            state.remote.calls().last(),
            Some(&RemoteCall::Delete { date: "2024-06-01".into() })
        );
    }

    #[tokio::test]
    async fn moving_a_task_pushes_both_dates() {
        let mut state = signed_in().await;
        let id = state
            .add_task("2024-06-01", "Move", Category::Work, Priority::Low)
            .await
            .unwrap();
        state
            .add_task("2024-06-01", "Stay", Category::Work, Priority::Low)
            .await
            .unwrap();

        let edit = TaskEdit {
            date: Some("2024-06-05".into()),
            ..TaskEdit::default()
        };
        state.edit_task("2024-06-01", &id, edit).await.unwrap();

        let calls = state.remote.calls();
        assert_eq!(
            calls[calls.len() - 2..].to_vec(),
            vec![
                RemoteCall::Push { date: "2024-06-01".into(), count: 1 },
                RemoteCall::Push { date: "2024-06-05".into(), count: 1 },
            ]
        );
    }

    #[tokio::test]
    async fn rejected_input_changes_nothing() {
        let mut state = signed_in().await;
        let revision = state.revision();

        assert_eq!(
            state.add_task("2024-06-01", "  ", Category::Work, Priority::Low).await,
            Err(TaskError::EmptyText)
        );
        assert!(matches!(
            state.add_task("someday", "Task", Category::Work, Priority::Low).await,
            Err(TaskError::InvalidDate(_))
        ));
        assert!(matches!(
            state.toggle_starred("2024-06-01", "missing").await,
            Err(TaskError::NotFound { .. })
        ));

        assert_eq!(state.revision(), revision);
        assert!(state.remote.calls().is_empty());
    }

    #[tokio::test]
    async fn failed_push_keeps_local_change() {
        let remote = FakeRemote {
            snapshot: Some(Snapshot::new()),
            fail_writes: true,
            ..FakeRemote::default()
        };
        let mut state = AppState::load(
            LocalSnapshotStore::in_memory(),
            remote,
            Some("42".into()),
            Box::new(CountingRenderer::default()),
        )
        .await;

        state
            .add_task("2024-06-01", "Offline edit", Category::Personal, Priority::Medium)
            .await
            .unwrap();

        assert_eq!(state.tasks_on("2024-06-01").len(), 1);
        assert_eq!(state.store.read().len(), 1);
    }

    #[tokio::test]
    async fn without_user_no_remote_calls_are_made() {
        let mut state = AppState::load(
            LocalSnapshotStore::in_memory(),
            FakeRemote::serving(Snapshot::new()),
            None,
            Box::new(CountingRenderer::default()),
        )
        .await;

        let id = state
            .add_task("2024-06-01", "Local", Category::Other, Priority::Medium)
            .await
            .unwrap();
        state.toggle_completed("2024-06-01", &id).await.unwrap();

        assert!(state.remote.calls().is_empty());
        assert_eq!(state.store.read(), *state.snapshot());
    }

    #[tokio::test]
    async fn offline_remote_still_persists_locally() {
        let mut state = AppState::load(
            LocalSnapshotStore::in_memory(),
            OfflineRemote,
            Some("42".into()),
            Box::new(CountingRenderer::default()),
        )
        .await;

        let id = state
            .add_task("2024-06-01", "Task", Category::Other, Priority::Medium)
            .await
            .unwrap();
        assert_eq!(state.toggle_starred("2024-06-01", &id).await, Ok(true));
        assert!(state.store.read()["2024-06-01"][0].starred);
    }
}
