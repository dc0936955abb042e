// Import/export of the whole task snapshot as JSON
// An import merges into the current tasks with the imported entries taking precedence

use std::fs;
use std::path::Path;

use crate::app::AppState;
use crate::error::{ImportError, StorageError};
use crate::merge::merge_snapshots;
use crate::models::{Snapshot, normalize_snapshot};
use crate::sync::RemoteSync;

impl<R: RemoteSync> AppState<R> {
    /// Merge a JSON snapshot into the collection and persist every resulting date;
    /// returns the number of dates in the import. Malformed input leaves every piece
    /// of state as it was.
    pub async fn import_snapshot(&mut self, json: &str) -> Result<usize, ImportError> {
        let imported = normalize_snapshot(serde_json::from_str::<Snapshot>(json)?);

        let merged = merge_snapshots(&imported, self.collection.snapshot());
        let dates: Vec<String> = merged.keys().cloned().collect();
        self.collection.replace(merged);
        tracing::info!(imported = imported.len(), dates = dates.len(), "imported snapshot");

        self.sync_dates(&dates).await;
        Ok(imported.len())
    }

    pub async fn import_file(&mut self, path: &Path) -> Result<usize, ImportError> {
        let json = fs::read_to_string(path)?;
        self.import_snapshot(&json).await
    }

    pub fn export_snapshot(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self.collection.snapshot())
    }

    pub fn export_file(&self, path: &Path) -> Result<(), StorageError> {
        let json = self.export_snapshot()?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, json)?;
        tracing::info!(path = %path.display(), "exported snapshot");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::app::AppState;
    use crate::app::testing::{CountingRenderer, FakeRemote, RemoteCall};
    use crate::error::ImportError;
    use crate::models::{Category, Priority, Snapshot};
    use crate::storage::LocalSnapshotStore;
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
    async fn export_then_import_into_fresh_state() {
        let mut source = signed_in().await;
        source
            .add_task("2024-06-01", "Essay", Category::Study, Priority::High)
            .await
            .unwrap();
        source
            .add_task("2024-06-04", "Gym", Category::Personal, Priority::Low)
            .await
            .unwrap();
        let json = source.export_snapshot().unwrap();

        let mut target = signed_in().await;
        let touched = target.import_snapshot(&json).await.unwrap();

        assert_eq!(touched, 2);
        assert_eq!(target.snapshot(), source.snapshot());
        assert_eq!(target.store.read(), *target.snapshot());
        assert_eq!(
            target.remote.calls(),
            vec![
                RemoteCall::Push { date: "2024-06-01".into(), count: 1 },
                RemoteCall::Push { date: "2024-06-04".into(), count: 1 },
            ]
        );
    }

    #[tokio::test]
    async fn import_keeps_existing_tasks_after_imported_ones() {
        let mut state = signed_in().await;
        state
            .add_task("2024-06-01", "Existing", Category::Work, Priority::Medium)
            .await
            .unwrap();

        let json = r#"{"2024-06-01":[{"text":"Imported","category":"work","priority":"high","starred":false,"created":"2024-01-01T00:00:00Z"}]}"#;
        state.import_snapshot(json).await.unwrap();

        let texts: Vec<&str> = state.tasks_on("2024-06-01").iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["Imported", "Existing"]);
        assert!(!state.tasks_on("2024-06-01")[0].id.is_empty());
    }

    #[tokio::test]
    async fn import_of_a_known_task_does_not_duplicate_it() {
        let mut state = signed_in().await;
        let local = r#"{"d":[
            {"text":"A","created":"2024-01-01T00:00:00Z"},
            {"text":"B","created":"2024-01-02T00:00:00Z"}
        ]}"#;
        state.import_snapshot(local).await.unwrap();

        let touched = state
            .import_snapshot(r#"{"d":[{"text":"A","created":"2024-01-01T00:00:00Z"}]}"#)
            .await
            .unwrap();

        assert_eq!(touched, 1);
        let texts: Vec<&str> = state.tasks_on("d").iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["A", "B"]);
        assert_eq!(state.store.read(), *state.snapshot());
        assert_eq!(
            state.remote.calls().last(),
            Some(&RemoteCall::Push { date: "d".into(), count: 2 })
        );
    }

    #[tokio::test]
    async fn malformed_import_leaves_state_unchanged() {
        let mut state = signed_in().await;
        state
            .add_task("2024-06-01", "Keep", Category::Work, Priority::Medium)
            .await
            .unwrap();
        let before = state.snapshot().clone();
        let revision = state.revision();
        let calls = state.remote.calls().len();

        let result = state.import_snapshot("{not json").await;

        assert!(matches!(result, Err(ImportError::Parse(_))));
        assert_eq!(state.snapshot(), &before);
        assert_eq!(state.revision(), revision);
        assert_eq!(state.remote.calls().len(), calls);
    }

    #[tokio::test]
    async fn export_and_import_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("backup").join("tasks.json");
        let mut state = signed_in().await;
        state
            .add_task("2024-06-01", "Saved", Category::Other, Priority::Medium)
            .await
            .unwrap();

        state.export_file(&path).unwrap();
        let mut restored = signed_in().await;
        restored.import_file(&path).await.unwrap();

        assert_eq!(restored.snapshot(), state.snapshot());
        assert!(matches!(
            restored.import_file(&dir.path().join("missing.json")).await,
            Err(ImportError::Io(_))
        ));
    }
}
