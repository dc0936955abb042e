// Document store behind the REST endpoint
// One document per user holding that user's date -> task list mapping

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;

use crate::error::StorageError;
use crate::models::{Snapshot, Task};

type Documents = HashMap<String, Snapshot>;

#[derive(Debug)]
enum Backing {
    Memory,
    File(PathBuf),
    /// Connection failed at startup; reads are empty and writes are dropped
    Unavailable,
}

#[derive(Debug)]
pub struct DocumentStore {
    documents: RwLock<Documents>,
    backing: Backing,
}

impl DocumentStore {
    pub fn memory() -> Self {
        Self {
            documents: RwLock::default(),
            backing: Backing::Memory,
        }
    }

    pub fn unavailable() -> Self {
        Self {
            documents: RwLock::default(),
            backing: Backing::Unavailable,
        }
    }

    /// Open a file-backed store. A missing file starts empty; an unreadable one
    /// leaves the store unavailable.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        match load_documents(&path) {
            Ok(documents) => {
                tracing::info!(path = %path.display(), users = documents.len(), "document store opened");
                Self {
                    documents: RwLock::new(documents),
                    backing: Backing::File(path),
                }
            }
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "document store unavailable");
                Self::unavailable()
            }
        }
    }

    pub fn is_available(&self) -> bool {
        !matches!(self.backing, Backing::Unavailable)
    }

    /// The user's whole mapping; empty when unknown or unavailable
    pub fn get(&self, user_id: &str) -> Snapshot {
        self.documents.read().get(user_id).cloned().unwrap_or_default()
    }

    /// Upsert one date of one user's document
    pub fn put(&self, user_id: &str, date: &str, tasks: Vec<Task>) -> Result<(), StorageError> {
        if !self.is_available() {
            tracing::warn!(user_id, date, "store unavailable, dropping write");
            return Ok(());
        }
        self.update_document(user_id, |document| {
            document.insert(date.to_string(), tasks);
        })
    }

    pub fn remove(&self, user_id: &str, date: &str) -> Result<(), StorageError> {
        if !self.is_available() {
            tracing::warn!(user_id, date, "store unavailable, dropping delete");
            return Ok(());
        }
        self.update_document(user_id, |document| {
            document.remove(date);
        })
    }

    /// Apply a change to one user's document; a failed write restores the previous document
    fn update_document(&self, user_id: &str, change: impl FnOnce(&mut Snapshot)) -> Result<(), StorageError> {
        let mut documents = self.documents.write();
        let previous = documents.get(user_id).cloned();

        change(documents.entry(user_id.to_string()).or_default());
        if let Err(e) = self.persist(&documents) {
            match previous {
                Some(document) => documents.insert(user_id.to_string(), document),
                None => documents.remove(user_id),
            };
            return Err(e);
        }
        Ok(())
    }

    fn persist(&self, documents: &Documents) -> Result<(), StorageError> {
        let Backing::File(path) = &self.backing else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_string(documents)?)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }
}

fn load_documents(path: &Path) -> Result<Documents, StorageError> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(serde_json::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Documents::new()),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, Priority};
    use pretty_assertions::assert_eq;

    fn tasks(texts: &[&str]) -> Vec<Task> {
        texts
            .iter()
            .map(|t| Task::new(*t, Category::Work, Priority::Medium))
            .collect()
    }

    #[test]
    fn put_replaces_only_the_given_date() {
        let store = DocumentStore::memory();
        store.put("42", "2024-06-01", tasks(&["A"])).unwrap();
        store.put("42", "2024-06-02", tasks(&["B"])).unwrap();
        store.put("42", "2024-06-01", tasks(&["C"])).unwrap();

        let document = store.get("42");
        assert_eq!(document.len(), 2);
        assert_eq!(document["2024-06-01"][0].text, "C");
        assert!(store.get("7").is_empty());
    }

    #[test]
    fn remove_drops_the_date() {
        let store = DocumentStore::memory();
        store.put("42", "2024-06-01", tasks(&["A"])).unwrap();
        store.remove("42", "2024-06-01").unwrap();
        store.remove("unknown", "2024-06-01").unwrap();
        assert!(store.get("42").is_empty());
    }

    #[test]
    fn file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("server").join("documents.json");

        let store = DocumentStore::open(&path);
        store.put("42", "2024-06-01", tasks(&["Persisted"])).unwrap();
        drop(store);

        let reopened = DocumentStore::open(&path);
        assert!(reopened.is_available());
        assert_eq!(reopened.get("42")["2024-06-01"][0].text, "Persisted");
    }

    #[test]
    fn failed_write_is_not_served() {
        let dir = tempfile::tempdir().unwrap();
        let server_dir = dir.path().join("server");
        let path = server_dir.join("documents.json");
        let store = DocumentStore::open(&path);
        store.put("42", "2024-06-01", tasks(&["Kept"])).unwrap();

        // A file where the data directory should be makes every write fail
        fs::remove_dir_all(&server_dir).unwrap();
        fs::write(&server_dir, "blocker").unwrap();

        assert!(store.put("42", "2024-06-02", tasks(&["Lost"])).is_err());
        assert!(store.put("7", "2024-06-01", tasks(&["Lost"])).is_err());
        assert!(store.remove("42", "2024-06-01").is_err());

        let document = store.get("42");
        assert_eq!(document.len(), 1);
        assert_eq!(document["2024-06-01"][0].text, "Kept");
        assert!(store.get("7").is_empty());
    }

    #[test]
    fn corrupt_file_makes_store_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("documents.json");
        fs::write(&path, "not json").unwrap();

        let store = DocumentStore::open(&path);
        assert!(!store.is_available());
        store.put("42", "2024-06-01", tasks(&["Dropped"])).unwrap();
        assert!(store.get("42").is_empty());
    }
}
