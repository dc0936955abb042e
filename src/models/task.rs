// Task model for per-date task lists
// UUID for stable ID, creation timestamp kept as an opaque string for merge identity

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::common::{Category, Priority, date_key, parse_date_key};

/// Stable task identifier (UUID v4 string)
pub type TaskId = String;

/// Date-key -> ordered task list, as persisted locally, sent over the wire and exported
pub type Snapshot = BTreeMap<String, Vec<Task>>;

/// Rewrite date keys in zero-padded form. Lists that land on the same day are joined in
/// key order; keys that are not dates stay as they are; empty days are dropped.
pub fn normalize_snapshot(snapshot: Snapshot) -> Snapshot {
    let mut normalized = Snapshot::new();
    for (key, tasks) in snapshot {
        if tasks.is_empty() {
            continue;
        }
        let key = parse_date_key(&key).map(date_key).unwrap_or(key);
        normalized.entry(key).or_default().extend(tasks);
    }
    normalized
}

/// Generate new UUID
pub fn new_id() -> TaskId {
    uuid::Uuid::new_v4().to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    // Tasks written by older clients carry no id; they get one on load
    #[serde(default = "new_id")]
    pub id: TaskId,
    pub text: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub category: Category,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub starred: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
}

impl Task {
    pub fn new(text: impl Into<String>, category: Category, priority: Priority) -> Self {
        Self {
            id: new_id(),
            text: text.into(),
            completed: false,
            category,
            priority,
            starred: false,
            created: Some(chrono::Utc::now().to_rfc3339()),
        }
    }

    /// Case-insensitive substring match against the task text
    pub fn matches_query(&self, query_lower: &str) -> bool {
        query_lower.is_empty() || self.text.to_lowercase().contains(query_lower)
    }
}
