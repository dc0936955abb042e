// Snapshot merge for reconciling remote and local task lists
// Primary order is preserved; secondary only contributes tasks the primary lacks

use std::collections::{BTreeSet, HashSet};

use crate::models::{Category, Priority, Snapshot, Task};

/// Heuristic identity used to deduplicate tasks across snapshots.
///
/// The creation timestamp when present, otherwise `(text, category, priority)`.
/// Two distinct tasks without timestamps that share all three fields on the same
/// day are indistinguishable and collapse into one. The stable `id` is not used:
/// snapshots from clients that never exchanged ids must still deduplicate.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TaskIdentity {
    Created(String),
    Composite {
        text: String,
        category: Category,
        priority: Priority,
    },
}

impl TaskIdentity {
    pub fn of(task: &Task) -> Self {
        match task.created.as_deref() {
            Some(created) if !created.is_empty() => Self::Created(created.to_string()),
            _ => Self::Composite {
                text: task.text.clone(),
                category: task.category,
                priority: task.priority,
            },
        }
    }
}

/// Merge two snapshots: for every date in either, keep `primary`'s list and append
/// `secondary` tasks whose identity is not already present. Empty days are dropped.
pub fn merge_snapshots(primary: &Snapshot, secondary: &Snapshot) -> Snapshot {
    let dates: BTreeSet<&String> = primary.keys().chain(secondary.keys()).collect();
    let mut merged = Snapshot::new();

    for date in dates {
        let mut tasks: Vec<Task> = primary.get(date).cloned().unwrap_or_default();
        let mut seen: HashSet<TaskIdentity> = tasks.iter().map(TaskIdentity::of).collect();

        for task in secondary.get(date).into_iter().flatten() {
            if seen.insert(TaskIdentity::of(task)) {
                tasks.push(task.clone());
            }
        }

        if !tasks.is_empty() {
            merged.insert(date.clone(), tasks);
        }
    }

    merged
}
