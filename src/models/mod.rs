// Models module for Deadline
// Wire and storage formats use camelCase JSON

pub mod common;
pub mod config;
pub mod task;

pub use common::{Category, Priority, Theme, date_key, parse_date_key};
pub use config::{DEFAULT_UPCOMING_LIMIT, Settings, SettingsOverride};
pub use task::{Snapshot, Task, TaskId, new_id, normalize_snapshot};
