// Error types for Deadline
// None of these are fatal: callers degrade to memory-only, local-only or no-op

use std::io;

/// Local storage failure (quota, disabled storage, unwritable data directory)
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("snapshot serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("storage unavailable")]
    Unavailable,
}

/// Remote fetch/push failure; the remote write is treated as not having happened
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("server responded with status {0}")]
    Status(u16),
    #[error("malformed response: {0}")]
    Decode(String),
    #[error("no remote configured")]
    Offline,
}

/// Rejected mutation input; the collection is left untouched
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TaskError {
    #[error("task text is empty")]
    EmptyText,
    #[error("invalid date key: {0:?}")]
    InvalidDate(String),
    #[error("task {id} not found on {date}")]
    NotFound { date: String, id: String },
}

/// Import failure surfaced to the user; in-memory state is unchanged
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("could not read import file: {0}")]
    Io(#[from] io::Error),
    #[error("import is not a valid task snapshot: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("config YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Startup failure of the server binary
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("server error: {0}")]
    Server(#[from] io::Error),
    #[error("server is already running")]
    AlreadyRunning,
}
