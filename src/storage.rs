// Local storage layer for Deadline
// Key-value slots on the device for the task snapshot and theme, plus the Markdown config file

use parking_lot::Mutex;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, StorageError};
use crate::models::{Settings, Snapshot, Theme, normalize_snapshot};

// ============================================
// PATH HELPERS
// ============================================

/// Global config directory (~/.deadline/)
pub fn global_config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".deadline")
}

/// Global config file path
pub fn global_config_path() -> PathBuf {
    global_config_dir().join("config.md")
}

/// Data directory for slots and the server's document file
pub fn data_dir(settings: &Settings) -> PathBuf {
    match &settings.data_dir {
        Some(dir) => PathBuf::from(dir),
        None => dirs::data_dir()
            .unwrap_or_else(global_config_dir)
            .join("deadline"),
    }
}

// ============================================
// FRONTMATTER PARSING
// ============================================

/// Parse YAML frontmatter from markdown content; `None` when there is no frontmatter block
pub fn parse_frontmatter<T: serde::de::DeserializeOwned>(
    content: &str,
) -> Result<Option<(T, String)>, serde_yaml::Error> {
    let content = content.trim();
    let Some(rest) = content.strip_prefix("---") else {
        return Ok(None);
    };
    let Some(end) = rest.find("\n---") else {
        return Ok(None);
    };
    let yaml = rest[..end].trim();
    let body = rest[end + 4..].trim().to_string();

    let frontmatter: T = serde_yaml::from_str(yaml)?;
    Ok(Some((frontmatter, body)))
}

/// Serialize frontmatter + body to markdown
pub fn to_markdown<T: serde::Serialize>(frontmatter: &T, body: &str) -> Result<String, serde_yaml::Error> {
    let yaml = serde_yaml::to_string(frontmatter)?;
    Ok(format!("---\n{}---\n\n{}", yaml, body))
}

// ============================================
// GLOBAL CONFIG
// ============================================

const CONFIG_BODY: &str = "# Deadline\n\nSettings for the deadline tracker. Environment variables override these values.\n";

/// Load settings from a config file; defaults when the file or its frontmatter is missing
pub fn load_settings(path: &Path) -> Result<Settings, ConfigError> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "config file does not exist, using defaults");
        return Ok(Settings::default());
    }

    let content = fs::read_to_string(path)?;
    match parse_frontmatter::<Settings>(&content)? {
        Some((settings, _body)) => {
            tracing::debug!(path = %path.display(), "loaded settings");
            Ok(settings)
        }
        None => {
            tracing::warn!(path = %path.display(), "config file has no frontmatter, using defaults");
            Ok(Settings::default())
        }
    }
}

pub fn save_settings(path: &Path, settings: &Settings) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let content = to_markdown(settings, CONFIG_BODY)?;
    fs::write(path, content)?;
    Ok(())
}

// ============================================
// KEY-VALUE SLOTS
// ============================================

/// Persistent string slots on the client device
pub trait SlotStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// One file per slot inside a directory
#[derive(Debug, Clone)]
pub struct FileSlots {
    dir: PathBuf,
}

impl FileSlots {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn slot_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.slot"))
    }
}

impl SlotStore for FileSlots {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.slot_path(key)) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        fs::create_dir_all(&self.dir)?;
        // Write-then-rename so a crash never leaves a half-written snapshot
        let tmp = self.dir.join(format!(".{key}.slot.tmp"));
        fs::write(&tmp, value)?;
        fs::rename(&tmp, self.slot_path(key))?;
        Ok(())
    }
}

/// In-memory slots for memory-only sessions and tests
#[derive(Debug, Default)]
pub struct MemorySlots {
    slots: Mutex<HashMap<String, String>>,
    disabled: bool,
}

impl MemorySlots {
    pub fn new() -> Self {
        Self::default()
    }

    /// Slots that reject every access, like storage disabled by the browser
    pub fn disabled() -> Self {
        Self {
            slots: Mutex::default(),
            disabled: true,
        }
    }
}

impl SlotStore for MemorySlots {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        if self.disabled {
            return Err(StorageError::Unavailable);
        }
        Ok(self.slots.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        if self.disabled {
            return Err(StorageError::Unavailable);
        }
        self.slots.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }
}

// ============================================
// LOCAL SNAPSHOT STORE
// ============================================

pub const TASKS_SLOT: &str = "tasks";
pub const THEME_SLOT: &str = "theme";

/// Reads and writes the task snapshot and theme preference.
///
/// Storage is a cache when a remote identity exists and the sole authority otherwise.
/// Nothing here fails outward: read errors yield an empty snapshot, write errors are
/// logged and the in-memory collection stays the source of truth.
pub struct LocalSnapshotStore {
    slots: Box<dyn SlotStore>,
}

impl LocalSnapshotStore {
    pub fn new(slots: impl SlotStore + 'static) -> Self {
        Self { slots: Box::new(slots) }
    }

    pub fn in_memory() -> Self {
        Self::new(MemorySlots::new())
    }

    pub fn read(&self) -> Snapshot {
        let raw = match self.slots.get(TASKS_SLOT) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Snapshot::new(),
            Err(e) => {
                tracing::warn!(error = %e, "could not read local snapshot");
                return Snapshot::new();
            }
        };

        match serde_json::from_str::<Snapshot>(&raw) {
            Ok(snapshot) => normalize_snapshot(snapshot),
            Err(e) => {
                tracing::warn!(error = %e, "local snapshot is malformed, starting empty");
                Snapshot::new()
            }
        }
    }

    pub fn write(&self, snapshot: &Snapshot) {
        let result = serde_json::to_string(snapshot)
            .map_err(StorageError::from)
            .and_then(|raw| self.slots.set(TASKS_SLOT, &raw));
        if let Err(e) = result {
            tracing::error!(error = %e, "could not write local snapshot, continuing in memory only");
        }
    }

    pub fn read_theme(&self) -> Theme {
        match self.slots.get(THEME_SLOT) {
            Ok(Some(raw)) => Theme::parse(&raw).unwrap_or_default(),
            Ok(None) => Theme::default(),
            Err(e) => {
                tracing::warn!(error = %e, "could not read theme preference");
                Theme::default()
            }
        }
    }

    pub fn write_theme(&self, theme: Theme) {
        if let Err(e) = self.slots.set(THEME_SLOT, theme.as_str()) {
            tracing::error!(error = %e, "could not write theme preference");
        }
    }
}
