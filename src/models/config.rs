// Configuration models for Deadline
// Global config file settings and environment overrides

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:3001";
pub const DEFAULT_API_BASE: &str = "http://127.0.0.1:3001/api";
pub const DEFAULT_UPCOMING_LIMIT: usize = 10;

/// All settings (stored in the global config.md frontmatter, can be overridden by environment)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub api_base: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<String>,
    pub bind_address: String,
    pub allowed_origins: Vec<String>,
    pub upcoming_limit: usize,
    /// Render tick period for client sessions
    pub frame_millis: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            user_id: None,
            data_dir: None,
            bind_address: DEFAULT_BIND_ADDRESS.to_string(),
            allowed_origins: vec![
                "http://localhost:5173".to_string(),
                "http://localhost:3000".to_string(),
            ],
            upcoming_limit: DEFAULT_UPCOMING_LIMIT,
            frame_millis: 16,
        }
    }
}

/// Partial settings read from the environment (all fields optional)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SettingsOverride {
    pub api_base: Option<String>,
    pub user_id: Option<String>,
    pub data_dir: Option<String>,
    pub bind_address: Option<String>,
    pub allowed_origins: Option<Vec<String>>,
    pub upcoming_limit: Option<usize>,
}

impl SettingsOverride {
    /// Read overrides from `DEADLINE_*` variables; `PORT` rebinds on all interfaces
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let bind_address = match (non_empty("DEADLINE_BIND"), non_empty("PORT")) {
            (Some(bind), _) => Some(bind),
            (None, Some(port)) => {
                let port: u16 = port.trim().parse().map_err(|_| ConfigError::InvalidValue {
                    key: "PORT".to_string(),
                    message: format!("not a port number: {port}"),
                })?;
                Some(format!("0.0.0.0:{port}"))
            }
            (None, None) => None,
        };

        let upcoming_limit = non_empty("DEADLINE_UPCOMING_LIMIT")
            .map(|raw| {
                raw.trim().parse::<usize>().map_err(|_| ConfigError::InvalidValue {
                    key: "DEADLINE_UPCOMING_LIMIT".to_string(),
                    message: format!("not a positive integer: {raw}"),
                })
            })
            .transpose()?;

        Ok(Self {
            api_base: non_empty("DEADLINE_API_BASE"),
            user_id: non_empty("DEADLINE_USER_ID"),
            data_dir: non_empty("DEADLINE_DATA_DIR"),
            bind_address,
            allowed_origins: non_empty("DEADLINE_ALLOWED_ORIGINS").map(|raw| {
                raw.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            }),
            upcoming_limit,
        })
    }
}

impl Settings {
    /// Merge with environment override
    pub fn with_override(&self, over: &SettingsOverride) -> Self {
        Self {
            api_base: over.api_base.clone().unwrap_or_else(|| self.api_base.clone()),
            user_id: over.user_id.clone().or_else(|| self.user_id.clone()),
            data_dir: over.data_dir.clone().or_else(|| self.data_dir.clone()),
            bind_address: over.bind_address.clone().unwrap_or_else(|| self.bind_address.clone()),
            allowed_origins: over.allowed_origins.clone().unwrap_or_else(|| self.allowed_origins.clone()),
            upcoming_limit: over.upcoming_limit.unwrap_or(self.upcoming_limit),
            frame_millis: self.frame_millis,
        }
    }
}
