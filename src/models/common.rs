// Common types shared by the task model, filters and settings
// All serialized as lowercase strings for compatibility with stored snapshots

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Task category - unknown values from older snapshots fall back to `Other`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Study,
    Work,
    Personal,
    #[default]
    #[serde(other)]
    Other,
}

impl Category {
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "study" => Some(Self::Study),
            "work" => Some(Self::Work),
            "personal" => Some(Self::Personal),
            "other" => Some(Self::Other),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Study => "study",
            Self::Work => "work",
            Self::Personal => "personal",
            Self::Other => "other",
        }
    }
}

/// Task priority - unknown values fall back to `Medium`, the server default
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    High,
    #[default]
    #[serde(other)]
    Medium,
}

impl Priority {
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    /// Sort rank: high(3) > medium(2) > low(1)
    pub fn rank(&self) -> u8 {
        match self {
            Self::Low => 1,
            Self::Medium => 2,
            Self::High => 3,
        }
    }
}

/// UI theme preference, persisted in its own storage slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    #[default]
    Dark,
    Pixel,
}

impl Theme {
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "light" => Some(Self::Light),
            "dark" => Some(Self::Dark),
            "pixel" => Some(Self::Pixel),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
            Self::Pixel => "pixel",
        }
    }
}

// ============================================
// DATE KEYS
// ============================================

/// Format a calendar date as a zero-padded `YYYY-MM-DD` key
pub fn date_key(date: NaiveDate) -> String {
    format!("{:04}-{:02}-{:02}", date.year(), date.month(), date.day())
}

/// Parse a date key; unpadded keys (`2024-6-1`) written by older clients are accepted
pub fn parse_date_key(key: &str) -> Option<NaiveDate> {
    let mut parts = key.trim().splitn(3, '-');
    let year: i32 = parts.next()?.parse().ok()?;
    let month: u32 = parts.next()?.parse().ok()?;
    let day: u32 = parts.next()?.parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}
