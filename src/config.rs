//! Configuration loaded from `.reviewpulse.toml`.
//!
//! Every field has a default, so a missing file or a partial file is fine.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub const DEFAULT_CONFIG_PATH: &str = ".reviewpulse.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub dashboard: DashboardSettings,

    #[serde(default)]
    pub database: DatabaseConfig,
}

/// Window sizes and thresholds used by the aggregation engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSettings {
    /// Number of calendar months in the review trend.
    #[serde(default = "default_trend_months")]
    pub trend_months: usize,

    /// How many categories the breakdown keeps.
    #[serde(default = "default_top_categories")]
    pub top_categories: usize,

    /// How many reviews the latest-reviews list keeps.
    #[serde(default = "default_latest_reviews")]
    pub latest_reviews: usize,

    /// Upper bound (inclusive) for a reply to count as same-day.
    #[serde(default = "default_same_day_hours")]
    pub same_day_hours: i64,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            trend_months: default_trend_months(),
            top_categories: default_top_categories(),
            latest_reviews: default_latest_reviews(),
            same_day_hours: default_same_day_hours(),
        }
    }
}

fn default_trend_months() -> usize {
    6
}

fn default_top_categories() -> usize {
    5
}

fn default_latest_reviews() -> usize {
    5
}

fn default_same_day_hours() -> i64 {
    24
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            max_connections: default_max_connections(),
        }
    }
}

fn default_max_connections() -> u32 {
    5
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Loads `path` when it exists, otherwise falls back to defaults.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }
}
