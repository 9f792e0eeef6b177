//! Configuration loading, validation, and management for taskbrief.
//!
//! Loads configuration from `taskbrief.toml` with environment variable
//! overrides (`TASKBRIEF_*`). Every field has a default so an absent file
//! yields a usable configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// The root configuration structure.
///
/// Maps directly to `taskbrief.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssemblyConfig {
    /// Whether the process-local payload cache is enabled. Off by default.
    #[serde(default)]
    pub cache_enabled: bool,

    /// Directory holding role SOP files (`<role-slug>.md`).
    #[serde(default = "default_sop_dir")]
    pub sop_dir: PathBuf,

    /// Project-local directory holding amalgamation files.
    #[serde(default = "default_amalgam_dir")]
    pub amalgam_dir: PathBuf,

    /// How many recent session summaries to load per assembly.
    #[serde(default = "default_temporal_limit")]
    pub temporal_limit: usize,

    /// Staleness detection settings.
    #[serde(default)]
    pub staleness: StalenessConfig,

    /// Batch refresh settings.
    #[serde(default)]
    pub auto_refresh: AutoRefreshConfig,
}

fn default_sop_dir() -> PathBuf {
    PathBuf::from(".taskbrief/sops")
}
fn default_amalgam_dir() -> PathBuf {
    PathBuf::from(".taskbrief/amalgamations")
}
fn default_temporal_limit() -> usize {
    5
}

impl Default for AssemblyConfig {
    fn default() -> Self {
        Self {
            cache_enabled: false,
            sop_dir: default_sop_dir(),
            amalgam_dir: default_amalgam_dir(),
            temporal_limit: default_temporal_limit(),
            staleness: StalenessConfig::default(),
            auto_refresh: AutoRefreshConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StalenessConfig {
    /// Age in days before a record counts as stale.
    #[serde(default = "default_threshold_days")]
    pub threshold_days: u32,

    /// Whether to consult the change log when classifying staleness.
    #[serde(default = "default_true")]
    pub check_change_log: bool,
}

fn default_threshold_days() -> u32 {
    7
}
fn default_true() -> bool {
    true
}

impl Default for StalenessConfig {
    fn default() -> Self {
        Self {
            threshold_days: default_threshold_days(),
            check_change_log: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutoRefreshConfig {
    /// Refresh only high-priority stale records.
    #[serde(default = "default_true")]
    pub only_high_priority: bool,

    /// Consult the smart trigger evaluator before refreshing.
    #[serde(default = "default_true")]
    pub use_smart_triggers: bool,
}

impl Default for AutoRefreshConfig {
    fn default() -> Self {
        Self {
            only_high_priority: true,
            use_smart_triggers: true,
        }
    }
}

impl AssemblyConfig {
    /// Load from the given path with environment overrides applied.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load_from(path)?;

        // Environment variable overrides (highest priority)
        if let Ok(v) = std::env::var("TASKBRIEF_CACHE_ENABLED") {
            config.cache_enabled = matches!(v.as_str(), "1" | "true" | "yes");
        }
        if let Ok(dir) = std::env::var("TASKBRIEF_SOP_DIR") {
            config.sop_dir = PathBuf::from(dir);
        }
        if let Ok(dir) = std::env::var("TASKBRIEF_AMALGAM_DIR") {
            config.amalgam_dir = PathBuf::from(dir);
        }
        if let Ok(days) = std::env::var("TASKBRIEF_STALENESS_DAYS") {
            config.staleness.threshold_days = days.parse().map_err(|_| {
                ConfigError::ValidationError(format!(
                    "TASKBRIEF_STALENESS_DAYS is not a number: {days}"
                ))
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path without env overrides.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.temporal_limit == 0 {
            return Err(ConfigError::ValidationError(
                "temporal_limit must be at least 1".into(),
            ));
        }
        if self.staleness.threshold_days == 0 {
            return Err(ConfigError::ValidationError(
                "staleness.threshold_days must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Errors from configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}
