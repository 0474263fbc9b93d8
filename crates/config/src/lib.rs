//! Configuration loading, validation, and management for splice.
//!
//! Loads configuration from `~/.splice/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// The root configuration structure.
///
/// Maps directly to `~/.splice/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Per-round backend defaults
    #[serde(default)]
    pub backend: BackendConfig,

    /// Continuation loop settings
    #[serde(default)]
    pub reassembly: ReassemblyConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_model() -> String {
    "anthropic/claude-3.5-sonnet".into()
}
fn default_temperature() -> f32 {
    0.1
}
fn default_max_tokens() -> u32 {
    4000
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReassemblyConfig {
    /// Round budget per reassembly operation
    #[serde(default = "default_max_rounds")]
    pub max_rounds: u32,

    /// Timeout applied to every backend round-trip
    #[serde(default = "default_round_timeout_secs")]
    pub round_timeout_secs: u64,
}

fn default_max_rounds() -> u32 {
    splice_core::MAX_ROUNDS
}
fn default_round_timeout_secs() -> u64 {
    60
}

impl Default for ReassemblyConfig {
    fn default() -> Self {
        Self {
            max_rounds: default_max_rounds(),
            round_timeout_secs: default_round_timeout_secs(),
        }
    }
}

impl ReassemblyConfig {
    pub fn round_timeout(&self) -> Duration {
        Duration::from_secs(self.round_timeout_secs)
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.splice/config.toml).
    ///
    /// Environment overrides (highest priority):
    /// - `SPLICE_MODEL`
    /// - `SPLICE_MAX_ROUNDS`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;

        if let Ok(model) = std::env::var("SPLICE_MODEL") {
            config.backend.model = model;
        }

        if let Ok(rounds) = std::env::var("SPLICE_MAX_ROUNDS") {
            config.reassembly.max_rounds = rounds.trim().parse().map_err(|_| {
                ConfigError::ValidationError(format!(
                    "SPLICE_MAX_ROUNDS must be a positive integer, got '{rounds}'"
                ))
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        Self::parse(&content).map_err(|e| match e {
            ConfigError::ParseError { reason, .. } => ConfigError::ParseError {
                path: path.to_path_buf(),
                reason,
            },
            other => other,
        })
    }

    /// Parse and validate configuration from TOML text.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(|e| ConfigError::ParseError {
            path: PathBuf::from("<inline>"),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".splice")
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.backend.temperature) {
            return Err(ConfigError::ValidationError(
                "backend.temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.reassembly.max_rounds == 0 {
            return Err(ConfigError::ValidationError(
                "reassembly.max_rounds must be at least 1".into(),
            ));
        }

        if self.reassembly.round_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "reassembly.round_timeout_secs must be at least 1".into(),
            ));
        }

        Ok(())
    }

    /// Generate a default config TOML string.
    pub fn default_toml() -> String {
        Self::default().to_toml()
    }

    /// Render this configuration as TOML.
    pub fn to_toml(&self) -> String {
        toml::to_string_pretty(self).unwrap_or_default()
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
