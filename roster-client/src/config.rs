//! Configuration loading for roster-client.
//!
//! Configuration is loaded from a TOML file (e.g. `roster.toml`):
//!
//! ```toml
//! [session]
//! local_uid = "me"
//!
//! [requests]
//! timeout_secs = 15
//!
//! [push]
//! max_payload_bytes = 65536
//! ```

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use roster_types::Uid;

/// Root configuration for roster-client.
#[derive(Debug, Clone, Deserialize)]
pub struct RosterConfig {
    /// Signed-in session.
    pub session: SessionConfig,
    /// SDK request settings.
    #[serde(default)]
    pub requests: RequestConfig,
    /// Push handling settings.
    #[serde(default)]
    pub push: PushConfig,
}

/// Signed-in session.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// The local user. Blank ids are rejected while parsing.
    pub local_uid: Uid,
}

/// SDK request settings.
#[derive(Debug, Clone, Deserialize)]
pub struct RequestConfig {
    /// Seconds to wait for an SDK completion (default: 15).
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Push handling settings.
#[derive(Debug, Clone, Deserialize)]
pub struct PushConfig {
    /// Pushes larger than this are discarded (default: 64KB).
    #[serde(default = "default_max_payload_bytes")]
    pub max_payload_bytes: usize,
}

// Default value functions
fn default_timeout_secs() -> u64 {
    15
}

fn default_max_payload_bytes() -> usize {
    64 * 1024 // 64KB
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for PushConfig {
    fn default() -> Self {
        Self {
            max_payload_bytes: default_max_payload_bytes(),
        }
    }
}

impl RosterConfig {
    /// Configuration for `local_uid` with default settings.
    pub fn new(local_uid: Uid) -> Self {
        Self {
            session: SessionConfig { local_uid },
            requests: RequestConfig::default(),
            push: PushConfig::default(),
        }
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or validated.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check settings that parse but cannot work.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.requests.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "requests.timeout_secs must be greater than 0".into(),
            ));
        }
        if self.push.max_payload_bytes == 0 {
            return Err(ConfigError::Invalid(
                "push.max_payload_bytes must be greater than 0".into(),
            ));
        }
        Ok(())
    }

    /// The request timeout as a [`Duration`].
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.requests.timeout_secs)
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// Failed to parse configuration file.
    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying TOML parse error.
        source: toml::de::Error,
    },
    /// A setting has an unusable value.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}
