//! Client configuration
//!
//! Loaded from `<config dir>/wolfchat/config.toml`. Every field has a default,
//! so a missing file or a partial file is fine.

use crate::{ChatError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Environment variable overriding the backend base URL
pub const API_URL_ENV: &str = "WOLFCHAT_API_URL";

const APP_DIR: &str = "wolfchat";

/// Backend connection settings
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the assistant backend
    pub base_url: String,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            timeout_secs: 30,
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Microphone capture settings
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordingConfig {
    /// Chunk granularity in milliseconds
    pub timeslice_ms: u64,

    /// Preferred capture sample rate
    pub sample_rate: u32,

    pub echo_cancellation: bool,

    pub noise_suppression: bool,
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            timeslice_ms: 100,
            sample_rate: 44100,
            echo_cancellation: true,
            noise_suppression: true,
        }
    }
}

impl RecordingConfig {
    pub fn timeslice(&self) -> Duration {
        Duration::from_millis(self.timeslice_ms)
    }
}

/// Where client-local state lives
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Credential file; defaults to `<data dir>/wolfchat/session.json`
    pub credentials_path: Option<PathBuf>,
}

impl StorageConfig {
    pub fn credentials_path(&self) -> Option<PathBuf> {
        self.credentials_path
            .clone()
            .or_else(|| dirs::data_local_dir().map(|dir| dir.join(APP_DIR).join("session.json")))
    }
}

/// Complete client configuration
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub api: ApiConfig,
    pub recording: RecordingConfig,
    pub storage: StorageConfig,
}

impl ClientConfig {
    /// Default location of the config file
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join("config.toml"))
    }

    /// Load from the default location, then apply environment overrides
    pub fn load() -> Result<Self> {
        let mut config = match Self::default_path() {
            Some(path) if path.exists() => Self::from_file(&path)?,
            _ => {
                debug!("No config file found, using defaults");
                Self::default()
            }
        };

        if let Ok(url) = std::env::var(API_URL_ENV) {
            config.api.base_url = url;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config = Self::from_toml(&raw)?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn from_toml(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|e| ChatError::ConfigError(format!("Invalid config: {}", e)))
    }

    /// Set the backend base URL
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.api.base_url = base_url.into();
        self
    }

    /// Set the credential file location
    pub fn with_credentials_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.storage.credentials_path = Some(path.into());
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        let url = self.api.base_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ChatError::ConfigError(format!(
                "Base URL must be http(s): {:?}",
                self.api.base_url
            )));
        }

        if self.api.timeout_secs == 0 {
            return Err(ChatError::ConfigError("Request timeout must be positive".into()));
        }

        if self.recording.timeslice_ms == 0 {
            return Err(ChatError::ConfigError("Recording timeslice must be positive".into()));
        }

        Ok(())
    }
}
