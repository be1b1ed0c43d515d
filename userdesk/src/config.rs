//! Application configuration
//!
//! Central location for naming conventions and defaults, plus the
//! JSON-backed `Settings` that select and configure a backend.

use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

// ===== Naming Conventions =====

/// Table holding user rows
pub const DEFAULT_TABLE: &str = "Users";

/// Bucket holding one image per user row
pub const DEFAULT_BUCKET: &str = "Img";

/// Suffix appended to a record id to form its image key
pub const IMAGE_KEY_SUFFIX: &str = ".jpg";

/// Content type sent with uploads when the caller supplies none
pub const DEFAULT_CONTENT_TYPE: &str = "image/jpeg";

// ===== Hosted Backend =====

/// Request timeout for the hosted backend in seconds
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Environment variable overriding `hosted.url`
pub const ENV_URL: &str = "USERDESK_URL";

/// Environment variable overriding `hosted.api_key`
pub const ENV_API_KEY: &str = "USERDESK_API_KEY";

/// Environment variable overriding `backend`
pub const ENV_BACKEND: &str = "USERDESK_BACKEND";

/// Which pair of stores backs the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Hosted,
    #[default]
    Local,
    Memory,
}

impl std::str::FromStr for BackendKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hosted" => Ok(Self::Hosted),
            "local" => Ok(Self::Local),
            "memory" => Ok(Self::Memory),
            other => Err(AppError::Config(format!("Unknown backend: {}", other))),
        }
    }
}

/// Hosted (REST) backend connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostedSettings {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

impl Default for HostedSettings {
    fn default() -> Self {
        Self {
            url: String::new(),
            api_key: String::new(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Local (SQLite + directory) backend settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalSettings {
    /// Directory holding `userdesk.db` and the `blobs/` tree
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("userdesk-data")
}

impl Default for LocalSettings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// Top-level settings file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub backend: BackendKind,
    #[serde(default = "default_table")]
    pub table: String,
    #[serde(default = "default_bucket")]
    pub bucket: String,
    #[serde(default)]
    pub hosted: HostedSettings,
    #[serde(default)]
    pub local: LocalSettings,
}

fn default_table() -> String {
    DEFAULT_TABLE.to_string()
}

fn default_bucket() -> String {
    DEFAULT_BUCKET.to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            table: default_table(),
            bucket: default_bucket(),
            hosted: HostedSettings::default(),
            local: LocalSettings::default(),
        }
    }
}

impl Settings {
    /// Load settings from a JSON file, falling back to defaults if it is missing
    pub async fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::info!("No settings file at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).await?;
        let settings: Settings = serde_json::from_str(&content)?;

        tracing::debug!("Loaded settings from {:?}", path);
        Ok(settings)
    }

    /// Overlay `USERDESK_*` environment variables
    pub fn apply_env(mut self) -> Result<Self> {
        if let Ok(url) = std::env::var(ENV_URL) {
            self.hosted.url = url;
        }
        if let Ok(key) = std::env::var(ENV_API_KEY) {
            self.hosted.api_key = key;
        }
        if let Ok(backend) = std::env::var(ENV_BACKEND) {
            self.backend = backend.parse()?;
        }
        Ok(self)
    }

    /// Reject settings that cannot produce a working backend
    pub fn validate(&self) -> Result<()> {
        if self.table.trim().is_empty() {
            return Err(AppError::Config("table must not be empty".to_string()));
        }
        if self.bucket.trim().is_empty() {
            return Err(AppError::Config("bucket must not be empty".to_string()));
        }
        if self.backend == BackendKind::Hosted {
            if self.hosted.url.trim().is_empty() {
                return Err(AppError::Config("hosted.url is required".to_string()));
            }
            if self.hosted.api_key.trim().is_empty() {
                return Err(AppError::Config("hosted.api_key is required".to_string()));
            }
        }
        Ok(())
    }
}
