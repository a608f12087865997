//! Settings loaded from `config.yaml` with environment overrides.
//!
//! Every field has a default, so a missing file is the common case.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::error::Result;
use crate::storage::default_data_dir;

pub const DEFAULT_AI_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_AI_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Directory holding the two task collections.
    pub data_dir: PathBuf,
    /// Directory export files are written to.
    pub export_dir: PathBuf,
    pub notifications: NotificationSettings,
    pub ai: AiSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            export_dir: PathBuf::from("."),
            notifications: NotificationSettings::default(),
            ai: AiSettings::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NotificationSettings {
    pub enabled: bool,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self { enabled: true }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AiSettings {
    pub api_key: Option<String>,
    pub model: String,
    pub endpoint: String,
    pub timeout_secs: u64,
}

impl Default for AiSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_AI_MODEL.to_string(),
            endpoint: DEFAULT_AI_ENDPOINT.to_string(),
            timeout_secs: 30,
        }
    }
}

/// Config file location: `TASKFLOW_CONFIG`, else `<config_dir>/taskflow/config.yaml`.
pub fn default_config_path() -> Option<PathBuf> {
    std::env::var("TASKFLOW_CONFIG")
        .ok()
        .map(PathBuf::from)
        .or_else(|| dirs::config_dir().map(|d| d.join("taskflow").join("config.yaml")))
}

impl Settings {
    /// Loads settings from the default location and applies env overrides.
    pub fn load() -> Result<Self> {
        let mut settings = match default_config_path() {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };
        settings.apply_env(|k| std::env::var(k).ok());
        Ok(settings)
    }

    /// Reads a YAML file; a missing file yields defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let s = std::fs::read_to_string(path)?;
        Self::from_yaml(&s)
    }

    pub fn from_yaml(s: &str) -> Result<Self> {
        if s.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(s)?)
    }

    /// Applies `TASKFLOW_DATA_DIR`, `TASKFLOW_EXPORT_DIR` and the API key
    /// variables (`GEMINI_API_KEY`, then `API_KEY`).
    pub fn apply_env<F>(&mut self, var: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = var("TASKFLOW_DATA_DIR").filter(|v| !v.is_empty()) {
            self.data_dir = PathBuf::from(dir);
        }
        if let Some(dir) = var("TASKFLOW_EXPORT_DIR").filter(|v| !v.is_empty()) {
            self.export_dir = PathBuf::from(dir);
        }
        if let Some(key) = var("GEMINI_API_KEY")
            .or_else(|| var("API_KEY"))
            .filter(|v| !v.trim().is_empty())
        {
            self.ai.api_key = Some(key);
        }
    }
}
