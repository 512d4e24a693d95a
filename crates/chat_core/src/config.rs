use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};
use crate::params::{Credential, SessionParameters};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub endpoint_url: Option<String>,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: u8,
    #[serde(default)]
    pub system_message: String,
    #[serde(default)]
    pub api_key: Option<String>,
}

const CONFIG_FILE_PATH: &str = "config.toml";
const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
const DEFAULT_TEMPERATURE: u8 = 50;

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_temperature() -> u8 {
    DEFAULT_TEMPERATURE
}

fn docchat_dir() -> PathBuf {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
        .unwrap_or_else(std::env::temp_dir)
        .join(".docchat")
}

fn docchat_config_json_path() -> PathBuf {
    docchat_dir().join("config.json")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint_url: None,
            model: default_model(),
            temperature: default_temperature(),
            system_message: String::new(),
            api_key: None,
        }
    }
}

impl Config {
    /// Load from `~/.docchat/config.json`, else `./config.toml`, then apply
    /// `DOCCHAT_*` environment overrides.
    pub fn load() -> Self {
        let mut config = Self::from_files(&docchat_config_json_path(), Path::new(CONFIG_FILE_PATH));
        config.apply_overrides(|key| std::env::var(key).ok());
        config
    }

    /// The JSON file wins over the TOML file; unreadable files are skipped.
    pub fn from_files(json_path: &Path, toml_path: &Path) -> Self {
        if json_path.exists() {
            match Self::from_json_file(json_path) {
                Ok(config) => return config,
                Err(e) => tracing::warn!("Skipping config {}: {}", json_path.display(), e),
            }
        }

        if toml_path.exists() {
            match Self::from_toml_file(toml_path) {
                Ok(config) => return config,
                Err(e) => tracing::warn!("Skipping config {}: {}", toml_path.display(), e),
            }
        }

        Self::default()
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Apply overrides from a key lookup (the process environment in `load`).
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("DOCCHAT_WS_URL") {
            self.endpoint_url = Some(url);
        }
        if let Some(model) = lookup("DOCCHAT_MODEL") {
            self.model = model;
        }
        if let Some(raw) = lookup("DOCCHAT_TEMPERATURE") {
            match raw.trim().parse::<u8>() {
                Ok(temperature) => self.temperature = temperature,
                Err(e) => tracing::warn!("Ignoring DOCCHAT_TEMPERATURE={:?}: {}", raw, e),
            }
        }
        if let Some(system) = lookup("DOCCHAT_SYSTEM_MESSAGE") {
            self.system_message = system;
        }
        if let Some(api_key) = lookup("DOCCHAT_API_KEY") {
            self.api_key = Some(api_key);
        }
    }

    /// Validate into the parameters a session connects with.
    pub fn session_parameters(&self) -> Result<SessionParameters> {
        let endpoint_url = self
            .endpoint_url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
            .ok_or(ConfigError::Missing("endpoint_url"))?;

        let params = SessionParameters::new(
            endpoint_url,
            self.model.clone(),
            self.temperature,
            self.system_message.clone(),
        )?;

        let credential = self
            .api_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .map(Credential::new);

        Ok(params.with_credential(credential))
    }
}
