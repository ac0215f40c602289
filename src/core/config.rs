//! Application configuration.
//!
//! Everything has a workable default, so the server runs with no config file
//! at all. A YAML file at the platform config dir (or `--config-path`)
//! overrides the bind address and the provider base URLs; pointing the URLs
//! at mock servers is also how the integration tests drive the binary.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub providers: ProvidersConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 8787,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvidersConfig {
    pub yahoo_base_url: String,
    pub er_api_base_url: String,
    pub frankfurter_base_url: String,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        ProvidersConfig {
            yahoo_base_url: "https://query1.finance.yahoo.com".to_string(),
            er_api_base_url: "https://open.er-api.com".to_string(),
            frankfurter_base_url: "https://api.frankfurter.app".to_string(),
        }
    }
}

impl AppConfig {
    /// Loads the config from `explicit` when given (the file must exist),
    /// otherwise from the default path, falling back to defaults when no
    /// file has been written yet.
    pub fn load(explicit: Option<&Path>) -> Result<AppConfig> {
        match explicit {
            Some(path) => Self::load_from_path(path),
            None => {
                let path = Self::default_config_path()?;
                if path.exists() {
                    Self::load_from_path(&path)
                } else {
                    debug!("No config file at {}, using defaults", path.display());
                    Ok(AppConfig::default())
                }
            }
        }
    }

    pub fn load_from_path(path: &Path) -> Result<AppConfig> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Could not read config file: {}", path.display()))?;
        serde_yaml::from_str(&contents)
            .with_context(|| format!("Could not parse config file: {}", path.display()))
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("io", "wondash", "wondash")
            .context("Could not determine the configuration directory")?;
        Ok(dirs.config_dir().join("config.yaml"))
    }
}
