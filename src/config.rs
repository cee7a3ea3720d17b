//! Application configuration management.
//!
//! This module handles loading and saving the application configuration,
//! which includes the script endpoint URL and the last used username.
//!
//! Configuration is stored at `~/.config/rollcall/config.json`. The
//! `ROLLCALL_SCRIPT_URL` environment variable overrides the configured
//! endpoint, which keeps the URL out of the config file on shared stations.

use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Application name used for config/cache directory paths
const APP_NAME: &str = "rollcall";

/// Config file name
const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub script_url: Option<String>,
    pub last_username: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            Ok(serde_json::from_str(&contents)?)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// The script endpoint to talk to: environment first, then config file.
    pub fn script_url(&self) -> Result<String> {
        if let Ok(url) = std::env::var("ROLLCALL_SCRIPT_URL") {
            if !url.is_empty() {
                return Ok(url);
            }
        }
        self.script_url
            .clone()
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "No script URL configured. Set ROLLCALL_SCRIPT_URL or add script_url to the config file."
                )
            })
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn cache_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }
}
