use anyhow::{Context, Result};
use log::debug;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Settings that rarely change between invocations, read from
/// `<config_dir>/maia/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub maia: Settings,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    /// HTTP proxy for all backend requests
    #[serde(default)]
    pub proxy: Option<String>,
    /// Send `/federate` requests to this base URL instead of the backend URL
    #[serde(default)]
    pub federate_url: Option<String>,
    /// Skip TLS certificate verification
    #[serde(default)]
    pub insecure: bool,
    /// Default zone for rendered timestamps (IANA name or `local`)
    #[serde(default)]
    pub timezone: Option<String>,
}

impl Config {
    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = if cfg!(target_os = "linux") {
            dirs::config_dir()
                .context("Failed to get XDG config directory")?
                .join("maia")
        } else {
            dirs::home_dir()
                .context("Failed to get home directory")?
                .join(".maia")
        };

        Ok(config_dir.join("config.toml"))
    }

    /// Load the config file if there is one, then apply environment switches.
    pub fn load() -> Result<Self> {
        let config_path = Self::get_config_path()?;
        debug!("Loading config from: {:?}", config_path);

        let mut config = if config_path.exists() {
            let config_content = fs::read_to_string(&config_path)
                .with_context(|| format!("Failed to read config file: {:?}", config_path))?;
            Self::from_toml(&config_content)
                .with_context(|| format!("Failed to parse config file: {:?}", config_path))?
        } else {
            debug!("Config file doesn't exist, using defaults");
            Self::default()
        };

        config.apply_env();
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    fn apply_env(&mut self) {
        if insecure_requested() {
            self.maia.insecure = true;
        }
    }
}

/// `MAIA_INSECURE=1` turns off certificate verification.
pub fn insecure_requested() -> bool {
    std::env::var("MAIA_INSECURE").map(|v| v == "1").unwrap_or(false)
}

pub fn debug_requested() -> bool {
    std::env::var("MAIA_DEBUG").map(|v| v == "1").unwrap_or(false)
}
