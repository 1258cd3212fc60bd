use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";

/// Main application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the chat backend, without the `/api/...` suffix
    pub api_base_url: String,

    /// Upper bound for one chat exchange, in seconds
    pub chat_timeout_secs: u64,

    /// Upper bound for one health probe, in seconds
    pub health_timeout_secs: u64,

    /// aidoc home directory (config file and logs)
    #[serde(skip)]
    pub aidoc_home: PathBuf,

    /// UI preferences
    pub ui: UiConfig,
}

/// UI configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    /// Show the backend's "context used" list under replies
    pub show_context: bool,
    /// Redraw interval, drives the typing indicator animation
    pub tick_rate_ms: u64,
    /// Ask before discarding a non-empty conversation
    pub confirm_reset: bool,
}

impl Default for UiConfig {
    fn default() -> Self {
        UiConfig {
            show_context: true,
            tick_rate_ms: 250,
            confirm_reset: true,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("~"));

        Config {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            chat_timeout_secs: 60,
            health_timeout_secs: 5,
            aidoc_home: home.join(".aidoc"),
            ui: UiConfig::default(),
        }
    }
}

impl Config {
    /// Load `~/.aidoc/config.toml`, falling back to defaults when it does not exist
    pub fn load() -> Result<Self> {
        let home = dirs::home_dir().context("Could not find home directory")?;
        let aidoc_home = home.join(".aidoc");

        fs::create_dir_all(&aidoc_home).context("Failed to create .aidoc directory")?;

        let mut config = Self::load_from(&aidoc_home.join("config.toml"))?;
        config.aidoc_home = aidoc_home;
        Ok(config)
    }

    /// Load configuration from an explicit file; a missing file yields defaults
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            toml::from_str::<Config>(&content)
                .with_context(|| format!("Failed to parse config file {}", path.display()))?
        } else {
            Config::default()
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                config.aidoc_home = parent.to_path_buf();
            }
        }

        Ok(config)
    }

    /// Save configuration to `config.toml` in the aidoc home
    pub fn save(&self) -> Result<()> {
        fs::create_dir_all(&self.aidoc_home).context("Failed to create .aidoc directory")?;
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(self.config_path(), content).context("Failed to write config file")?;
        Ok(())
    }

    pub fn config_path(&self) -> PathBuf {
        self.aidoc_home.join("config.toml")
    }

    pub fn log_dir(&self) -> PathBuf {
        self.aidoc_home.join("logs")
    }

    /// Point the client at a different backend for this run
    pub fn set_api_base_url(&mut self, url: impl Into<String>) {
        let url = url.into();
        self.api_base_url = url.trim_end_matches('/').to_string();
    }

    pub fn chat_timeout(&self) -> Duration {
        Duration::from_secs(self.chat_timeout_secs)
    }

    pub fn health_timeout(&self) -> Duration {
        Duration::from_secs(self.health_timeout_secs)
    }

    pub fn tick_rate(&self) -> Duration {
        Duration::from_millis(self.ui.tick_rate_ms.max(16))
    }
}
