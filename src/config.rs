use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const ENDPOINT_ENV: &str = "TASKCHAT_ENDPOINT";
pub const USER_ID_ENV: &str = "TASKCHAT_USER_ID";

/// Main application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Fully-qualified URL of the conversation endpoint
    pub endpoint: String,

    /// Identifier sent with every turn
    pub user_id: String,

    /// Where the terminal UI writes its log
    pub log_file: PathBuf,

    /// UI preferences
    pub ui: UiConfig,
}

/// UI configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    pub tick_rate_ms: u64,
    pub show_timestamps: bool,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            tick_rate_ms: 250,
            show_timestamps: true,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            endpoint: "http://localhost:8000/chat".to_string(),
            user_id: "demo-user".to_string(),
            log_file: taskchat_home().join("taskchat.log"),
            ui: UiConfig::default(),
        }
    }
}

/// `~/.taskchat`, or a relative `.taskchat` when no home directory exists
pub fn taskchat_home() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".taskchat")
}

impl Config {
    /// Default location of the config file
    pub fn default_path() -> PathBuf {
        taskchat_home().join("config.toml")
    }

    /// Load configuration from `path`, falling back to defaults when the file
    /// does not exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Config::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        tracing::debug!(path = %path.display(), "loaded config file");
        Ok(config)
    }

    /// Save configuration to `path`, creating parent directories
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write config file {}", path.display()))?;
        Ok(())
    }

    /// Apply environment overrides. `lookup` is `std::env::var` in production.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(endpoint) = lookup(ENDPOINT_ENV).filter(|v| !v.trim().is_empty()) {
            self.endpoint = endpoint;
        }
        if let Some(user_id) = lookup(USER_ID_ENV).filter(|v| !v.trim().is_empty()) {
            self.user_id = user_id;
        }
    }

    /// Apply command-line overrides
    pub fn apply_overrides(&mut self, endpoint: Option<String>, user_id: Option<String>) {
        if let Some(endpoint) = endpoint {
            self.endpoint = endpoint;
        }
        if let Some(user_id) = user_id {
            self.user_id = user_id;
        }
    }

    /// Parsed endpoint. Only absolute http(s) URLs are accepted, so a bare
    /// host name is rejected here instead of failing on every request.
    pub fn endpoint_url(&self) -> Result<reqwest::Url> {
        let url = reqwest::Url::parse(self.endpoint.trim())
            .with_context(|| format!("Invalid endpoint URL '{}'", self.endpoint))?;

        match url.scheme() {
            "http" | "https" => {}
            other => bail!(
                "Endpoint '{}' must use http or https, not '{}'",
                self.endpoint,
                other
            ),
        }
        if url.host_str().is_none() {
            bail!("Endpoint '{}' has no host", self.endpoint);
        }

        Ok(url)
    }

    /// Check the configuration is usable
    pub fn validate(&self) -> Result<()> {
        self.endpoint_url()?;
        if self.user_id.trim().is_empty() {
            bail!("user_id must not be empty");
        }
        if self.ui.tick_rate_ms == 0 {
            bail!("ui.tick_rate_ms must be greater than zero");
        }
        Ok(())
    }
}
