use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Origin serving the chat, URL and upload endpoints
    pub base_url: String,

    /// Endpoint paths relative to `base_url`
    pub endpoints: Endpoints,

    /// Per-request timeout. Unset means requests may wait forever.
    pub request_timeout_secs: Option<u64>,

    /// UI preferences
    pub ui: UiConfig,

    /// llm-chat home directory
    #[serde(skip)]
    pub home: PathBuf,
}

/// Endpoint path configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    pub chat: String,
    pub fetch_url: String,
    pub upload: String,
}

/// UI configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    pub title: String,
    pub tick_rate_ms: u64,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            chat: "/api/chat".to_string(),
            fetch_url: "/api/fetch_url".to_string(),
            upload: "/api/upload".to_string(),
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            title: "LLM Chat".to_string(),
            tick_rate_ms: 100,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            base_url: "http://localhost:8000".to_string(),
            endpoints: Endpoints::default(),
            request_timeout_secs: None,
            ui: UiConfig::default(),
            home: default_home(),
        }
    }
}

fn default_home() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".llm-chat")
}

impl Config {
    /// Load configuration from `path`, or from `~/.llm-chat/config.toml` when none is given.
    /// A missing file yields the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let home = default_home();
        let config_path = path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| home.join("config.toml"));

        let mut config = if config_path.exists() {
            let content = fs::read_to_string(&config_path)
                .with_context(|| format!("Failed to read config file {}", config_path.display()))?;
            Self::from_toml(&content)
                .with_context(|| format!("Failed to parse config file {}", config_path.display()))?
        } else {
            tracing::debug!(path = %config_path.display(), "no config file, using defaults");
            Config::default()
        };

        config.home = home;
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }

    /// Render the effective configuration
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config")
    }

    /// Directory for log files
    pub fn log_dir(&self) -> PathBuf {
        self.home.join("logs")
    }

    pub fn chat_url(&self) -> String {
        self.endpoint_url(&self.endpoints.chat)
    }

    pub fn fetch_url_url(&self) -> String {
        self.endpoint_url(&self.endpoints.fetch_url)
    }

    pub fn upload_url(&self) -> String {
        self.endpoint_url(&self.endpoints.upload)
    }

    fn endpoint_url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}
