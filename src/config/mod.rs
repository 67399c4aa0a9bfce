//! Configuration management.
//!
//! Configuration is read from `~/.config/newsreel/config.toml` at startup.
//! If the file doesn't exist, a default configuration with comments is created.

use serde::Deserialize;
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use crate::pipeline::filter::DEFAULT_TECHNOLOGY_TOKENS;

/// Environment variable that overrides `api.api_key`.
pub const API_KEY_ENV: &str = "NEWS_API_KEY";

/// Main configuration struct.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub feed: FeedConfig,
}

/// Remote news API settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL, with trailing slash, e.g. `https://newsapi.org/v2/`
    pub base_url: String,
    pub api_key: String,
    /// Country code for the business headline feed
    pub country: String,
    /// Comma-separated source ids queried for the technology feed
    pub technology_sources: String,
    /// Language for search results
    pub language: String,
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://newsapi.org/v2/".to_string(),
            api_key: String::new(),
            country: "us".to_string(),
            technology_sources: "techcrunch".to_string(),
            language: "en".to_string(),
            timeout_secs: 10,
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Pagination, search and classification settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    /// Articles requested per feed per page (default: 5)
    pub page_size: u32,
    /// Quiet window before a search query is committed (default: 300)
    pub debounce_ms: u64,
    /// Source-name tokens that mark an article as technology
    pub technology_tokens: Vec<String>,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            page_size: 5,
            debounce_ms: 300,
            technology_tokens: DEFAULT_TECHNOLOGY_TOKENS
                .iter()
                .map(|t| t.to_string())
                .collect(),
        }
    }
}

impl FeedConfig {
    pub fn debounce_window(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

impl Config {
    /// Load configuration from the default path.
    ///
    /// If the config file doesn't exist, creates a default one with comments.
    /// Missing fields in the config file will use default values.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::default_config_path()?;

        let mut config = if config_path.exists() {
            Self::load_from(&config_path)?
        } else {
            Self::create_default_config(&config_path)?;
            Self::default()
        };

        config.apply_env();
        Ok(config)
    }

    pub fn load_from(path: &PathBuf) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.clone(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.clone(),
            source: e,
        })
    }

    /// Get the default config file path: `~/.config/newsreel/config.toml`
    pub fn default_config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("newsreel").join("config.toml"))
    }

    /// Defaults plus environment overrides, for when no file can be read.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    fn apply_env(&mut self) {
        if let Ok(key) = std::env::var(API_KEY_ENV) {
            if !key.trim().is_empty() {
                self.api.api_key = key.trim().to_string();
            }
        }
    }

    fn create_default_config(path: &PathBuf) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let mut file = fs::File::create(path).map_err(|e| ConfigError::Io {
            path: path.clone(),
            source: e,
        })?;

        file.write_all(Self::default_config_content().as_bytes())
            .map_err(|e| ConfigError::Io {
                path: path.clone(),
                source: e,
            })?;

        tracing::info!("Wrote default config to {}", path.display());
        Ok(())
    }

    fn default_config_content() -> String {
        r##"# newsreel configuration
#
# The API key can also be supplied through the NEWS_API_KEY environment
# variable, which takes precedence over the value below.

[api]
base_url = "https://newsapi.org/v2/"
api_key = ""

# Country for the business headline feed
country = "us"

# Comma-separated source ids for the technology feed
technology_sources = "techcrunch"

# Language for search results
language = "en"

# Request timeout in seconds
timeout_secs = 10

[feed]
# Articles requested from each feed per page
page_size = 5

# Quiet period before a search query runs (milliseconds)
debounce_ms = 300

# Source names containing any of these (case-insensitive) count as technology
technology_tokens = ["techcrunch"]
"##
        .to_string()
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Failed to read/write config file at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}
