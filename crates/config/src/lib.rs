//! Configuration loading and validation for FlowChat.
//!
//! Loads configuration from `~/.flowchat/config.toml` with environment
//! variable overrides, and builds the per-turn [`ChatContext`].
//!
//! There is no process-global mutable configuration: the caller constructs
//! a `ChatContext` from the current `AppConfig` once per turn and hands it
//! to the orchestrator. Updating the config simply produces a new context
//! for subsequent turns; the switch is not atomic across turns already in
//! flight, which is acceptable for interactive use.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.flowchat/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Chat endpoint base URL (OpenAI-compatible `/v1` root)
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// API key for the chat endpoint (local backends may not need one)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Default model
    #[serde(default = "default_model")]
    pub model: String,

    /// Default temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Default max tokens per model response
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Whether reasoning events are forwarded to the consumer
    #[serde(default = "default_true")]
    pub show_thinking: bool,

    /// Intent-classifier settings
    #[serde(default)]
    pub classifier: ClassifierConfig,

    /// Weather capability settings
    #[serde(default)]
    pub weather: WeatherConfig,
}

fn default_base_url() -> String {
    "http://localhost:11434/v1".into()
}
fn default_model() -> String {
    "qwen3:8b".into()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_max_tokens() -> u32 {
    4096
}
fn default_true() -> bool {
    true
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &redact(&self.api_key))
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("show_thinking", &self.show_thinking)
            .field("classifier", &self.classifier)
            .field("weather", &self.weather)
            .finish()
    }
}

/// Settings for the classifier pre-pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Model for classification calls; `None` uses the main model.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Classification temperature. Kept low: the classifier must answer
    /// from a closed instruction set.
    #[serde(default = "default_classifier_temperature")]
    pub temperature: f32,
}

fn default_classifier_temperature() -> f32 {
    0.0
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            model: None,
            temperature: default_classifier_temperature(),
        }
    }
}

/// Settings for the geocoding / current-conditions capability.
#[derive(Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    #[serde(default = "default_geo_base_url")]
    pub geo_base_url: String,

    #[serde(default = "default_weather_base_url")]
    pub weather_base_url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

fn default_geo_base_url() -> String {
    "https://geoapi.qweather.com".into()
}
fn default_weather_base_url() -> String {
    "https://devapi.qweather.com".into()
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            geo_base_url: default_geo_base_url(),
            weather_base_url: default_weather_base_url(),
            api_key: None,
        }
    }
}

impl std::fmt::Debug for WeatherConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeatherConfig")
            .field("geo_base_url", &self.geo_base_url)
            .field("weather_base_url", &self.weather_base_url)
            .field("api_key", &redact(&self.api_key))
            .finish()
    }
}

/// Everything one turn needs, frozen at turn start.
///
/// Built from [`AppConfig::chat_context`]; orchestrators never read
/// configuration from anywhere else.
#[derive(Debug, Clone)]
pub struct ChatContext {
    pub base_url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
    pub show_thinking: bool,
    pub classifier_model: String,
    pub classifier_temperature: f32,
}

impl AppConfig {
    /// Load configuration from the default path (`~/.flowchat/config.toml`),
    /// or the file named by `FLOWCHAT_CONFIG`.
    ///
    /// Environment variable overrides:
    /// - `FLOWCHAT_API_KEY` — chat endpoint key
    /// - `FLOWCHAT_MODEL` — model name
    /// - `QWEATHER_API_KEY` — weather capability key
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = std::env::var("FLOWCHAT_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| Self::config_dir().join("config.toml"));
        let mut config = Self::load_from(&config_path)?;

        if config.api_key.is_none() {
            config.api_key = std::env::var("FLOWCHAT_API_KEY").ok();
        }
        if let Ok(model) = std::env::var("FLOWCHAT_MODEL") {
            config.model = model;
        }
        if config.weather.api_key.is_none() {
            config.weather.api_key = std::env::var("QWEATHER_API_KEY").ok();
        }

        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".flowchat")
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.temperature < 0.0 || self.temperature > 2.0 {
            return Err(ConfigError::ValidationError(
                "temperature must be between 0.0 and 2.0".into(),
            ));
        }
        if self.max_tokens == 0 {
            return Err(ConfigError::ValidationError(
                "max_tokens must be greater than 0".into(),
            ));
        }
        Ok(())
    }

    /// Build the per-turn context from the current configuration.
    pub fn chat_context(&self) -> ChatContext {
        ChatContext {
            base_url: self.base_url.clone(),
            api_key: self.api_key.clone(),
            model: self.model.clone(),
            temperature: self.temperature,
            max_tokens: Some(self.max_tokens),
            show_thinking: self.show_thinking,
            classifier_model: self
                .classifier
                .model
                .clone()
                .unwrap_or_else(|| self.model.clone()),
            classifier_temperature: self.classifier.temperature,
        }
    }

    /// Generate a default config TOML string.
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: None,
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            show_thinking: true,
            classifier: ClassifierConfig::default(),
            weather: WeatherConfig::default(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
