//! Configuration management for hack-proxy
//!
//! Supports configuration via:
//! 1. Config file (~/.config/hack-proxy/config.toml)
//! 2. Environment variables (GEMINI_API_KEY, GEMINI_BASE_URL, HACK_PROXY_HOST, HACK_PROXY_PORT)
//! 3. CLI arguments (override file/env settings)

use crate::api::{ApiConfig, GenerationParams, ModelRef, DEFAULT_BASE_URL};
use crate::orchestrator::{OrchestratorConfig, DEFAULT_USER_PROMPT};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP listener settings
    pub server: ServerSettings,

    /// Upstream Gemini settings
    pub gemini: GeminiSettings,

    /// Request defaults
    pub prompt: PromptSettings,
}

/// HTTP listener settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Path the generate endpoint is mounted on
    pub route: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8787,
            route: "/api/hack".to_string(),
        }
    }
}

/// Gemini API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeminiSettings {
    /// API key (can also use GEMINI_API_KEY env var)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Base URL for the API
    pub base_url: String,

    /// Version namespaces searched during discovery, in order
    pub namespaces: Vec<String>,

    /// Ask the API for its model list before using the fallbacks
    pub discovery: bool,

    /// Temperature for generation
    pub temperature: f32,

    /// Maximum tokens for responses
    pub max_output_tokens: u32,

    /// Maximum tokens for the retry after a truncated response
    pub retry_max_output_tokens: u32,

    /// Request `application/json` output from the model
    pub force_json: bool,

    /// Deadline for one generation, discovery included
    pub timeout_secs: u64,

    /// Models tried after the discovered one
    pub fallback_models: Vec<ModelRef>,
}

impl Default for GeminiSettings {
    fn default() -> Self {
        let orchestrator = OrchestratorConfig::default();
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            namespaces: orchestrator.namespaces,
            discovery: orchestrator.discovery,
            temperature: orchestrator.params.temperature,
            max_output_tokens: orchestrator.params.max_output_tokens,
            retry_max_output_tokens: orchestrator.retry_max_output_tokens,
            force_json: orchestrator.params.force_json,
            timeout_secs: orchestrator.timeout.as_secs(),
            fallback_models: orchestrator.fallback_models,
        }
    }
}

/// Defaults applied to incoming requests
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptSettings {
    /// Prompt used when the client sends none
    pub default_prompt: String,

    /// Language hint used when the client sends none
    pub default_lang_hint: String,
}

impl Default for PromptSettings {
    fn default() -> Self {
        Self {
            default_prompt: DEFAULT_USER_PROMPT.to_string(),
            default_lang_hint: "auto".to_string(),
        }
    }
}

impl Config {
    /// Get default config file path
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("hack-proxy")
            .join("config.toml")
    }

    /// Load config from specific path
    pub fn load_from(path: PathBuf) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default().with_env_overrides());
        }

        let content = std::fs::read_to_string(&path)?;
        let config: Config = toml::from_str(&content)?;

        Ok(config.with_env_overrides())
    }

    /// Apply environment variable overrides
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|name| std::env::var(name).ok())
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(key) = lookup("GEMINI_API_KEY").filter(|k| !k.is_empty()) {
            self.gemini.api_key = Some(key);
        }
        if let Some(url) = lookup("GEMINI_BASE_URL") {
            self.gemini.base_url = url;
        }
        if let Some(host) = lookup("HACK_PROXY_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("HACK_PROXY_PORT").and_then(|p| p.parse().ok()) {
            self.server.port = port;
        }

        self
    }

    /// Save config to specific path
    pub fn save_to(&self, path: PathBuf) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(&path, content)?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.gemini.namespaces.is_empty() && self.gemini.fallback_models.is_empty() {
            return Err(ConfigError::Invalid(
                "at least one namespace or fallback model is required".to_string(),
            ));
        }
        if self.gemini.timeout_secs == 0 {
            return Err(ConfigError::Invalid("timeout_secs must be positive".to_string()));
        }
        if !self.server.route.starts_with('/') {
            return Err(ConfigError::Invalid(format!(
                "route must start with '/': {}",
                self.server.route
            )));
        }
        Ok(())
    }

    /// Connection settings for the upstream client
    pub fn api_config(&self) -> ApiConfig {
        ApiConfig {
            api_key: self.gemini.api_key.clone(),
            base_url: self.gemini.base_url.clone(),
        }
    }

    /// Orchestration settings derived from the `[gemini]` section
    pub fn orchestrator_config(&self) -> OrchestratorConfig {
        OrchestratorConfig {
            namespaces: self.gemini.namespaces.clone(),
            discovery: self.gemini.discovery,
            fallback_models: self
                .gemini
                .fallback_models
                .iter()
                .cloned()
                .map(ModelRef::normalized)
                .collect(),
            params: GenerationParams {
                temperature: self.gemini.temperature,
                max_output_tokens: self.gemini.max_output_tokens,
                force_json: self.gemini.force_json,
            },
            retry_max_output_tokens: self.gemini.retry_max_output_tokens,
            timeout: Duration::from_secs(self.gemini.timeout_secs),
        }
    }

    /// Generate example config content
    pub fn example() -> String {
        let example = Config::default();
        toml::to_string_pretty(&example).unwrap_or_default()
    }
}

/// Builder for creating Config programmatically
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.gemini.api_key = Some(key.into());
        self
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.gemini.base_url = url.into();
        self
    }

    pub fn namespaces(mut self, namespaces: Vec<String>) -> Self {
        self.config.gemini.namespaces = namespaces;
        self
    }

    pub fn discovery(mut self, enabled: bool) -> Self {
        self.config.gemini.discovery = enabled;
        self
    }

    pub fn fallback_models(mut self, models: Vec<ModelRef>) -> Self {
        self.config.gemini.fallback_models = models;
        self
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.config.gemini.timeout_secs = secs;
        self
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.server.host = host.into();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.config.server.port = port;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
