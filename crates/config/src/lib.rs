//! Configuration loading, validation, and management for the campus advisor.
//!
//! Loads configuration from `~/.advisor/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful student advisor for Duke University. \
Answer questions about academics, programs, courses, and campus events. \
Use the available tools to look up handbook content, the course catalog, and the events \
calendar instead of guessing, and say so when a lookup returns nothing useful.";

/// The root configuration structure.
///
/// Maps directly to `~/.advisor/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key for the chat provider (can be overridden per-provider)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Chat provider name
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Chat model
    #[serde(default = "default_model")]
    pub model: String,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Max tokens per model response
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// System instruction prepended to every model request
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,

    /// Provider-specific configurations
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,

    /// Tool loop limits
    #[serde(default)]
    pub agent: AgentConfig,

    /// Lookup tool settings
    #[serde(default)]
    pub tools: ToolsConfig,

    /// Answer-quality evaluation settings
    #[serde(default)]
    pub eval: EvalConfig,
}

fn default_provider() -> String {
    "openai".into()
}
fn default_model() -> String {
    "gpt-4o-mini".into()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_system_prompt() -> String {
    DEFAULT_SYSTEM_PROMPT.into()
}

fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("providers", &self.providers)
            .field("agent", &self.agent)
            .field("tools", &self.tools)
            .field("eval", &self.eval)
            .finish()
    }
}

#[derive(Clone, Default, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Maximum model calls per user exchange
    #[serde(default = "default_max_rounds")]
    pub max_rounds: u32,

    /// Wall-clock limit for one exchange, 0 disables it
    #[serde(default = "default_turn_timeout")]
    pub turn_timeout_secs: u64,
}

fn default_max_rounds() -> u32 {
    8
}
fn default_turn_timeout() -> u64 {
    120
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_rounds: default_max_rounds(),
            turn_timeout_secs: default_turn_timeout(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolsConfig {
    #[serde(default)]
    pub catalog: CatalogConfig,

    #[serde(default)]
    pub events: EventsConfig,

    #[serde(default)]
    pub handbooks: HandbooksConfig,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    #[serde(default = "default_catalog_url")]
    pub base_url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

fn default_catalog_url() -> String {
    "https://streamer.oit.duke.edu".into()
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: default_catalog_url(),
            api_key: None,
        }
    }
}

impl std::fmt::Debug for CatalogConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &redact(&self.api_key))
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventsConfig {
    #[serde(default = "default_events_url")]
    pub base_url: String,

    /// How many days ahead to fetch when the model doesn't say
    #[serde(default = "default_future_days")]
    pub future_days: u32,

    /// Cap on events returned to the model
    #[serde(default = "default_max_results")]
    pub max_results: usize,
}

fn default_events_url() -> String {
    "https://calendar.duke.edu/events/index.json".into()
}
fn default_future_days() -> u32 {
    30
}
fn default_max_results() -> usize {
    10
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            base_url: default_events_url(),
            future_days: default_future_days(),
            max_results: default_max_results(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandbooksConfig {
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    /// Index file for the Master of Engineering Management handbook
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mem_index: Option<PathBuf>,

    /// Index file for the Pratt School of Engineering handbook
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pratt_index: Option<PathBuf>,

    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

fn default_embedding_model() -> String {
    "text-embedding-3-small".into()
}
fn default_top_k() -> usize {
    3
}

impl Default for HandbooksConfig {
    fn default() -> Self {
        Self {
            embedding_model: default_embedding_model(),
            mem_index: None,
            pratt_index: None,
            top_k: default_top_k(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvalConfig {
    /// Provider serving the judge model
    #[serde(default = "default_eval_provider")]
    pub provider: String,

    #[serde(default = "default_eval_model")]
    pub model: String,

    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Initial backoff, doubled after every failed attempt
    #[serde(default = "default_retry_delay")]
    pub retry_delay_secs: u64,
}

fn default_eval_provider() -> String {
    "ollama".into()
}
fn default_eval_model() -> String {
    "llama3".into()
}
fn default_max_retries() -> u32 {
    3
}
fn default_retry_delay() -> u64 {
    2
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            provider: default_eval_provider(),
            model: default_eval_model(),
            max_retries: default_max_retries(),
            retry_delay_secs: default_retry_delay(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.advisor/config.toml).
    ///
    /// Environment overrides:
    /// - `ADVISOR_API_KEY`, then `OPENAI_API_KEY` (when no key is configured)
    /// - `ADVISOR_MODEL`
    /// - `DUKE_API_KEY` for the course catalog
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env(|key| std::env::var(key).ok());
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

    /// Apply environment overrides through a lookup function.
    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if self.api_key.is_none() {
            self.api_key = var("ADVISOR_API_KEY").or_else(|| var("OPENAI_API_KEY"));
        }

        if let Some(model) = var("ADVISOR_MODEL") {
            self.model = model;
        }

        if self.tools.catalog.api_key.is_none() {
            self.tools.catalog.api_key = var("DUKE_API_KEY");
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".advisor")
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ConfigError::ValidationError(
                "temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.agent.max_rounds == 0 {
            return Err(ConfigError::ValidationError(
                "agent.max_rounds must be at least 1".into(),
            ));
        }

        if self.tools.handbooks.top_k == 0 {
            return Err(ConfigError::ValidationError(
                "tools.handbooks.top_k must be at least 1".into(),
            ));
        }

        Ok(())
    }

    /// API key for a named provider: its own key, else the global one.
    pub fn api_key_for(&self, provider: &str) -> Option<String> {
        self.providers
            .get(provider)
            .and_then(|p| p.api_key.clone())
            .or_else(|| self.api_key.clone())
    }

    /// Generate a default config TOML string.
    pub fn default_toml() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            provider: default_provider(),
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: None,
            system_prompt: default_system_prompt(),
            providers: HashMap::new(),
            agent: AgentConfig::default(),
            tools: ToolsConfig::default(),
            eval: EvalConfig::default(),
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
