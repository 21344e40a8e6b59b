//! Configuration for the chat-relay backend.

use std::env;
use std::fmt;
use std::time::Duration;

use chat_relay_common::ModelEntry;
use config::{Config as ConfigLoader, ConfigError, Environment, File};
use serde::Deserialize;

use crate::resolver::ProcessDefaults;

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub defaults: DefaultsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub cors: CorsConfig,
    /// Static model catalog served by `/api/models`.
    #[serde(default = "default_catalog")]
    pub catalog: Vec<ModelEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Upstream completion provider settings.
#[derive(Clone, Deserialize)]
pub struct ProviderConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// API key. When unset the service still starts but reports itself as
    /// not configured and refuses chat requests.
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// Output-token ceiling for models that are not in the catalog.
    #[serde(default = "default_max_tokens_ceiling")]
    pub max_tokens_ceiling: u32,
}

impl ProviderConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Returns the key only if it is present and non-blank.
    pub fn credential(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: None,
            timeout_secs: default_timeout(),
            max_tokens_ceiling: default_max_tokens_ceiling(),
        }
    }
}

// Keeps the key out of logs.
impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("timeout_secs", &self.timeout_secs)
            .field("max_tokens_ceiling", &self.max_tokens_ceiling)
            .finish()
    }
}

/// Generation parameters used when a request does not override them.
#[derive(Debug, Clone, Deserialize)]
pub struct DefaultsConfig {
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CorsConfig {
    /// `*` or a comma-separated list of origins.
    #[serde(default = "default_cors_origins")]
    pub origins: String,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            origins: default_cors_origins(),
        }
    }
}

// Default values
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8000
}
fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}
fn default_timeout() -> u64 {
    60
}
fn default_max_tokens_ceiling() -> u32 {
    4096
}
fn default_model() -> String {
    "gpt-3.5-turbo".to_string()
}
fn default_temperature() -> f64 {
    0.7
}
fn default_max_tokens() -> u32 {
    1000
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_cors_origins() -> String {
    "*".to_string()
}

fn default_catalog() -> Vec<ModelEntry> {
    vec![
        ModelEntry {
            id: "gpt-3.5-turbo".to_string(),
            name: "GPT-3.5 Turbo".to_string(),
            description: "Fast and inexpensive, good for most conversations".to_string(),
            max_tokens: 4096,
        },
        ModelEntry {
            id: "gpt-4".to_string(),
            name: "GPT-4".to_string(),
            description: "Most capable model for complex reasoning".to_string(),
            max_tokens: 8192,
        },
        ModelEntry {
            id: "gpt-4-turbo-preview".to_string(),
            name: "GPT-4 Turbo".to_string(),
            description: "GPT-4 quality with a larger context window".to_string(),
            max_tokens: 4096,
        },
    ]
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            provider: ProviderConfig::default(),
            defaults: DefaultsConfig::default(),
            logging: LoggingConfig::default(),
            cors: CorsConfig::default(),
            catalog: default_catalog(),
        }
    }
}

impl Config {
    /// Load configuration from file and environment variables.
    ///
    /// Configuration sources (in order of precedence):
    /// 1. Environment variables (CHAT_RELAY__SECTION__KEY format)
    /// 2. config.toml file (if present)
    /// 3. Built-in defaults
    ///
    /// `OPENAI_API_KEY` is used when no key is set through the sources above.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("config")
    }

    /// Same as [`Config::load`] with an explicit config file stem.
    pub fn load_from(file_stem: &str) -> Result<Self, ConfigError> {
        let loader = ConfigLoader::builder()
            .add_source(File::with_name(file_stem).required(false))
            .add_source(
                Environment::with_prefix("CHAT_RELAY")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut config: Config = loader.try_deserialize()?;
        if config.provider.credential().is_none() {
            config.provider.api_key = env::var("OPENAI_API_KEY").ok();
        }
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the service cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let defaults = &self.defaults;
        if defaults.model.trim().is_empty() {
            return Err(ConfigError::Message("defaults.model must not be empty".into()));
        }
        if !(0.0..=2.0).contains(&defaults.temperature) {
            return Err(ConfigError::Message(format!(
                "defaults.temperature must be between 0.0 and 2.0, got {}",
                defaults.temperature
            )));
        }
        if defaults.max_tokens == 0 {
            return Err(ConfigError::Message("defaults.max_tokens must be positive".into()));
        }
        if self.provider.timeout_secs == 0 {
            return Err(ConfigError::Message("provider.timeout_secs must be positive".into()));
        }
        if self.provider.max_tokens_ceiling == 0 {
            return Err(ConfigError::Message(
                "provider.max_tokens_ceiling must be positive".into(),
            ));
        }
        Ok(())
    }

    pub fn process_defaults(&self) -> ProcessDefaults {
        ProcessDefaults {
            model: self.defaults.model.clone(),
            temperature: self.defaults.temperature,
            max_tokens: self.defaults.max_tokens,
        }
    }
}
