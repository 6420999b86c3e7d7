//! Configuration file parsing for the scoring server.
//!
//! Loads the bind address, upload limit, scoring engine settings and the
//! generation service endpoint from a TOML file. The API key itself is never
//! stored in the file: the config names the environment variable holding it.

use serde::Deserialize;
use std::path::Path;
use tcsa_scorer::ScoringConfig;
use thiserror::Error;

/// Server configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse TOML
    #[error("Failed to parse config TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// A value is out of range or inconsistent
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    /// The API key environment variable is unset or blank
    #[error("Missing API key: environment variable {0} is not set")]
    MissingApiKey(String),
}

/// Server configuration loaded from TOML
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "127.0.0.1")
    pub bind_address: String,

    /// Bind port (e.g., 8000)
    pub bind_port: u16,

    /// Maximum request body size in bytes (default: 55 MiB)
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,

    /// Scoring engine settings
    pub scoring: ScoringConfig,

    /// Generation service settings
    #[serde(default)]
    pub gemini: GeminiConfig,
}

/// Generation service configuration
#[derive(Debug, Clone, Deserialize)]
pub struct GeminiConfig {
    /// API base URL
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            api_key_env: default_api_key_env(),
        }
    }
}

/// Default upload limit: 55 MiB (multipart overhead included)
fn default_max_upload_bytes() -> usize {
    55 * 1024 * 1024
}

fn default_endpoint() -> String {
    tcsa_llm::gemini::DEFAULT_ENDPOINT.to_string()
}

fn default_api_key_env() -> String {
    "GOOGLE_API_KEY".to_string()
}

impl GeminiConfig {
    /// Resolve the API key using `lookup` to read environment variables
    pub fn api_key_with<F>(&self, lookup: F) -> Result<String, ConfigError>
    where
        F: FnOnce(&str) -> Option<String>,
    {
        lookup(&self.api_key_env)
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
            .ok_or_else(|| ConfigError::MissingApiKey(self.api_key_env.clone()))
    }

    /// Resolve the API key from the process environment
    pub fn api_key(&self) -> Result<String, ConfigError> {
        self.api_key_with(|name| std::env::var(name).ok())
    }
}

impl ServerConfig {
    /// Load and validate configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parse and validate configuration from a TOML string
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: ServerConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_upload_bytes == 0 {
            return Err(ConfigError::Invalid(
                "max_upload_bytes must be greater than 0".to_string(),
            ));
        }
        if self.gemini.api_key_env.trim().is_empty() {
            return Err(ConfigError::Invalid("gemini.api_key_env must not be empty".to_string()));
        }
        self.scoring
            .validate()
            .map_err(|e| ConfigError::Invalid(format!("scoring: {}", e)))
    }

    /// Create a default configuration for testing
    pub fn default_test_config() -> Self {
        ServerConfig {
            bind_address: "127.0.0.1".to_string(),
            bind_port: 8000,
            max_upload_bytes: default_max_upload_bytes(),
            scoring: ScoringConfig::new(
                vec![
                    "gemini-1.5-flash-latest".to_string(),
                    "gemini-1.5-pro-latest".to_string(),
                ],
                120,
            ),
            gemini: GeminiConfig::default(),
        }
    }

    /// Get the full bind address (address:port)
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.bind_port)
    }
}
