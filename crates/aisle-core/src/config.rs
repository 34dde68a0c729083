//! Configuration management for Aisle
//!
//! Handles loading the assistant configuration from TOML, including the
//! provider settings, the shared request secret, and the data fixtures.

use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default cap on tool-gathering iterations per request
pub const DEFAULT_MAX_ITERATIONS: usize = 10;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,
    /// LLM provider settings
    #[serde(default)]
    pub provider: ProviderConfig,
    /// Agent loop settings
    #[serde(default)]
    pub assistant: AssistantConfig,
    /// Planner data settings
    #[serde(default)]
    pub data: DataConfig,
}

impl Config {
    /// Reject values the agent loop cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.assistant.max_iterations == 0 {
            return Err(Error::Config("assistant.max_iterations must be at least 1".to_string()));
        }
        Ok(())
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address to listen on
    pub bind: String,
    /// Shared secret callers must present (can be loaded from env)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,
    /// Environment variable name for the shared secret
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret_env: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8787".to_string(),
            secret: None,
            secret_env: Some("AISLE_ASSISTANT_SECRET".to_string()),
        }
    }
}

impl ServerConfig {
    /// Get the secret, checking the environment variable if not set directly
    pub fn get_secret(&self) -> Option<String> {
        if let Some(secret) = &self.secret
            && !secret.is_empty()
        {
            return Some(secret.clone());
        }

        self.secret_env
            .as_ref()
            .and_then(|name| std::env::var(name).ok())
            .filter(|secret| !secret.is_empty())
    }
}

/// LLM Provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Provider type: "anthropic", "openai", "gemini", etc.
    pub provider_type: String,
    /// API key (can be loaded from env)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Environment variable name for API key
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,
    /// Model to use
    pub model: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self::anthropic()
    }
}

impl ProviderConfig {
    /// Create Anthropic provider config
    pub fn anthropic() -> Self {
        Self {
            provider_type: "anthropic".to_string(),
            api_key: None,
            api_key_env: Some("ANTHROPIC_API_KEY".to_string()),
            model: "claude-sonnet-4-5-20250929".to_string(),
        }
    }

    /// Get the API key, checking environment variable if not set directly
    pub fn get_api_key(&self) -> Option<String> {
        if let Some(key) = &self.api_key
            && !key.is_empty()
        {
            return Some(key.clone());
        }

        if let Some(env_name) = &self.api_key_env
            && let Ok(key) = std::env::var(env_name)
            && !key.is_empty()
        {
            return Some(key);
        }

        // Fall back to the provider's conventional variable
        match self.provider_type.as_str() {
            "anthropic" => std::env::var("ANTHROPIC_API_KEY").ok(),
            "openai" => std::env::var("OPENAI_API_KEY").ok(),
            "gemini" | "google" => std::env::var("GEMINI_API_KEY")
                .or_else(|_| std::env::var("GOOGLE_API_KEY"))
                .ok(),
            "groq" => std::env::var("GROQ_API_KEY").ok(),
            "deepseek" => std::env::var("DEEPSEEK_API_KEY").ok(),
            _ => None,
        }
    }
}

/// Agent loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistantConfig {
    /// Maximum number of tool-gathering rounds per request
    pub max_iterations: usize,
    /// Capacity of the per-request event channel
    pub event_buffer: usize,
    /// Replaces the built-in base system prompt
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            event_buffer: 32,
            system_prompt: None,
        }
    }
}

/// Planner data configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DataConfig {
    /// JSON file seeding the in-memory planner data
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fixtures: Option<PathBuf>,
}

/// Configuration manager for loading config
pub struct ConfigManager {
    config_path: PathBuf,
    config: Config,
}

impl ConfigManager {
    /// Load from the default location, falling back to defaults when absent
    pub fn new() -> Result<Self> {
        let config_path = Self::default_config_path()?;
        Self::with_path(config_path)
    }

    /// Load from a specific path, falling back to defaults when absent
    pub fn with_path(config_path: PathBuf) -> Result<Self> {
        let config = if config_path.exists() {
            Self::load_from_path(&config_path)?
        } else {
            Config::default()
        };
        Ok(Self { config_path, config })
    }

    /// Get the default config file path
    pub fn default_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| Error::Config("Could not determine config directory".to_string()))?;
        Ok(config_dir.join("aisle").join("config.toml"))
    }

    fn load_from_path(path: &Path) -> Result<Config> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn into_config(self) -> Config {
        self.config
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }
}
