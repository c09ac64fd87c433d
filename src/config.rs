//! Configuration for cabchat
//!
//! Configuration is layered: built-in defaults, then an optional JSON file,
//! then environment variables (a `.env` file is honoured by the binary via
//! `dotenvy`). The provider API token has no default; its absence is a fatal
//! [`CabError::Config`].

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{CabError, Result};

/// Environment variable holding the provider credential.
pub const API_TOKEN_ENV: &str = "HUGGINGFACE_API_TOKEN";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub provider: ProviderConfig,
    pub server: ServerConfig,
    pub agent: AgentConfig,
    pub chat: ChatConfig,
    pub search: SearchConfig,
    pub logging: LoggingConfig,
}

/// Completion provider settings.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub api_key: Option<String>,
    /// Base URL of an OpenAI-compatible chat completion API.
    pub api_base: String,
    pub model: String,
    pub max_new_tokens: u32,
    pub temperature: f32,
    pub timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base: "https://router.huggingface.co/v1".to_string(),
            model: "meta-llama/Llama-3.1-8B-Instruct".to_string(),
            max_new_tokens: 512,
            temperature: 0.7,
            timeout_secs: 60,
        }
    }
}

// Keep the token out of logs.
impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .field("max_new_tokens", &self.max_new_tokens)
            .field("temperature", &self.temperature)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            cors_origins: vec!["https://roc-frontend.vercel.app".to_string()],
        }
    }
}

/// Bounds for the reasoning loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub max_iterations: u32,
    /// Wall-clock bound for one agent run. `None` means iterations only.
    pub max_execution_secs: Option<u64>,
    /// Unparseable model outputs tolerated before giving up.
    pub max_parse_retries: u32,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_iterations: 15,
            max_execution_secs: None,
            max_parse_retries: 2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Answer booking-status questions with the fixed reply in code instead
    /// of trusting the model to follow the persona.
    pub enforce_booking_override: bool,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            enforce_booking_override: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub endpoint: String,
    pub max_results: usize,
    pub timeout_secs: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://html.duckduckgo.com/html/".to_string(),
            max_results: 5,
            timeout_secs: 20,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub json: bool,
}

impl Config {
    /// Load configuration from an optional JSON file plus the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if the
    /// resulting configuration is invalid (for example, no API token).
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Read a JSON config file. Missing sections take their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            CabError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        serde_json::from_str(&content)
            .map_err(|e| CabError::Config(format!("invalid config {}: {}", path.display(), e)))
    }

    /// Apply environment overrides using `lookup` to resolve variables.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(token) = non_empty(API_TOKEN_ENV) {
            self.provider.api_key = Some(token);
        }
        if let Some(base) = non_empty("CABCHAT_API_BASE") {
            self.provider.api_base = base;
        }
        if let Some(model) = non_empty("CABCHAT_MODEL") {
            self.provider.model = model;
        }
        if let Some(host) = non_empty("CABCHAT_HOST") {
            self.server.host = host;
        }
        // CABCHAT_PORT wins over the platform-provided PORT.
        for key in ["PORT", "CABCHAT_PORT"] {
            if let Some(port) = non_empty(key).and_then(|p| p.trim().parse().ok()) {
                self.server.port = port;
            }
        }
        if let Some(origins) = non_empty("CABCHAT_CORS_ORIGINS") {
            self.server.cors_origins = origins
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(String::from)
                .collect();
        }
        if let Some(endpoint) = non_empty("CABCHAT_SEARCH_ENDPOINT") {
            self.search.endpoint = endpoint;
        }
    }

    /// Check that the configuration can serve requests.
    pub fn validate(&self) -> Result<()> {
        match self.provider.api_key.as_deref() {
            Some(key) if !key.trim().is_empty() => {}
            _ => {
                return Err(CabError::Config(format!(
                    "{} is not set (environment, .env file or provider.api_key)",
                    API_TOKEN_ENV
                )))
            }
        }
        if self.agent.max_iterations == 0 {
            return Err(CabError::Config(
                "agent.max_iterations must be at least 1".into(),
            ));
        }
        if self.search.max_results == 0 {
            return Err(CabError::Config(
                "search.max_results must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
