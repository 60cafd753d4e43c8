//! Configuration management

use crate::error::{ErrorContext, QandaError, QandaResult};
use crate::logging::LoggingConfig;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "gemini-pro-latest";

/// Top-level configuration shared by the CLI and the web server
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct QandaConfig {
    pub llm: LlmConfig,
    pub storage: StorageConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

/// Generation service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// API key (optional here, usually provided through `GEMINI_API_KEY`)
    pub api_key: Option<String>,
    /// Base URL of the generative language API
    pub base_url: String,
    /// Model name without the `models/` prefix
    pub model: String,
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
    pub max_output_tokens: u32,
    /// Request timeout for the HTTP client
    pub timeout_secs: u64,
    /// Ask the service not to block any harm category
    pub disable_safety_blocking: bool,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.7,
            top_p: 0.8,
            top_k: 40,
            max_output_tokens: 8192,
            timeout_secs: 120,
            disable_safety_blocking: true,
        }
    }
}

/// Persistence configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// sqlx connection URL, e.g. `sqlite:queries.db` or `sqlite::memory:`
    pub database_url: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite:queries.db".to_string(),
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Number of records returned by the history endpoint
    pub history_limit: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            history_limit: 15,
        }
    }
}

impl ServerConfig {
    /// Get the server address
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl QandaConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> QandaResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| QandaError::Config {
            message: format!("Failed to read config file: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("read_file")
                .with_suggestion("Check if the config file exists and is readable"),
        })?;

        toml::from_str(&content).map_err(|e| QandaError::Config {
            message: format!("Failed to parse config: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("parse_toml")
                .with_suggestion("Check TOML syntax in config file"),
        })
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> QandaResult<()> {
        let content = toml::to_string_pretty(self).map_err(|e| QandaError::Config {
            message: format!("Failed to serialize config: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config").with_operation("serialize_toml"),
        })?;

        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        std::fs::write(path, content).map_err(|e| QandaError::Config {
            message: format!("Failed to write config file: {}", e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("config")
                .with_operation("write_file")
                .with_suggestion("Check if the directory exists and is writable"),
        })
    }

    /// Load from `path` when given, else from the first default location that
    /// exists, else defaults.
    pub fn load(path: Option<&Path>) -> QandaResult<Self> {
        if let Some(path) = path {
            tracing::info!("Loading configuration from {:?}", path);
            return Self::from_file(path);
        }

        for candidate in Self::default_paths() {
            if candidate.exists() {
                tracing::info!("Loading configuration from {:?}", candidate);
                return Self::from_file(candidate);
            }
        }

        tracing::debug!("No configuration file found, using defaults");
        Ok(Self::default())
    }

    /// Candidate configuration files, in lookup order
    pub fn default_paths() -> Vec<PathBuf> {
        [
            dirs::config_dir().map(|d| d.join("qanda").join("config.toml")),
            dirs::home_dir().map(|d| d.join(".qanda").join("config.toml")),
            Some(PathBuf::from("qanda.toml")),
        ]
        .into_iter()
        .flatten()
        .collect()
    }

    /// Apply environment overrides.
    ///
    /// `GEMINI_API_KEY`, `QANDA_MODEL`, `DATABASE_URL`, `QANDA_HOST` and
    /// `QANDA_PORT` are recognized.
    pub fn apply_env(&mut self) -> QandaResult<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    fn apply_overrides<F>(&mut self, lookup: F) -> QandaResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(api_key) = lookup("GEMINI_API_KEY").filter(|k| !k.trim().is_empty()) {
            self.llm.api_key = Some(api_key);
        }
        if let Some(model) = lookup("QANDA_MODEL") {
            self.llm.model = model;
        }
        if let Some(url) = lookup("DATABASE_URL") {
            self.storage.database_url = url;
        }
        if let Some(host) = lookup("QANDA_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("QANDA_PORT") {
            self.server.port = port.parse().map_err(|_| QandaError::Config {
                message: format!("Invalid QANDA_PORT value: {}", port),
                source: None,
                context: ErrorContext::new("config").with_operation("apply_env"),
            })?;
        }
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> QandaResult<()> {
        if self.llm.model.trim().is_empty() {
            return Err(QandaError::Config {
                message: "llm.model must not be empty".to_string(),
                source: None,
                context: ErrorContext::new("config")
                    .with_operation("validate")
                    .with_suggestion("Run 'qanda models' to see available models"),
            });
        }

        if !(self.llm.base_url.starts_with("http://") || self.llm.base_url.starts_with("https://"))
        {
            return Err(QandaError::Config {
                message: format!("llm.base_url must be an http(s) URL: {}", self.llm.base_url),
                source: None,
                context: ErrorContext::new("config").with_operation("validate"),
            });
        }

        if self.llm.max_output_tokens == 0 {
            return Err(QandaError::Config {
                message: "llm.max_output_tokens must be greater than 0".to_string(),
                source: None,
                context: ErrorContext::new("config")
                    .with_operation("validate")
                    .with_suggestion("Set llm.max_output_tokens to a positive value"),
            });
        }

        if !self.storage.database_url.starts_with("sqlite:") {
            return Err(QandaError::Config {
                message: format!(
                    "storage.database_url must be a sqlite URL: {}",
                    self.storage.database_url
                ),
                source: None,
                context: ErrorContext::new("config")
                    .with_operation("validate")
                    .with_suggestion("Use e.g. sqlite:queries.db"),
            });
        }

        if self.server.history_limit == 0 {
            return Err(QandaError::Config {
                message: "server.history_limit must be greater than 0".to_string(),
                source: None,
                context: ErrorContext::new("config").with_operation("validate"),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn env_overrides_are_applied() {
        let env: HashMap<&str, &str> = [
            ("GEMINI_API_KEY", "secret"),
            ("QANDA_PORT", "8081"),
            ("DATABASE_URL", "sqlite::memory:"),
        ]
        .into_iter()
        .collect();

        let mut config = QandaConfig::default();
        config
            .apply_overrides(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.llm.api_key.as_deref(), Some("secret"));
        assert_eq!(config.server.port, 8081);
        assert_eq!(config.storage.database_url, "sqlite::memory:");
        assert_eq!(config.llm.model, DEFAULT_MODEL);
    }

    #[test]
    fn invalid_port_is_rejected() {
        let mut config = QandaConfig::default();
        let result = config.apply_overrides(|key| {
            (key == "QANDA_PORT").then(|| "not-a-port".to_string())
        });
        assert!(matches!(result, Err(QandaError::Config { .. })));
    }

    #[test]
    fn blank_api_key_is_ignored() {
        let mut config = QandaConfig::default();
        config
            .apply_overrides(|key| (key == "GEMINI_API_KEY").then(|| "  ".to_string()))
            .unwrap();
        assert!(config.llm.api_key.is_none());
    }
}
