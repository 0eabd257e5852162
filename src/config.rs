//! Configuration management for gamesmith
//!
//! Settings are loaded from environment variables with defaults.
//!
//! # Environment Variables
//!
//! - `GAMESMITH_PROVIDER`: ollama|openai|anthropic|gemini|xai|groq - default: "ollama"
//! - `GAMESMITH_MODEL`: model name - default: "qwen2.5-coder:7b" for Ollama
//! - `GAMESMITH_REQUEST_TIMEOUT`: timeout in seconds - default: "120"
//! - `GAMESMITH_TEMPERATURE`: sampling temperature - default: "0.7"
//! - `GAMESMITH_PROJECTS_DIR`: deployment root - default: "./generated_projects"
//! - `GAMESMITH_URL_PREFIX`: web prefix of deployed projects - default: "/static/projects"
//! - `GAMESMITH_CHECKPOINT_DIR`: checkpoint directory - default: in-memory checkpoints
//! - `GAMESMITH_EXCHANGE_LOG`: JSONL log of model exchanges - default: disabled
//! - `GAMESMITH_LOG_LEVEL`: logging level - default: "info"
//!
//! Provider credentials (`OPENAI_API_KEY`, `ANTHROPIC_API_KEY`, `OLLAMA_HOST`, ...)
//! are read directly by the genai library.

use crate::llm::{BackendError, GenAIClient};
use crate::pipeline::PipelineConfig;
use genai::adapter::AdapterKind;
use std::env;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_OLLAMA_MODEL: &str = "qwen2.5-coder:7b";
const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;
const DEFAULT_TEMPERATURE: f32 = 0.7;
const DEFAULT_PROJECTS_DIR: &str = "./generated_projects";
const DEFAULT_URL_PREFIX: &str = "/static/projects";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid provider: {0}. Valid options: ollama, openai, anthropic, gemini, xai, groq")]
    InvalidProvider(String),

    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),

    #[error("Failed to parse {field}: {error}")]
    ParseError { field: String, error: String },

    #[error("Backend initialization failed: {0}")]
    BackendInitError(#[from] BackendError),
}

pub fn parse_provider(s: &str) -> Result<AdapterKind, ConfigError> {
    AdapterKind::from_lower_str(&s.to_lowercase())
        .ok_or_else(|| ConfigError::InvalidProvider(s.to_string()))
}

/// Default model name for a provider
pub fn default_model(provider: AdapterKind) -> &'static str {
    match provider {
        AdapterKind::Ollama => DEFAULT_OLLAMA_MODEL,
        _ => DEFAULT_OPENAI_MODEL,
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Result<Option<T>, ConfigError>
where
    T::Err: fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| ConfigError::ParseError {
                field: name.to_string(),
                error: e.to_string(),
            }),
        Err(_) => Ok(None),
    }
}

#[derive(Debug, Clone)]
pub struct GamesmithConfig {
    pub provider: AdapterKind,
    pub model: String,
    pub request_timeout_secs: u64,
    pub temperature: f32,
    pub projects_dir: PathBuf,
    pub url_prefix: String,
    /// Directory for file checkpoints; `None` keeps them in memory
    pub checkpoint_dir: Option<PathBuf>,
    pub exchange_log: Option<PathBuf>,
    pub log_level: String,
}

impl Default for GamesmithConfig {
    fn default() -> Self {
        Self {
            provider: AdapterKind::Ollama,
            model: DEFAULT_OLLAMA_MODEL.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            temperature: DEFAULT_TEMPERATURE,
            projects_dir: PathBuf::from(DEFAULT_PROJECTS_DIR),
            url_prefix: DEFAULT_URL_PREFIX.to_string(),
            checkpoint_dir: None,
            exchange_log: None,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl GamesmithConfig {
    /// Loads `GAMESMITH_*` variables over the defaults
    ///
    /// Unparsable values are errors rather than silently replaced by defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let provider = match env::var("GAMESMITH_PROVIDER") {
            Ok(name) => parse_provider(name.trim())?,
            Err(_) => defaults.provider,
        };
        let model = env::var("GAMESMITH_MODEL")
            .ok()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| default_model(provider).to_string());

        Ok(Self {
            provider,
            model,
            request_timeout_secs: parse_var("GAMESMITH_REQUEST_TIMEOUT")?
                .unwrap_or(defaults.request_timeout_secs),
            temperature: parse_var("GAMESMITH_TEMPERATURE")?.unwrap_or(defaults.temperature),
            projects_dir: env::var("GAMESMITH_PROJECTS_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.projects_dir),
            url_prefix: env::var("GAMESMITH_URL_PREFIX").unwrap_or(defaults.url_prefix),
            checkpoint_dir: env::var("GAMESMITH_CHECKPOINT_DIR").ok().map(PathBuf::from),
            exchange_log: env::var("GAMESMITH_EXCHANGE_LOG").ok().map(PathBuf::from),
            log_level: env::var("GAMESMITH_LOG_LEVEL")
                .unwrap_or(defaults.log_level)
                .to_lowercase(),
        })
    }

    /// Range-checks every value
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.model.trim().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "Model name cannot be empty".to_string(),
            ));
        }

        if self.request_timeout_secs == 0 {
            return Err(ConfigError::ValidationFailed(
                "Request timeout must be at least 1 second".to_string(),
            ));
        }
        if self.request_timeout_secs > 600 {
            return Err(ConfigError::ValidationFailed(
                "Request timeout cannot exceed 10 minutes".to_string(),
            ));
        }

        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ConfigError::ValidationFailed(format!(
                "Temperature must be between 0.0 and 2.0, got {}",
                self.temperature
            )));
        }

        if !self.url_prefix.starts_with('/') {
            return Err(ConfigError::ValidationFailed(format!(
                "URL prefix must start with '/': {}",
                self.url_prefix
            )));
        }

        match self.log_level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(ConfigError::ValidationFailed(format!(
                    "Invalid log level: {}. Valid options: trace, debug, info, warn, error",
                    self.log_level
                )))
            }
        }

        Ok(())
    }

    pub fn create_client(&self) -> Result<GenAIClient, ConfigError> {
        let timeout = Duration::from_secs(self.request_timeout_secs);
        Ok(GenAIClient::new(self.provider, self.model.clone(), timeout)?)
    }

    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig::default()
            .with_temperature(self.temperature)
            .with_projects_dir(self.projects_dir.clone())
            .with_url_prefix(self.url_prefix.clone())
    }

    pub fn to_display_map(&self) -> std::collections::BTreeMap<String, String> {
        let mut map = std::collections::BTreeMap::new();

        map.insert("provider".to_string(), self.provider.as_str().to_string());
        map.insert("model".to_string(), self.model.clone());
        map.insert(
            "request_timeout_secs".to_string(),
            self.request_timeout_secs.to_string(),
        );
        map.insert("temperature".to_string(), self.temperature.to_string());
        map.insert(
            "projects_dir".to_string(),
            self.projects_dir.display().to_string(),
        );
        map.insert("url_prefix".to_string(), self.url_prefix.clone());
        if let Some(ref dir) = self.checkpoint_dir {
            map.insert("checkpoint_dir".to_string(), dir.display().to_string());
        }
        if let Some(ref path) = self.exchange_log {
            map.insert("exchange_log".to_string(), path.display().to_string());
        }
        map.insert("log_level".to_string(), self.log_level.clone());

        map
    }
}

impl fmt::Display for GamesmithConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Gamesmith Configuration:")?;
        writeln!(f, "  Provider: {}", self.provider.as_str())?;
        writeln!(f, "  Model: {}", self.model)?;
        writeln!(f, "  Request Timeout: {}s", self.request_timeout_secs)?;
        writeln!(f, "  Temperature: {}", self.temperature)?;
        writeln!(f, "  Projects Dir: {}", self.projects_dir.display())?;
        writeln!(f, "  URL Prefix: {}", self.url_prefix)?;
        match self.checkpoint_dir {
            Some(ref dir) => writeln!(f, "  Checkpoints: {}", dir.display())?,
            None => writeln!(f, "  Checkpoints: in-memory")?,
        }
        if let Some(ref path) = self.exchange_log {
            writeln!(f, "  Exchange Log: {}", path.display())?;
        }
        writeln!(f, "  Log Level: {}", self.log_level)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: [&str; 9] = [
        "GAMESMITH_PROVIDER",
        "GAMESMITH_MODEL",
        "GAMESMITH_REQUEST_TIMEOUT",
        "GAMESMITH_TEMPERATURE",
        "GAMESMITH_PROJECTS_DIR",
        "GAMESMITH_URL_PREFIX",
        "GAMESMITH_CHECKPOINT_DIR",
        "GAMESMITH_EXCHANGE_LOG",
        "GAMESMITH_LOG_LEVEL",
    ];

    /// Helper to temporarily set environment variables for testing
    struct EnvGuard {
        key: String,
        old_value: Option<String>,
    }

    impl EnvGuard {
        fn set(key: &str, value: &str) -> Self {
            let old_value = env::var(key).ok();
            env::set_var(key, value);
            Self {
                key: key.to_string(),
                old_value,
            }
        }

        fn unset(key: &str) -> Self {
            let old_value = env::var(key).ok();
            env::remove_var(key);
            Self {
                key: key.to_string(),
                old_value,
            }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            match &self.old_value {
                Some(v) => env::set_var(&self.key, v),
                None => env::remove_var(&self.key),
            }
        }
    }

    fn clear_all() -> Vec<EnvGuard> {
        VARS.iter().map(|k| EnvGuard::unset(k)).collect()
    }

    #[test]
    #[serial]
    fn test_default_configuration() {
        let _guards = clear_all();

        let config = GamesmithConfig::from_env().unwrap();

        assert_eq!(config.provider, AdapterKind::Ollama);
        assert_eq!(config.model, DEFAULT_OLLAMA_MODEL);
        assert_eq!(config.request_timeout_secs, DEFAULT_REQUEST_TIMEOUT_SECS);
        assert_eq!(config.temperature, DEFAULT_TEMPERATURE);
        assert_eq!(config.projects_dir, PathBuf::from(DEFAULT_PROJECTS_DIR));
        assert_eq!(config.url_prefix, DEFAULT_URL_PREFIX);
        assert!(config.checkpoint_dir.is_none());
        assert!(config.exchange_log.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    #[serial]
    fn test_environment_variable_parsing() {
        let _clear = clear_all();
        let _guards = vec![
            EnvGuard::set("GAMESMITH_PROVIDER", "OpenAI"),
            EnvGuard::set("GAMESMITH_REQUEST_TIMEOUT", "60"),
            EnvGuard::set("GAMESMITH_TEMPERATURE", "0.2"),
            EnvGuard::set("GAMESMITH_PROJECTS_DIR", "/srv/games"),
            EnvGuard::set("GAMESMITH_CHECKPOINT_DIR", "/var/lib/gamesmith"),
            EnvGuard::set("GAMESMITH_LOG_LEVEL", "DEBUG"),
        ];

        let config = GamesmithConfig::from_env().unwrap();

        assert_eq!(config.provider, AdapterKind::OpenAI);
        assert_eq!(config.model, DEFAULT_OPENAI_MODEL);
        assert_eq!(config.request_timeout_secs, 60);
        assert_eq!(config.temperature, 0.2);
        assert_eq!(config.projects_dir, PathBuf::from("/srv/games"));
        assert_eq!(
            config.checkpoint_dir,
            Some(PathBuf::from("/var/lib/gamesmith"))
        );
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    #[serial]
    fn test_invalid_values_are_errors() {
        let _clear = clear_all();

        {
            let _g = EnvGuard::set("GAMESMITH_PROVIDER", "skynet");
            assert!(matches!(
                GamesmithConfig::from_env(),
                Err(ConfigError::InvalidProvider(_))
            ));
        }
        {
            let _g = EnvGuard::set("GAMESMITH_REQUEST_TIMEOUT", "soon");
            assert!(matches!(
                GamesmithConfig::from_env(),
                Err(ConfigError::ParseError { .. })
            ));
        }
    }

    #[test]
    fn test_configuration_validation() {
        let mut config = GamesmithConfig::default();
        assert!(config.validate().is_ok());

        config.request_timeout_secs = 0;
        assert!(config.validate().is_err());

        config = GamesmithConfig::default();
        config.temperature = 2.5;
        assert!(config.validate().is_err());

        config = GamesmithConfig::default();
        config.url_prefix = "static".to_string();
        assert!(config.validate().is_err());

        config = GamesmithConfig::default();
        config.log_level = "invalid".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_pipeline_config() {
        let config = GamesmithConfig {
            temperature: 0.3,
            projects_dir: PathBuf::from("/tmp/p"),
            url_prefix: "/games".to_string(),
            ..GamesmithConfig::default()
        };

        let pipeline = config.pipeline_config();
        assert_eq!(pipeline.temperature, 0.3);
        assert_eq!(pipeline.projects_dir, PathBuf::from("/tmp/p"));
        assert_eq!(pipeline.url_prefix, "/games");
        assert_eq!(pipeline.entry_file, "index.html");
    }

    #[test]
    fn test_config_display() {
        let config = GamesmithConfig::default();
        let display = format!("{}", config);
        assert!(display.contains("Gamesmith Configuration:"));
        assert!(display.contains("Checkpoints: in-memory"));
        assert_eq!(config.to_display_map()["provider"], "Ollama");
    }
}
