//! Configuration management for WikiQuiz.
//!
//! Configuration is loaded in order of precedence:
//! 1. Defaults
//! 2. Config file (~/.wikiquiz/config.toml)
//! 3. Environment variables
//! 4. CLI flags (handled at CLI layer)

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Which transport a model call goes through
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// The official `gemini` CLI, spawned as a child process
    Cli,
    /// The Generative Language REST endpoint
    Rest,
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendKind::Cli => write!(f, "cli"),
            BackendKind::Rest => write!(f, "rest"),
        }
    }
}

/// Model / quiz generation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Backends in the order they are tried (exactly two)
    #[serde(default = "default_backends")]
    pub backends: Vec<BackendKind>,

    /// Model identifier passed to both backends
    #[serde(default = "default_model_id")]
    pub model_id: String,

    /// API key for the REST backend. Usually supplied via GEMINI_API_KEY.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Path to the gemini binary (default: "gemini")
    #[serde(default = "default_binary")]
    pub gemini_binary: String,

    /// Base URL of the REST API
    #[serde(default = "default_rest_base_url")]
    pub rest_base_url: String,

    /// Built-in prompt template version ("v1" or "v2")
    #[serde(default = "default_prompt_version")]
    pub prompt_version: String,

    /// Custom `.prompt.md` template; overrides `prompt_version` when set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_template: Option<PathBuf>,

    /// Maximum number of article characters sent to the model (0 = no cap)
    #[serde(default = "default_article_char_cap")]
    pub article_char_cap: usize,

    /// Fixed question count used by the v2 template
    #[serde(default = "default_question_count")]
    pub question_count: u32,

    /// Title assigned when the model omits one
    #[serde(default = "default_quiz_title")]
    pub default_title: String,

    #[serde(default)]
    pub temperature: f32,

    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,

    /// Timeout for a single CLI invocation
    #[serde(default = "default_cli_timeout")]
    pub cli_timeout_secs: u64,

    /// Timeout for a single REST call
    #[serde(default = "default_rest_timeout")]
    pub rest_timeout_secs: u64,
}

fn default_backends() -> Vec<BackendKind> {
    vec![BackendKind::Cli, BackendKind::Rest]
}

fn default_model_id() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_binary() -> String {
    "gemini".to_string()
}

fn default_rest_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_prompt_version() -> String {
    "v1".to_string()
}

fn default_article_char_cap() -> usize {
    8000
}

fn default_question_count() -> u32 {
    5
}

fn default_quiz_title() -> String {
    "Untitled Quiz".to_string()
}

fn default_max_output_tokens() -> u32 {
    2048
}

fn default_cli_timeout() -> u64 {
    120
}

fn default_rest_timeout() -> u64 {
    30
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            backends: default_backends(),
            model_id: default_model_id(),
            api_key: None,
            gemini_binary: default_binary(),
            rest_base_url: default_rest_base_url(),
            prompt_version: default_prompt_version(),
            prompt_template: None,
            article_char_cap: default_article_char_cap(),
            question_count: default_question_count(),
            default_title: default_quiz_title(),
            temperature: 0.0,
            max_output_tokens: default_max_output_tokens(),
            cli_timeout_secs: default_cli_timeout(),
            rest_timeout_secs: default_rest_timeout(),
        }
    }
}

impl ModelConfig {
    /// Check the settings the generator cannot work without
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.backends.len() != 2 {
            return Err(ConfigError::ValidationError(format!(
                "model.backends must list exactly two backends, got {}",
                self.backends.len()
            )));
        }
        if self.model_id.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "model.model_id must not be empty".to_string(),
            ));
        }
        if self.default_title.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "model.default_title must not be empty".to_string(),
            ));
        }
        if self.prompt_template.is_none() && !["v1", "v2"].contains(&self.prompt_version.as_str())
        {
            return Err(ConfigError::ValidationError(format!(
                "Unknown prompt_version '{}' (expected v1 or v2)",
                self.prompt_version
            )));
        }
        Ok(())
    }
}

/// Article scraping configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScraperConfig {
    /// User-Agent sent with every fetch
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    #[serde(default = "default_fetch_timeout")]
    pub timeout_secs: u64,

    /// Stop after this many non-empty paragraphs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_paragraphs: Option<usize>,
}

fn default_user_agent() -> String {
    "wikiquiz/0.1 (+https://github.com/wikiquiz/wikiquiz)".to_string()
}

fn default_fetch_timeout() -> u64 {
    15
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            timeout_secs: default_fetch_timeout(),
            max_paragraphs: None,
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Origins allowed by CORS (the frontend dev/preview servers)
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_cors_origins() -> Vec<String> {
    ["3000", "5173", "4173"]
        .iter()
        .flat_map(|port| {
            [
                format!("http://localhost:{}", port),
                format!("http://127.0.0.1:{}", port),
            ]
        })
        .collect()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: default_cors_origins(),
        }
    }
}

/// Database configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite file; defaults to ~/.wikiquiz/quizzes.db
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Main configuration struct
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub model: ModelConfig,

    #[serde(default)]
    pub scraper: ScraperConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Returns the default WikiQuiz directory (~/.wikiquiz)
    pub fn wikiquiz_dir() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".wikiquiz"))
    }

    /// Returns the default config file path
    pub fn default_config_path() -> Option<PathBuf> {
        Self::wikiquiz_dir().map(|d| d.join("config.toml"))
    }

    /// Returns the default database path
    pub fn default_db_path() -> Option<PathBuf> {
        Self::wikiquiz_dir().map(|d| d.join("quizzes.db"))
    }

    /// The database path to use: configured, else the default
    pub fn db_path(&self) -> Option<PathBuf> {
        self.database.path.clone().or_else(Self::default_db_path)
    }

    /// Load configuration from the default path with environment overrides
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match Self::default_config_path() {
            Some(path) if path.exists() => Self::load_from_file(&path)?,
            _ => Config::default(),
        };

        config.apply_env_overrides();

        Ok(config)
    }

    /// Load configuration from a specific file, then apply environment overrides
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&contents)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    fn apply_overrides_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(key) = lookup("GEMINI_API_KEY").filter(|k| !k.is_empty()) {
            self.model.api_key = Some(key);
        }

        if let Some(model) = lookup("WIKIQUIZ_MODEL") {
            self.model.model_id = model;
        }

        if let Some(port) = lookup("WIKIQUIZ_PORT").and_then(|p| p.parse().ok()) {
            self.server.port = port;
        }

        if let Some(host) = lookup("WIKIQUIZ_HOST") {
            self.server.host = host;
        }

        if let Some(level) = lookup("WIKIQUIZ_LOG_LEVEL") {
            self.logging.level = level;
        }

        if let Some(path) = lookup("WIKIQUIZ_DATABASE") {
            self.database.path = Some(PathBuf::from(path));
        }

        if let Some(binary) = lookup("WIKIQUIZ_GEMINI_BINARY") {
            self.model.gemini_binary = binary;
        }

        if let Some(version) = lookup("WIKIQUIZ_PROMPT_VERSION") {
            self.model.prompt_version = version;
        }
    }

    /// Save configuration to a specific file
    pub fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Get the server address as a string
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Get the server URL
    pub fn server_url(&self) -> String {
        format!("http://{}:{}", self.server.host, self.server.port)
    }

    /// Ensure the WikiQuiz directory exists
    pub fn ensure_dirs() -> std::io::Result<()> {
        if let Some(dir) = Self::wikiquiz_dir() {
            std::fs::create_dir_all(dir)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.model.backends, vec![BackendKind::Cli, BackendKind::Rest]);
        assert_eq!(config.model.article_char_cap, 8000);
        assert_eq!(config.model.prompt_version, "v1");
        assert_eq!(config.scraper.timeout_secs, 15);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8000);
        assert!(config
            .server
            .cors_origins
            .contains(&"http://localhost:5173".to_string()));
        assert_eq!(config.server.cors_origins.len(), 6);
        assert!(config.model.validate().is_ok());
    }

    #[test]
    fn test_partial_config() {
        let toml_str = r#"
[model]
backends = ["rest", "cli"]
article_char_cap = 0

[scraper]
max_paragraphs = 10
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.model.backends, vec![BackendKind::Rest, BackendKind::Cli]);
        assert_eq!(config.model.article_char_cap, 0);
        assert_eq!(config.scraper.max_paragraphs, Some(10));
        // Defaults still applied
        assert_eq!(config.model.model_id, "gemini-2.5-flash");
        assert_eq!(config.server.port, 8000);
    }

    #[test]
    fn test_config_serialization_skips_api_key_when_absent() {
        let config = Config::default();
        let toml_str = toml::to_string(&config).unwrap();
        assert!(!toml_str.contains("api_key"));
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(config.server.port, parsed.server.port);
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("GEMINI_API_KEY", "secret"),
            ("WIKIQUIZ_PORT", "9001"),
            ("WIKIQUIZ_PROMPT_VERSION", "v2"),
            ("WIKIQUIZ_DATABASE", "/tmp/q.db"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_overrides_from(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.model.api_key.as_deref(), Some("secret"));
        assert_eq!(config.server.port, 9001);
        assert_eq!(config.model.prompt_version, "v2");
        assert_eq!(config.db_path(), Some(PathBuf::from("/tmp/q.db")));
    }

    #[test]
    fn test_validate_rejects_bad_backends_and_versions() {
        let mut model = ModelConfig {
            backends: vec![BackendKind::Cli],
            ..Default::default()
        };
        assert!(model.validate().is_err());

        model.backends = default_backends();
        model.prompt_version = "v9".to_string();
        assert!(model.validate().is_err());

        model.prompt_template = Some(PathBuf::from("custom.prompt.md"));
        assert!(model.validate().is_ok());
    }
}
