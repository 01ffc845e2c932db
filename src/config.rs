// Configuration File Support
//
// This module provides configuration file parsing for the PawForge gateway.
// Supports TOML format with environment variable overrides.
// Configuration files are loaded from XDG config directory: ~/.config/pawforge/config.toml

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::generator::DEFAULT_MODEL;
use crate::rate_limit::RateLimitConfig;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    /// Logging configuration
    pub logging: LoggingConfig,

    /// HTTP server configuration
    pub server: ServerConfig,

    /// Admission gate limits
    pub rate_limit: RateLimitConfig,

    /// Image generation provider
    pub generator: GeneratorConfig,

    /// Metrics configuration
    pub metrics: MetricsConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (json, pretty, compact)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "compact".to_string(),
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address
    pub host: String,

    /// Listen port
    pub port: u16,

    /// Maximum accepted length of the image data URL in bytes
    pub max_image_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            max_image_bytes: 5 * 1024 * 1024,
        }
    }
}

/// Image generation provider configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Provider API base URL
    pub base_url: String,

    /// Model identifier (owner/name)
    pub model: String,

    /// Provider API token
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_token: Option<String>,

    /// Timeout in seconds for a single generation, polling included
    pub timeout_secs: u64,

    /// Initial delay between prediction status polls, doubled up to 5s
    pub poll_interval_ms: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.replicate.com".to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_token: None,
            timeout_secs: 120,
            poll_interval_ms: 500,
        }
    }
}

/// Metrics configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MetricsConfig {
    /// Whether to expose /metrics
    pub enabled: bool,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl Config {
    /// Load configuration from the default XDG config directory
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed.
    /// If the config file does not exist, returns default configuration.
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();
        Self::load_from_path(&config_path)
    }

    /// Load configuration from a specific path
    ///
    /// Environment overrides are applied whether or not the file exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed, or
    /// if the resulting configuration is invalid.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let config = if path.exists() {
            let content = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file from {:?}", path))?;
            let config: Config = toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file from {:?}", path))?;
            tracing::info!("Loaded configuration from {:?}", path);
            config
        } else {
            tracing::debug!("Config file not found at {:?}, using defaults", path);
            Self::default()
        };

        let config = config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path
    ///
    /// Returns `~/.config/pawforge/config.toml` on Linux/Mac
    pub fn config_path() -> PathBuf {
        if let Some(proj_dirs) = directories::ProjectDirs::from("com", "pawforge", "PawForge") {
            proj_dirs.config_dir().join("config.toml")
        } else {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home).join(".config").join("pawforge").join("config.toml")
        }
    }

    /// Apply environment variable overrides to the configuration
    ///
    /// Environment variables take precedence over config file values:
    /// - PAWFORGE_LOG_LEVEL, PAWFORGE_LOG_FORMAT
    /// - PAWFORGE_HOST, PAWFORGE_PORT
    /// - PAWFORGE_PER_ADDRESS_PER_HOUR, PAWFORGE_PER_ADDRESS_PER_DAY,
    ///   PAWFORGE_PER_SESSION_PER_DAY
    /// - PAWFORGE_GENERATOR_MODEL, REPLICATE_API_TOKEN
    /// - PAWFORGE_METRICS_ENABLED
    fn apply_env_overrides(self) -> Self {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    fn apply_overrides<F>(mut self, var: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        // Logging overrides
        if let Some(level) = var("PAWFORGE_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = var("PAWFORGE_LOG_FORMAT") {
            self.logging.format = format;
        }

        // Server overrides
        if let Some(host) = var("PAWFORGE_HOST") {
            self.server.host = host;
        }
        if let Some(port) = var("PAWFORGE_PORT").and_then(|p| p.parse::<u16>().ok()) {
            self.server.port = port;
        }

        // Limit overrides, zero is ignored
        let limit = |key: &str| var(key).and_then(|v| v.parse::<u32>().ok()).filter(|v| *v > 0);
        if let Some(value) = limit("PAWFORGE_PER_ADDRESS_PER_HOUR") {
            self.rate_limit.per_address_per_hour = value;
        }
        if let Some(value) = limit("PAWFORGE_PER_ADDRESS_PER_DAY") {
            self.rate_limit.per_address_per_day = value;
        }
        if let Some(value) = limit("PAWFORGE_PER_SESSION_PER_DAY") {
            self.rate_limit.per_session_per_day = value;
        }

        // Generator overrides
        if let Some(model) = var("PAWFORGE_GENERATOR_MODEL") {
            self.generator.model = model;
        }
        if let Some(token) = var("REPLICATE_API_TOKEN").filter(|t| !t.is_empty()) {
            self.generator.api_token = Some(token);
        }

        // Metrics overrides
        if let Some(enabled) = var("PAWFORGE_METRICS_ENABLED") {
            self.metrics.enabled = enabled.parse().unwrap_or(self.metrics.enabled);
        }

        self
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<()> {
        match self.logging.level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!("Invalid log level: {}. Must be one of: trace, debug, info, warn, error", self.logging.level),
        }

        match self.logging.format.to_lowercase().as_str() {
            "json" | "pretty" | "compact" => {}
            _ => anyhow::bail!("Invalid log format: {}. Must be one of: json, pretty, compact", self.logging.format),
        }

        if self.server.port == 0 {
            anyhow::bail!("Server port must be > 0");
        }
        if self.server.max_image_bytes == 0 {
            anyhow::bail!("Maximum image size must be > 0");
        }

        self.rate_limit
            .validate()
            .context("Invalid rate limit configuration")?;

        if self.generator.model.split('/').filter(|s| !s.is_empty()).count() != 2 {
            anyhow::bail!("Generator model must be of the form owner/name: {}", self.generator.model);
        }
        if self.generator.timeout_secs == 0 {
            anyhow::bail!("Generator timeout must be > 0");
        }
        if self.generator.poll_interval_ms == 0 {
            anyhow::bail!("Generator poll interval must be > 0");
        }

        Ok(())
    }

    /// Convert log level string to tracing::Level
    pub fn log_level(&self) -> Result<tracing::Level> {
        self.logging.level.to_lowercase().parse()
            .map_err(|e| anyhow::anyhow!("Failed to parse log level: {}", e))
    }
}
