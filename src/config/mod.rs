//! Configuration management for mikrotik-gateway
//!
//! This module handles loading, parsing, and validating application
//! configuration from YAML files and environment variables.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Upstream router configuration
    #[serde(default)]
    pub upstream: UpstreamConfig,

    /// Cross-origin policy
    #[serde(default)]
    pub cors: CorsConfig,

    /// Domain blocking configuration
    #[serde(default)]
    pub block: BlockConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::FileRead(format!("Failed to read config file: {}", e)))?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        // Expand environment variables before parsing
        let expanded = expand_env_vars(yaml);
        serde_yaml::from_str(&expanded)
            .map_err(|e| ConfigError::Parse(format!("Failed to parse YAML: {}", e)))
    }

    /// Load configuration from environment variables with prefix MIKROTIK_GATEWAY_
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Config::default();

        if let Ok(host) = std::env::var("MIKROTIK_GATEWAY_SERVER_HOST") {
            config.server.host = host;
        }
        if let Ok(port) = std::env::var("MIKROTIK_GATEWAY_SERVER_PORT") {
            config.server.port = port
                .parse()
                .map_err(|_| ConfigError::Parse("Invalid port number".to_string()))?;
        }

        if let Ok(base_url) = std::env::var("MIKROTIK_GATEWAY_UPSTREAM_URL") {
            config.upstream.base_url = base_url;
        }
        if let Ok(username) = std::env::var("MIKROTIK_GATEWAY_UPSTREAM_USERNAME") {
            config.upstream.username = Some(username);
        }
        if let Ok(password) = std::env::var("MIKROTIK_GATEWAY_UPSTREAM_PASSWORD") {
            config.upstream.password = Some(password);
        }
        if let Ok(timeout) = std::env::var("MIKROTIK_GATEWAY_UPSTREAM_TIMEOUT_SECS") {
            config.upstream.timeout_secs = timeout
                .parse()
                .map_err(|_| ConfigError::Parse("Invalid upstream timeout".to_string()))?;
        }

        if let Ok(origin) = std::env::var("MIKROTIK_GATEWAY_CORS_ALLOWED_ORIGIN") {
            config.cors.allowed_origin = origin;
        }

        if let Ok(ttl) = std::env::var("MIKROTIK_GATEWAY_BLOCK_TTL_SECS") {
            config.block.ttl_secs = ttl
                .parse()
                .map_err(|_| ConfigError::Parse("Invalid block TTL".to_string()))?;
        }
        if let Ok(target) = std::env::var("MIKROTIK_GATEWAY_BLOCK_TARGET_ADDRESS") {
            config.block.target_address = target;
        }

        if let Ok(level) = std::env::var("MIKROTIK_GATEWAY_LOG_LEVEL") {
            config.logging.level = level;
        }

        Ok(config)
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerConfig {
    /// Host address to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on
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

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3001
}

/// Upstream router configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UpstreamConfig {
    /// Base URL of the router's management interface
    #[serde(default = "default_upstream_url")]
    pub base_url: String,

    /// Management username for static DNS operations
    pub username: Option<String>,

    /// Management password for static DNS operations
    pub password: Option<String>,

    /// Request timeout in seconds; exceeding it counts as unreachable
    #[serde(default = "default_upstream_timeout")]
    pub timeout_secs: u64,
}

impl UpstreamConfig {
    /// Request timeout as a Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: default_upstream_url(),
            username: None,
            password: None,
            timeout_secs: default_upstream_timeout(),
        }
    }
}

fn default_upstream_url() -> String {
    "http://192.168.1.1".to_string()
}

fn default_upstream_timeout() -> u64 {
    10
}

/// Cross-origin policy configuration
///
/// A single origin is allowed to call the gateway with a fixed set of
/// methods and headers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CorsConfig {
    /// The one origin permitted to make cross-origin calls
    #[serde(default = "default_allowed_origin")]
    pub allowed_origin: String,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origin: default_allowed_origin(),
        }
    }
}

fn default_allowed_origin() -> String {
    "http://localhost:3000".to_string()
}

/// Domain blocking configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BlockConfig {
    /// How long a block lives before expiring, in seconds
    #[serde(default = "default_block_ttl")]
    pub ttl_secs: u64,

    /// Address blocked domains resolve to
    #[serde(default = "default_target_address")]
    pub target_address: String,
}

impl BlockConfig {
    /// Block lifetime as a Duration
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

impl Default for BlockConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_block_ttl(),
            target_address: default_target_address(),
        }
    }
}

fn default_block_ttl() -> u64 {
    86400 // 1 day
}

fn default_target_address() -> String {
    "127.0.0.1".to_string()
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// Log level
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

fn default_log_level() -> String {
    "info".to_string()
}

/// Configuration error types
#[derive(Debug, thiserror::Error, Clone, PartialEq)]
pub enum ConfigError {
    /// Error reading configuration file
    #[error("Failed to read configuration file: {0}")]
    FileRead(String),

    /// Error parsing configuration
    #[error("Failed to parse configuration: {0}")]
    Parse(String),

    /// Invalid configuration value
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

/// Expand environment variables in a string
///
/// Supports `${VAR_NAME}` syntax
fn expand_env_vars(input: &str) -> String {
    let re = regex_lite::Regex::new(r"\$\{([^}]+)\}")
        .expect("Invalid regex pattern for environment variable expansion");

    re.replace_all(input, |caps: &regex_lite::Captures| {
        let var_name = &caps[1];
        std::env::var(var_name).unwrap_or_else(|_| caps[0].to_string())
    })
    .into_owned()
}
