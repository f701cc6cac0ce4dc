//! Configuration management for tool-runner.
//!
//! Configuration is loaded with the following priority (highest to lowest):
//! 1. Command-line arguments
//! 2. Environment variables
//! 3. Configuration file (JSON)
//! 4. Default values

use std::net::IpAddr;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::api::ServerConfig;
use crate::cli::Args;
use crate::execution::{ExecutorConfig, Shell};

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Server configuration.
    pub server: ServerSection,
    /// Executor configuration.
    pub executor: ExecutorSection,
    /// Result cache configuration.
    pub cache: CacheSection,
    /// Logging configuration.
    pub logging: LoggingSection,
}

/// Server configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    /// Host address to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// Enable graceful shutdown.
    pub graceful_shutdown: bool,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8888,
            graceful_shutdown: true,
        }
    }
}

/// Executor configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutorSection {
    /// Per-command deadline in seconds.
    pub timeout_secs: u64,
    /// Wait between graceful and forced termination, in seconds.
    pub grace_period_secs: u64,
    /// Output drain bound after exit, in seconds.
    pub drain_timeout_secs: u64,
    /// TTL for cached successful results, in seconds.
    pub success_ttl_secs: u64,
    /// Shell argv prefix, e.g. `["bash", "-c"]`. Empty uses the platform shell.
    pub shell: Vec<String>,
}

impl Default for ExecutorSection {
    fn default() -> Self {
        Self {
            timeout_secs: 300,
            grace_period_secs: 2,
            drain_timeout_secs: 5,
            success_ttl_secs: 30 * 60,
            shell: Vec::new(),
        }
    }
}

/// Result cache configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSection {
    /// TTL used when none is given, in seconds.
    pub default_ttl_secs: u64,
    /// Interval between expiry sweeps, in seconds.
    pub cleanup_interval_secs: u64,
}

impl Default for CacheSection {
    fn default() -> Self {
        Self {
            default_ttl_secs: 30 * 60,
            cleanup_interval_secs: 10 * 60,
        }
    }
}

/// Logging configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level (error, warn, info, debug, trace).
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        serde_json::from_str(&content).map_err(ConfigError::Json)
    }

    /// Apply environment variable overrides.
    pub fn apply_env(&mut self) {
        if let Ok(host) = std::env::var("TOOL_RUNNER_HOST") {
            self.server.host = host;
        }

        if let Ok(port) = std::env::var("TOOL_RUNNER_PORT") {
            if let Ok(port) = port.parse() {
                self.server.port = port;
            }
        }

        if let Ok(timeout) = std::env::var("TOOL_RUNNER_TIMEOUT") {
            if let Ok(timeout) = timeout.parse() {
                self.executor.timeout_secs = timeout;
            }
        }

        if let Ok(level) = std::env::var("TOOL_RUNNER_LOG_LEVEL") {
            self.logging.level = level;
        } else if let Ok(level) = std::env::var("RUST_LOG") {
            self.logging.level = level;
        }
    }

    /// Apply CLI argument overrides.
    pub fn apply_args(&mut self, args: &Args) {
        if let Some(host) = args.host {
            self.server.host = host.to_string();
        }

        if let Some(port) = args.port {
            self.server.port = port;
        }

        if let Some(timeout) = args.timeout_secs {
            self.executor.timeout_secs = timeout;
        }

        if let Some(ref level) = args.log_level {
            self.logging.level = level.clone();
        }
    }

    /// Load configuration with full priority chain.
    ///
    /// Priority: CLI args > env vars > config file > defaults
    pub fn load(args: &Args) -> Result<Self, ConfigError> {
        let mut config = Config::default();

        if let Some(ref path) = args.config {
            config = Config::from_file(path)?;
        }

        config.apply_env();
        config.apply_args(args);
        config.validate()?;

        Ok(config)
    }

    /// Reject values the executor cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.executor.timeout_secs == 0 {
            return Err(ConfigError::Invalid("executor.timeout_secs must be positive"));
        }
        if self.cache.cleanup_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "cache.cleanup_interval_secs must be positive",
            ));
        }
        Ok(())
    }

    /// Convert to ServerConfig for the API server.
    pub fn to_server_config(&self) -> Result<ServerConfig, ConfigError> {
        let host: IpAddr = self
            .server
            .host
            .parse()
            .map_err(|_| ConfigError::InvalidHost(self.server.host.clone()))?;

        let mut server_config = ServerConfig::new(host.to_string(), self.server.port);
        if !self.server.graceful_shutdown {
            server_config = server_config.without_graceful_shutdown();
        }

        Ok(server_config)
    }

    /// Convert to the executor's runtime configuration.
    pub fn executor_config(&self) -> ExecutorConfig {
        let section = &self.executor;
        ExecutorConfig {
            timeout: Duration::from_secs(section.timeout_secs),
            grace_period: Duration::from_secs(section.grace_period_secs),
            drain_timeout: Duration::from_secs(section.drain_timeout_secs),
            success_ttl: Duration::from_secs(section.success_ttl_secs),
            shell: Shell::from_argv(&section.shell).unwrap_or_default(),
        }
    }

    /// Default TTL for the result cache.
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache.default_ttl_secs)
    }

    /// Interval between cache sweeps.
    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cache.cleanup_interval_secs)
    }

    /// Get the log level filter string.
    pub fn log_filter(&self) -> &str {
        &self.logging.level
    }
}

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    /// IO error reading config file.
    Io(std::io::Error),
    /// JSON parsing error.
    Json(serde_json::Error),
    /// Invalid host address.
    InvalidHost(String),
    /// Out-of-range value.
    Invalid(&'static str),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "failed to read config file: {}", e),
            Self::Json(e) => write!(f, "failed to parse config file: {}", e),
            Self::InvalidHost(host) => write!(f, "invalid host address: {}", host),
            Self::Invalid(reason) => write!(f, "invalid configuration: {}", reason),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<ConfigError> for crate::ToolRunnerError {
    fn from(e: ConfigError) -> Self {
        crate::ToolRunnerError::Config(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8888);
        assert_eq!(config.executor.timeout_secs, 300);
        assert_eq!(config.cache.default_ttl_secs, 1800);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_from_json() {
        let json = r#"{
            "server": {
                "host": "0.0.0.0",
                "port": 8080
            },
            "executor": {
                "timeout_secs": 60,
                "shell": ["bash", "-c"]
            },
            "cache": {
                "cleanup_interval_secs": 30
            }
        }"#;

        let mut file = NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.executor.timeout_secs, 60);
        assert_eq!(config.executor.grace_period_secs, 2); // Default
        assert_eq!(config.cleanup_interval(), Duration::from_secs(30));

        let executor = config.executor_config();
        assert_eq!(executor.timeout, Duration::from_secs(60));
        assert_eq!(executor.shell, Shell::new("bash", ["-c"]));
    }

    #[test]
    fn test_config_partial_json() {
        let json = r#"{
            "server": {
                "port": 9000
            }
        }"#;

        let mut file = NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.server.host, "127.0.0.1"); // Default
        assert_eq!(config.server.port, 9000);
    }

    #[test]
    fn test_invalid_json() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"{ not json").unwrap();

        let result = Config::from_file(file.path());
        assert!(matches!(result, Err(ConfigError::Json(_))));
    }

    #[test]
    fn test_apply_args() {
        let mut config = Config::default();
        let args = Args {
            host: Some("192.168.1.1".parse().unwrap()),
            port: Some(5000),
            timeout_secs: Some(10),
            log_level: Some("debug".to_string()),
            ..Args::default()
        };

        config.apply_args(&args);

        assert_eq!(config.server.host, "192.168.1.1");
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.executor.timeout_secs, 10);
        assert_eq!(config.log_filter(), "debug");
    }

    #[test]
    fn test_apply_args_keeps_unset_values() {
        let mut config = Config::default();
        config.server.port = 9999;

        config.apply_args(&Args::default());
        assert_eq!(config.server.port, 9999);
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let mut config = Config::default();
        config.executor.timeout_secs = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_default_executor_config() {
        let executor = Config::default().executor_config();
        assert_eq!(executor.timeout, Duration::from_secs(300));
        assert_eq!(executor.success_ttl, Duration::from_secs(1800));
        assert_eq!(executor.shell, Shell::default());
    }

    #[test]
    fn test_to_server_config() {
        let config = Config::default();
        let server_config = config.to_server_config().unwrap();

        assert_eq!(server_config.host, "127.0.0.1");
        assert_eq!(server_config.port, 8888);
        assert!(server_config.graceful_shutdown);
    }

    #[test]
    fn test_invalid_host() {
        let mut config = Config::default();
        config.server.host = "not-an-ip".to_string();

        let result = config.to_server_config();
        assert!(result.is_err());
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let json = serde_json::to_string_pretty(&config).unwrap();
        assert!(json.contains("\"timeout_secs\""));
        assert!(json.contains("\"cleanup_interval_secs\""));
    }
}
