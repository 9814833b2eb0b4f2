use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub trading: TradingConfig,
    pub oracle: OracleConfig,
    pub queue: QueueConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address for the HTTP API (e.g. "0.0.0.0:8080")
    pub bind: String,
    /// Bearer token required on every API call
    pub api_token: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,
    /// Maximum connections in pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    5
}

#[derive(Debug, Clone, Deserialize)]
pub struct TradingConfig {
    /// Interval for the internal step ticker; 0 disables it and steps are
    /// driven purely by API calls.
    #[serde(default)]
    pub auto_step_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OracleConfig {
    /// Per-oracle query timeout before falling back to the neutral baseline
    #[serde(default = "default_oracle_timeout_ms")]
    pub timeout_ms: u64,
    /// Seed for the simulated oracle sources; None uses entropy
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_oracle_timeout_ms() -> u64 {
    1500
}

#[derive(Debug, Clone, Deserialize)]
pub struct QueueConfig {
    /// Base URL of the external order queue service; empty disables
    /// submission (proposals are logged and dropped).
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_queue_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_queue_timeout_ms() -> u64 {
    3000
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Enable JSON formatted logs
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl AppConfig {
    /// Load configuration from files and environment
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("config")
    }

    /// Load configuration from a specific directory
    pub fn load_from<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();

        let builder = Config::builder()
            .set_default("server.bind", "0.0.0.0:8080")?
            .set_default("server.api_token", "")?
            .set_default("logging.level", "info")?
            .set_default("logging.json", false)?
            .set_default("database.max_connections", 5)?
            .set_default("trading.auto_step_secs", 0)?
            .set_default("oracle.timeout_ms", 1500)?
            .set_default("queue.url", "")?
            .set_default("queue.timeout_ms", 3000)?
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            .add_source(
                File::from(config_dir.join(
                    std::env::var("HIVEMIND_ENV").unwrap_or_else(|_| "development".to_string()),
                ))
                .required(false),
            )
            // Override with environment variables (HIVEMIND_DATABASE__URL, etc.)
            .add_source(
                Environment::with_prefix("HIVEMIND")
                    .separator("__")
                    .try_parsing(true),
            );

        builder.build()?.try_deserialize()
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.server.api_token.trim().is_empty() {
            errors.push("server.api_token must be set".to_string());
        }

        if self.database.url.trim().is_empty() {
            errors.push("database.url must be set".to_string());
        }

        if self.oracle.timeout_ms == 0 {
            errors.push("oracle.timeout_ms must be positive".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> AppConfig {
        AppConfig {
            server: ServerConfig {
                bind: "127.0.0.1:8080".to_string(),
                api_token: "secret".to_string(),
            },
            database: DatabaseConfig {
                url: "postgres://localhost/hivemind".to_string(),
                max_connections: 5,
            },
            trading: TradingConfig { auto_step_secs: 0 },
            oracle: OracleConfig {
                timeout_ms: 1500,
                seed: None,
            },
            queue: QueueConfig {
                url: String::new(),
                timeout_ms: 3000,
            },
            logging: LoggingConfig::default(),
        }
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(base_config().validate().is_ok());
    }

    #[test]
    fn test_missing_token_rejected() {
        let mut cfg = base_config();
        cfg.server.api_token = "  ".to_string();
        let errors = cfg.validate().unwrap_err();
        assert!(errors.iter().any(|e| e.contains("api_token")));
    }
}
