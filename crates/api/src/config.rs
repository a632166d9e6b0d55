//! # API Configuration Module
//!
//! Loads the server configuration from environment variables, falling back to
//! defaults where a value is optional.
//!
//! ## Environment Variables
//!
//! - `API_HOST`: The host address to bind the server to (default: "0.0.0.0")
//! - `API_PORT`: The port to listen on (default: 3000)
//! - `DATABASE_URL`: PostgreSQL connection string (required)
//! - `DATABASE_MAX_CONNECTIONS`: Pool size (default: 5)
//! - `LOG_LEVEL`: Logging level (default: "info")
//! - `API_CORS_ORIGINS`: Comma-separated list of allowed CORS origins
//! - `API_REQUEST_TIMEOUT_SECONDS`: Whole-request timeout (default: 30)
//! - `SLOT_TRANSACTION_TIMEOUT_MS`: Upper bound on one slot transaction (default: 10000)
//! - `SLOT_CONFLICT_SCOPE`: `all_groups` (default) or `group`

use std::env;
use std::time::Duration;

use carpool_engine::{ConflictScope, EngineSettings};
use eyre::{Result, WrapErr};
use tracing::Level;

/// Configuration for the carpool API server
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Host address for the API server (e.g., "127.0.0.1", "0.0.0.0")
    pub host: String,

    /// Port for the API server to listen on
    pub port: u16,

    /// PostgreSQL database connection string
    pub database_url: String,

    pub database_max_connections: u32,

    /// Log level for the application
    pub log_level: Level,

    /// CORS allowed origins (optional)
    pub cors_origins: Option<Vec<String>>,

    /// Request timeout in seconds
    pub request_timeout: u64,

    pub transaction_timeout: Duration,

    pub conflict_scope: ConflictScope,
}

impl ApiConfig {
    /// Creates a new ApiConfig from environment variables
    ///
    /// # Errors
    ///
    /// Fails when `DATABASE_URL` is not set, or when `API_PORT`,
    /// `DATABASE_MAX_CONNECTIONS`, `SLOT_TRANSACTION_TIMEOUT_MS` or
    /// `SLOT_CONFLICT_SCOPE` hold a value that does not parse.
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Same as [`ApiConfig::from_env`], reading values through `var`.
    pub fn from_vars<F>(var: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Network settings
        let host = var("API_HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = var("API_PORT")
            .unwrap_or_else(|| "3000".to_string())
            .parse()
            .wrap_err("Invalid API_PORT value")?;

        // Database settings
        let database_url =
            var("DATABASE_URL").ok_or_else(|| eyre::eyre!("DATABASE_URL environment variable must be set"))?;
        let database_max_connections = var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|| "5".to_string())
            .parse()
            .wrap_err("Invalid DATABASE_MAX_CONNECTIONS value")?;

        // Logging settings
        let log_level = match var("LOG_LEVEL")
            .unwrap_or_else(|| "info".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        };

        // CORS settings
        let cors_origins = var("API_CORS_ORIGINS").map(|origins| {
            origins
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        });

        // Performance settings
        let request_timeout = var("API_REQUEST_TIMEOUT_SECONDS")
            .and_then(|v| v.parse().ok())
            .unwrap_or(30);

        // Slot engine settings
        let transaction_timeout = match var("SLOT_TRANSACTION_TIMEOUT_MS") {
            Some(ms) => Duration::from_millis(
                ms.parse()
                    .wrap_err("Invalid SLOT_TRANSACTION_TIMEOUT_MS value")?,
            ),
            None => carpool_engine::settings::DEFAULT_TRANSACTION_TIMEOUT,
        };
        let conflict_scope = match var("SLOT_CONFLICT_SCOPE") {
            Some(scope) => scope.parse().wrap_err("Invalid SLOT_CONFLICT_SCOPE value")?,
            None => ConflictScope::default(),
        };

        Ok(Self {
            host,
            port,
            database_url,
            database_max_connections,
            log_level,
            cors_origins,
            request_timeout,
            transaction_timeout,
            conflict_scope,
        })
    }

    /// Returns the server address as a string, e.g. "127.0.0.1:8080"
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            transaction_timeout: self.transaction_timeout,
            conflict_scope: self.conflict_scope,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use pretty_assertions::assert_eq;

    use super::*;

    fn config_from(pairs: &[(&str, &str)]) -> Result<ApiConfig> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ApiConfig::from_vars(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[("DATABASE_URL", "postgres://localhost/carpool")]).unwrap();

        assert_eq!(config.server_addr(), "0.0.0.0:3000");
        assert_eq!(config.database_max_connections, 5);
        assert_eq!(config.log_level, Level::INFO);
        assert_eq!(config.cors_origins, None);
        assert_eq!(config.request_timeout, 30);
        assert_eq!(config.engine_settings(), EngineSettings::default());
    }

    #[test]
    fn test_slot_settings_are_read() {
        let config = config_from(&[
            ("DATABASE_URL", "postgres://localhost/carpool"),
            ("SLOT_TRANSACTION_TIMEOUT_MS", "250"),
            ("SLOT_CONFLICT_SCOPE", "group"),
            ("API_CORS_ORIGINS", "http://a.test, http://b.test,"),
            ("LOG_LEVEL", "DEBUG"),
        ])
        .unwrap();

        assert_eq!(config.transaction_timeout, Duration::from_millis(250));
        assert_eq!(config.conflict_scope, ConflictScope::Group);
        assert_eq!(
            config.cors_origins,
            Some(vec!["http://a.test".to_string(), "http://b.test".to_string()])
        );
        assert_eq!(config.log_level, Level::DEBUG);
    }

    #[test]
    fn test_database_url_is_required() {
        let err = config_from(&[]).unwrap_err();
        assert!(err.to_string().contains("DATABASE_URL"));
    }

    #[test]
    fn test_bad_values_are_rejected() {
        assert!(config_from(&[("DATABASE_URL", "x"), ("API_PORT", "http")]).is_err());
        assert!(config_from(&[("DATABASE_URL", "x"), ("SLOT_CONFLICT_SCOPE", "family")]).is_err());
        assert!(config_from(&[("DATABASE_URL", "x"), ("SLOT_TRANSACTION_TIMEOUT_MS", "-1")]).is_err());
    }
}
