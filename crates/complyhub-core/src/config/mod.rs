//! Application configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate. Each sub-module represents a logical configuration
//! section.

pub mod app;
pub mod auth;
pub mod database;
pub mod logging;
pub mod webhook;
pub mod worker;

use serde::{Deserialize, Serialize};

pub use self::app::{CorsConfig, ServerConfig};
pub use self::auth::AuthConfig;
pub use self::database::DatabaseConfig;
pub use self::logging::LoggingConfig;
pub use self::webhook::WebhookConfig;
pub use self::worker::WorkerConfig;

use crate::error::AppError;

/// Environment variable prefix for configuration overrides.
pub const ENV_PREFIX: &str = "COMPLYHUB";

/// Root application configuration.
///
/// This struct is the top-level deserialization target for the merged
/// TOML configuration files (default.toml + environment overlay).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database connection settings.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Authentication settings.
    #[serde(default)]
    pub auth: AuthConfig,
    /// Webhook delivery policy.
    #[serde(default)]
    pub webhooks: WebhookConfig,
    /// Background worker settings.
    #[serde(default)]
    pub worker: WorkerConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from TOML files.
    ///
    /// Merges the default configuration with an environment-specific overlay
    /// and environment variables prefixed with `COMPLYHUB__`
    /// (e.g. `COMPLYHUB__DATABASE__URL`).
    pub fn load(env: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        let config: Self = config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))?;

        config.validate()?;
        Ok(config)
    }

    /// Reject combinations that cannot work at runtime.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.database.url.trim().is_empty() {
            return Err(AppError::configuration("database.url must be set"));
        }
        if self.auth.jwt_secret.len() < 16 {
            return Err(AppError::configuration(
                "auth.jwt_secret must be at least 16 characters",
            ));
        }
        if self.webhooks.max_delay_seconds < self.webhooks.base_delay_seconds {
            return Err(AppError::configuration(
                "webhooks.max_delay_seconds must be >= webhooks.base_delay_seconds",
            ));
        }
        if self.worker.concurrency == 0 {
            return Err(AppError::configuration("worker.concurrency must be > 0"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.webhooks.default_retry_count, 3);
        assert_eq!(config.webhooks.default_timeout_ms, 30_000);
    }

    #[test]
    fn test_short_secret_rejected() {
        let mut config = AppConfig::default();
        config.auth.jwt_secret = "short".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_inverted_backoff_rejected() {
        let mut config = AppConfig::default();
        config.webhooks.base_delay_seconds = 100;
        config.webhooks.max_delay_seconds = 10;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: AppConfig = config::Config::builder()
            .add_source(config::File::from_str(
                "[webhooks]\nfailure_threshold = 9\n",
                config::FileFormat::Toml,
            ))
            .build()
            .and_then(|c| c.try_deserialize())
            .expect("deserialize");
        assert_eq!(config.webhooks.failure_threshold, 9);
        assert_eq!(config.webhooks.base_delay_seconds, 1);
        assert_eq!(config.server.port, 8080);
    }
}
