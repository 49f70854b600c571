//! Configuration module
//!
//! Loads configuration from environment variables.

use std::env;

/// Key used to sign cursors outside production when `CURSOR_SECRET` is unset
const DEVELOPMENT_CURSOR_SECRET: &str = "accounts-api-development-cursor-key";

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Database connection URL
    pub database_url: String,

    /// Maximum database connections in pool
    pub database_max_connections: u32,

    /// Server host
    pub host: String,

    /// Server port
    pub port: u16,

    /// Environment (development, production)
    pub environment: String,

    /// Secret used to sign pagination cursors
    pub cursor_secret: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url = env::var("DATABASE_URL")
            .map_err(|_| ConfigError::MissingEnv("DATABASE_URL"))?;

        let database_max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidValue("DATABASE_MAX_CONNECTIONS"))?;

        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());

        let port = env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidValue("PORT"))?;

        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

        let cursor_secret = Self::resolve_cursor_secret(
            env::var("CURSOR_SECRET").ok(),
            environment == "production",
        )?;

        Ok(Self {
            database_url,
            database_max_connections,
            host,
            port,
            environment,
            cursor_secret,
        })
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Production deployments must supply their own non-empty cursor secret.
    fn resolve_cursor_secret(
        value: Option<String>,
        production: bool,
    ) -> Result<String, ConfigError> {
        match value {
            Some(secret) if secret.trim().is_empty() => {
                Err(ConfigError::InvalidValue("CURSOR_SECRET"))
            }
            Some(secret) => Ok(secret),
            None if production => Err(ConfigError::MissingEnv("CURSOR_SECRET")),
            None => Ok(DEVELOPMENT_CURSOR_SECRET.to_string()),
        }
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnv(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(&'static str),
}
