//! Configuration module
//!
//! Loads configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use reqwest::Url;

use crate::notifier::NotifierConfig;

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

    /// Path prefix the REST API is mounted under
    pub api_prefix: String,

    /// Directory served at /public/uploads
    pub upload_dir: String,

    /// Environment (development, production)
    pub environment: String,

    /// Build hook called on every store change
    pub build_hook_url: Url,

    /// Change notifier tuning
    pub notifier: NotifierConfig,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").ok_or(ConfigError::MissingEnv("DATABASE_URL"))?;

        let build_hook_url = lookup("BUILD_HOOK_URL")
            .ok_or(ConfigError::MissingEnv("BUILD_HOOK_URL"))?
            .parse::<Url>()
            .map_err(|_| ConfigError::InvalidValue("BUILD_HOOK_URL"))?;

        if !matches!(build_hook_url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidValue("BUILD_HOOK_URL"));
        }

        let database_max_connections = parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 10)?;

        let host = lookup("HOST").unwrap_or_else(|| "127.0.0.1".to_string());

        let port = parse_or(&lookup, "PORT", 3000)?;

        let api_prefix = lookup("API_URL").unwrap_or_else(|| "/api/v1".to_string());
        let api_prefix = api_prefix.trim_end_matches('/').to_string();
        if !api_prefix.starts_with('/') || api_prefix.len() < 2 {
            return Err(ConfigError::InvalidValue("API_URL"));
        }

        let upload_dir = lookup("UPLOAD_DIR").unwrap_or_else(|| "public/uploads".to_string());

        let environment = lookup("ENVIRONMENT").unwrap_or_else(|| "development".to_string());

        let defaults = NotifierConfig::default();

        let queue_capacity: usize =
            parse_or(&lookup, "NOTIFIER_QUEUE_CAPACITY", defaults.queue_capacity)?;
        if queue_capacity == 0 {
            return Err(ConfigError::InvalidValue("NOTIFIER_QUEUE_CAPACITY"));
        }

        let max_in_flight: usize =
            parse_or(&lookup, "NOTIFIER_MAX_IN_FLIGHT", defaults.max_in_flight)?;
        if max_in_flight == 0 {
            return Err(ConfigError::InvalidValue("NOTIFIER_MAX_IN_FLIGHT"));
        }

        let webhook_timeout_secs: u64 = parse_or(
            &lookup,
            "WEBHOOK_TIMEOUT_SECS",
            defaults.webhook_timeout.as_secs(),
        )?;
        if webhook_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue("WEBHOOK_TIMEOUT_SECS"));
        }

        Ok(Self {
            database_url,
            database_max_connections,
            host,
            port,
            api_prefix,
            upload_dir,
            environment,
            build_hook_url,
            notifier: NotifierConfig {
                queue_capacity,
                max_in_flight,
                webhook_timeout: Duration::from_secs(webhook_timeout_secs),
            },
        })
    }
}

fn parse_or<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(name) {
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidValue(name)),
        None => Ok(default),
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
