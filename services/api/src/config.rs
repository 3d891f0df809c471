//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use std::ops::RangeInclusive;
use std::str::FromStr;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Which `DatabaseService` adapter backs the service.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    /// Process-local store; data is lost on restart.
    Memory,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "postgres" => Ok(StoreBackend::Postgres),
            "memory" => Ok(StoreBackend::Memory),
            other => Err(format!("'{}' is not one of postgres, memory", other)),
        }
    }
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub store_backend: StoreBackend,
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub log_level: Level,
    pub auth_session_days: i64,
    pub assessment_session_ttl_minutes: i64,
    pub cors_origin: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([0, 0, 0, 0], 3000)),
            store_backend: StoreBackend::Memory,
            database_url: None,
            database_max_connections: 5,
            log_level: Level::INFO,
            auth_session_days: 30,
            assessment_session_ttl_minutes: 60,
            cors_origin: "http://localhost:3000".to_string(),
        }
    }
}

fn parse_var<T: FromStr>(name: &str, default: T) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidValue(name.to_string(), e.to_string())),
        Err(_) => Ok(default),
    }
}

/// Session lifetimes are capped at one year, expressed in the setting's unit.
const SESSION_DAYS_RANGE: RangeInclusive<i64> = 1..=365;
const SESSION_MINUTES_RANGE: RangeInclusive<i64> = 1..=525_600;

fn within(name: &str, value: i64, range: RangeInclusive<i64>) -> Result<i64, ConfigError> {
    if range.contains(&value) {
        Ok(value)
    } else {
        Err(ConfigError::InvalidValue(
            name.to_string(),
            format!("{} is outside {}..={}", value, range.start(), range.end()),
        ))
    }
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        // --- Load Server and Store Settings ---
        let bind_address_str =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let bind_address = bind_address_str.parse::<SocketAddr>().map_err(|e| {
            ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
        })?;

        let store_backend = parse_var("STORE_BACKEND", StoreBackend::Postgres)?;
        let database_url = std::env::var("DATABASE_URL").ok();
        if store_backend == StoreBackend::Postgres && database_url.is_none() {
            return Err(ConfigError::MissingVar("DATABASE_URL".to_string()));
        }
        let database_max_connections = parse_var("DATABASE_MAX_CONNECTIONS", 5u32)?;

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Load Session Settings ---
        let auth_session_days = within(
            "AUTH_SESSION_DAYS",
            parse_var("AUTH_SESSION_DAYS", 30i64)?,
            SESSION_DAYS_RANGE,
        )?;
        let assessment_session_ttl_minutes = within(
            "ASSESSMENT_SESSION_TTL_MINUTES",
            parse_var("ASSESSMENT_SESSION_TTL_MINUTES", 60i64)?,
            SESSION_MINUTES_RANGE,
        )?;

        let cors_origin = std::env::var("CORS_ORIGIN")
            .unwrap_or_else(|_| "http://localhost:3000".to_string());

        Ok(Self {
            bind_address,
            store_backend,
            database_url,
            database_max_connections,
            log_level,
            auth_session_days,
            assessment_session_ttl_minutes,
            cors_origin,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_backend_parses_case_insensitively() {
        assert_eq!("Memory".parse::<StoreBackend>(), Ok(StoreBackend::Memory));
        assert_eq!("postgres".parse::<StoreBackend>(), Ok(StoreBackend::Postgres));
        assert!("mysql".parse::<StoreBackend>().is_err());
    }

    #[test]
    fn missing_variables_fall_back_to_defaults() {
        assert_eq!(parse_var("PRESCHOOL_TEST_UNSET_VARIABLE", 7u32).unwrap(), 7);
    }

    #[test]
    fn session_lifetimes_outside_one_year_are_rejected() {
        assert_eq!(within("AUTH_SESSION_DAYS", 30, SESSION_DAYS_RANGE).unwrap(), 30);
        assert_eq!(
            within("ASSESSMENT_SESSION_TTL_MINUTES", 525_600, SESSION_MINUTES_RANGE).unwrap(),
            525_600
        );
        for bad in [0, -5, 525_601, i64::MAX / 10] {
            assert!(matches!(
                within("ASSESSMENT_SESSION_TTL_MINUTES", bad, SESSION_MINUTES_RANGE),
                Err(ConfigError::InvalidValue(name, _)) if name == "ASSESSMENT_SESSION_TTL_MINUTES"
            ));
        }
        assert!(within("AUTH_SESSION_DAYS", 366, SESSION_DAYS_RANGE).is_err());
        assert!(within("AUTH_SESSION_DAYS", i64::MAX / 10, SESSION_DAYS_RANGE).is_err());
    }
}
