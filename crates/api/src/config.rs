//! Process configuration read from environment variables.

use std::net::SocketAddr;

use thiserror::Error;

use orderdesk_observability::LogFormat;

pub const DEV_JWT_SECRET: &str = "dev-secret";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid {var}: {message}")]
pub struct ConfigError {
    pub var: &'static str,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub jwt_secret: String,
    /// `None` selects the in-memory store.
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub run_migrations: bool,
    pub log_format: LogFormat,
    pub default_currency: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unset or blank values take their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let bind_addr: SocketAddr = parse("BIND_ADDR", get("BIND_ADDR"), "0.0.0.0:8080".parse())?;
        let database_max_connections: u32 = parse(
            "DATABASE_MAX_CONNECTIONS",
            get("DATABASE_MAX_CONNECTIONS"),
            Ok(10),
        )?;
        let run_migrations = match get("RUN_MIGRATIONS") {
            None => true,
            Some(v) => parse_bool(&v).ok_or_else(|| ConfigError {
                var: "RUN_MIGRATIONS",
                message: format!("expected true or false, got '{v}'"),
            })?,
        };
        let log_format = match get("LOG_FORMAT") {
            None => LogFormat::default(),
            Some(v) => v.parse().map_err(|message| ConfigError {
                var: "LOG_FORMAT",
                message,
            })?,
        };

        Ok(Self {
            bind_addr,
            jwt_secret: get("JWT_SECRET").unwrap_or_else(|| DEV_JWT_SECRET.to_string()),
            database_url: get("DATABASE_URL"),
            database_max_connections,
            run_migrations,
            log_format,
            default_currency: get("DEFAULT_CURRENCY").unwrap_or_else(|| "USD".to_string()),
        })
    }

    pub fn uses_dev_secret(&self) -> bool {
        self.jwt_secret == DEV_JWT_SECRET
    }
}

fn parse<T>(
    var: &'static str,
    raw: Option<String>,
    default: Result<T, T::Err>,
) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let parsed = match raw {
        Some(v) => v.trim().parse::<T>(),
        None => default,
    };
    parsed.map_err(|e| ConfigError {
        var,
        message: e.to_string(),
    })
}

fn parse_bool(v: &str) -> Option<bool> {
    match v.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
