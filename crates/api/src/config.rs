//! Application configuration loaded from environment variables.

use std::time::Duration;

use saga::{EnrollmentFee, SimulatedPaymentProcessor};
use thiserror::Error;

/// Configuration error types.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Server configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST`: bind address (default: `"0.0.0.0"`)
/// - `PORT`: listen port (default: `3000`)
/// - `RUST_LOG`: tracing filter directive (default: `"info"`)
/// - `LOG_FORMAT`: `text` or `json` (default: `text`)
/// - `DATABASE_URL`: PostgreSQL URL; records are kept in memory when unset
/// - `DATABASE_MAX_CONNECTIONS`: pool size (default: `5`)
/// - `PAYMENT_TIMEOUT_MS`: bound on one payment call (default: `5000`)
/// - `PAYMENT_SUCCESS_RATE`: approval share of the simulated processor
///   (default: `0.8`)
/// - `ENROLLMENT_FEE`: fee in rupees (default: `500`)
/// - `ENROLLMENT_FEE_DESCRIPTION`: charge description (default:
///   `"Yoga Monthly Fee"`)
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub log_format: LogFormat,
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub payment_timeout: Duration,
    pub payment_success_rate: f64,
    pub fee: EnrollmentFee,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration through an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let log_format = match lookup("LOG_FORMAT") {
            None => defaults.log_format,
            Some(v) => match v.to_ascii_lowercase().as_str() {
                "text" | "" => LogFormat::Text,
                "json" => LogFormat::Json,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        key: "LOG_FORMAT",
                        value: v,
                    });
                }
            },
        };

        let payment_success_rate: f64 = parse(&lookup, "PAYMENT_SUCCESS_RATE")?
            .unwrap_or(defaults.payment_success_rate);
        if !(0.0..=1.0).contains(&payment_success_rate) {
            return Err(ConfigError::InvalidValue {
                key: "PAYMENT_SUCCESS_RATE",
                value: payment_success_rate.to_string(),
            });
        }

        let fee = EnrollmentFee::new(
            parse(&lookup, "ENROLLMENT_FEE")?.unwrap_or(defaults.fee.amount),
            lookup("ENROLLMENT_FEE_DESCRIPTION").unwrap_or(defaults.fee.description),
        );

        Ok(Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port: parse(&lookup, "PORT")?.unwrap_or(defaults.port),
            log_level: lookup("RUST_LOG").unwrap_or(defaults.log_level),
            log_format,
            database_url: lookup("DATABASE_URL").filter(|url| !url.is_empty()),
            database_max_connections: parse(&lookup, "DATABASE_MAX_CONNECTIONS")?
                .unwrap_or(defaults.database_max_connections),
            payment_timeout: parse(&lookup, "PAYMENT_TIMEOUT_MS")?
                .map(Duration::from_millis)
                .unwrap_or(defaults.payment_timeout),
            payment_success_rate,
            fee,
        })
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
            database_url: None,
            database_max_connections: 5,
            payment_timeout: saga::coordinator::DEFAULT_PAYMENT_TIMEOUT,
            payment_success_rate: SimulatedPaymentProcessor::DEFAULT_SUCCESS_RATE,
            fee: EnrollmentFee::default(),
        }
    }
}

fn parse<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<Option<T>, ConfigError> {
    match lookup(key) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue { key, value }),
    }
}
