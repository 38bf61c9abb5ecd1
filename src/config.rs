//! Service configuration, read from the environment.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::auth::DEFAULT_METADATA_ENDPOINT;
use crate::catalog::FailurePolicy;
use crate::inventory::client::DEFAULT_COMPUTE_ENDPOINT;
use crate::logging::LogFormat;
use crate::monitoring::client::DEFAULT_MONITORING_ENDPOINT;
use crate::{MetricsServiceError, Result};

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    pub port: u16,
    /// Deadline for a whole report request.
    pub request_timeout: Duration,
    /// Per-HTTP-call timeout towards the backends.
    pub backend_timeout: Duration,
    pub failure_policy: FailurePolicy,
    pub monitoring_endpoint: String,
    pub compute_endpoint: String,
    pub metadata_endpoint: String,
    /// When unset, tokens come from the metadata server.
    pub access_token: Option<String>,
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0".to_string(),
            port: 8080,
            request_timeout: Duration::from_secs(60),
            backend_timeout: Duration::from_secs(30),
            failure_policy: FailurePolicy::FailFast,
            monitoring_endpoint: DEFAULT_MONITORING_ENDPOINT.to_string(),
            compute_endpoint: DEFAULT_COMPUTE_ENDPOINT.to_string(),
            metadata_endpoint: DEFAULT_METADATA_ENDPOINT.to_string(),
            access_token: None,
            log_format: LogFormat::Compact,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup, falling back
    /// to the defaults for unset or empty keys.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Config::default();

        let partial = match get("PARTIAL_METRICS") {
            Some(raw) => parse_bool("PARTIAL_METRICS", &raw)?,
            None => false,
        };
        let failure_policy = match get("FAILURE_POLICY") {
            Some(raw) => raw.parse()?,
            None if partial => FailurePolicy::PartialSuccess,
            None => FailurePolicy::FailFast,
        };

        Ok(Config {
            bind_addr: get("BIND_ADDR").unwrap_or(defaults.bind_addr),
            port: parse_or("PORT", get("PORT"), defaults.port)?,
            request_timeout: Duration::from_secs(parse_or(
                "REQUEST_TIMEOUT_SECS",
                get("REQUEST_TIMEOUT_SECS"),
                defaults.request_timeout.as_secs(),
            )?),
            backend_timeout: Duration::from_secs(parse_or(
                "BACKEND_TIMEOUT_SECS",
                get("BACKEND_TIMEOUT_SECS"),
                defaults.backend_timeout.as_secs(),
            )?),
            failure_policy,
            monitoring_endpoint: get("MONITORING_ENDPOINT").unwrap_or(defaults.monitoring_endpoint),
            compute_endpoint: get("COMPUTE_ENDPOINT").unwrap_or(defaults.compute_endpoint),
            metadata_endpoint: get("METADATA_ENDPOINT").unwrap_or(defaults.metadata_endpoint),
            access_token: get("GCP_ACCESS_TOKEN"),
            log_format: parse_or("LOG_FORMAT", get("LOG_FORMAT"), defaults.log_format)?,
        })
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }
}

fn parse_or<T>(key: &str, raw: Option<String>, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| MetricsServiceError::Config(format!("{}={}: {}", key, raw, e))),
        None => Ok(default),
    }
}

fn parse_bool(key: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(MetricsServiceError::Config(format!(
            "{}={}: expected a boolean",
            key, raw
        ))),
    }
}
