use std::str::FromStr;

use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::{MetricsServiceError, Result};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

impl FromStr for LogFormat {
    type Err = MetricsServiceError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "compact" | "text" => Ok(LogFormat::Compact),
            "json" => Ok(LogFormat::Json),
            other => Err(MetricsServiceError::Config(format!(
                "unknown log format '{}'",
                other
            ))),
        }
    }
}

/// Sets up the global tracing subscriber.
///
/// `RUST_LOG` overrides the default of `info` for this crate and the HTTP
/// trace layer.
pub fn init_logger(format: LogFormat) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "{}={},tower_http={}",
            env!("CARGO_CRATE_NAME"),
            Level::INFO,
            Level::INFO
        ))
    });

    let registry = tracing_subscriber::registry().with(env_filter);

    let result = match format {
        LogFormat::Compact => registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(true)
                    .with_file(true)
                    .with_line_number(true)
                    .with_level(true)
                    .with_ansi(true)
                    .compact(),
            )
            .try_init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_current_span(true))
            .try_init(),
    };

    result.map_err(|e| MetricsServiceError::Internal(format!("Failed to initialize logger: {}", e)))
}
