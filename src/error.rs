use std::fmt;
use std::time::Duration;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Remote service a failed query was addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Monitoring,
    Inventory,
}

impl Backend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Backend::Monitoring => "monitoring",
            Backend::Inventory => "inventory",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn describe_metric(metric: &Option<String>) -> String {
    match metric {
        Some(name) => format!(" for metric {}", name),
        None => String::new(),
    }
}

#[derive(Debug, Error)]
pub enum MetricsServiceError {
    #[error("{0}")]
    Scope(String),

    #[error("{backend} query failed{}: {detail}", describe_metric(.metric))]
    BackendQuery {
        backend: Backend,
        metric: Option<String>,
        detail: String,
    },

    #[error("Request deadline of {0:?} exceeded")]
    Timeout(Duration),

    #[error("Credentials error: {0}")]
    Credentials(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl MetricsServiceError {
    pub fn backend(backend: Backend, detail: impl Into<String>) -> Self {
        MetricsServiceError::BackendQuery {
            backend,
            metric: None,
            detail: detail.into(),
        }
    }

    /// Tags a backend failure with the catalog metric it was raised for.
    /// Other variants pass through untouched.
    pub fn for_metric(self, name: &str) -> Self {
        match self {
            MetricsServiceError::BackendQuery {
                backend,
                metric: None,
                detail,
            } => MetricsServiceError::BackendQuery {
                backend,
                metric: Some(name.to_string()),
                detail,
            },
            other => other,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            MetricsServiceError::Scope(_) => StatusCode::BAD_REQUEST,
            MetricsServiceError::BackendQuery { .. } => StatusCode::BAD_GATEWAY,
            MetricsServiceError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            MetricsServiceError::Credentials(_)
            | MetricsServiceError::Config(_)
            | MetricsServiceError::Serialization(_)
            | MetricsServiceError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<serde_json::Error> for MetricsServiceError {
    fn from(err: serde_json::Error) -> Self {
        MetricsServiceError::Serialization(err.to_string())
    }
}

impl From<prometheus::Error> for MetricsServiceError {
    fn from(err: prometheus::Error) -> Self {
        MetricsServiceError::Internal(err.to_string())
    }
}

impl IntoResponse for MetricsServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, MetricsServiceError>;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_backend_error_names_metric() {
        let err = MetricsServiceError::backend(Backend::Monitoring, "quota exceeded: slow down")
            .for_metric("disk_read_ops");

        assert_eq!(
            err.to_string(),
            "monitoring query failed for metric disk_read_ops: quota exceeded: slow down"
        );
    }

    #[test]
    fn test_for_metric_keeps_first_name() {
        let err = MetricsServiceError::backend(Backend::Monitoring, "boom")
            .for_metric("cpu_utilization")
            .for_metric("cpu_usage_time");

        assert!(err.to_string().contains("cpu_utilization"));
        assert!(!err.to_string().contains("cpu_usage_time"));
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            MetricsServiceError::Scope("Missing zone".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            MetricsServiceError::backend(Backend::Inventory, "down").status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            MetricsServiceError::Timeout(Duration::from_secs(5)).status_code(),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            MetricsServiceError::Internal("x".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
