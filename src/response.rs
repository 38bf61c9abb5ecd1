//! Shared handling of backend HTTP responses.

use reqwest::Response;
use serde::de::DeserializeOwned;

use crate::error::Backend;
use crate::telemetry;
use crate::{MetricsServiceError, Result};

pub(crate) fn transport_error(backend: Backend, err: reqwest::Error) -> MetricsServiceError {
    telemetry::record_backend_failure(backend);
    if err.is_timeout() {
        MetricsServiceError::backend(backend, format!("request timed out: {}", err))
    } else {
        MetricsServiceError::backend(backend, format!("transport failure: {}", err))
    }
}

/// Checks the status and decodes the JSON body, classifying failures the
/// way the Google APIs report them.
pub(crate) async fn decode_response<T: DeserializeOwned>(
    backend: Backend,
    response: Response,
) -> Result<T> {
    let status = response.status();

    if !status.is_success() {
        telemetry::record_backend_failure(backend);
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        let code = status.as_u16();

        let context = match code {
            400 => "malformed request".to_string(),
            401 | 403 => "authentication failed".to_string(),
            404 => "resource not found".to_string(),
            429 => "quota exceeded".to_string(),
            500..=599 => format!("server error ({})", code),
            _ => format!("request failed ({})", code),
        };

        return Err(MetricsServiceError::backend(
            backend,
            format!("{}: {}", context, error_text.trim()),
        ));
    }

    response.json::<T>().await.map_err(|e| {
        telemetry::record_backend_failure(backend);
        MetricsServiceError::backend(backend, format!("response parse failed: {}", e))
    })
}
