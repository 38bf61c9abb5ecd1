//! Base URLs of the REST backends.

use reqwest::Url;

use crate::{MetricsServiceError, Result};

/// Parses a backend base URL, which may carry a path prefix of its own.
pub(crate) fn parse_endpoint(raw: &str) -> Result<Url> {
    let url = Url::parse(raw.trim())
        .map_err(|e| MetricsServiceError::Config(format!("Invalid endpoint '{}': {}", raw, e)))?;

    if url.cannot_be_a_base() {
        return Err(MetricsServiceError::Config(format!(
            "Invalid endpoint '{}': not a base URL",
            raw
        )));
    }

    Ok(url)
}

/// Appends `segments` to the base path. Each segment is percent-encoded,
/// so a `/` inside one never introduces another path level.
pub(crate) fn join_segments(base: &Url, segments: &[&str]) -> Url {
    let mut url = base.clone();
    if let Ok(mut path) = url.path_segments_mut() {
        path.pop_if_empty().extend(segments);
    }
    url
}
