//! Bearer tokens for the Google APIs.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::debug;

use crate::{MetricsServiceError, Result};

pub const DEFAULT_METADATA_ENDPOINT: &str = "http://metadata.google.internal";

const TOKEN_PATH: &str = "/computeMetadata/v1/instance/service-accounts/default/token";

/// Tokens are refreshed this long before the server says they expire.
const EXPIRY_MARGIN_SECS: i64 = 60;

#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn token(&self) -> Result<String>;
}

/// A fixed token, typically injected through the environment.
#[derive(Debug, Clone)]
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        StaticToken(token.into())
    }
}

#[async_trait]
impl TokenSource for StaticToken {
    async fn token(&self) -> Result<String> {
        Ok(self.0.clone())
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    expires_at: DateTime<Utc>,
}

/// Service-account tokens from the GCE metadata server.
pub struct MetadataServerToken {
    http_client: Client,
    endpoint: String,
    cached: Mutex<Option<CachedToken>>,
}

impl MetadataServerToken {
    pub fn new(http_client: Client, endpoint: impl Into<String>) -> Self {
        Self {
            http_client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            cached: Mutex::new(None),
        }
    }

    async fn fetch(&self) -> Result<CachedToken> {
        let url = format!("{}{}", self.endpoint, TOKEN_PATH);
        let response = self
            .http_client
            .get(&url)
            .header("Metadata-Flavor", "Google")
            .send()
            .await
            .map_err(|e| {
                MetricsServiceError::Credentials(format!("metadata server unreachable: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(MetricsServiceError::Credentials(format!(
                "metadata server returned {}",
                status
            )));
        }

        let body: TokenResponse = response.json().await.map_err(|e| {
            MetricsServiceError::Credentials(format!("invalid token response: {}", e))
        })?;

        Ok(CachedToken {
            access_token: body.access_token,
            expires_at: Utc::now() + Duration::seconds(body.expires_in),
        })
    }
}

#[async_trait]
impl TokenSource for MetadataServerToken {
    async fn token(&self) -> Result<String> {
        let mut cached = self.cached.lock().await;

        if let Some(token) = cached.as_ref() {
            if token.expires_at > Utc::now() + Duration::seconds(EXPIRY_MARGIN_SECS) {
                return Ok(token.access_token.clone());
            }
        }

        let fresh = self.fetch().await?;
        debug!(expires_at = %fresh.expires_at, "Refreshed metadata server token");
        let access_token = fresh.access_token.clone();
        *cached = Some(fresh);

        Ok(access_token)
    }
}
