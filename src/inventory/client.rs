//! Compute Engine v1 `instances.list` over REST.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::auth::TokenSource;
use crate::endpoint::{join_segments, parse_endpoint};
use crate::error::Backend;
use crate::response::{decode_response, transport_error};
use crate::telemetry;
use crate::Result;

use super::{Instance, InventoryBackend};

pub const DEFAULT_COMPUTE_ENDPOINT: &str = "https://compute.googleapis.com";

const PAGE_SIZE: &str = "500";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InstanceListResponse {
    #[serde(default)]
    items: Vec<Instance>,
    #[serde(default)]
    next_page_token: Option<String>,
}

pub struct HttpInventoryClient {
    http_client: Client,
    endpoint: Url,
    tokens: Arc<dyn TokenSource>,
}

impl HttpInventoryClient {
    pub fn new(http_client: Client, endpoint: &str, tokens: Arc<dyn TokenSource>) -> Result<Self> {
        Ok(Self {
            http_client,
            endpoint: parse_endpoint(endpoint)?,
            tokens,
        })
    }

    fn instances_url(&self, project_id: &str, zone: &str) -> Url {
        join_segments(
            &self.endpoint,
            &["compute", "v1", "projects", project_id, "zones", zone, "instances"],
        )
    }
}

#[async_trait]
impl InventoryBackend for HttpInventoryClient {
    #[instrument(skip(self), level = "debug")]
    async fn list_instances(&self, project_id: &str, zone: &str) -> Result<Vec<Instance>> {
        let url = self.instances_url(project_id, zone);
        let token = self.tokens.token().await?;

        let mut instances = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            telemetry::record_backend_query(Backend::Inventory);

            let mut request = self
                .http_client
                .get(url.clone())
                .bearer_auth(&token)
                .query(&[("maxResults", PAGE_SIZE)]);
            if let Some(page) = &page_token {
                request = request.query(&[("pageToken", page.as_str())]);
            }

            let response = request
                .send()
                .await
                .map_err(|e| transport_error(Backend::Inventory, e))?;
            let page: InstanceListResponse = decode_response(Backend::Inventory, response).await?;

            debug!(instances = page.items.len(), "Fetched instance page");
            instances.extend(page.items);

            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(next) => page_token = Some(next),
                None => break,
            }
        }

        Ok(instances)
    }
}
