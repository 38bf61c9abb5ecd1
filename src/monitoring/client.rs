//! Cloud Monitoring v3 `projects.timeSeries.list` over REST.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::auth::TokenSource;
use crate::endpoint::{join_segments, parse_endpoint};
use crate::error::Backend;
use crate::models::TimeWindow;
use crate::response::{decode_response, transport_error};
use crate::telemetry;
use crate::Result;

use super::{MonitoringBackend, TimeSeries};

pub const DEFAULT_MONITORING_ENDPOINT: &str = "https://monitoring.googleapis.com";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListTimeSeriesResponse {
    #[serde(default)]
    time_series: Vec<TimeSeries>,
    #[serde(default)]
    next_page_token: Option<String>,
}

pub struct HttpMonitoringClient {
    http_client: Client,
    endpoint: Url,
    tokens: Arc<dyn TokenSource>,
}

impl HttpMonitoringClient {
    pub fn new(http_client: Client, endpoint: &str, tokens: Arc<dyn TokenSource>) -> Result<Self> {
        Ok(Self {
            http_client,
            endpoint: parse_endpoint(endpoint)?,
            tokens,
        })
    }

    fn time_series_url(&self, project_id: &str) -> Url {
        join_segments(&self.endpoint, &["v3", "projects", project_id, "timeSeries"])
    }
}

#[async_trait]
impl MonitoringBackend for HttpMonitoringClient {
    #[instrument(skip(self, window), level = "debug")]
    async fn list_time_series(
        &self,
        project_id: &str,
        filter: &str,
        window: &TimeWindow,
    ) -> Result<Vec<TimeSeries>> {
        let url = self.time_series_url(project_id);
        let token = self.tokens.token().await?;
        let start_time = window.start_rfc3339();
        let end_time = window.end_rfc3339();

        let mut series = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            telemetry::record_backend_query(Backend::Monitoring);

            let mut request = self.http_client.get(url.clone()).bearer_auth(&token).query(&[
                ("filter", filter),
                ("interval.startTime", start_time.as_str()),
                ("interval.endTime", end_time.as_str()),
                ("view", "FULL"),
            ]);
            if let Some(page) = &page_token {
                request = request.query(&[("pageToken", page.as_str())]);
            }

            let response = request
                .send()
                .await
                .map_err(|e| transport_error(Backend::Monitoring, e))?;
            let page: ListTimeSeriesResponse = decode_response(Backend::Monitoring, response).await?;

            debug!(series = page.time_series.len(), "Fetched time series page");
            series.extend(page.time_series);

            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(next) => page_token = Some(next),
                None => break,
            }
        }

        Ok(series)
    }
}
