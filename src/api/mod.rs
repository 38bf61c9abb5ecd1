use std::sync::Arc;

use axum::{routing::get, Router};
use reqwest::Client;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use crate::{
    auth::{MetadataServerToken, StaticToken, TokenSource},
    catalog::MetricsCatalog,
    config::Config,
    inventory::{HttpInventoryClient, InstanceDirectory},
    monitoring::HttpMonitoringClient,
    report::ReportService,
    MetricsServiceError, Result,
};

pub mod handlers;

#[derive(Clone)]
pub struct AppState {
    pub reports: Arc<ReportService>,
}

impl AppState {
    pub fn new(reports: ReportService) -> Self {
        Self {
            reports: Arc::new(reports),
        }
    }

    /// Wires the HTTP backends and credentials described by `config`.
    pub fn from_config(config: &Config) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(config.backend_timeout)
            .build()
            .map_err(|e| MetricsServiceError::Config(format!("Failed to build HTTP client: {}", e)))?;

        let tokens: Arc<dyn TokenSource> = match &config.access_token {
            Some(token) => Arc::new(StaticToken::new(token.clone())),
            None => Arc::new(MetadataServerToken::new(
                http_client.clone(),
                config.metadata_endpoint.clone(),
            )),
        };

        let monitoring =
            HttpMonitoringClient::new(http_client.clone(), &config.monitoring_endpoint, tokens.clone())?;
        let inventory = HttpInventoryClient::new(http_client, &config.compute_endpoint, tokens)?;

        Ok(Self::new(ReportService::new(
            MetricsCatalog::new(Arc::new(monitoring), config.failure_policy),
            InstanceDirectory::new(Arc::new(inventory)),
            config.request_timeout,
        )))
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::home))
        .route("/metrics", get(handlers::get_metrics))
        .route("/report", get(handlers::get_report))
        .route("/internal/telemetry", get(handlers::get_telemetry))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn serve(config: &Config, state: AppState) -> Result<()> {
    let app = router(state);
    let addr = config.listen_addr();
    info!("Starting metrics service on {}", addr);

    let listener = TcpListener::bind(&addr).await.map_err(|e| {
        MetricsServiceError::Internal(format!("Failed to bind to address: {}", e))
    })?;

    axum::serve(listener, app)
        .await
        .map_err(|e| MetricsServiceError::Internal(format!("Server error: {}", e)))?;

    Ok(())
}
