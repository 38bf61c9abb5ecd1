use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

use crate::{
    models::{MetricTable, Scope},
    report::ZoneReport,
    telemetry::{self, RequestTimer},
    Result,
};

use super::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ScopeParams {
    pub project_id: Option<String>,
    pub zone: Option<String>,
}

impl ScopeParams {
    /// Rejects the request before any backend is touched when either
    /// parameter is missing or blank.
    pub fn into_scope(self) -> Result<Scope> {
        Scope::new(
            self.project_id.unwrap_or_default(),
            self.zone.unwrap_or_default(),
        )
    }
}

pub async fn home() -> &'static str {
    "ok"
}

pub async fn get_metrics(
    State(state): State<AppState>,
    Query(params): Query<ScopeParams>,
) -> Result<Json<MetricTable>> {
    let scope = params.into_scope()?;
    let _timer = RequestTimer::new("/metrics");
    let request_id = Uuid::new_v4();

    info!(%request_id, project_id = %scope.project_id, zone = %scope.zone, "Collecting zone metrics");

    let table = state
        .reports
        .collect_metrics(&scope)
        .instrument(info_span!("metrics_request", %request_id))
        .await?;

    Ok(Json(table))
}

pub async fn get_report(
    State(state): State<AppState>,
    Query(params): Query<ScopeParams>,
) -> Result<Json<ZoneReport>> {
    let scope = params.into_scope()?;
    let _timer = RequestTimer::new("/report");
    let request_id = Uuid::new_v4();

    info!(%request_id, project_id = %scope.project_id, zone = %scope.zone, "Building zone report");

    let report = state
        .reports
        .build_report(&scope)
        .instrument(info_span!("report_request", %request_id))
        .await?;

    Ok(Json(report))
}

pub async fn get_telemetry() -> Result<String> {
    telemetry::render()
}
