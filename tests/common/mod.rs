#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::{body::Body, http::Request, Router};
use gce_metrics::{
    api::{self, AppState},
    catalog::{FailurePolicy, MetricsCatalog},
    inventory::InstanceDirectory,
    report::ReportService,
    testing::{ScriptedInventory, ScriptedMonitoring},
};
use serde_json::Value;
use tower::ServiceExt;

pub fn app(
    monitoring: Arc<ScriptedMonitoring>,
    inventory: Arc<ScriptedInventory>,
    policy: FailurePolicy,
) -> Router {
    let reports = ReportService::new(
        MetricsCatalog::new(monitoring, policy),
        InstanceDirectory::new(inventory),
        Duration::from_secs(10),
    );
    api::router(AppState::new(reports))
}

pub async fn get_json(app: Router, uri: &str) -> (u16, Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status().as_u16();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

    (status, body)
}
