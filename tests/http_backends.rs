mod common;

use common::get_json;
use gce_metrics::{
    api::{self, AppState},
    catalog::CATALOG,
    config::Config,
};
use mockito::{Matcher, Server};
use pretty_assertions::assert_eq;
use serde_json::json;

fn config(server: &Server) -> Config {
    Config {
        monitoring_endpoint: server.url(),
        compute_endpoint: server.url(),
        access_token: Some("static-token".to_string()),
        ..Config::default()
    }
}

#[tokio::test]
async fn report_over_http_backends() {
    let mut server = Server::new_async().await;

    let time_series = server
        .mock("GET", "/v3/projects/proj/timeSeries")
        .match_query(Matcher::UrlEncoded("view".into(), "FULL".into()))
        .match_header("authorization", "Bearer static-token")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "timeSeries": [{
                    "resource": {"type": "gce_instance", "labels": {"instance_id": "7", "zone": "us-central1-a"}},
                    "points": [
                        {"value": {"int64Value": "40"}},
                        {"value": {}}
                    ]
                }]
            })
            .to_string(),
        )
        .expect(CATALOG.len())
        .create_async()
        .await;

    let instances = server
        .mock("GET", "/compute/v1/projects/proj/zones/us-central1-a/instances")
        .match_query(Matcher::UrlEncoded("maxResults".into(), "500".into()))
        .match_header("authorization", "Bearer static-token")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "items": [
                    {"id": "7", "name": "web-1", "machineType": "projects/proj/zones/us-central1-a/machineTypes/e2-medium"},
                    {"id": "8", "name": "idle-1", "machineType": "projects/proj/zones/us-central1-a/machineTypes/e2-micro"}
                ]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let app = api::router(AppState::from_config(&config(&server)).unwrap());
    let (status, body) = get_json(app, "/report?project_id=proj&zone=us-central1-a").await;

    time_series.assert_async().await;
    instances.assert_async().await;

    assert_eq!(status, 200);
    let reports = body["instances"].as_array().unwrap();
    assert_eq!(reports.len(), 2);
    assert_eq!(reports[0]["machine_type"], "e2-medium");
    assert_eq!(reports[0]["metrics"]["system_uptime"], json!(40.0));
    assert_eq!(reports[1]["id"], "8");
    assert_eq!(reports[1]["metrics"]["system_uptime"], json!(0.0));
}

#[tokio::test]
async fn backend_outage_is_bad_gateway() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/v3/projects/proj/timeSeries")
        .match_query(Matcher::Any)
        .with_status(503)
        .with_body("backend unavailable")
        .create_async()
        .await;

    let app = api::router(AppState::from_config(&config(&server)).unwrap());
    let (status, body) = get_json(app, "/metrics?project_id=proj&zone=us-central1-a").await;

    assert_eq!(status, 502);
    assert!(body["error"]
        .as_str()
        .unwrap()
        .contains("server error (503)"));
}
