// Integration tests for the built-in service endpoints

use crate::common::*;
use axum::http::StatusCode;
use chrono::Utc;
use gatekeeper::config::Config;
use std::fs;
use tempfile::TempDir;

#[tokio::test]
async fn test_root_reports_configured_version() {
    let app = test_app();
    let response = app.send(get_request("/", &[])).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        serde_json::json!({"code": 0, "key": "gatekeeper", "data": "test-1.0.0"})
    );
}

#[tokio::test]
async fn test_root_prefers_build_tag_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("build-tag");
    fs::write(&path, "v9.9.9-deadbee\n").unwrap();

    let mut config = Config::test_config();
    config.build_tag_path = path;
    let app = test_app_with_config(config);

    let body = body_json(app.send(get_request("/", &[])).await).await;
    assert_eq!(body["data"], "v9.9.9-deadbee");
}

#[tokio::test]
async fn test_session_returns_renewed_claims() {
    let app = test_app();
    let key = app.api_key("web-portal");
    let issued = Utc::now().timestamp_millis();
    let token = app.token(&user_claims(issued));

    let response = app
        .send(get_request("/session", &[("X-API-KEY", &key), ("X-ACCESS-TOKEN", &token)]))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["subjectId"], "user-42");
    assert_eq!(body["subjectType"], 3);
    assert_eq!(body["status"], 2);
    assert!(body["expiresIn"].as_i64().unwrap() > issued);
}

#[tokio::test]
async fn test_session_requires_token() {
    let app = test_app();
    let key = app.api_key("web-portal");

    let response = app.send(get_request("/session", &[("X-API-KEY", &key)])).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
