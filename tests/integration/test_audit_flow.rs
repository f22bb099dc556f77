// Integration tests for audit recording behind an authenticated mutation

use crate::common::*;
use axum::{
    extract::State,
    http::{Request, StatusCode},
    routing::put,
    Extension, Json, Router,
};
use gatekeeper::api::{create_router, AppState};
use gatekeeper::audit::{AuditRecorder, InMemoryAuditStore};
use gatekeeper::config::Config;
use gatekeeper::core::models::{AuditAction, AuditItem, SessionClaims, SubjectType};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

/// Stand-in for a business handler: applies an update and records the delta
async fn rename_item(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
    Json(after): Json<Value>,
) -> StatusCode {
    let before = json!({"name": "Old", "price": 10, "meta": {"color": "red", "size": 2}});
    state
        .recorder
        .record(
            Some(&claims),
            &AuditItem::new("product", "p-1", "Old"),
            AuditAction::Update,
            before,
            after,
        )
        .await;
    StatusCode::NO_CONTENT
}

#[tokio::test]
async fn test_mutation_records_minimal_delta() {
    let store = Arc::new(InMemoryAuditStore::new());
    let state = AppState::new(Config::test_config(), store.clone()).unwrap();
    let key = state.gate.api_keys().create_api_key("admin-ui").unwrap();
    let token = state
        .gate
        .tokens()
        .issue(&user_claims(chrono::Utc::now().timestamp_millis()))
        .unwrap();
    let router = create_router(state, Router::new().route("/products/p-1", put(rename_item)));

    let request = Request::builder()
        .method("PUT")
        .uri("/products/p-1")
        .header("X-API-KEY", key)
        .header("X-ACCESS-TOKEN", token)
        .header("Content-Type", "application/json")
        .body(axum::body::Body::from(
            json!({"name": "Old", "price": 12, "meta": {"color": "red", "size": 3}}).to_string(),
        ))
        .unwrap();
    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let entries = store.entries().await;
    assert_eq!(entries.len(), 1);
    let entry = &entries[0];
    assert_eq!(entry.user_id, "user-42");
    assert_eq!(entry.user_type, SubjectType::User);
    assert_eq!(entry.action, AuditAction::Update);
    assert_eq!(
        serde_json::from_str::<Value>(&entry.before_change).unwrap(),
        json!({"price": 10, "meta": {"size": 2}})
    );
    assert_eq!(
        serde_json::from_str::<Value>(&entry.after_change).unwrap(),
        json!({"price": 12, "meta": {"size": 3}})
    );
}

#[tokio::test]
async fn test_store_failure_is_swallowed() {
    let recorder = AuditRecorder::new(Arc::new(FailingAuditStore));

    let entry = recorder
        .record(
            Some(&service_claims()),
            &AuditItem::new("product", "p-2", "Lamp"),
            AuditAction::Delete,
            json!({"name": "Lamp"}),
            Value::Null,
        )
        .await;

    assert!(entry.is_none());
}

#[tokio::test]
async fn test_create_records_full_after_snapshot() {
    let store = Arc::new(InMemoryAuditStore::new());
    let recorder = AuditRecorder::new(store.clone());

    recorder
        .record(
            Some(&service_claims()),
            &AuditItem::new("product", "p-3", "Desk"),
            AuditAction::Create,
            Value::Null,
            json!({"name": "Desk", "price": 99}),
        )
        .await
        .unwrap();

    let entry = &store.entries().await[0];
    assert_eq!(entry.before_change, "{}");
    assert_eq!(
        serde_json::from_str::<Value>(&entry.after_change).unwrap(),
        json!({"name": "Desk", "price": 99})
    );
}
