// Common test utilities and helpers for all test modules
#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, Response},
    routing::get,
    Router,
};
use gatekeeper::api::{create_router, AppState};
use gatekeeper::audit::{AuditStore, InMemoryAuditStore};
use gatekeeper::config::Config;
use gatekeeper::core::errors::GateError;
use gatekeeper::core::models::{AuditLogEntry, SessionClaims, SubjectStatus, SubjectType};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tower::ServiceExt;

/// Audit store that rejects every insert
pub struct FailingAuditStore;

#[async_trait]
impl AuditStore for FailingAuditStore {
    async fn insert(&self, _entry: AuditLogEntry) -> Result<AuditLogEntry, GateError> {
        Err(GateError::StoreError("database unavailable".to_string()))
    }
}

/// Router plus the pieces tests need to inspect
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub store: Arc<InMemoryAuditStore>,
    pub handler_calls: Arc<AtomicUsize>,
}

impl TestApp {
    pub fn calls(&self) -> usize {
        self.handler_calls.load(Ordering::SeqCst)
    }

    pub fn api_key(&self, app: &str) -> String {
        self.state.gate.api_keys().create_api_key(app).unwrap()
    }

    pub fn token(&self, claims: &SessionClaims) -> String {
        self.state.gate.tokens().issue(claims).unwrap()
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }
}

/// Build the full router with test routes:
/// `/orders` and `/user/authorize` count invocations, `/explode` panics.
pub fn test_app() -> TestApp {
    test_app_with_config(Config::test_config())
}

pub fn test_app_with_config(config: Config) -> TestApp {
    let store = Arc::new(InMemoryAuditStore::new());
    let state = AppState::new(config, store.clone()).unwrap();
    let handler_calls = Arc::new(AtomicUsize::new(0));

    let orders_calls = handler_calls.clone();
    let login_calls = handler_calls.clone();
    let extra = Router::new()
        .route(
            "/orders",
            get(move || {
                let calls = orders_calls.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    "orders"
                }
            }),
        )
        .route(
            "/user/authorize",
            get(move || {
                let calls = login_calls.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    "authorized"
                }
            }),
        )
        .route("/explode", get(exploding_handler));

    TestApp {
        router: create_router(state.clone(), extra),
        state,
        store,
        handler_calls,
    }
}

async fn exploding_handler() -> &'static str {
    panic!("handler exploded")
}

pub fn user_claims(expires_at: i64) -> SessionClaims {
    SessionClaims::new("user-42", SubjectType::User, SubjectStatus::Active, expires_at)
}

pub fn service_claims() -> SessionClaims {
    SessionClaims::new("svc-billing", SubjectType::Service, SubjectStatus::Active, 0)
}

pub fn get_request(path: &str, headers: &[(&str, &str)]) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(path);
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    builder.body(Body::empty()).unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}
