// Ordered request pipeline: CORS, cache control, recovery, API key, token, version

use crate::auth::api_key::ApiKeyCipher;
use crate::auth::audit_logger::{RequestMeta, SecurityEvent, SecurityEventLogger};
use crate::auth::token::TokenCodec;
use crate::core::errors::GateError;
use crate::core::models::SessionClaims;
use crate::gate::whitelist::{RouteFlags, Whitelist};
use axum::http::{header, HeaderMap, HeaderValue, Method, StatusCode};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::debug;

pub const API_KEY_HEADER: &str = "x-api-key";
pub const ACCESS_TOKEN_HEADER: &str = "x-access-token";
pub const API_VERSION_HEADER: &str = "x-api-version";

const CORS_ALLOW_HEADERS: &str = "Content-Type, Content-Length, Accept-Encoding, X-CSRF-Token, \
X-API-KEY, X-ACCESS-TOKEN, X-TIMEZONE, accept, origin, Cache-Control, X-Requested-With, \
Content-Disposition, Content-Filename";
const CORS_EXPOSE_HEADERS: &str =
    "X-API-KEY, X-ACCESS-TOKEN, X-TIMEZONE, Content-Disposition, Content-Filename";
const CORS_ALLOW_METHODS: &str = "GET, POST, PUT, DELETE, OPTIONS, HEAD";
const CORS_MAX_AGE: &str = "86400";
const NO_CACHE: &str = "no-cache, no-store";

/// One step of the gate, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Cors,
    DisableCache,
    Recovery,
    ApiKey,
    Token,
    ApiVersion,
}

impl Stage {
    pub fn name(self) -> &'static str {
        match self {
            Stage::Cors => "cors",
            Stage::DisableCache => "disable_cache",
            Stage::Recovery => "recovery",
            Stage::ApiKey => "api_key",
            Stage::Token => "token",
            Stage::ApiVersion => "api_version",
        }
    }
}

pub const PIPELINE: [Stage; 6] = [
    Stage::Cors,
    Stage::DisableCache,
    Stage::Recovery,
    Stage::ApiKey,
    Stage::Token,
    Stage::ApiVersion,
];

/// Read-only view of the inbound request
#[derive(Debug, Clone, Copy)]
pub struct RequestView<'a> {
    pub method: &'a Method,
    pub path: &'a str,
    pub headers: &'a HeaderMap,
}

/// State accumulated while the stages run
#[derive(Debug, Default)]
pub struct GateContext {
    pub response_headers: HeaderMap,
    pub claims: Option<SessionClaims>,
    pub app_name: Option<String>,
}

/// Result of a single stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Abort(StatusCode),
}

/// Outcome of the whole pipeline
#[derive(Debug)]
pub enum GateDecision {
    /// Run the handler, then merge `context.response_headers` into its response
    Forward(GateContext),
    /// Respond immediately; the handler never runs
    Halt { status: StatusCode, headers: HeaderMap },
}

/// Authenticated application identity, placed in request extensions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppIdentity(pub String);

/// Whitelist-driven gate in front of every route
///
/// Holds only immutable, shared state; one instance serves all requests
/// concurrently.
#[derive(Debug, Clone)]
pub struct RouteGate {
    tokens: TokenCodec,
    api_keys: ApiKeyCipher,
    whitelist: Arc<Whitelist>,
    api_version: HeaderValue,
    logger: SecurityEventLogger,
}

impl RouteGate {
    pub fn new(
        tokens: TokenCodec,
        api_keys: ApiKeyCipher,
        whitelist: Arc<Whitelist>,
        api_version: &str,
    ) -> Result<Self, GateError> {
        let api_version = HeaderValue::from_str(api_version).map_err(|_| {
            GateError::ConfigurationError(format!("API version '{}' is not a valid header value", api_version))
        })?;
        Ok(Self {
            tokens,
            api_keys,
            whitelist,
            api_version,
            logger: SecurityEventLogger::new(),
        })
    }

    pub fn tokens(&self) -> &TokenCodec {
        &self.tokens
    }

    pub fn api_keys(&self) -> &ApiKeyCipher {
        &self.api_keys
    }

    /// Run every stage of [`PIPELINE`] against `request`
    ///
    /// `now_ms` is the wall clock in epoch milliseconds, used for renewal.
    pub fn evaluate(&self, request: &RequestView<'_>, now_ms: i64) -> GateDecision {
        let mut ctx = GateContext::default();
        let mut recovering = false;

        for stage in PIPELINE {
            let flow = if recovering {
                match guarded(|| self.run_stage(stage, request, &mut ctx, now_ms)) {
                    Ok(flow) => flow,
                    Err(()) => {
                        self.logger.log(
                            &SecurityEvent::PanicRecovered { stage: stage.name() },
                            request.path,
                            &RequestMeta::from_headers(request.headers),
                        );
                        Flow::Abort(StatusCode::INTERNAL_SERVER_ERROR)
                    }
                }
            } else {
                if stage == Stage::Recovery {
                    recovering = true;
                }
                self.run_stage(stage, request, &mut ctx, now_ms)
            };

            if let Flow::Abort(status) = flow {
                debug!(stage = stage.name(), status = status.as_u16(), path = %request.path, "Gate halted request");
                return GateDecision::Halt {
                    status,
                    headers: ctx.response_headers,
                };
            }
        }

        GateDecision::Forward(ctx)
    }

    fn run_stage(
        &self,
        stage: Stage,
        request: &RequestView<'_>,
        ctx: &mut GateContext,
        now_ms: i64,
    ) -> Flow {
        match stage {
            Stage::Cors => cors(request, ctx),
            Stage::DisableCache => {
                ctx.response_headers
                    .insert(header::CACHE_CONTROL, HeaderValue::from_static(NO_CACHE));
                Flow::Continue
            }
            Stage::Recovery => Flow::Continue,
            Stage::ApiKey => self.check_api_key(request, ctx),
            Stage::Token => self.check_token(request, ctx, now_ms),
            Stage::ApiVersion => {
                ctx.response_headers
                    .insert(API_VERSION_HEADER, self.api_version.clone());
                Flow::Continue
            }
        }
    }

    fn check_api_key(&self, request: &RequestView<'_>, ctx: &mut GateContext) -> Flow {
        if self.whitelist.allows(request.path, RouteFlags::SKIP_API_KEY) {
            return Flow::Continue;
        }

        let key = header_str(request.headers, API_KEY_HEADER).unwrap_or_default();
        match self.api_keys.parse_api_key(key) {
            Ok(app_name) => {
                ctx.app_name = Some(app_name);
                Flow::Continue
            }
            Err(e) => {
                self.logger.log(
                    &SecurityEvent::ApiKeyRejected,
                    request.path,
                    &RequestMeta::from_headers(request.headers),
                );
                Flow::Abort(status_of(&e))
            }
        }
    }

    fn check_token(&self, request: &RequestView<'_>, ctx: &mut GateContext, now_ms: i64) -> Flow {
        if self.whitelist.allows(request.path, RouteFlags::SKIP_TOKEN) {
            return Flow::Continue;
        }

        let reject = |reason: &str| {
            self.logger.log(
                &SecurityEvent::TokenRejected { reason: reason.to_string() },
                request.path,
                &RequestMeta::from_headers(request.headers),
            );
            Flow::Abort(StatusCode::UNAUTHORIZED)
        };

        let token = match header_str(request.headers, ACCESS_TOKEN_HEADER) {
            Some(t) if !t.is_empty() => t,
            _ => return reject("missing token"),
        };
        let claims = match self.tokens.verify(token) {
            Ok(c) => c,
            Err(_) => return reject("verification failed"),
        };

        let (claims, token) = match self.tokens.renew(&claims, now_ms) {
            Ok(Some((renewed, fresh))) => {
                self.logger.log(
                    &SecurityEvent::TokenRenewed {
                        subject_id: renewed.subject_id.clone(),
                        expires_at: renewed.expires_at,
                    },
                    request.path,
                    &RequestMeta::default(),
                );
                (renewed, fresh)
            }
            Ok(None) => (claims, token.to_string()),
            Err(e) => return Flow::Abort(status_of(&e)),
        };

        match HeaderValue::from_str(&token) {
            Ok(value) => {
                ctx.response_headers.insert(ACCESS_TOKEN_HEADER, value);
            }
            Err(_) => return Flow::Abort(StatusCode::INTERNAL_SERVER_ERROR),
        }
        ctx.claims = Some(claims);
        Flow::Continue
    }
}

fn cors(request: &RequestView<'_>, ctx: &mut GateContext) -> Flow {
    let headers = &mut ctx.response_headers;
    headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(CORS_ALLOW_HEADERS),
    );
    headers.insert(
        header::ACCESS_CONTROL_EXPOSE_HEADERS,
        HeaderValue::from_static(CORS_EXPOSE_HEADERS),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(CORS_ALLOW_METHODS),
    );
    headers.insert(header::ACCESS_CONTROL_MAX_AGE, HeaderValue::from_static(CORS_MAX_AGE));

    if *request.method == Method::OPTIONS {
        Flow::Abort(StatusCode::NO_CONTENT)
    } else {
        Flow::Continue
    }
}

/// Run `f`, turning a panic into `Err(())`
fn guarded<F: FnOnce() -> Flow>(f: F) -> Result<Flow, ()> {
    panic::catch_unwind(AssertUnwindSafe(f)).map_err(|_| ())
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

fn status_of(err: &GateError) -> StatusCode {
    StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}
