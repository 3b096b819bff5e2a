use std::{collections::HashSet, sync::Arc};

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use uuid::Uuid;

use crate::api::ApiError;

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Request ID stored as a request extension and echoed on the response.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// Bearer tokens accepted on the entry routes.
///
/// Built from `AppConfig::api_keys`; config loading already refuses an
/// empty key list outside development.
#[derive(Debug, Clone)]
pub struct AuthState {
    api_keys: Arc<HashSet<String>>,
}

impl AuthState {
    #[must_use]
    pub fn new(api_keys: &[String]) -> Self {
        if api_keys.is_empty() {
            tracing::warn!("no API keys configured; entry routes are open");
        }
        Self {
            api_keys: Arc::new(api_keys.iter().cloned().collect()),
        }
    }

    #[must_use]
    pub fn enabled(&self) -> bool {
        !self.api_keys.is_empty()
    }

    fn allows(&self, token: &str) -> bool {
        self.api_keys.contains(token)
    }
}

/// Tags every request with an ID, taken from `x-request-id` when the caller
/// sent one.
pub async fn request_id(mut req: Request, next: Next) -> Response {
    let id = req
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map_or_else(|| Uuid::new_v4().to_string(), ToOwned::to_owned);

    req.extensions_mut().insert(RequestId(id.clone()));
    let mut res = next.run(req).await;

    if let Ok(val) = HeaderValue::from_str(&id) {
        res.headers_mut().insert(REQUEST_ID_HEADER, val);
    }
    res
}

/// Rejects entry requests without a known bearer token, using the same
/// error envelope as the handlers.
pub async fn require_bearer_auth(
    State(auth): State<AuthState>,
    req: Request,
    next: Next,
) -> Response {
    if !auth.enabled() {
        return next.run(req).await;
    }

    let authorized = bearer_token(req.headers().get(AUTHORIZATION)).is_some_and(|t| auth.allows(t));
    if authorized {
        return next.run(req).await;
    }

    let request_id = req
        .extensions()
        .get::<RequestId>()
        .map(|id| id.0.clone())
        .unwrap_or_default();
    tracing::debug!(%request_id, path = %req.uri().path(), "rejected request without valid token");
    ApiError::new(request_id, "unauthorized", "missing or invalid bearer token").into_response()
}

fn bearer_token(value: Option<&HeaderValue>) -> Option<&str> {
    value
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|s| !s.is_empty())
}
