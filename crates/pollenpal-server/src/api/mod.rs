mod entries;
mod sensors;

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::{request_id, require_bearer_auth, AuthState, RequestId};
use crate::registry::EntryRegistry;

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<EntryRegistry>,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
    /// Per-field error codes for configuration-flow failures.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
    entries: usize,
    default_api_url: String,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
                fields: None,
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }

    /// A configuration-flow error reported against a single form field.
    pub fn form(
        request_id: impl Into<String>,
        field: &str,
        code: &str,
        message: impl Into<String>,
    ) -> Self {
        let mut error = Self::new(request_id, "form_error", message);
        error.error.fields = Some(BTreeMap::from([(field.to_owned(), code.to_owned())]));
        error
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "unauthorized" => StatusCode::UNAUTHORIZED,
            "bad_request" | "validation_error" | "form_error" => StatusCode::BAD_REQUEST,
            "already_configured" => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-request-id"),
        ])
}

fn protected_router(auth: AuthState) -> Router<AppState> {
    Router::new()
        .route(
            "/api/v1/entries",
            get(entries::list_entries).post(entries::create_entry),
        )
        .route(
            "/api/v1/entries/{entry_id}",
            get(entries::get_entry).delete(entries::delete_entry),
        )
        .route(
            "/api/v1/entries/{entry_id}/refresh",
            post(entries::refresh_entry),
        )
        .route(
            "/api/v1/entries/{entry_id}/sensors",
            get(sensors::list_sensors),
        )
        .route(
            "/api/v1/entries/{entry_id}/sensors/{sensor_key}",
            get(sensors::get_sensor),
        )
        .layer(axum::middleware::from_fn_with_state(
            auth,
            require_bearer_auth,
        ))
}

pub fn build_app(state: AppState, auth: AuthState) -> Router {
    let public_routes = Router::new().route("/api/v1/health", get(health));

    Router::new()
        .merge(public_routes)
        .merge(protected_router(auth))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn health(
    axum::extract::State(state): axum::extract::State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    let entries = state.registry.list().await.len();
    Json(ApiResponse {
        data: HealthData {
            status: "ok",
            entries,
            default_api_url: state.registry.default_api_url().to_owned(),
        },
        meta: ResponseMeta::new(req_id.0),
    })
}

/// Resolve an entry id, returning 404 if it is not configured.
pub(super) async fn resolve_entry(
    state: &AppState,
    entry_id: &str,
    request_id: &str,
) -> Result<Arc<crate::registry::Entry>, ApiError> {
    state.registry.get(entry_id).await.ok_or_else(|| {
        ApiError::new(
            request_id,
            "not_found",
            format!("entry '{entry_id}' not found"),
        )
    })
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn test_state() -> AppState {
        let http = pollenpal_client::build_http_client(5, "pollenpal-tests/0.1").expect("http client");
        AppState {
            registry: Arc::new(EntryRegistry::new(
                http,
                pollenpal_core::DEFAULT_API_URL,
                pollenpal_sensors::DEFAULT_SCAN_INTERVAL,
            )),
        }
    }

    fn test_app(state: AppState) -> Router {
        let auth = AuthState::new(&[]);
        build_app(state, auth)
    }

    async fn mock_pollen_api(location: &str) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("/pollen/{location}/current")))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "location": "London",
                "coordinates": { "lat": 51.5, "lng": -0.12 },
                "current_day": {
                    "day_name": "Monday",
                    "day_number": 1,
                    "grass": { "level": "High", "count": 120, "detail": "x" },
                    "trees": { "level": "Low", "count": 8, "detail": "Oak" },
                    "weeds": { "level": "Low", "count": 2, "detail": "Dock" }
                }
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(format!("/pollen/{location}/advice")))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "alert_level": "High",
                "advice": ["Keep windows closed"],
                "high_levels": ["grass"],
                "moderate_levels": []
            })))
            .mount(&server)
            .await;
        server
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = app.clone().oneshot(request).await.expect("response");
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        let json = if body.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&body).expect("json parse")
        };
        (status, json)
    }

    fn create_request(api_url: &str, location: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/v1/entries")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                serde_json::json!({ "api_url": api_url, "location": location }).to_string(),
            ))
            .expect("request")
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .body(Body::empty())
            .expect("request")
    }

    async fn wait_until_available(state: &AppState, entry_id: &str) {
        let entry = state.registry.get(entry_id).await.expect("entry exists");
        let mut rx = entry.coordinator.subscribe();
        tokio::time::timeout(Duration::from_secs(5), rx.wait_for(|s| s.last_update_success()))
            .await
            .expect("first refresh in time")
            .expect("channel open");
    }

    #[test]
    fn api_error_form_error_maps_to_bad_request() {
        let response = ApiError::form("req-1", "location", "invalid_location", "nope").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn api_error_already_configured_maps_to_conflict() {
        let response = ApiError::new("req-1", "already_configured", "dup").into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn health_reports_entry_count() {
        let app = test_app(test_state());
        let (status, json) = send(&app, get_request("/api/v1/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["status"], "ok");
        assert_eq!(json["data"]["entries"], 0);
        assert_eq!(json["data"]["default_api_url"], "http://localhost:3000");
    }

    #[tokio::test]
    async fn create_entry_then_read_sensors() {
        let server = mock_pollen_api("london").await;
        let state = test_state();
        let app = test_app(state.clone());

        let (status, json) = send(&app, create_request(&server.uri(), "london")).await;
        assert_eq!(status, StatusCode::CREATED, "body: {json}");
        assert_eq!(json["data"]["title"], "PollenPal - london");
        assert_eq!(json["data"]["running"], true);
        let entry_id = json["data"]["entry_id"].as_str().expect("entry id").to_owned();

        wait_until_available(&state, &entry_id).await;

        let (status, json) = send(
            &app,
            get_request(&format!("/api/v1/entries/{entry_id}/sensors")),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["device"]["name"], "PollenPal london");
        let sensors = json["data"]["sensors"].as_array().expect("sensors array");
        assert_eq!(sensors.len(), 7);

        let grass_level = sensors
            .iter()
            .find(|s| s["key"] == "grass_level")
            .expect("grass_level sensor");
        assert_eq!(grass_level["state"], "High");
        assert_eq!(grass_level["available"], true);
        assert_eq!(grass_level["attributes"]["grass_detail"], "x");
        assert_eq!(grass_level["unique_id"], format!("{entry_id}_grass_level"));
        assert_eq!(grass_level["name"], "PollenPal Grass Pollen Level");

        let (status, json) = send(
            &app,
            get_request(&format!("/api/v1/entries/{entry_id}/sensors/grass_count")),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["state"], 120);
    }

    #[tokio::test]
    async fn duplicate_entry_is_rejected() {
        let server = mock_pollen_api("london").await;
        let state = test_state();
        let app = test_app(state.clone());

        let (status, _) = send(&app, create_request(&server.uri(), "london")).await;
        assert_eq!(status, StatusCode::CREATED);

        let with_slash = format!("{}/", server.uri());
        let (status, json) = send(&app, create_request(&with_slash, "london")).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(json["error"]["code"], "already_configured");
        assert_eq!(state.registry.list().await.len(), 1);
    }

    #[tokio::test]
    async fn unknown_location_is_a_location_form_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/pollen/atlantis/current"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        let state = test_state();
        let app = test_app(state.clone());

        let (status, json) = send(&app, create_request(&server.uri(), "atlantis")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["fields"]["location"], "invalid_location");
        assert!(state.registry.list().await.is_empty());
    }

    #[tokio::test]
    async fn unreachable_api_is_a_base_form_error() {
        let state = test_state();
        let app = test_app(state);

        let (status, json) = send(&app, create_request("http://127.0.0.1:1", "london")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["fields"]["base"], "cannot_connect");
    }

    #[tokio::test]
    async fn blank_location_is_a_validation_error() {
        let app = test_app(test_state());
        let (status, json) = send(&app, create_request("http://127.0.0.1:1", "  ")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["code"], "validation_error");
    }

    #[tokio::test]
    async fn unknown_entry_returns_404() {
        let app = test_app(test_state());
        let (status, json) = send(&app, get_request("/api/v1/entries/missing/sensors")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"]["code"], "not_found");
    }

    #[tokio::test]
    async fn unknown_sensor_key_returns_404() {
        let server = mock_pollen_api("london").await;
        let state = test_state();
        let entry = state
            .registry
            .configure(Some(&server.uri()), "london")
            .await
            .expect("configured");
        let app = test_app(state);

        let (status, _) = send(
            &app,
            get_request(&format!("/api/v1/entries/{}/sensors/pollen_level", entry.id)),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn delete_entry_tears_it_down() {
        let server = mock_pollen_api("london").await;
        let state = test_state();
        let entry = state
            .registry
            .configure(Some(&server.uri()), "london")
            .await
            .expect("configured");
        let entry_id = entry.id.clone();
        drop(entry);
        let app = test_app(state.clone());

        let request = Request::builder()
            .method("DELETE")
            .uri(format!("/api/v1/entries/{entry_id}"))
            .body(Body::empty())
            .expect("request");
        let (status, _) = send(&app, request).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _) = send(&app, get_request(&format!("/api/v1/entries/{entry_id}"))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        // The same pair can be configured again once removed.
        let (status, _) = send(&app, create_request(&server.uri(), "london")).await;
        assert_eq!(status, StatusCode::CREATED);
    }

    #[tokio::test]
    async fn sensors_before_first_refresh_are_null() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/pollen/london/current"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "location": "London"
            })))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        let state = test_state();
        let entry = state
            .registry
            .configure(Some(&server.uri()), "london")
            .await
            .expect("configured");

        // Setup used the only successful response; the first cycle fails.
        let mut rx = entry.coordinator.subscribe();
        tokio::time::timeout(Duration::from_secs(5), rx.wait_for(|s| s.last_outcome.is_some()))
            .await
            .expect("first cycle in time")
            .expect("channel open");

        let app = test_app(state);
        let (status, json) = send(
            &app,
            get_request(&format!("/api/v1/entries/{}/sensors", entry.id)),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        for sensor in json["data"]["sensors"].as_array().expect("sensors") {
            assert_eq!(sensor["state"], serde_json::Value::Null, "{sensor}");
            assert_eq!(sensor["available"], false, "{sensor}");
        }
    }

    #[tokio::test]
    async fn protected_routes_require_token_when_enabled() {
        let auth = AuthState::new(&["secret".to_owned()]);
        let app = build_app(test_state(), auth);

        let (status, json) = send(&app, get_request("/api/v1/entries")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json["error"]["code"], "unauthorized");
        assert!(json["meta"]["request_id"]
            .as_str()
            .is_some_and(|id| !id.is_empty()));

        let request = Request::builder()
            .uri("/api/v1/entries")
            .header(header::AUTHORIZATION, "Bearer secret")
            .body(Body::empty())
            .expect("request");
        let (status, _) = send(&app, request).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = send(&app, get_request("/api/v1/health")).await;
        assert_eq!(status, StatusCode::OK);
    }
}
