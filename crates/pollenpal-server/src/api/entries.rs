use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use pollenpal_sensors::{CycleOutcome, Phase};
use serde::{Deserialize, Serialize};

use super::{resolve_entry, ApiError, ApiResponse, AppState, ResponseMeta};
use crate::middleware::RequestId;
use crate::registry::{Entry, FlowError};

#[derive(Debug, Deserialize)]
pub(super) struct CreateEntryRequest {
    /// Falls back to the configured default when absent.
    #[serde(default)]
    api_url: Option<String>,
    location: String,
}

#[derive(Debug, Serialize)]
pub(super) struct EntryItem {
    entry_id: String,
    unique_id: String,
    title: String,
    api_url: String,
    location: String,
    created_at: DateTime<Utc>,
    scan_interval_secs: u64,
    running: bool,
    phase: Phase,
    last_update_success: bool,
    last_outcome: Option<CycleOutcome>,
    last_error: Option<String>,
    last_attempt_at: Option<DateTime<Utc>>,
    last_fetched_at: Option<DateTime<Utc>>,
}

impl From<&Entry> for EntryItem {
    fn from(entry: &Entry) -> Self {
        let state = entry.coordinator.state();
        let endpoint = entry.endpoint();
        Self {
            entry_id: entry.id.clone(),
            unique_id: endpoint.unique_id(),
            title: entry.title.clone(),
            api_url: endpoint.api_url().to_owned(),
            location: endpoint.location().to_owned(),
            created_at: entry.created_at,
            scan_interval_secs: entry.coordinator.interval().as_secs(),
            running: entry.is_running(),
            phase: state.phase,
            last_update_success: state.last_update_success(),
            last_outcome: state.last_outcome,
            last_error: state.last_error.clone(),
            last_attempt_at: state.last_attempt_at,
            last_fetched_at: state.snapshot.as_ref().map(|s| s.fetched_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct RefreshAccepted {
    entry_id: String,
    queued: bool,
}

pub(super) async fn list_entries(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    let data: Vec<EntryItem> = state
        .registry
        .list()
        .await
        .iter()
        .map(|e| EntryItem::from(e.as_ref()))
        .collect();

    Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    })
}

pub(super) async fn get_entry(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(entry_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let entry = resolve_entry(&state, &entry_id, &req_id.0).await?;
    Ok(Json(ApiResponse {
        data: EntryItem::from(entry.as_ref()),
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn create_entry(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<CreateEntryRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let entry = state
        .registry
        .configure(body.api_url.as_deref(), &body.location)
        .await
        .map_err(|e| flow_error(&req_id.0, &e))?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse {
            data: EntryItem::from(entry.as_ref()),
            meta: ResponseMeta::new(req_id.0),
        }),
    ))
}

pub(super) async fn delete_entry(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(entry_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if state.registry.remove(&entry_id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::new(
            req_id.0,
            "not_found",
            format!("entry '{entry_id}' not found"),
        ))
    }
}

/// Queues an immediate refresh cycle. Does not wait for it to finish.
pub(super) async fn refresh_entry(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(entry_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let entry = resolve_entry(&state, &entry_id, &req_id.0).await?;
    entry.coordinator.request_refresh();

    Ok((
        StatusCode::ACCEPTED,
        Json(ApiResponse {
            data: RefreshAccepted {
                entry_id: entry.id.clone(),
                queued: true,
            },
            meta: ResponseMeta::new(req_id.0),
        }),
    ))
}

fn flow_error(request_id: &str, error: &FlowError) -> ApiError {
    match error {
        FlowError::InvalidInput { field, message } => ApiError::new(
            request_id,
            "validation_error",
            format!("{field}: {message}"),
        ),
        FlowError::Setup(setup) => {
            ApiError::form(request_id, setup.field(), setup.code(), setup.to_string())
        }
        FlowError::AlreadyConfigured { unique_id } => ApiError::new(
            request_id,
            "already_configured",
            format!("{unique_id} is already configured"),
        ),
        FlowError::Client(e) => {
            tracing::error!(error = %e, "unexpected error during entry setup");
            ApiError::form(request_id, "base", "unknown", "unexpected error")
        }
    }
}
