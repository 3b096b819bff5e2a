use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Extension, Json,
};
use pollenpal_core::SensorKind;
use pollenpal_sensors::{sensor_views, Attributes, SensorRead, SensorValue, SensorView};
use serde::Serialize;

use super::{resolve_entry, ApiError, ApiResponse, AppState, ResponseMeta};
use crate::middleware::RequestId;
use crate::registry::Entry;

const MANUFACTURER: &str = "PollenPal";
const MODEL: &str = "Pollen Monitor";
const SW_VERSION: &str = "1.0";

#[derive(Debug, Serialize)]
pub(super) struct DeviceInfo {
    identifier: String,
    name: String,
    manufacturer: &'static str,
    model: &'static str,
    sw_version: &'static str,
}

impl DeviceInfo {
    fn for_entry(entry: &Entry) -> Self {
        Self {
            identifier: entry.id.clone(),
            name: format!("PollenPal {}", entry.endpoint().location()),
            manufacturer: MANUFACTURER,
            model: MODEL,
            sw_version: SW_VERSION,
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct SensorItem {
    key: &'static str,
    unique_id: String,
    name: String,
    icon: &'static str,
    unit: Option<&'static str>,
    available: bool,
    state: Option<SensorValue>,
    attributes: Attributes,
}

impl SensorItem {
    fn from_view(entry_id: &str, view: &SensorView) -> Self {
        let kind = view.kind();
        let reading = view.reading();
        Self {
            key: kind.key(),
            unique_id: format!("{entry_id}_{}", kind.key()),
            name: format!("PollenPal {}", kind.name()),
            icon: kind.icon(),
            unit: kind.unit(),
            available: reading.available,
            state: reading.value,
            attributes: reading.attributes,
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct EntrySensors {
    device: DeviceInfo,
    sensors: Vec<SensorItem>,
}

pub(super) async fn list_sensors(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(entry_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let entry = resolve_entry(&state, &entry_id, &req_id.0).await?;
    let sensors = sensor_views(&entry.coordinator)
        .iter()
        .map(|view| SensorItem::from_view(&entry.id, view))
        .collect();

    Ok(Json(ApiResponse {
        data: EntrySensors {
            device: DeviceInfo::for_entry(&entry),
            sensors,
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn get_sensor(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path((entry_id, sensor_key)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let entry = resolve_entry(&state, &entry_id, &req_id.0).await?;
    let Some(kind) = SensorKind::from_key(&sensor_key) else {
        return Err(ApiError::new(
            req_id.0,
            "not_found",
            format!("sensor '{sensor_key}' not found"),
        ));
    };

    let view = SensorView::new(kind, std::sync::Arc::clone(&entry.coordinator));
    Ok(Json(ApiResponse {
        data: SensorItem::from_view(&entry.id, &view),
        meta: ResponseMeta::new(req_id.0),
    }))
}
