use chrono::{DateTime, Utc};
use pollenpal_client::{Advice, CurrentConditions, CurrentDay};
use pollenpal_core::EndpointConfig;
use serde::Serialize;

/// Result of one successful refresh cycle.
///
/// Never mutated after construction; the coordinator publishes a fresh
/// value each cycle and readers hold it behind an `Arc`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub current: CurrentConditions,
    pub advice: Advice,
    /// Location name reported by the API, or the configured identifier.
    pub location: String,
    /// Coordinates reported by the API, or an empty object.
    pub coordinates: serde_json::Value,
    pub fetched_at: DateTime<Utc>,
}

impl Snapshot {
    /// Combines the two resources fetched in one cycle.
    #[must_use]
    pub fn merge(endpoint: &EndpointConfig, current: CurrentConditions, advice: Advice) -> Self {
        let location = current
            .location
            .clone()
            .unwrap_or_else(|| endpoint.location().to_owned());
        let coordinates = current
            .coordinates
            .clone()
            .filter(|c| !c.is_null())
            .unwrap_or_else(|| serde_json::Value::Object(serde_json::Map::new()));

        Self {
            current,
            advice,
            location,
            coordinates,
            fetched_at: Utc::now(),
        }
    }

    #[must_use]
    pub fn current_day(&self) -> Option<&CurrentDay> {
        self.current.current_day.as_ref()
    }
}
