//! Read-only projections of the latest snapshot.
//!
//! Views hold no data of their own. Every read goes back to the coordinator
//! for the current `Arc<Snapshot>`, so a view never blocks on a refresh and
//! never sees a half-written snapshot.

use std::sync::Arc;

use pollenpal_client::{Advice, PollenCount};
use pollenpal_core::{PollenCategory, SensorKind};
use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::coordinator::RefreshCoordinator;
use crate::snapshot::Snapshot;

pub type Attributes = Map<String, Value>;

/// State reported by a sensor.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SensorValue {
    Text(String),
    Count(PollenCount),
}

/// The interface host adapters translate into their own entity shape.
pub trait SensorRead {
    fn kind(&self) -> SensorKind;
    /// `None` when there is no snapshot yet or the field is missing.
    fn value(&self) -> Option<SensorValue>;
    /// Empty when there is no snapshot yet.
    fn attributes(&self) -> Attributes;
    /// Whether the most recent refresh cycle succeeded.
    fn is_available(&self) -> bool;
}

/// Value, attributes and availability taken from one coordinator state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorReading {
    pub value: Option<SensorValue>,
    pub attributes: Attributes,
    pub available: bool,
}

/// One of the seven sensors bound to a coordinator.
#[derive(Debug, Clone)]
pub struct SensorView {
    kind: SensorKind,
    coordinator: Arc<RefreshCoordinator>,
}

impl SensorView {
    #[must_use]
    pub fn new(kind: SensorKind, coordinator: Arc<RefreshCoordinator>) -> Self {
        Self { kind, coordinator }
    }

    /// Reads everything from a single state, so a cycle finishing
    /// mid-read cannot mix two snapshots into one result.
    #[must_use]
    pub fn reading(&self) -> SensorReading {
        let state = self.coordinator.state();
        let snapshot = state.snapshot.as_deref();
        SensorReading {
            value: project_value(self.kind, snapshot),
            attributes: project_attributes(self.kind, snapshot),
            available: state.last_update_success(),
        }
    }
}

impl SensorRead for SensorView {
    fn kind(&self) -> SensorKind {
        self.kind
    }

    fn value(&self) -> Option<SensorValue> {
        project_value(self.kind, self.coordinator.snapshot().as_deref())
    }

    fn attributes(&self) -> Attributes {
        project_attributes(self.kind, self.coordinator.snapshot().as_deref())
    }

    fn is_available(&self) -> bool {
        self.coordinator.last_update_success()
    }
}

/// All seven views for a coordinator, in catalogue order.
#[must_use]
pub fn sensor_views(coordinator: &Arc<RefreshCoordinator>) -> Vec<SensorView> {
    SensorKind::ALL
        .into_iter()
        .map(|kind| SensorView::new(kind, Arc::clone(coordinator)))
        .collect()
}

#[must_use]
pub fn project_value(kind: SensorKind, snapshot: Option<&Snapshot>) -> Option<SensorValue> {
    let snapshot = snapshot?;
    match kind {
        SensorKind::Level(category) => reading_field(snapshot, category, |r| {
            r.level.clone().map(SensorValue::Text)
        }),
        SensorKind::Count(category) => reading_field(snapshot, category, |r| {
            r.count.clone().map(SensorValue::Count)
        }),
        SensorKind::AlertLevel => Some(SensorValue::Text(
            snapshot.advice.alert_level_or_unknown().to_owned(),
        )),
    }
}

#[must_use]
pub fn project_attributes(kind: SensorKind, snapshot: Option<&Snapshot>) -> Attributes {
    let mut attrs = Map::new();
    let Some(snapshot) = snapshot else {
        return attrs;
    };

    let day = snapshot.current_day();
    attrs.insert("location".to_owned(), json!(snapshot.location));
    attrs.insert("coordinates".to_owned(), snapshot.coordinates.clone());
    attrs.insert("day_name".to_owned(), json!(day.and_then(|d| d.day_name.as_ref())));
    attrs.insert("day_number".to_owned(), json!(day.and_then(|d| d.day_number.as_ref())));

    match kind.category() {
        Some(category) => insert_category_attributes(&mut attrs, snapshot, category),
        None => insert_advice_attributes(&mut attrs, &snapshot.advice),
    }
    attrs
}

fn reading_field<F>(snapshot: &Snapshot, category: PollenCategory, pick: F) -> Option<SensorValue>
where
    F: FnOnce(&pollenpal_client::CategoryReading) -> Option<SensorValue>,
{
    snapshot
        .current_day()
        .and_then(|day| day.reading(category))
        .and_then(pick)
}

fn insert_category_attributes(attrs: &mut Attributes, snapshot: &Snapshot, category: PollenCategory) {
    let reading = snapshot.current_day().and_then(|d| d.reading(category));
    let prefix = category.key();
    attrs.insert(format!("{prefix}_level"), json!(reading.and_then(|r| r.level.as_ref())));
    attrs.insert(format!("{prefix}_count"), json!(reading.and_then(|r| r.count.as_ref())));
    attrs.insert(format!("{prefix}_detail"), json!(reading.and_then(|r| r.detail.as_ref())));
}

fn insert_advice_attributes(attrs: &mut Attributes, advice: &Advice) {
    attrs.insert("advice".to_owned(), json!(advice.advice));
    attrs.insert("high_levels".to_owned(), json!(advice.high_levels));
    attrs.insert("moderate_levels".to_owned(), json!(advice.moderate_levels));
}

#[cfg(test)]
mod tests {
    use pollenpal_client::{CategoryReading, CurrentConditions, CurrentDay};
    use pollenpal_core::EndpointConfig;

    use super::*;

    fn snapshot_with_grass() -> Snapshot {
        let current = CurrentConditions {
            location: Some("London".to_owned()),
            coordinates: None,
            current_day: Some(CurrentDay {
                day_name: Some("Monday".to_owned()),
                day_number: Some(json!(1)),
                grass: Some(CategoryReading {
                    level: Some("High".to_owned()),
                    count: Some(PollenCount::Number(120_u64.into())),
                    detail: Some(json!("x")),
                }),
                trees: None,
                weeds: None,
            }),
        };
        let endpoint = EndpointConfig::new("http://localhost:3000", "london").unwrap();
        Snapshot::merge(&endpoint, current, Advice::unavailable())
    }

    #[test]
    fn grass_level_and_count_project_from_snapshot() {
        let snapshot = snapshot_with_grass();
        assert_eq!(
            project_value(SensorKind::Level(PollenCategory::Grass), Some(&snapshot)),
            Some(SensorValue::Text("High".to_owned()))
        );
        assert_eq!(
            project_value(SensorKind::Count(PollenCategory::Grass), Some(&snapshot)),
            Some(SensorValue::Count(PollenCount::Number(120_u64.into())))
        );
    }

    #[test]
    fn grass_detail_only_on_grass_sensors() {
        let snapshot = snapshot_with_grass();
        let grass = project_attributes(SensorKind::Count(PollenCategory::Grass), Some(&snapshot));
        assert_eq!(grass.get("grass_detail"), Some(&json!("x")));

        let trees = project_attributes(SensorKind::Level(PollenCategory::Trees), Some(&snapshot));
        assert!(!trees.contains_key("grass_detail"));
        assert_eq!(trees.get("trees_detail"), Some(&Value::Null));

        let alert = project_attributes(SensorKind::AlertLevel, Some(&snapshot));
        assert!(!alert.contains_key("grass_detail"));
        assert_eq!(alert.get("advice"), Some(&json!([])));
    }

    #[test]
    fn common_attributes_are_present() {
        let snapshot = snapshot_with_grass();
        let attrs = project_attributes(SensorKind::Level(PollenCategory::Weeds), Some(&snapshot));
        assert_eq!(attrs.get("location"), Some(&json!("London")));
        assert_eq!(attrs.get("coordinates"), Some(&json!({})));
        assert_eq!(attrs.get("day_name"), Some(&json!("Monday")));
        assert_eq!(attrs.get("day_number"), Some(&json!(1)));
    }

    #[test]
    fn missing_category_yields_none_for_that_field_only() {
        let snapshot = snapshot_with_grass();
        assert_eq!(
            project_value(SensorKind::Level(PollenCategory::Weeds), Some(&snapshot)),
            None
        );
        assert!(project_value(SensorKind::Level(PollenCategory::Grass), Some(&snapshot)).is_some());
    }

    #[test]
    fn no_snapshot_yields_none_and_empty_attributes() {
        for kind in SensorKind::ALL {
            assert_eq!(project_value(kind, None), None, "{kind}");
            assert!(project_attributes(kind, None).is_empty(), "{kind}");
        }
    }

    #[test]
    fn alert_level_reads_unknown_without_advice_level() {
        let mut snapshot = snapshot_with_grass();
        snapshot.advice = Advice::default();
        assert_eq!(
            project_value(SensorKind::AlertLevel, Some(&snapshot)),
            Some(SensorValue::Text("unknown".to_owned()))
        );
    }

    #[test]
    fn sensor_value_serializes_as_plain_json() {
        assert_eq!(
            serde_json::to_value(SensorValue::Count(PollenCount::Number(7_u64.into()))).unwrap(),
            json!(7)
        );
        assert_eq!(
            serde_json::to_value(SensorValue::Text("Low".to_owned())).unwrap(),
            json!("Low")
        );
    }
}
