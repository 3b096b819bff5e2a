//! Refresh coordinator and sensor views for PollenPal entries.

mod coordinator;
mod snapshot;
mod views;

pub use coordinator::{
    CoordinatorState, CycleOutcome, Phase, RefreshCoordinator, RefreshHandle,
    DEFAULT_SCAN_INTERVAL,
};
pub use snapshot::Snapshot;
pub use views::{
    project_attributes, project_value, sensor_views, Attributes, SensorRead, SensorReading,
    SensorValue, SensorView,
};
