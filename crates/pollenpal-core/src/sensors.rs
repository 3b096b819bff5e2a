//! Catalogue of the sensors published for every configured location.

use serde::{Deserialize, Serialize};

/// Pollen category reported by the `current_day` payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PollenCategory {
    Grass,
    Trees,
    Weeds,
}

impl PollenCategory {
    pub const ALL: [PollenCategory; 3] = [Self::Grass, Self::Trees, Self::Weeds];

    /// Key used in the API payload and as an attribute prefix.
    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            Self::Grass => "grass",
            Self::Trees => "trees",
            Self::Weeds => "weeds",
        }
    }

    #[must_use]
    pub fn icon(self) -> &'static str {
        match self {
            Self::Grass => "mdi:grass",
            Self::Trees => "mdi:tree",
            Self::Weeds => "mdi:flower",
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Grass => "Grass",
            Self::Trees => "Tree",
            Self::Weeds => "Weed",
        }
    }
}

impl std::fmt::Display for PollenCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// One of the seven read-only values exposed per location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SensorKind {
    Level(PollenCategory),
    Count(PollenCategory),
    AlertLevel,
}

impl SensorKind {
    pub const ALL: [SensorKind; 7] = [
        Self::Level(PollenCategory::Grass),
        Self::Count(PollenCategory::Grass),
        Self::Level(PollenCategory::Trees),
        Self::Count(PollenCategory::Trees),
        Self::Level(PollenCategory::Weeds),
        Self::Count(PollenCategory::Weeds),
        Self::AlertLevel,
    ];

    /// Stable key, e.g. `grass_level` or `alert_level`.
    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            Self::Level(PollenCategory::Grass) => "grass_level",
            Self::Count(PollenCategory::Grass) => "grass_count",
            Self::Level(PollenCategory::Trees) => "trees_level",
            Self::Count(PollenCategory::Trees) => "trees_count",
            Self::Level(PollenCategory::Weeds) => "weeds_level",
            Self::Count(PollenCategory::Weeds) => "weeds_count",
            Self::AlertLevel => "alert_level",
        }
    }

    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.key() == key)
    }

    /// Human-readable name, e.g. `Tree Pollen Count`.
    #[must_use]
    pub fn name(self) -> String {
        match self {
            Self::Level(category) => format!("{} Pollen Level", category.label()),
            Self::Count(category) => format!("{} Pollen Count", category.label()),
            Self::AlertLevel => "Pollen Alert Level".to_string(),
        }
    }

    #[must_use]
    pub fn icon(self) -> &'static str {
        match self {
            Self::Level(category) | Self::Count(category) => category.icon(),
            Self::AlertLevel => "mdi:alert-circle",
        }
    }

    /// None of the sensors carry a unit; counts are reported as the API sends them.
    #[must_use]
    pub fn unit(self) -> Option<&'static str> {
        None
    }

    #[must_use]
    pub fn category(self) -> Option<PollenCategory> {
        match self {
            Self::Level(category) | Self::Count(category) => Some(category),
            Self::AlertLevel => None,
        }
    }
}

impl std::fmt::Display for SensorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}
