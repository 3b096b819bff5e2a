//! PollenPal API response types.
//!
//! Every field is optional and read leniently: the service only guarantees
//! presence of the top-level `location` on the current-conditions resource.
//! A missing field and a field of an unexpected JSON type both read as "no
//! value", so one odd field never costs the rest of the payload.

use pollenpal_core::PollenCategory;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Reads a field as `T`, or `None` when it holds some other shape.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| serde_json::from_value(v).ok()))
}

/// Reads a JSON array item by item; anything else reads as empty.
fn lenient_list<'de, D>(deserializer: D) -> Result<Vec<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Array(items)) => Ok(items),
        _ => Ok(Vec::new()),
    }
}

// ---------------------------------------------------------------------------
// GET /pollen/{location}/current
// ---------------------------------------------------------------------------

/// Body of the current-conditions resource.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
    #[serde(default, deserialize_with = "lenient")]
    pub location: Option<String>,
    /// Shape is owned by the API; passed through untouched.
    #[serde(default)]
    pub coordinates: Option<Value>,
    #[serde(default, deserialize_with = "lenient")]
    pub current_day: Option<CurrentDay>,
}

/// Readings for the current day.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CurrentDay {
    #[serde(default, deserialize_with = "lenient")]
    pub day_name: Option<String>,
    #[serde(default)]
    pub day_number: Option<Value>,
    #[serde(default, deserialize_with = "lenient")]
    pub grass: Option<CategoryReading>,
    #[serde(default, deserialize_with = "lenient")]
    pub trees: Option<CategoryReading>,
    #[serde(default, deserialize_with = "lenient")]
    pub weeds: Option<CategoryReading>,
}

impl CurrentDay {
    #[must_use]
    pub fn reading(&self, category: PollenCategory) -> Option<&CategoryReading> {
        match category {
            PollenCategory::Grass => self.grass.as_ref(),
            PollenCategory::Trees => self.trees.as_ref(),
            PollenCategory::Weeds => self.weeds.as_ref(),
        }
    }
}

/// Level, count and detail for one pollen category.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryReading {
    /// Label such as `Low`, `Moderate`, `High` or `Very High`.
    #[serde(default, deserialize_with = "lenient")]
    pub level: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub count: Option<PollenCount>,
    /// Usually a string, sometimes a list of species; passed through.
    #[serde(default)]
    pub detail: Option<Value>,
}

/// The API reports counts either as a number or as a label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PollenCount {
    Number(serde_json::Number),
    Label(String),
}

impl std::fmt::Display for PollenCount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Label(s) => f.write_str(s),
        }
    }
}

// ---------------------------------------------------------------------------
// GET /pollen/{location}/advice
// ---------------------------------------------------------------------------

/// Body of the advice resource.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Advice {
    #[serde(default, deserialize_with = "lenient")]
    pub alert_level: Option<String>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub advice: Vec<Value>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub high_levels: Vec<Value>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub moderate_levels: Vec<Value>,
}

impl Advice {
    pub const UNKNOWN_ALERT_LEVEL: &'static str = "unknown";

    /// Value substituted when the advice resource cannot be read.
    #[must_use]
    pub fn unavailable() -> Self {
        Self {
            alert_level: Some(Self::UNKNOWN_ALERT_LEVEL.to_owned()),
            ..Self::default()
        }
    }

    /// Alert level, or `unknown` when the payload omits it.
    #[must_use]
    pub fn alert_level_or_unknown(&self) -> &str {
        self.alert_level
            .as_deref()
            .unwrap_or(Self::UNKNOWN_ALERT_LEVEL)
    }
}
