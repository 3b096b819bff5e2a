use serde::Serialize;

use crate::ConfigError;

/// Base address used when the user does not supply one.
pub const DEFAULT_API_URL: &str = "http://localhost:3000";

/// Where a single entry fetches its pollen data from.
///
/// Immutable once built. The base address is stored without a trailing slash
/// so that `unique_id` is stable regardless of how the user typed it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct EndpointConfig {
    api_url: String,
    location: String,
}

impl EndpointConfig {
    /// Build an endpoint from raw user input.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] if either value is blank.
    pub fn new(api_url: &str, location: &str) -> Result<Self, ConfigError> {
        let api_url = api_url.trim().trim_end_matches('/');
        let location = location.trim();

        if api_url.is_empty() {
            return Err(ConfigError::Validation(
                "api_url must be non-empty".to_string(),
            ));
        }
        if location.is_empty() {
            return Err(ConfigError::Validation(
                "location must be non-empty".to_string(),
            ));
        }

        Ok(Self {
            api_url: api_url.to_owned(),
            location: location.to_owned(),
        })
    }

    #[must_use]
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    #[must_use]
    pub fn location(&self) -> &str {
        &self.location
    }

    /// Key used to reject a second entry for the same base address and location.
    #[must_use]
    pub fn unique_id(&self) -> String {
        format!("{}_{}", self.api_url, self.location)
    }

    /// Display title for the configured entry.
    #[must_use]
    pub fn title(&self) -> String {
        format!("PollenPal - {}", self.location)
    }
}
