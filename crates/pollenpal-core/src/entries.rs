use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;

use crate::{ConfigError, EndpointConfig};

/// One entry to configure at startup.
#[derive(Debug, Clone, Deserialize)]
pub struct EntrySeed {
    /// Falls back to the configured default base address when absent.
    #[serde(default)]
    pub api_url: Option<String>,
    pub location: String,
}

impl EntrySeed {
    /// Resolve the seed into an endpoint, filling in `default_api_url`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] if the resolved values are blank.
    pub fn endpoint(&self, default_api_url: &str) -> Result<EndpointConfig, ConfigError> {
        EndpointConfig::new(
            self.api_url.as_deref().unwrap_or(default_api_url),
            &self.location,
        )
    }
}

#[derive(Debug, Deserialize)]
pub struct EntriesFile {
    #[serde(default)]
    pub entries: Vec<EntrySeed>,
}

/// Load and validate the startup entries from a YAML file.
///
/// Duplicate base-address/location pairs are rejected here so that a bad seed
/// file fails loudly instead of being silently collapsed.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_entries(path: &Path, default_api_url: &str) -> Result<Vec<EndpointConfig>, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::EntriesFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let file: EntriesFile = serde_yaml::from_str(&content)?;
    validate_entries(&file, default_api_url)
}

fn validate_entries(
    file: &EntriesFile,
    default_api_url: &str,
) -> Result<Vec<EndpointConfig>, ConfigError> {
    let mut seen = HashSet::new();
    let mut endpoints = Vec::with_capacity(file.entries.len());

    for seed in &file.entries {
        let endpoint = seed.endpoint(default_api_url)?;
        if !seen.insert(endpoint.unique_id()) {
            return Err(ConfigError::Validation(format!(
                "duplicate entry: '{}'",
                endpoint.unique_id()
            )));
        }
        endpoints.push(endpoint);
    }

    Ok(endpoints)
}
