//! Shared configuration and catalogue types for the PollenPal workspace.

mod app_config;
mod config;
mod endpoint;
mod entries;
mod sensors;

use thiserror::Error;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use endpoint::{EndpointConfig, DEFAULT_API_URL};
pub use entries::{load_entries, EntriesFile, EntrySeed};
pub use sensors::{PollenCategory, SensorKind};

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read entries file {path}: {source}")]
    EntriesFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse entries file: {0}")]
    EntriesFileParse(#[from] serde_yaml::Error),

    #[error("validation error: {0}")]
    Validation(String),
}
