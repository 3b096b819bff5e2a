//! HTTP client for the PollenPal REST API.

mod client;
mod error;
mod setup;
mod types;

pub use client::{build_http_client, PollenClient, DEFAULT_TIMEOUT_SECS};
pub use error::PollenError;
pub use setup::{validate_setup, SetupError, SetupInfo};
pub use types::{Advice, CategoryReading, CurrentConditions, CurrentDay, PollenCount};
