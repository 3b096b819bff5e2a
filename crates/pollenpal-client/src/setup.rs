//! One-shot connectivity check run before an entry is accepted.

use pollenpal_core::EndpointConfig;
use reqwest::Client;
use thiserror::Error;

use crate::client::PollenClient;
use crate::error::PollenError;

/// Why a proposed entry was refused.
#[derive(Debug, Error)]
pub enum SetupError {
    /// Transport failure, non-200 status, or a body without `location`.
    #[error("cannot connect to the PollenPal API: {0}")]
    CannotConnect(#[source] PollenError),

    /// The API answered 404 for the location.
    #[error("location '{0}' is not known to the PollenPal API")]
    InvalidLocation(String),
}

impl SetupError {
    /// Form field the error is reported against.
    #[must_use]
    pub fn field(&self) -> &'static str {
        match self {
            Self::CannotConnect(_) => "base",
            Self::InvalidLocation(_) => "location",
        }
    }

    /// Stable error code shown to the user.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::CannotConnect(_) => "cannot_connect",
            Self::InvalidLocation(_) => "invalid_location",
        }
    }
}

/// Result of a successful check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetupInfo {
    pub title: String,
}

/// Checks that `endpoint` answers its current-conditions resource.
///
/// Performs a single GET bounded by the timeout configured on `client`.
/// Has no side effects beyond the request itself.
///
/// # Errors
///
/// - [`SetupError::InvalidLocation`] on HTTP 404.
/// - [`SetupError::CannotConnect`] for any other failure, including a JSON
///   body that lacks a top-level `location` field.
pub async fn validate_setup(
    client: &Client,
    endpoint: &EndpointConfig,
) -> Result<SetupInfo, SetupError> {
    let result = check_current(client, endpoint).await;

    match result {
        Ok(()) => Ok(SetupInfo {
            title: endpoint.title(),
        }),
        Err(PollenError::NotFound { .. }) => {
            tracing::warn!(location = %endpoint.location(), "PollenPal API does not know location");
            Err(SetupError::InvalidLocation(endpoint.location().to_owned()))
        }
        Err(e) => {
            tracing::error!(
                api_url = %endpoint.api_url(),
                location = %endpoint.location(),
                error = %e,
                "error connecting to PollenPal API"
            );
            Err(SetupError::CannotConnect(e))
        }
    }
}

async fn check_current(client: &Client, endpoint: &EndpointConfig) -> Result<(), PollenError> {
    let pollen = PollenClient::new(client.clone(), endpoint)?;
    let body = pollen.fetch_current_json().await?;

    if body.get("location").is_none() {
        return Err(PollenError::MissingField {
            field: "location",
            url: pollen.current_url().to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_map_to_form_fields() {
        let invalid = SetupError::InvalidLocation("atlantis".to_owned());
        assert_eq!(invalid.field(), "location");
        assert_eq!(invalid.code(), "invalid_location");

        let cannot = SetupError::CannotConnect(PollenError::UnexpectedStatus {
            status: 500,
            url: "http://localhost:3000/pollen/x/current".to_owned(),
        });
        assert_eq!(cannot.field(), "base");
        assert_eq!(cannot.code(), "cannot_connect");
    }

    #[tokio::test]
    async fn invalid_base_url_cannot_connect() {
        let client = Client::new();
        let endpoint = EndpointConfig::new("not a url", "london").unwrap();
        let err = validate_setup(&client, &endpoint).await.unwrap_err();
        assert!(
            matches!(err, SetupError::CannotConnect(PollenError::InvalidBaseUrl { .. })),
            "got: {err:?}"
        );
    }
}
