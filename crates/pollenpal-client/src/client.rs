//! HTTP client for the PollenPal REST API.
//!
//! One [`PollenClient`] is bound to one endpoint (base address + location).
//! Clients built from the same `reqwest::Client` share its connection pool,
//! so every configured location can reuse a single pool.

use std::time::Duration;

use pollenpal_core::EndpointConfig;
use reqwest::{Client, StatusCode, Url};

use crate::error::PollenError;
use crate::types::{Advice, CurrentConditions};

/// Every request to the API is abandoned after this many seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Builds the shared `reqwest::Client` used for every PollenPal request.
///
/// `timeout_secs` bounds each request end to end; exceeding it surfaces as a
/// [`PollenError::Http`] timeout.
///
/// # Errors
///
/// Returns [`PollenError::Http`] if the underlying `reqwest::Client`
/// cannot be constructed.
pub fn build_http_client(timeout_secs: u64, user_agent: &str) -> Result<Client, PollenError> {
    let client = Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .connect_timeout(Duration::from_secs(timeout_secs.min(DEFAULT_TIMEOUT_SECS)))
        .user_agent(user_agent)
        .build()?;
    Ok(client)
}

/// Client for the two per-location PollenPal resources.
#[derive(Debug, Clone)]
pub struct PollenClient {
    client: Client,
    current_url: Url,
    advice_url: Url,
}

impl PollenClient {
    /// Binds `client` to the resources of `endpoint`.
    ///
    /// # Errors
    ///
    /// Returns [`PollenError::InvalidBaseUrl`] if the endpoint's base address
    /// is not an absolute `http(s)` URL.
    pub fn new(client: Client, endpoint: &EndpointConfig) -> Result<Self, PollenError> {
        Ok(Self {
            current_url: resource_url(endpoint, "current")?,
            advice_url: resource_url(endpoint, "advice")?,
            client,
        })
    }

    #[must_use]
    pub fn current_url(&self) -> &Url {
        &self.current_url
    }

    #[must_use]
    pub fn advice_url(&self) -> &Url {
        &self.advice_url
    }

    /// Fetches `/pollen/{location}/current` as raw JSON.
    ///
    /// # Errors
    ///
    /// - [`PollenError::NotFound`] on HTTP 404.
    /// - [`PollenError::UnexpectedStatus`] on any other non-200 status.
    /// - [`PollenError::Http`] on network failure or timeout.
    /// - [`PollenError::Deserialize`] if the body is not valid JSON.
    pub async fn fetch_current_json(&self) -> Result<serde_json::Value, PollenError> {
        self.request_json(&self.current_url).await
    }

    /// Fetches and decodes `/pollen/{location}/current`.
    ///
    /// # Errors
    ///
    /// Same as [`PollenClient::fetch_current_json`], plus
    /// [`PollenError::Deserialize`] if the top-level value cannot be read as
    /// [`CurrentConditions`], such as a bare string. Fields of an unexpected
    /// type read as absent rather than failing.
    pub async fn fetch_current(&self) -> Result<CurrentConditions, PollenError> {
        let body = self.fetch_current_json().await?;
        serde_json::from_value(body).map_err(|e| PollenError::Deserialize {
            context: self.current_url.to_string(),
            source: e,
        })
    }

    /// Fetches and decodes `/pollen/{location}/advice`.
    ///
    /// Callers treat this resource as best effort; see
    /// [`PollenClient::fetch_advice_or_default`].
    ///
    /// # Errors
    ///
    /// Same classes as [`PollenClient::fetch_current`].
    pub async fn fetch_advice(&self) -> Result<Advice, PollenError> {
        let body = self.request_json(&self.advice_url).await?;
        serde_json::from_value(body).map_err(|e| PollenError::Deserialize {
            context: self.advice_url.to_string(),
            source: e,
        })
    }

    /// Fetches advice, substituting [`Advice::unavailable`] on any failure.
    ///
    /// A bad status, a transport error and an undecodable body all degrade
    /// the same way.
    pub async fn fetch_advice_or_default(&self) -> Advice {
        match self.fetch_advice().await {
            Ok(advice) => advice,
            Err(e) => {
                tracing::warn!(
                    url = %self.advice_url,
                    error = %e,
                    "could not fetch advice data; using defaults"
                );
                Advice::unavailable()
            }
        }
    }

    /// Sends a GET request, requires HTTP 200, and parses the body as JSON.
    async fn request_json(&self, url: &Url) -> Result<serde_json::Value, PollenError> {
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            return Err(PollenError::NotFound {
                url: url.to_string(),
            });
        }
        if status != StatusCode::OK {
            return Err(PollenError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| PollenError::Deserialize {
            context: url.to_string(),
            source: e,
        })
    }
}

/// Builds `<base>/pollen/<location>/<resource>`.
///
/// The location is pushed as a single path segment, so characters such as
/// `/` or spaces are percent-encoded rather than changing the route.
fn resource_url(endpoint: &EndpointConfig, resource: &str) -> Result<Url, PollenError> {
    let invalid = |reason: String| PollenError::InvalidBaseUrl {
        api_url: endpoint.api_url().to_owned(),
        reason,
    };

    let mut url = Url::parse(endpoint.api_url()).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
    }

    url.path_segments_mut()
        .map_err(|()| invalid("URL cannot be a base".to_owned()))?
        .pop_if_empty()
        .extend(["pollen", endpoint.location(), resource]);
    Ok(url)
}
