use thiserror::Error;

/// Errors returned by the PollenPal API client.
#[derive(Debug, Error)]
pub enum PollenError {
    /// Network, TLS or timeout failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered 404 for the requested resource.
    #[error("resource not found: {url}")]
    NotFound { url: String },

    /// The API answered with any status other than 200 or 404.
    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// The response decoded but lacks a field the caller requires.
    #[error("response from {url} is missing the '{field}' field")]
    MissingField { field: &'static str, url: String },

    /// The configured base address cannot be turned into a request URL.
    #[error("invalid base URL '{api_url}': {reason}")]
    InvalidBaseUrl { api_url: String, reason: String },
}

impl PollenError {
    /// True when the request was abandoned because it ran past the timeout.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Http(e) if e.is_timeout())
    }
}
