//! Process-scoped map of configured entries.
//!
//! Each entry owns one [`RefreshCoordinator`] and the handle of its running
//! loop. Removing an entry drops the handle, which cancels its schedule.
//! Nothing outside this module holds coordinators by anything but an `Arc`
//! handed out from here.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use pollenpal_client::{validate_setup, PollenClient, PollenError, SetupError};
use pollenpal_core::{ConfigError, EndpointConfig};
use pollenpal_sensors::{RefreshCoordinator, RefreshHandle};
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Why the configuration flow refused to create an entry.
#[derive(Debug, Error)]
pub enum FlowError {
    /// The user input is blank or otherwise unusable before any request.
    #[error("invalid input for {field}: {message}")]
    InvalidInput {
        field: &'static str,
        message: String,
    },

    /// The connectivity check failed.
    #[error(transparent)]
    Setup(#[from] SetupError),

    /// An entry with the same base address and location already exists.
    #[error("already configured: {unique_id}")]
    AlreadyConfigured { unique_id: String },

    /// The endpoint validated but a client could not be bound to it.
    #[error("could not create client: {0}")]
    Client(#[from] PollenError),
}

/// A configured location and its running coordinator.
#[derive(Debug)]
pub struct Entry {
    pub id: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub coordinator: Arc<RefreshCoordinator>,
    refresh: RefreshHandle,
}

impl Entry {
    #[must_use]
    pub fn endpoint(&self) -> &EndpointConfig {
        self.coordinator.endpoint()
    }

    #[must_use]
    pub fn unique_id(&self) -> String {
        self.endpoint().unique_id()
    }

    /// Whether the refresh loop is still scheduled.
    #[must_use]
    pub fn is_running(&self) -> bool {
        !self.refresh.is_finished()
    }
}

pub struct EntryRegistry {
    http: reqwest::Client,
    default_api_url: String,
    scan_interval: Duration,
    entries: RwLock<HashMap<String, Arc<Entry>>>,
}

impl EntryRegistry {
    /// `http` is shared by every coordinator, so all entries use one pool.
    #[must_use]
    pub fn new(http: reqwest::Client, default_api_url: &str, scan_interval: Duration) -> Self {
        Self {
            http,
            default_api_url: default_api_url.to_owned(),
            scan_interval,
            entries: RwLock::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn default_api_url(&self) -> &str {
        &self.default_api_url
    }

    /// Runs the configuration flow: validate input, check connectivity,
    /// reject duplicates, then create and start the entry.
    ///
    /// # Errors
    ///
    /// Returns [`FlowError`] describing which step refused the input.
    pub async fn configure(
        &self,
        api_url: Option<&str>,
        location: &str,
    ) -> Result<Arc<Entry>, FlowError> {
        let endpoint = EndpointConfig::new(api_url.unwrap_or(&self.default_api_url), location)
            .map_err(|e| invalid_input(api_url, location, e))?;

        self.ensure_not_configured(&endpoint).await?;
        let info = validate_setup(&self.http, &endpoint).await?;
        self.insert(endpoint, info.title).await
    }

    /// Adds an entry without a connectivity check, as done for entries
    /// restored at startup.
    ///
    /// # Errors
    ///
    /// Returns [`FlowError::AlreadyConfigured`] for a duplicate pair.
    pub async fn restore(&self, endpoint: EndpointConfig) -> Result<Arc<Entry>, FlowError> {
        let title = endpoint.title();
        self.insert(endpoint, title).await
    }

    async fn ensure_not_configured(&self, endpoint: &EndpointConfig) -> Result<(), FlowError> {
        let unique_id = endpoint.unique_id();
        let entries = self.entries.read().await;
        if entries.values().any(|e| e.unique_id() == unique_id) {
            return Err(FlowError::AlreadyConfigured { unique_id });
        }
        Ok(())
    }

    async fn insert(&self, endpoint: EndpointConfig, title: String) -> Result<Arc<Entry>, FlowError> {
        let unique_id = endpoint.unique_id();
        let client = PollenClient::new(self.http.clone(), &endpoint)?;

        // Re-checked under the write lock: two flows for the same pair may
        // both pass the early check while their connectivity checks run.
        let mut entries = self.entries.write().await;
        if entries.values().any(|e| e.unique_id() == unique_id) {
            return Err(FlowError::AlreadyConfigured { unique_id });
        }

        let coordinator = Arc::new(RefreshCoordinator::new(endpoint, client, self.scan_interval));
        let refresh = coordinator.spawn();
        let entry = Arc::new(Entry {
            id: Uuid::new_v4().to_string(),
            title,
            created_at: Utc::now(),
            coordinator,
            refresh,
        });
        entries.insert(entry.id.clone(), Arc::clone(&entry));

        tracing::info!(
            entry_id = %entry.id,
            unique_id = %unique_id,
            "entry configured"
        );
        Ok(entry)
    }

    pub async fn get(&self, entry_id: &str) -> Option<Arc<Entry>> {
        self.entries.read().await.get(entry_id).cloned()
    }

    /// All entries, oldest first.
    pub async fn list(&self) -> Vec<Arc<Entry>> {
        let mut entries: Vec<_> = self.entries.read().await.values().cloned().collect();
        entries.sort_by_key(|e| e.created_at);
        entries
    }

    /// Tears down an entry. Returns `false` if it did not exist.
    pub async fn remove(&self, entry_id: &str) -> bool {
        let removed = self.entries.write().await.remove(entry_id);
        match removed {
            Some(entry) => {
                tracing::info!(entry_id, unique_id = %entry.unique_id(), "entry removed");
                true
            }
            None => false,
        }
    }

    /// Tears down every entry.
    pub async fn clear(&self) {
        let count = {
            let mut entries = self.entries.write().await;
            let count = entries.len();
            entries.clear();
            count
        };
        tracing::info!(count, "all entries unloaded");
    }
}

fn invalid_input(api_url: Option<&str>, location: &str, error: ConfigError) -> FlowError {
    let field = if location.trim().is_empty() {
        "location"
    } else if api_url.is_some_and(|u| u.trim().trim_end_matches('/').is_empty()) {
        "api_url"
    } else {
        "base"
    };
    FlowError::InvalidInput {
        field,
        message: error.to_string(),
    }
}
