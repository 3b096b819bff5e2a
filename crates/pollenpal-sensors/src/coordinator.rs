//! Scheduled refresh with a shared, swap-only snapshot.
//!
//! A [`RefreshCoordinator`] owns one endpoint. Each cycle fetches the
//! current-conditions resource (required) and the advice resource (best
//! effort), merges them into a [`Snapshot`], and publishes it through a
//! `tokio::sync::watch` channel. Readers only ever see a whole snapshot.
//!
//! Failures never leave the loop: a failed cycle keeps the previous snapshot,
//! marks the coordinator unavailable, and waits for the next tick.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use pollenpal_client::{PollenClient, PollenError};
use pollenpal_core::EndpointConfig;
use serde::Serialize;
use tokio::sync::{watch, Mutex, Notify};
use tokio::task::JoinHandle;

use crate::snapshot::Snapshot;

/// Default gap between the end of one cycle and the start of the next.
pub const DEFAULT_SCAN_INTERVAL: Duration = Duration::from_secs(3600);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    #[default]
    Idle,
    Refreshing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CycleOutcome {
    Success,
    Failed,
}

/// Everything subscribers can observe about a coordinator.
#[derive(Debug, Clone, Default)]
pub struct CoordinatorState {
    pub phase: Phase,
    pub snapshot: Option<Arc<Snapshot>>,
    pub last_outcome: Option<CycleOutcome>,
    pub last_error: Option<String>,
    pub last_attempt_at: Option<DateTime<Utc>>,
}

impl CoordinatorState {
    /// True only when the most recent cycle succeeded.
    #[must_use]
    pub fn last_update_success(&self) -> bool {
        self.last_outcome == Some(CycleOutcome::Success)
    }
}

pub struct RefreshCoordinator {
    endpoint: EndpointConfig,
    client: PollenClient,
    interval: Duration,
    state: watch::Sender<CoordinatorState>,
    trigger: Notify,
    // Held for the whole cycle so two refreshes never overlap.
    cycle: Mutex<()>,
}

impl std::fmt::Debug for RefreshCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshCoordinator")
            .field("endpoint", &self.endpoint)
            .field("interval", &self.interval)
            .field("state", &*self.state.borrow())
            .finish_non_exhaustive()
    }
}

impl RefreshCoordinator {
    #[must_use]
    pub fn new(endpoint: EndpointConfig, client: PollenClient, interval: Duration) -> Self {
        let (state, _) = watch::channel(CoordinatorState::default());
        Self {
            endpoint,
            client,
            interval,
            state,
            trigger: Notify::new(),
            cycle: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn endpoint(&self) -> &EndpointConfig {
        &self.endpoint
    }

    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Receiver notified after every state change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<CoordinatorState> {
        self.state.subscribe()
    }

    #[must_use]
    pub fn state(&self) -> CoordinatorState {
        self.state.borrow().clone()
    }

    #[must_use]
    pub fn snapshot(&self) -> Option<Arc<Snapshot>> {
        self.state.borrow().snapshot.clone()
    }

    #[must_use]
    pub fn last_update_success(&self) -> bool {
        self.state.borrow().last_update_success()
    }

    /// Asks the running loop to start a cycle now instead of waiting.
    pub fn request_refresh(&self) {
        self.trigger.notify_one();
    }

    /// Runs one cycle and publishes its outcome.
    ///
    /// Waits for any cycle already in flight to finish first.
    pub async fn refresh(&self) -> CycleOutcome {
        let _cycle = self.cycle.lock().await;
        self.state.send_modify(|s| s.phase = Phase::Refreshing);

        let result = self.fetch_snapshot().await;
        let attempted_at = Utc::now();

        match result {
            Ok(snapshot) => {
                tracing::debug!(
                    location = %self.endpoint.location(),
                    alert_level = %snapshot.advice.alert_level_or_unknown(),
                    "pollen refresh succeeded"
                );
                let snapshot = Arc::new(snapshot);
                self.state.send_modify(|s| {
                    s.phase = Phase::Idle;
                    s.snapshot = Some(snapshot);
                    s.last_outcome = Some(CycleOutcome::Success);
                    s.last_error = None;
                    s.last_attempt_at = Some(attempted_at);
                });
                CycleOutcome::Success
            }
            Err(e) => {
                tracing::warn!(
                    location = %self.endpoint.location(),
                    error = %e,
                    "error communicating with PollenPal API; keeping previous data"
                );
                let message = e.to_string();
                self.state.send_modify(|s| {
                    s.phase = Phase::Idle;
                    s.last_outcome = Some(CycleOutcome::Failed);
                    s.last_error = Some(message);
                    s.last_attempt_at = Some(attempted_at);
                });
                CycleOutcome::Failed
            }
        }
    }

    async fn fetch_snapshot(&self) -> Result<Snapshot, PollenError> {
        let current = self.client.fetch_current().await?;
        let advice = self.client.fetch_advice_or_default().await;
        Ok(Snapshot::merge(&self.endpoint, current, advice))
    }

    /// Refreshes forever: one cycle, then wait for the interval or a manual
    /// trigger, whichever comes first.
    pub async fn run(self: Arc<Self>) {
        tracing::info!(
            location = %self.endpoint.location(),
            interval_secs = self.interval.as_secs(),
            "pollen coordinator started"
        );
        loop {
            self.refresh().await;
            tokio::select! {
                () = tokio::time::sleep(self.interval) => {}
                () = self.trigger.notified() => {
                    tracing::debug!(location = %self.endpoint.location(), "manual refresh requested");
                }
            }
        }
    }

    /// Starts [`RefreshCoordinator::run`] on the runtime.
    ///
    /// The first cycle starts immediately. Dropping the returned handle
    /// cancels the schedule and abandons any in-flight request.
    #[must_use]
    pub fn spawn(self: &Arc<Self>) -> RefreshHandle {
        RefreshHandle {
            task: tokio::spawn(Arc::clone(self).run()),
        }
    }
}

/// Owns a running coordinator loop.
#[derive(Debug)]
pub struct RefreshHandle {
    task: JoinHandle<()>,
}

impl RefreshHandle {
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for RefreshHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}
