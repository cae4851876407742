//! Staggered, retrying fetch of reservations, guests and rooms.
//!
//! Reservations come first and are published as soon as they arrive. Guests
//! and rooms follow after a short delay, concurrently; their failure leaves
//! the reservation list usable and is reported as a partial load. Primary
//! failures are retried on a fixed delay until the consecutive-failure
//! ceiling is reached, after which only [`ReservationEngine::retry`] fetches
//! again.

use std::sync::Arc;

use lodge_reservations::{normalize, normalize_guests, normalize_rooms};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::engine::ReservationEngine;
use crate::error::{ApiError, EngineResult};
use crate::schedule::ScheduledTask;
use crate::store::StoreAction;

const LOAD_FAILED: &str = "Failed to load reservations";

/// Observable load status.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum LoadState {
    #[default]
    Idle,
    Loading,
    /// The primary fetch failed; another attempt is scheduled.
    Retrying { attempt: u32 },
    Loaded,
    /// Reservations are usable but guests and/or rooms failed.
    PartiallyLoaded { message: String },
    /// The primary fetch failed and no automatic retry is pending.
    Failed { message: String },
}

/// What to do after a primary failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    Retry { attempt: u32 },
    GiveUp,
}

/// Load state machine plus the consecutive-failure counter.
#[derive(Debug, Clone, Default)]
pub struct LoadTracker {
    state: LoadState,
    consecutive_failures: u32,
    fetches: u64,
}

impl LoadTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&mut self) {
        self.fetches += 1;
        self.state = LoadState::Loading;
    }

    pub fn primary_succeeded(&mut self) {
        self.consecutive_failures = 0;
        self.state = LoadState::Loaded;
    }

    /// Records the failure and decides whether an automatic retry may follow:
    /// only while the failure count is still below `limit`.
    pub fn primary_failed(&mut self, message: impl Into<String>, limit: u32) -> RetryDecision {
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        if self.consecutive_failures < limit {
            self.state = LoadState::Retrying { attempt: self.consecutive_failures };
            RetryDecision::Retry { attempt: self.consecutive_failures }
        } else {
            self.state = LoadState::Failed { message: message.into() };
            RetryDecision::GiveUp
        }
    }

    pub fn secondary_failed(&mut self, message: impl Into<String>) {
        self.state = LoadState::PartiallyLoaded { message: message.into() };
    }

    /// A scheduled retry was dropped (superseded or shut down) before firing.
    pub fn retry_abandoned(&mut self, message: impl Into<String>) {
        if matches!(self.state, LoadState::Retrying { .. }) {
            self.state = LoadState::Failed { message: message.into() };
        }
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.state, LoadState::Loading | LoadState::Retrying { .. })
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    /// Primary fetches started so far.
    pub fn fetches(&self) -> u64 {
        self.fetches
    }
}

impl ReservationEngine {
    /// Fetch everything. Supersedes any in-flight load and any pending
    /// automatic retry; results of a superseded load are discarded.
    ///
    /// Returns the primary fetch error, if any. A secondary failure is not an
    /// error here; it shows up as [`LoadState::PartiallyLoaded`].
    pub async fn load_all(&self) -> EngineResult<()> {
        self.cancel_scheduled_retry();
        let generation = self.update(|s| {
            s.load_generation += 1;
            s.tracker.begin();
            s.load_generation
        })?;
        debug!("Starting reservation load (generation {})", generation);
        self.run_load(generation).await
    }

    /// Manual retry after the automatic retries gave up: exactly one more
    /// primary fetch. The failure counter only resets if it succeeds.
    pub async fn retry(&self) -> EngineResult<()> {
        info!(
            "Manual reload requested after {} consecutive failure(s)",
            self.consecutive_failures()
        );
        self.load_all().await
    }

    /// Full reload of the canonical collection; used to recover from a
    /// failed mutation. Changes of mutations still in flight are re-applied
    /// over the fresh records.
    pub async fn reload(&self) -> EngineResult<()> {
        self.load_all().await
    }

    async fn run_load(&self, generation: u64) -> EngineResult<()> {
        let api = Arc::clone(&self.inner.api);

        let raw = match api.list_reservations().await {
            Ok(raw) => raw,
            Err(e) => {
                self.primary_failed(generation, &e)?;
                return Err(e.into());
            }
        };

        let views = normalize(&raw);
        let count = views.len();
        let current = self.update(|s| {
            if s.load_generation != generation {
                return false;
            }
            s.store.apply(StoreAction::ReservationsLoaded(views));
            for action in s.journal.replay() {
                s.store.apply(action);
            }
            s.tracker.primary_succeeded();
            s.last_error = None;
            true
        })?;
        if !current {
            debug!(
                "Discarding reservations from superseded load (generation {})",
                generation
            );
            return Ok(());
        }
        info!("Loaded {} reservation(s)", count);

        tokio::time::sleep(self.inner.config.secondary_delay).await;

        let (guests, rooms) = tokio::join!(api.list_guests(), api.list_rooms());
        let mut failed = Vec::new();
        let guests = match guests {
            Ok(raw) => Some(normalize_guests(&raw)),
            Err(e) => {
                warn!("Failed to load guests: {}", e);
                failed.push("guests");
                None
            }
        };
        let rooms = match rooms {
            Ok(raw) => Some(normalize_rooms(&raw)),
            Err(e) => {
                warn!("Failed to load rooms: {}", e);
                failed.push("rooms");
                None
            }
        };

        self.update(|s| {
            if s.load_generation != generation {
                return;
            }
            s.store.apply(StoreAction::SecondaryLoaded { guests, rooms });
            if !failed.is_empty() {
                let message = format!(
                    "Reservations loaded, but {} could not be loaded",
                    failed.join(" and ")
                );
                s.tracker.secondary_failed(message.clone());
                s.last_error = Some(message);
            }
        })?;
        Ok(())
    }

    fn primary_failed(&self, generation: u64, error: &ApiError) -> EngineResult<()> {
        let limit = self.inner.config.retry_limit;
        let decision = self.update(|s| {
            if s.load_generation != generation {
                return None;
            }
            let message = error.user_message(LOAD_FAILED);
            s.last_error = Some(message.clone());
            let decision = s.tracker.primary_failed(message, limit);
            Some((decision, s.tracker.consecutive_failures()))
        })?;

        match decision {
            None => debug!("Ignoring failure of superseded load (generation {})", generation),
            Some((RetryDecision::Retry { attempt }, _)) => {
                warn!(
                    "Reservation load failed (attempt {}): {}; retrying in {:?}",
                    attempt, error, self.inner.config.retry_delay
                );
                self.schedule_retry();
            }
            Some((RetryDecision::GiveUp, failures)) => {
                warn!(
                    "Reservation load failed {} time(s) in a row: {}; waiting for manual retry",
                    failures, error
                );
            }
        }
        Ok(())
    }

    fn schedule_retry(&self) {
        let engine = Arc::downgrade(&self.inner);
        let task = ScheduledTask::after(self.inner.config.retry_delay, async move {
            let Some(inner) = engine.upgrade() else {
                return;
            };
            let engine = ReservationEngine { inner };
            if let Err(e) = engine.load_all().await {
                debug!("Automatic reservation reload failed: {}", e);
            }
        });
        if let Some(previous) = self.retry_slot().replace(task) {
            previous.cancel();
        }
    }

    /// Drop a pending automatic retry that has not fired yet.
    pub(crate) fn cancel_scheduled_retry(&self) {
        let Some(task) = self.retry_slot().take() else {
            return;
        };
        if task.has_fired() {
            return;
        }
        task.cancel();
        debug!("Cancelled pending reservation retry");
        let _ = self.update(|s| s.tracker.retry_abandoned(LOAD_FAILED));
    }

    pub fn load_state(&self) -> LoadState {
        self.read(|s| s.tracker.state().clone())
    }

    pub fn is_loading(&self) -> bool {
        self.read(|s| s.tracker.is_loading())
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.read(|s| s.tracker.consecutive_failures())
    }

    /// Whether an automatic retry is waiting to fire.
    pub fn retry_pending(&self) -> bool {
        self.retry_slot()
            .as_ref()
            .is_some_and(|task| !task.has_fired() && !task.is_cancelled())
    }
}
