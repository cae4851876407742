//! Engine facade: shared state, the live flag and the read surface the UI
//! binds to. Loading lives in `orchestrator`, mutations in `mutator`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::NaiveDate;
use lodge_core::RecordKey;
use lodge_reservations::{
    FilterCriteria, FilterMemo, Guest, ReservationSummary, ReservationView, Room, SortOrder,
    StatusFilter,
};
use tracing::info;

use crate::api::ReservationApi;
use crate::api::http::HttpReservationApi;
use crate::config::ClientConfig;
use crate::error::{ApiResult, EngineError, EngineResult};
use crate::mutator::MutationJournal;
use crate::orchestrator::LoadTracker;
use crate::schedule::ScheduledTask;
use crate::store::ReservationStore;

#[derive(Debug, Default)]
pub(crate) struct EngineState {
    pub(crate) store: ReservationStore,
    pub(crate) criteria: FilterCriteria,
    pub(crate) memo: FilterMemo,
    pub(crate) tracker: LoadTracker,
    pub(crate) journal: MutationJournal,
    pub(crate) last_error: Option<String>,
    /// Bumped by every load; results of older loads are dropped.
    pub(crate) load_generation: u64,
}

pub(crate) struct Inner {
    state: Mutex<EngineState>,
    live: AtomicBool,
    retry: Mutex<Option<ScheduledTask>>,
    pub(crate) api: Arc<dyn ReservationApi>,
    pub(crate) config: ClientConfig,
}

/// Handle to the reservation list engine. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct ReservationEngine {
    pub(crate) inner: Arc<Inner>,
}

impl std::fmt::Debug for ReservationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReservationEngine")
            .field("api_url", &self.inner.config.api_url)
            .field("live", &self.is_live())
            .finish_non_exhaustive()
    }
}

impl ReservationEngine {
    pub fn new(api: Arc<dyn ReservationApi>, config: ClientConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(EngineState::default()),
                live: AtomicBool::new(true),
                retry: Mutex::new(None),
                api,
                config,
            }),
        }
    }

    /// Engine talking HTTP to `config.api_url`.
    pub fn from_config(config: ClientConfig) -> ApiResult<Self> {
        let api = HttpReservationApi::new(&config)?;
        Ok(Self::new(Arc::new(api), config))
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    fn lock(&self) -> MutexGuard<'_, EngineState> {
        self.inner.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub(crate) fn retry_slot(&self) -> MutexGuard<'_, Option<ScheduledTask>> {
        self.inner.retry.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Run a state update unless the engine has been shut down.
    pub(crate) fn update<R>(&self, f: impl FnOnce(&mut EngineState) -> R) -> EngineResult<R> {
        if !self.is_live() {
            return Err(EngineError::Shutdown);
        }
        let mut state = self.lock();
        Ok(f(&mut state))
    }

    pub(crate) fn read<R>(&self, f: impl FnOnce(&EngineState) -> R) -> R {
        f(&self.lock())
    }

    pub fn is_live(&self) -> bool {
        self.inner.live.load(Ordering::SeqCst)
    }

    /// Stop accepting state updates and drop any scheduled retry. Requests
    /// already in flight complete but their results are discarded.
    pub fn shutdown(&self) {
        if self.inner.live.swap(false, Ordering::SeqCst) {
            if let Some(task) = self.retry_slot().take() {
                task.cancel();
            }
            info!("Reservation engine shut down");
        }
    }

    /// The filtered collection, in canonical order unless an urgency sort is
    /// selected. Recomputed only when the collection or the filter inputs
    /// changed.
    pub fn visible(&self) -> Arc<[ReservationView]> {
        let mut guard = self.lock();
        let EngineState { store, criteria, memo, .. } = &mut *guard;
        memo.get(store.revision(), store.reservations(), criteria)
    }

    /// How many times the visible set has actually been recomputed.
    pub fn filter_recomputations(&self) -> u64 {
        self.read(|s| s.memo.recomputations())
    }

    /// The full canonical collection.
    pub fn reservations(&self) -> Vec<ReservationView> {
        self.read(|s| s.store.reservations().to_vec())
    }

    pub fn reservation(&self, key: &RecordKey) -> Option<ReservationView> {
        self.read(|s| s.store.get(key).cloned())
    }

    pub fn guests(&self) -> Vec<Guest> {
        self.read(|s| s.store.guests().to_vec())
    }

    pub fn rooms(&self) -> Vec<Room> {
        self.read(|s| s.store.rooms().to_vec())
    }

    /// Revision of the canonical collection.
    pub fn revision(&self) -> u64 {
        self.read(|s| s.store.revision())
    }

    /// Counts and totals over the visible set.
    pub fn summary(&self, day: NaiveDate) -> ReservationSummary {
        ReservationSummary::from_views(&self.visible(), day)
    }

    pub fn error(&self) -> Option<String> {
        self.read(|s| s.last_error.clone())
    }

    pub fn dismiss_error(&self) -> EngineResult<()> {
        self.update(|s| s.last_error = None)
    }

    pub fn criteria(&self) -> FilterCriteria {
        self.read(|s| s.criteria.clone())
    }

    pub fn set_search_term(&self, term: impl Into<String>) -> EngineResult<()> {
        let term = term.into();
        self.update(|s| s.criteria.search_term = term)
    }

    pub fn set_status_filter(&self, status: StatusFilter) -> EngineResult<()> {
        self.update(|s| s.criteria.status = status)
    }

    pub fn set_date_filter(&self, date: Option<NaiveDate>) -> EngineResult<()> {
        self.update(|s| s.criteria.date = date)
    }

    pub fn set_sort_order(&self, order: SortOrder) -> EngineResult<()> {
        self.update(|s| s.criteria.order = order)
    }

    /// Resets the predicates and the order.
    pub fn clear_filters(&self) -> EngineResult<()> {
        self.update(|s| s.criteria = FilterCriteria::default())
    }
}
