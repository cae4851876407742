//! Reservation list synchronization engine.
//!
//! The [`ReservationEngine`] owns the canonical reservation collection, keeps
//! it in sync with the backend through a [`ReservationApi`], applies
//! mutations optimistically and exposes the filtered view the UI renders.

pub mod api;
pub mod config;
pub mod controller;
pub mod engine;
pub mod error;
pub mod mutator;
pub mod orchestrator;
pub mod schedule;
pub mod store;

pub use api::{CreatedReservation, ReservationApi};
pub use api::http::HttpReservationApi;
pub use api::in_memory::{Endpoint, InMemoryReservationApi};
pub use config::{ClientConfig, ConfigError};
pub use controller::{ViewAction, ViewController, ViewMode};
pub use engine::ReservationEngine;
pub use error::{ApiError, ApiResult, EngineError, EngineResult};
pub use mutator::{MutationJournal, MutationKind, MutationPhase, PendingMutation, Recovery};
pub use orchestrator::{LoadState, LoadTracker, RetryDecision};
pub use schedule::ScheduledTask;
pub use store::{ReservationStore, StoreAction};
