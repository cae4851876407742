//! Reservation domain module for the reservation list engine.
//!
//! This crate contains the pure, deterministic part of the engine (no IO, no
//! HTTP, no timers):
//! - the status/transition registry
//! - formatting and stay calculations
//! - loosely-typed wire records and the total normalizer that turns them into
//!   view models
//! - the memoized filter engine, urgency sorting and summary statistics

pub mod draft;
pub mod filter;
pub mod format;
pub mod normalize;
pub mod status;
pub mod summary;
pub mod view;
pub mod wire;

pub use draft::{AdditionalGuest, ReservationDraft};
pub use filter::{
    FilterCriteria, FilterMemo, SortOrder, StatusFilter, filter_reservations, sort_by_urgency,
};
pub use normalize::{normalize, normalize_guests, normalize_one, normalize_rooms};
pub use status::{PrimaryAction, ReservationStatus, StatusInfo, ensure_transition};
pub use summary::ReservationSummary;
pub use view::{Guest, GuestSummary, ReservationView, Room, RoomSummary};
pub use wire::{RawGuest, RawReservation, RawRoom};
