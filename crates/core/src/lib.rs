//! `lodge-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns)
//! shared by the reservation domain and the client engine.

pub mod entity;
pub mod error;
pub mod id;
pub mod value_object;

pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{GuestId, RecordKey, ReservationId, RoomId, TempId};
pub use value_object::{Money, ValueObject};
