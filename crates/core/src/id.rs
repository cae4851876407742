//! Strongly-typed identifiers used across the domain.

use core::str::FromStr;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

/// Server-assigned identifier of a reservation.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReservationId(i64);

/// Server-assigned identifier of a guest.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GuestId(i64);

/// Server-assigned identifier of a room.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(i64);

macro_rules! impl_numeric_newtype {
    ($t:ty, $name:literal) => {
        impl $t {
            pub const fn new(value: i64) -> Self {
                Self(value)
            }

            pub const fn get(&self) -> i64 {
                self.0
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<i64> for $t {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }

        impl From<$t> for i64 {
            fn from(value: $t) -> Self {
                value.0
            }
        }

        impl FromStr for $t {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let value = s
                    .trim()
                    .parse::<i64>()
                    .map_err(|e| DomainError::invalid_id(format!("{}: {}", $name, e)))?;
                Ok(Self(value))
            }
        }
    };
}

impl_numeric_newtype!(ReservationId, "ReservationId");
impl_numeric_newtype!(GuestId, "GuestId");
impl_numeric_newtype!(RoomId, "RoomId");

/// Synthetic identifier of a reservation the server has not acknowledged yet.
///
/// Lives in its own namespace (see [`RecordKey`]) so it can never collide
/// with a server id.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TempId(Uuid);

impl TempId {
    /// Create a new temporary identifier (UUIDv7, time-ordered).
    ///
    /// Prefer passing IDs explicitly in tests for determinism.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for TempId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for TempId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "temp-{}", self.0)
    }
}

/// Key of a record in the canonical reservation collection.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum RecordKey {
    /// Acknowledged by the server.
    Server(ReservationId),
    /// Optimistic placeholder awaiting the create response.
    Temp(TempId),
}

impl RecordKey {
    pub fn is_temp(&self) -> bool {
        matches!(self, RecordKey::Temp(_))
    }

    pub fn server_id(&self) -> Option<ReservationId> {
        match self {
            RecordKey::Server(id) => Some(*id),
            RecordKey::Temp(_) => None,
        }
    }
}

impl From<ReservationId> for RecordKey {
    fn from(value: ReservationId) -> Self {
        RecordKey::Server(value)
    }
}

impl From<TempId> for RecordKey {
    fn from(value: TempId) -> Self {
        RecordKey::Temp(value)
    }
}

impl core::fmt::Display for RecordKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            RecordKey::Server(id) => core::fmt::Display::fmt(id, f),
            RecordKey::Temp(id) => core::fmt::Display::fmt(id, f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reservation_id_parses_and_displays() {
        let id: ReservationId = " 42 ".parse().unwrap();
        assert_eq!(id.get(), 42);
        assert_eq!(id.to_string(), "42");
    }

    #[test]
    fn reservation_id_rejects_garbage() {
        let err = "abc".parse::<ReservationId>().unwrap_err();
        assert!(matches!(err, DomainError::InvalidId(msg) if msg.starts_with("ReservationId")));
    }

    #[test]
    fn temp_and_server_keys_never_compare_equal() {
        let temp = RecordKey::Temp(TempId::new());
        let server = RecordKey::Server(ReservationId::new(1));
        assert_ne!(temp, server);
        assert!(temp.is_temp());
        assert_eq!(server.server_id(), Some(ReservationId::new(1)));
        assert_eq!(temp.server_id(), None);
    }

    #[test]
    fn temp_ids_are_unique() {
        assert_ne!(TempId::new(), TempId::new());
    }

    #[test]
    fn record_key_serializes_tagged() {
        let json = serde_json::to_value(RecordKey::Server(ReservationId::new(7))).unwrap();
        assert_eq!(json, serde_json::json!({"kind": "server", "id": 7}));
    }
}
