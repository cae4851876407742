//! Reservation status lifecycle and its static registry.
//!
//! Every status-dependent decision (badge styling, which transitions are
//! allowed, the label of the contextual action button, urgency ordering) is
//! answered by [`ReservationStatus::info`]. Nothing else in the engine hardcodes
//! status rules.

use core::str::FromStr;

use lodge_core::{DomainError, DomainResult};
use serde::{Deserialize, Serialize};

/// Reservation status lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReservationStatus {
    Pending,
    Confirmed,
    CheckedIn,
    CheckedOut,
    Cancelled,
    #[serde(rename = "noshow", alias = "no_show")]
    NoShow,
}

/// The contextual primary action offered for a status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrimaryAction {
    pub label: &'static str,
    pub target: ReservationStatus,
}

/// Static registry entry for one status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusInfo {
    pub status: ReservationStatus,
    pub label: &'static str,
    /// CSS utility classes for the status badge.
    pub badge_classes: &'static str,
    /// Permitted next statuses. Empty for terminal statuses.
    pub next: &'static [ReservationStatus],
    pub primary_action: Option<PrimaryAction>,
    /// Lower sorts first when ordering by urgency.
    pub sort_priority: u8,
}

use ReservationStatus::*;

static REGISTRY: [StatusInfo; 6] = [
    StatusInfo {
        status: Pending,
        label: "Pending",
        badge_classes: "bg-yellow-100 text-yellow-800",
        next: &[Confirmed, Cancelled],
        primary_action: Some(PrimaryAction {
            label: "Confirm",
            target: Confirmed,
        }),
        sort_priority: 1,
    },
    StatusInfo {
        status: Confirmed,
        label: "Confirmed",
        badge_classes: "bg-blue-100 text-blue-800",
        next: &[CheckedIn, Cancelled, NoShow],
        primary_action: Some(PrimaryAction {
            label: "Check In",
            target: CheckedIn,
        }),
        sort_priority: 2,
    },
    StatusInfo {
        status: CheckedIn,
        label: "Checked In",
        badge_classes: "bg-green-100 text-green-800",
        next: &[CheckedOut, NoShow],
        primary_action: Some(PrimaryAction {
            label: "Check Out",
            target: CheckedOut,
        }),
        sort_priority: 3,
    },
    StatusInfo {
        status: CheckedOut,
        label: "Checked Out",
        badge_classes: "bg-gray-100 text-gray-800",
        next: &[],
        primary_action: None,
        sort_priority: 4,
    },
    StatusInfo {
        status: Cancelled,
        label: "Cancelled",
        badge_classes: "bg-red-100 text-red-800",
        next: &[],
        primary_action: None,
        sort_priority: 5,
    },
    StatusInfo {
        status: NoShow,
        label: "No Show",
        badge_classes: "bg-orange-100 text-orange-800",
        next: &[],
        primary_action: None,
        sort_priority: 6,
    },
];

impl ReservationStatus {
    pub const ALL: [ReservationStatus; 6] =
        [Pending, Confirmed, CheckedIn, CheckedOut, Cancelled, NoShow];

    pub fn info(self) -> &'static StatusInfo {
        let idx = match self {
            Pending => 0,
            Confirmed => 1,
            CheckedIn => 2,
            CheckedOut => 3,
            Cancelled => 4,
            NoShow => 5,
        };
        &REGISTRY[idx]
    }

    /// Wire representation (`"checked_in"`, `"noshow"`, ...).
    pub fn as_str(self) -> &'static str {
        match self {
            Pending => "pending",
            Confirmed => "confirmed",
            CheckedIn => "checked_in",
            CheckedOut => "checked_out",
            Cancelled => "cancelled",
            NoShow => "noshow",
        }
    }

    pub fn label(self) -> &'static str {
        self.info().label
    }

    pub fn transitions(self) -> &'static [ReservationStatus] {
        self.info().next
    }

    pub fn is_terminal(self) -> bool {
        self.transitions().is_empty()
    }

    pub fn can_transition_to(self, target: ReservationStatus) -> bool {
        self.transitions().contains(&target)
    }

    pub fn primary_action(self) -> Option<PrimaryAction> {
        self.info().primary_action
    }

    pub fn sort_priority(self) -> u8 {
        self.info().sort_priority
    }

    /// Case-insensitive parse; accepts `no_show`/`no-show` for `noshow`.
    pub fn parse(s: &str) -> Option<ReservationStatus> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        match normalized.as_str() {
            "pending" => Some(Pending),
            "confirmed" => Some(Confirmed),
            "checked_in" => Some(CheckedIn),
            "checked_out" => Some(CheckedOut),
            "cancelled" | "canceled" => Some(Cancelled),
            "noshow" | "no_show" => Some(NoShow),
            _ => None,
        }
    }
}

impl FromStr for ReservationStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
            .ok_or_else(|| DomainError::validation(format!("unknown reservation status: {s:?}")))
    }
}

impl core::fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reject `from -> to` unless the registry declares that edge.
pub fn ensure_transition(from: ReservationStatus, to: ReservationStatus) -> DomainResult<()> {
    if from.can_transition_to(to) {
        return Ok(());
    }
    if from.is_terminal() {
        return Err(DomainError::invariant(format!(
            "reservation is {from}; no further status changes are allowed"
        )));
    }
    Err(DomainError::invariant(format!("cannot change status from {from} to {to}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ReservationStatus::*;

    #[test]
    fn registry_entries_are_indexed_by_their_status() {
        for status in ReservationStatus::ALL {
            assert_eq!(status.info().status, status);
        }
    }

    #[test]
    fn declared_edges_match_lifecycle() {
        assert_eq!(Pending.transitions(), &[Confirmed, Cancelled]);
        assert_eq!(Confirmed.transitions(), &[CheckedIn, Cancelled, NoShow]);
        assert_eq!(CheckedIn.transitions(), &[CheckedOut, NoShow]);
        assert!(CheckedOut.is_terminal());
        assert!(Cancelled.is_terminal());
        assert!(NoShow.is_terminal());
    }

    #[test]
    fn primary_action_targets_first_edge() {
        for status in ReservationStatus::ALL {
            match status.primary_action() {
                Some(action) => assert_eq!(Some(&action.target), status.transitions().first()),
                None => assert!(status.is_terminal()),
            }
        }
        assert_eq!(Confirmed.primary_action().unwrap().label, "Check In");
    }

    #[test]
    fn terminal_statuses_reject_everything() {
        for from in [CheckedOut, Cancelled] {
            for to in ReservationStatus::ALL {
                let err = ensure_transition(from, to).unwrap_err();
                assert!(matches!(err, DomainError::InvariantViolation(_)));
            }
        }
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!(ReservationStatus::parse("Checked_In"), Some(CheckedIn));
        assert_eq!(ReservationStatus::parse(" NOSHOW "), Some(NoShow));
        assert_eq!(ReservationStatus::parse("no-show"), Some(NoShow));
        assert_eq!(ReservationStatus::parse("archived"), None);
        assert!("archived".parse::<ReservationStatus>().is_err());
    }

    #[test]
    fn serde_uses_wire_names() {
        let json = serde_json::to_string(&NoShow).unwrap();
        assert_eq!(json, "\"noshow\"");
        let parsed: ReservationStatus = serde_json::from_str("\"checked_out\"").unwrap();
        assert_eq!(parsed, CheckedOut);
    }

    #[test]
    fn sort_priority_is_strictly_increasing_along_lifecycle() {
        let priorities: Vec<u8> =
            ReservationStatus::ALL.iter().map(|s| s.sort_priority()).collect();
        assert!(priorities.windows(2).all(|w| w[0] < w[1]));
    }

    mod proptest_tests {
        use crate::status::{ReservationStatus, ensure_transition};
        use proptest::prelude::*;

        fn any_status() -> impl Strategy<Value = ReservationStatus> {
            prop::sample::select(ReservationStatus::ALL.to_vec())
        }

        proptest! {
            /// Property: a transition is permitted iff the registry lists the edge.
            #[test]
            fn transition_closure(from in any_status(), to in any_status()) {
                let permitted = ensure_transition(from, to).is_ok();
                prop_assert_eq!(permitted, from.transitions().contains(&to));
            }

            /// Property: parse(as_str(s)) == s.
            #[test]
            fn wire_name_parses_back(status in any_status()) {
                prop_assert_eq!(ReservationStatus::parse(status.as_str()), Some(status));
            }
        }
    }
}
