//! Submitted create-reservation form.

use chrono::NaiveDate;
use lodge_core::{DomainError, DomainResult, GuestId, RoomId};
use serde::{Deserialize, Serialize};

use crate::status::ReservationStatus;

/// Extra occupant listed on the booking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdditionalGuest {
    pub first_name: String,
    pub last_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Create request; serializes directly to the `POST /reservations` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationDraft {
    pub guest_id: GuestId,
    pub room_id: RoomId,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub adults: u32,
    pub children: u32,
    pub status: ReservationStatus,
    pub special_requests: String,
    pub additional_guests: Vec<AdditionalGuest>,
}

impl ReservationDraft {
    /// One adult, no children, `pending`.
    pub fn new(
        guest_id: GuestId,
        room_id: RoomId,
        check_in: NaiveDate,
        check_out: NaiveDate,
    ) -> Self {
        Self {
            guest_id,
            room_id,
            check_in,
            check_out,
            adults: 1,
            children: 0,
            status: ReservationStatus::Pending,
            special_requests: String::new(),
            additional_guests: Vec::new(),
        }
    }

    pub fn with_occupancy(mut self, adults: u32, children: u32) -> Self {
        self.adults = adults;
        self.children = children;
        self
    }

    pub fn with_status(mut self, status: ReservationStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_special_requests(mut self, requests: impl Into<String>) -> Self {
        self.special_requests = requests.into();
        self
    }

    pub fn with_additional_guest(mut self, guest: AdditionalGuest) -> Self {
        self.additional_guests.push(guest);
        self
    }

    /// Checked before any optimistic record is created.
    pub fn validate(&self) -> DomainResult<()> {
        if self.check_out <= self.check_in {
            return Err(DomainError::validation("check-out must be after check-in"));
        }
        if self.adults == 0 {
            return Err(DomainError::validation("at least one adult is required"));
        }
        if self.status.is_terminal() {
            return Err(DomainError::validation(format!(
                "a new reservation cannot start as {}",
                self.status
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 9, d).unwrap()
    }

    #[test]
    fn serializes_to_create_body() {
        let draft = ReservationDraft::new(GuestId::new(7), RoomId::new(3), date(1), date(3))
            .with_occupancy(2, 1)
            .with_special_requests("late arrival");

        let body = serde_json::to_value(&draft).unwrap();
        assert_eq!(
            body,
            json!({
                "guest_id": 7,
                "room_id": 3,
                "check_in": "2025-09-01",
                "check_out": "2025-09-03",
                "adults": 2,
                "children": 1,
                "status": "pending",
                "special_requests": "late arrival",
                "additional_guests": []
            })
        );
    }

    #[test]
    fn rejects_inverted_stay() {
        let draft = ReservationDraft::new(GuestId::new(1), RoomId::new(1), date(3), date(3));
        assert!(matches!(draft.validate(), Err(DomainError::Validation(_))));
    }

    #[test]
    fn rejects_zero_adults_and_terminal_status() {
        let base = ReservationDraft::new(GuestId::new(1), RoomId::new(1), date(1), date(2));
        assert!(base.clone().with_occupancy(0, 2).validate().is_err());
        assert!(base.clone().with_status(ReservationStatus::Cancelled).validate().is_err());
        assert!(base.with_status(ReservationStatus::Confirmed).validate().is_ok());
    }
}
