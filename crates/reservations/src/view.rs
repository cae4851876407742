//! Flat, defaulted view models the rest of the engine works with.

use chrono::{DateTime, NaiveDate, Utc};
use lodge_core::{Entity, GuestId, Money, RecordKey, RoomId, TempId};
use serde::{Deserialize, Serialize};

use crate::draft::ReservationDraft;
use crate::format::{format_date_range, format_optional_date, nights_between_dates};
use crate::status::ReservationStatus;

/// Guest fields embedded in a reservation row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuestSummary {
    pub first_name: String,
    pub last_name: String,
    /// `first last`, trimmed.
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub country: String,
}

impl GuestSummary {
    pub fn display_name(first_name: &str, last_name: &str) -> String {
        format!("{} {}", first_name.trim(), last_name.trim()).trim().to_string()
    }
}

/// Room fields embedded in a reservation row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomSummary {
    pub room_number: String,
    pub room_type: String,
    pub price_per_night: Money,
    pub amenities: Vec<String>,
}

/// Reservation view model.
///
/// Only `total_amount` and `paid_amount` are stored; the balance is always
/// derived via [`ReservationView::balance`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationView {
    pub key: RecordKey,
    /// Human-readable code, e.g. `RES-00042`.
    pub code: String,
    pub guest_id: Option<GuestId>,
    pub room_id: Option<RoomId>,
    pub check_in: Option<NaiveDate>,
    pub check_out: Option<NaiveDate>,
    pub check_in_display: String,
    pub check_out_display: String,
    pub stay_display: String,
    pub nights: u32,
    pub adults: u32,
    pub children: u32,
    pub status: ReservationStatus,
    pub total_amount: Money,
    pub paid_amount: Money,
    pub special_requests: String,
    pub created_at: Option<DateTime<Utc>>,
    pub guest: GuestSummary,
    pub room: RoomSummary,
}

pub const TEMP_CODE: &str = "RES-NEW";

impl ReservationView {
    pub fn balance(&self) -> Money {
        self.total_amount - self.paid_amount
    }

    pub fn is_temp(&self) -> bool {
        self.key.is_temp()
    }

    /// Placeholder shown while the create request is in flight.
    ///
    /// Guest and room display data come from the already-loaded secondary
    /// collections when available; the total is estimated from the nightly
    /// rate.
    pub fn temporary(
        temp_id: TempId,
        draft: &ReservationDraft,
        guest: Option<&Guest>,
        room: Option<&Room>,
        created_at: DateTime<Utc>,
    ) -> Self {
        let nights = nights_between_dates(draft.check_in, draft.check_out);
        let room_summary = room.map(Room::summary).unwrap_or_default();
        let total_amount = Money::from_minor(
            room_summary
                .price_per_night
                .minor_units()
                .saturating_mul(i64::from(nights)),
        );

        Self {
            key: RecordKey::Temp(temp_id),
            code: TEMP_CODE.to_string(),
            guest_id: Some(draft.guest_id),
            room_id: Some(draft.room_id),
            check_in: Some(draft.check_in),
            check_out: Some(draft.check_out),
            check_in_display: format_optional_date(Some(draft.check_in)),
            check_out_display: format_optional_date(Some(draft.check_out)),
            stay_display: format_date_range(Some(draft.check_in), Some(draft.check_out)),
            nights,
            adults: draft.adults,
            children: draft.children,
            status: draft.status,
            total_amount,
            paid_amount: Money::ZERO,
            special_requests: draft.special_requests.clone(),
            created_at: Some(created_at),
            guest: guest.map(Guest::summary).unwrap_or_default(),
            room: room_summary,
        }
    }

    /// Lowercased text the search term is matched against.
    pub fn search_haystack(&self) -> String {
        [
            self.guest.name.as_str(),
            self.code.as_str(),
            self.room.room_number.as_str(),
            self.room.room_type.as_str(),
            self.guest.email.as_str(),
            self.guest.phone.as_str(),
        ]
        .join(" ")
        .to_lowercase()
    }

    /// Whether `date` falls within `[check_in, check_out]`.
    pub fn covers(&self, date: NaiveDate) -> bool {
        match (self.check_in, self.check_out) {
            (Some(start), Some(end)) => start <= date && date <= end,
            _ => false,
        }
    }
}

impl Entity for ReservationView {
    type Id = RecordKey;

    fn id(&self) -> &RecordKey {
        &self.key
    }
}

/// Guest from the secondary `GET /guests` collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Guest {
    pub id: GuestId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub country: String,
}

impl Guest {
    pub fn summary(&self) -> GuestSummary {
        GuestSummary {
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            name: GuestSummary::display_name(&self.first_name, &self.last_name),
            email: self.email.clone(),
            phone: self.phone.clone(),
            address: self.address.clone(),
            city: self.city.clone(),
            country: self.country.clone(),
        }
    }
}

impl Entity for Guest {
    type Id = GuestId;

    fn id(&self) -> &GuestId {
        &self.id
    }
}

/// Room from the secondary `GET /rooms` collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    pub id: RoomId,
    pub room_number: String,
    pub room_type: String,
    pub price_per_night: Money,
    pub amenities: Vec<String>,
}

impl Room {
    pub fn summary(&self) -> RoomSummary {
        RoomSummary {
            room_number: self.room_number.clone(),
            room_type: self.room_type.clone(),
            price_per_night: self.price_per_night,
            amenities: self.amenities.clone(),
        }
    }
}

impl Entity for Room {
    type Id = RoomId;

    fn id(&self) -> &RoomId {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn draft() -> ReservationDraft {
        ReservationDraft::new(GuestId::new(7), RoomId::new(3), date(2025, 9, 1), date(2025, 9, 3))
    }

    fn room() -> Room {
        Room {
            id: RoomId::new(3),
            room_number: "101".into(),
            room_type: "Deluxe".into(),
            price_per_night: Money::from_major(120.0),
            amenities: vec!["wifi".into()],
        }
    }

    fn guest() -> Guest {
        Guest {
            id: GuestId::new(7),
            first_name: "Jane".into(),
            last_name: "Smith".into(),
            email: "jane@example.com".into(),
            phone: "555-0100".into(),
            address: String::new(),
            city: String::new(),
            country: String::new(),
        }
    }

    #[test]
    fn temporary_record_uses_loaded_lookups() {
        let view = ReservationView::temporary(
            TempId::new(),
            &draft(),
            Some(&guest()),
            Some(&room()),
            Utc::now(),
        );

        assert!(view.is_temp());
        assert_eq!(view.nights, 2);
        assert_eq!(view.guest.name, "Jane Smith");
        assert_eq!(view.room.room_number, "101");
        assert_eq!(view.total_amount, Money::from_major(240.0));
        assert_eq!(view.balance(), Money::from_major(240.0));
        assert_eq!(view.status, ReservationStatus::Pending);
    }

    #[test]
    fn temporary_record_without_lookups_is_blank_but_valid() {
        let view = ReservationView::temporary(TempId::new(), &draft(), None, None, Utc::now());
        assert_eq!(view.guest, GuestSummary::default());
        assert_eq!(view.total_amount, Money::ZERO);
        assert_eq!(view.stay_display, "Sep 1 – Sep 3, 2025");
    }

    #[test]
    fn covers_is_inclusive() {
        let view = ReservationView::temporary(TempId::new(), &draft(), None, None, Utc::now());
        assert!(view.covers(date(2025, 9, 1)));
        assert!(view.covers(date(2025, 9, 3)));
        assert!(!view.covers(date(2025, 9, 4)));
    }

    #[test]
    fn display_name_trims_missing_parts() {
        assert_eq!(GuestSummary::display_name("Jane", ""), "Jane");
        assert_eq!(GuestSummary::display_name("", ""), "");
    }
}
