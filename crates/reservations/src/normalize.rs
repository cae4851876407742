//! Raw wire records -> view models.
//!
//! These are total functions: a malformed field degrades to an empty string,
//! zero or `None`, never to an error, so one bad record cannot keep the rest
//! of the collection from rendering.

use lodge_core::{GuestId, Money, RecordKey, ReservationId, RoomId};
use serde_json::Value;

use crate::format::{format_date_range, format_optional_date, nights_between};
use crate::status::ReservationStatus;
use crate::view::{Guest, GuestSummary, ReservationView, Room, RoomSummary};
use crate::wire::{
    RawGuest, RawReservation, RawRoom, RawRoomType, coerce_count, coerce_datetime, coerce_f64,
    coerce_i64, coerce_string, coerce_string_list, coerce_utc, first_present,
};

/// Width of the zero-padded numeric part of a reservation code.
const CODE_WIDTH: usize = 5;

pub fn reservation_code(id: ReservationId) -> String {
    format!("RES-{:0width$}", id.get(), width = CODE_WIDTH)
}

/// Normalize a fetched collection, preserving order.
pub fn normalize(raw: &[RawReservation]) -> Vec<ReservationView> {
    raw.iter().map(normalize_one).collect()
}

pub fn normalize_one(raw: &RawReservation) -> ReservationView {
    let id = ReservationId::new(
        coerce_i64(first_present(&[&raw.reservation_id, &raw.id])).unwrap_or(0),
    );

    let raw_guest = RawGuest::from_value(&raw.guest);
    let raw_room = RawRoom::from_value(&raw.room);

    let guest_id = coerce_i64(first_present(&[&raw.guest_id, &raw_guest.guest_id, &raw_guest.id]))
        .map(GuestId::new);
    let room_id = coerce_i64(first_present(&[&raw.room_id, &raw_room.room_id, &raw_room.id]))
        .map(RoomId::new);

    let check_in_at = coerce_datetime(&raw.check_in);
    let check_out_at = coerce_datetime(&raw.check_out);
    let check_in = check_in_at.map(|dt| dt.date());
    let check_out = check_out_at.map(|dt| dt.date());
    let nights = match (check_in_at, check_out_at) {
        (Some(start), Some(end)) => nights_between(start, end),
        _ => 1,
    };

    let status = raw
        .status
        .as_str()
        .and_then(ReservationStatus::parse)
        .unwrap_or(ReservationStatus::Pending);

    ReservationView {
        key: RecordKey::Server(id),
        code: reservation_code(id),
        guest_id,
        room_id,
        check_in,
        check_out,
        check_in_display: format_optional_date(check_in),
        check_out_display: format_optional_date(check_out),
        stay_display: format_date_range(check_in, check_out),
        nights,
        adults: coerce_count(&raw.adults),
        children: coerce_count(&raw.children),
        status,
        total_amount: Money::from_major(coerce_f64(&raw.total_amount)),
        paid_amount: Money::from_major(coerce_f64(&raw.paid_amount)),
        special_requests: coerce_string(&raw.special_requests),
        created_at: coerce_utc(&raw.created_at),
        guest: guest_summary(&raw_guest),
        room: room_summary(&raw_room),
    }
}

fn guest_summary(raw: &RawGuest) -> GuestSummary {
    let first_name = coerce_string(&raw.first_name);
    let last_name = coerce_string(&raw.last_name);
    GuestSummary {
        name: GuestSummary::display_name(&first_name, &last_name),
        first_name,
        last_name,
        email: coerce_string(&raw.email),
        phone: coerce_string(&raw.phone),
        address: coerce_string(&raw.address),
        city: coerce_string(&raw.city),
        country: coerce_string(&raw.country),
    }
}

fn room_summary(raw: &RawRoom) -> RoomSummary {
    let (room_type, room_type_fields) = match &raw.room_type {
        Value::Object(_) => {
            let nested = RawRoomType::from_value(&raw.room_type);
            let name = coerce_string(first_present(&[&nested.name, &nested.type_name]));
            (name, Some(nested))
        }
        Value::String(name) => (name.clone(), None),
        _ => (coerce_string(&raw.type_name), None),
    };

    let nested_price = room_type_fields.as_ref().map(|t| &t.base_price).unwrap_or(&Value::Null);
    let nested_amenities = room_type_fields.as_ref().map(|t| &t.amenities).unwrap_or(&Value::Null);

    RoomSummary {
        room_number: coerce_string(&raw.room_number),
        room_type,
        price_per_night: Money::from_major(coerce_f64(first_present(&[
            &raw.price,
            &raw.base_price,
            nested_price,
        ]))),
        amenities: coerce_string_list(first_present(&[&raw.amenities, nested_amenities])),
    }
}

/// Guests without a usable id are dropped; later duplicates of an id are
/// ignored.
pub fn normalize_guests(raw: &[RawGuest]) -> Vec<Guest> {
    let mut guests: Vec<Guest> = Vec::with_capacity(raw.len());
    for item in raw {
        let id = coerce_i64(first_present(&[&item.guest_id, &item.id])).map(GuestId::new);
        let Some(id) = id else {
            continue;
        };
        if guests.iter().any(|g| g.id == id) {
            continue;
        }
        let summary = guest_summary(item);
        guests.push(Guest {
            id,
            first_name: summary.first_name,
            last_name: summary.last_name,
            email: summary.email,
            phone: summary.phone,
            address: summary.address,
            city: summary.city,
            country: summary.country,
        });
    }
    guests
}

/// Rooms without a usable id are dropped; later duplicates of an id are
/// ignored.
pub fn normalize_rooms(raw: &[RawRoom]) -> Vec<Room> {
    let mut rooms: Vec<Room> = Vec::with_capacity(raw.len());
    for item in raw {
        let Some(id) = coerce_i64(first_present(&[&item.room_id, &item.id])).map(RoomId::new) else {
            continue;
        };
        if rooms.iter().any(|r| r.id == id) {
            continue;
        }
        let summary = room_summary(item);
        rooms.push(Room {
            id,
            room_number: summary.room_number,
            room_type: summary.room_type,
            price_per_night: summary.price_per_night,
            amenities: summary.amenities,
        });
    }
    rooms
}
