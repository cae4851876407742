//! In-process backend with failure injection.
//!
//! Holds raw JSON records the way the REST backend would return them and
//! answers through the same envelope parsers as [`HttpReservationApi`], so the
//! engine sees identical shapes. Each endpoint can be scripted to fail, slowed
//! down, and its calls counted.
//!
//! [`HttpReservationApi`]: super::http::HttpReservationApi

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use lodge_core::ReservationId;
use lodge_reservations::format::nights_between_dates;
use lodge_reservations::wire::{coerce_f64, coerce_i64, first_present};
use lodge_reservations::{RawGuest, RawReservation, RawRoom, ReservationDraft, ReservationStatus};
use serde_json::{Value, json};

use super::{
    CreatedReservation, ReservationApi, created_from_body, guests_from_body,
    reservations_from_body, rooms_from_body,
};
use crate::error::{ApiError, ApiResult};

/// One REST operation, for failure injection and call accounting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    ListReservations,
    ListGuests,
    ListRooms,
    Create,
    UpdateStatus,
    Cancel,
    Delete,
}

#[derive(Debug, Default)]
struct State {
    reservations: Vec<Value>,
    guests: Vec<Value>,
    rooms: Vec<Value>,
    next_id: i64,
    scripted: HashMap<Endpoint, VecDeque<ApiError>>,
    always: HashMap<Endpoint, ApiError>,
    calls: HashMap<Endpoint, usize>,
    latency: HashMap<Endpoint, Duration>,
}

impl State {
    fn position(&self, id: ReservationId) -> Option<usize> {
        self.reservations.iter().position(|r| record_id(r) == Some(id.get()))
    }

    fn find_by_id<'a>(list: &'a [Value], key: &str, id: i64) -> Option<&'a Value> {
        list.iter()
            .find(|v| coerce_i64(first_present(&[&v[key], &v["id"]])) == Some(id))
    }
}

#[derive(Debug, Default)]
pub struct InMemoryReservationApi {
    state: Mutex<State>,
}

impl InMemoryReservationApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// A small hotel: three guests, three rooms, four reservations.
    pub fn demo() -> Self {
        Self::new()
            .with_guests(vec![
                json!({
                    "guest_id": 1, "first_name": "Jane", "last_name": "Smith",
                    "email": "jane.smith@example.com", "phone": "555-0100",
                    "city": "Lisbon", "country": "PT"
                }),
                json!({
                    "guest_id": 2, "first_name": "John", "last_name": "Doe",
                    "email": "john.doe@example.org", "phone": "555-0199"
                }),
                json!({
                    "guest_id": 3, "first_name": "Amara", "last_name": "Okafor",
                    "email": "amara@example.net", "phone": "555-0142"
                }),
            ])
            .with_rooms(vec![
                json!({
                    "room_id": 1, "room_number": "101",
                    "room_type": {
                        "name": "Standard", "base_price": "89.00", "amenities": ["wifi", "tv"]
                    }
                }),
                json!({
                    "room_id": 2, "room_number": "204",
                    "room_type": {
                        "name": "Deluxe", "base_price": "129.50",
                        "amenities": "wifi, minibar, balcony"
                    }
                }),
                json!({
                    "room_id": 3, "room_number": "301",
                    "room_type": {"name": "Suite", "base_price": 240}
                }),
            ])
            .with_reservations(vec![
                demo_reservation(1, 1, 2, "2025-09-01", "2025-09-04", "confirmed", "388.50", "100"),
                demo_reservation(2, 2, 1, "2025-09-02", "2025-09-03", "pending", "89.00", "0"),
                demo_reservation(3, 3, 3, "2025-08-30", "2025-09-02", "checked_in", "720", "720"),
                demo_reservation(4, 2, 2, "2025-08-20", "2025-08-22", "checked_out", "259", "259"),
            ])
    }

    pub fn with_reservations(self, records: Vec<Value>) -> Self {
        {
            let mut state = self.state();
            state.next_id = records.iter().filter_map(record_id).max().unwrap_or(0) + 1;
            state.reservations = records;
        }
        self
    }

    pub fn with_guests(self, guests: Vec<Value>) -> Self {
        self.state().guests = guests;
        self
    }

    pub fn with_rooms(self, rooms: Vec<Value>) -> Self {
        self.state().rooms = rooms;
        self
    }

    /// The id the next create will be assigned.
    pub fn set_next_id(&self, id: i64) {
        self.state().next_id = id;
    }

    /// Fail the next call to `endpoint` with `error`. Queued failures are
    /// consumed in order before [`fail_always`](Self::fail_always) applies.
    pub fn fail_next(&self, endpoint: Endpoint, error: ApiError) {
        self.state().scripted.entry(endpoint).or_default().push_back(error);
    }

    pub fn fail_always(&self, endpoint: Endpoint, error: ApiError) {
        self.state().always.insert(endpoint, error);
    }

    pub fn clear_failures(&self, endpoint: Endpoint) {
        let mut state = self.state();
        state.scripted.remove(&endpoint);
        state.always.remove(&endpoint);
    }

    /// Delay every call to `endpoint` by `latency` (tokio time).
    pub fn set_latency(&self, endpoint: Endpoint, latency: Duration) {
        self.state().latency.insert(endpoint, latency);
    }

    pub fn calls(&self, endpoint: Endpoint) -> usize {
        self.state().calls.get(&endpoint).copied().unwrap_or(0)
    }

    /// Server-side view of the reservation records.
    pub fn reservations(&self) -> Vec<Value> {
        self.state().reservations.clone()
    }

    /// Change a record behind the engine's back.
    pub fn set_status(&self, id: ReservationId, status: ReservationStatus) -> bool {
        let mut state = self.state();
        match state.position(id) {
            Some(idx) => {
                state.reservations[idx]["status"] = json!(status);
                true
            }
            None => false,
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Count the call, wait out any latency, then apply injected failures.
    async fn enter(&self, endpoint: Endpoint) -> ApiResult<()> {
        let latency = {
            let mut state = self.state();
            *state.calls.entry(endpoint).or_default() += 1;
            state.latency.get(&endpoint).copied()
        };
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        let mut state = self.state();
        if let Some(error) = state.scripted.get_mut(&endpoint).and_then(VecDeque::pop_front) {
            return Err(error);
        }
        match state.always.get(&endpoint) {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ReservationApi for InMemoryReservationApi {
    async fn list_reservations(&self) -> ApiResult<Vec<RawReservation>> {
        self.enter(Endpoint::ListReservations).await?;
        let reservations = self.state().reservations.clone();
        let body = json!({"success": true, "data": {"reservations": reservations}});
        reservations_from_body(&body)
    }

    async fn list_guests(&self) -> ApiResult<Vec<RawGuest>> {
        self.enter(Endpoint::ListGuests).await?;
        let body = json!({"success": true, "data": self.state().guests.clone()});
        guests_from_body(&body)
    }

    async fn list_rooms(&self) -> ApiResult<Vec<RawRoom>> {
        self.enter(Endpoint::ListRooms).await?;
        let body = Value::Array(self.state().rooms.clone());
        rooms_from_body(&body)
    }

    async fn create_reservation(&self, draft: &ReservationDraft) -> ApiResult<CreatedReservation> {
        self.enter(Endpoint::Create).await?;

        let mut state = self.state();
        let guest = State::find_by_id(&state.guests, "guest_id", draft.guest_id.get()).cloned();
        let room = State::find_by_id(&state.rooms, "room_id", draft.room_id.get()).cloned();
        let Some(room) = room else {
            return Err(ApiError::http(422, Some("Room not found".to_string())));
        };

        let nightly = coerce_f64(first_present(&[
            &room["price"],
            &room["base_price"],
            &room["room_type"]["base_price"],
        ]));
        let nights = nights_between_dates(draft.check_in, draft.check_out);

        let id = state.next_id.max(1);
        state.next_id = id + 1;

        let mut record = serde_json::to_value(draft).map_err(|e| ApiError::Parse(e.to_string()))?;
        record["reservation_id"] = json!(id);
        record["total_amount"] = json!(format!("{:.2}", nightly * f64::from(nights)));
        record["paid_amount"] = json!("0.00");
        record["created_at"] = json!(chrono::Utc::now().to_rfc3339());
        record["room"] = room;
        if let Some(guest) = guest {
            record["guest"] = guest;
        }
        state.reservations.insert(0, record.clone());

        created_from_body(&json!({"success": true, "data": record}))
    }

    async fn update_status(&self, id: ReservationId, status: ReservationStatus) -> ApiResult<()> {
        self.enter(Endpoint::UpdateStatus).await?;
        transition(&mut self.state(), id, status)
    }

    async fn cancel_reservation(&self, id: ReservationId) -> ApiResult<()> {
        self.enter(Endpoint::Cancel).await?;
        transition(&mut self.state(), id, ReservationStatus::Cancelled)
    }

    async fn delete_reservation(&self, id: ReservationId) -> ApiResult<()> {
        self.enter(Endpoint::Delete).await?;
        let mut state = self.state();
        let idx = state.position(id).ok_or_else(not_found)?;
        state.reservations.remove(idx);
        Ok(())
    }
}

fn transition(state: &mut State, id: ReservationId, status: ReservationStatus) -> ApiResult<()> {
    let idx = state.position(id).ok_or_else(not_found)?;
    let record = &mut state.reservations[idx];
    let current = record["status"]
        .as_str()
        .and_then(ReservationStatus::parse)
        .unwrap_or(ReservationStatus::Pending);
    if !current.can_transition_to(status) {
        return Err(ApiError::http(
            422,
            Some(format!("Cannot change status from {} to {}", current, status)),
        ));
    }
    record["status"] = json!(status);
    Ok(())
}

fn not_found() -> ApiError {
    ApiError::http(404, Some("Reservation not found".to_string()))
}

fn record_id(record: &Value) -> Option<i64> {
    coerce_i64(first_present(&[&record["reservation_id"], &record["id"]]))
}

#[allow(clippy::too_many_arguments)]
fn demo_reservation(
    id: i64,
    guest_id: i64,
    room_id: i64,
    check_in: &str,
    check_out: &str,
    status: &str,
    total: &str,
    paid: &str,
) -> Value {
    let guest = match guest_id {
        1 => json!({
            "first_name": "Jane", "last_name": "Smith",
            "email": "jane.smith@example.com", "phone": "555-0100"
        }),
        2 => json!({
            "first_name": "John", "last_name": "Doe",
            "email": "john.doe@example.org", "phone": "555-0199"
        }),
        _ => json!({
            "first_name": "Amara", "last_name": "Okafor",
            "email": "amara@example.net", "phone": "555-0142"
        }),
    };
    let room = match room_id {
        1 => json!({
            "room_number": "101",
            "room_type": {"name": "Standard", "base_price": "89.00"}
        }),
        2 => json!({"room_number": "204", "room_type": {"name": "Deluxe", "base_price": "129.50"}}),
        _ => json!({"room_number": "301", "room_type": {"name": "Suite", "base_price": 240}}),
    };
    json!({
        "reservation_id": id,
        "guest_id": guest_id,
        "room_id": room_id,
        "check_in": check_in,
        "check_out": check_out,
        "adults": 2,
        "children": 0,
        "status": status,
        "total_amount": total,
        "paid_amount": paid,
        "special_requests": "",
        "created_at": "2025-08-15T10:00:00Z",
        "guest": guest,
        "room": room,
    })
}
