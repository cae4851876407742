//! Backend boundary: the REST operations the engine needs and the envelope
//! parsing shared by every implementation.

use async_trait::async_trait;
use lodge_core::ReservationId;
use lodge_reservations::wire::{coerce_i64, first_present};
use lodge_reservations::{RawGuest, RawReservation, RawRoom, ReservationDraft, ReservationStatus};
use serde_json::Value;

use crate::error::{ApiError, ApiResult};

pub mod http;
pub mod in_memory;

/// Authoritative create response.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CreatedReservation {
    pub reservation: RawReservation,
    /// Full guest entity, when the backend includes it.
    pub guest: Option<RawGuest>,
    /// Full room entity, when the backend includes it.
    pub room: Option<RawRoom>,
}

/// REST operations against the reservation backend.
#[async_trait]
pub trait ReservationApi: Send + Sync {
    /// `GET /reservations`
    async fn list_reservations(&self) -> ApiResult<Vec<RawReservation>>;

    /// `GET /guests`
    async fn list_guests(&self) -> ApiResult<Vec<RawGuest>>;

    /// `GET /rooms`
    async fn list_rooms(&self) -> ApiResult<Vec<RawRoom>>;

    /// `POST /reservations`
    async fn create_reservation(&self, draft: &ReservationDraft) -> ApiResult<CreatedReservation>;

    /// `PATCH /reservations/{id}/status`
    async fn update_status(&self, id: ReservationId, status: ReservationStatus) -> ApiResult<()>;

    /// `POST /reservations/{id}/cancel`
    async fn cancel_reservation(&self, id: ReservationId) -> ApiResult<()>;

    /// `DELETE /reservations/{id}`
    async fn delete_reservation(&self, id: ReservationId) -> ApiResult<()>;
}

/// Reject a 2xx body that reports `success: false`.
pub fn ensure_success(body: &Value) -> ApiResult<()> {
    if body.get("success").and_then(Value::as_bool) == Some(false) {
        return Err(ApiError::rejected(body_message(body)));
    }
    Ok(())
}

/// The `message` field of a response body, if it is a non-empty string.
pub fn body_message(body: &Value) -> Option<String> {
    body.get("message")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(str::to_string)
}

/// Extract the reservation list from any of the envelopes the backend uses:
/// `{data: {reservations: [..]}}`, `{data: [..]}`, `{reservations: [..]}` or
/// a bare array.
pub fn reservations_from_body(body: &Value) -> ApiResult<Vec<RawReservation>> {
    ensure_success(body)?;
    let list = find_list(body, "reservations")
        .ok_or_else(|| ApiError::Parse("response carries no reservation list".into()))?;
    Ok(RawReservation::list_from_value(list))
}

pub fn guests_from_body(body: &Value) -> ApiResult<Vec<RawGuest>> {
    ensure_success(body)?;
    let list = find_list(body, "guests")
        .ok_or_else(|| ApiError::Parse("response carries no guest list".into()))?;
    Ok(RawGuest::list_from_value(list))
}

pub fn rooms_from_body(body: &Value) -> ApiResult<Vec<RawRoom>> {
    ensure_success(body)?;
    let list = find_list(body, "rooms")
        .ok_or_else(|| ApiError::Parse("response carries no room list".into()))?;
    Ok(RawRoom::list_from_value(list))
}

/// Parse `{data: RawReservation}` (or a bare record). The record must carry
/// an id, otherwise it could not replace the temporary record.
pub fn created_from_body(body: &Value) -> ApiResult<CreatedReservation> {
    ensure_success(body)?;
    let data = match body.get("data") {
        Some(data) if data.is_object() => data,
        _ => body,
    };
    let record = match data.get("reservation") {
        Some(nested) if nested.is_object() => nested,
        _ => data,
    };

    let reservation = RawReservation::from_value(record);
    if coerce_i64(first_present(&[&reservation.reservation_id, &reservation.id])).is_none() {
        return Err(ApiError::Parse("create response has no reservation id".into()));
    }

    let entity = |key: &str| data.get(key).filter(|v| v.is_object());
    Ok(CreatedReservation {
        guest: entity("guest").map(RawGuest::from_value),
        room: entity("room").map(RawRoom::from_value),
        reservation,
    })
}

fn find_list<'a>(body: &'a Value, key: &str) -> Option<&'a Value> {
    let data = body.get("data");
    [
        data.and_then(|d| d.get(key)),
        data,
        body.get(key),
        Some(body),
    ]
    .into_iter()
    .flatten()
    .find(|v| v.is_array())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reservations_accept_every_envelope() {
        let record = json!({"reservation_id": 1});
        for body in [
            json!({"success": true, "data": {"reservations": [record.clone()]}}),
            json!({"data": [record.clone()]}),
            json!({"reservations": [record.clone()]}),
            json!([record.clone()]),
        ] {
            let list = reservations_from_body(&body).unwrap();
            assert_eq!(list.len(), 1, "body {body}");
            assert_eq!(list[0].reservation_id, json!(1));
        }
    }

    #[test]
    fn success_false_is_a_rejection() {
        let body = json!({"success": false, "message": "Session expired", "data": []});
        assert_eq!(
            reservations_from_body(&body).unwrap_err(),
            ApiError::Rejected { message: Some("Session expired".into()) }
        );
    }

    #[test]
    fn missing_list_is_a_parse_error() {
        let counted = json!({"data": {"count": 0}});
        assert!(matches!(guests_from_body(&counted), Err(ApiError::Parse(_))));
        assert_eq!(rooms_from_body(&json!({"data": []})).unwrap(), Vec::<RawRoom>::new());
    }

    #[test]
    fn created_body_carries_optional_entities() {
        let body = json!({
            "success": true,
            "data": {
                "reservation_id": 99,
                "status": "pending",
                "guest": {"guest_id": 7, "first_name": "Jane"},
                "room": {"room_id": 3, "room_number": "101"}
            }
        });
        let created = created_from_body(&body).unwrap();
        assert_eq!(created.reservation.reservation_id, json!(99));
        assert_eq!(created.guest.unwrap().guest_id, json!(7));
        assert_eq!(created.room.unwrap().room_number, json!("101"));

        let bare = created_from_body(&json!({"data": {"id": 5}})).unwrap();
        assert!(bare.guest.is_none() && bare.room.is_none());
    }

    #[test]
    fn created_body_without_id_is_rejected() {
        let anonymous = json!({"data": {"status": "pending"}});
        assert!(matches!(created_from_body(&anonymous), Err(ApiError::Parse(_))));
    }
}
