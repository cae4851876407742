//! Raw wire records, exactly as loose as the backend sends them.
//!
//! Every field is a `serde_json::Value` defaulting to `null`, so decoding a
//! record never fails on a single malformed field. Nothing outside the
//! normalizer should read these types; the coercion helpers below are the only
//! way values leave them.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Reservation as returned by `GET /reservations` and `POST /reservations`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawReservation {
    pub reservation_id: Value,
    pub id: Value,
    pub guest_id: Value,
    pub room_id: Value,
    pub check_in: Value,
    pub check_out: Value,
    pub adults: Value,
    pub children: Value,
    pub status: Value,
    pub total_amount: Value,
    pub paid_amount: Value,
    pub special_requests: Value,
    pub created_at: Value,
    /// Embedded guest object.
    pub guest: Value,
    /// Embedded room object (with nested `room_type`).
    pub room: Value,
}

/// Guest as returned by `GET /guests` or embedded in a reservation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawGuest {
    pub guest_id: Value,
    pub id: Value,
    pub first_name: Value,
    pub last_name: Value,
    pub email: Value,
    pub phone: Value,
    pub address: Value,
    pub city: Value,
    pub country: Value,
}

/// Room as returned by `GET /rooms` or embedded in a reservation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawRoom {
    pub room_id: Value,
    pub id: Value,
    pub room_number: Value,
    pub room_type: Value,
    #[serde(rename = "type")]
    pub type_name: Value,
    pub price: Value,
    pub base_price: Value,
    pub amenities: Value,
}

/// Room type, either nested under `room.room_type` or flattened to a string.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawRoomType {
    pub name: Value,
    pub type_name: Value,
    pub base_price: Value,
    pub amenities: Value,
}

macro_rules! impl_from_value {
    ($t:ty) => {
        impl $t {
            /// Decode from an arbitrary JSON value; non-objects decode to the
            /// all-`null` default.
            pub fn from_value(value: &Value) -> Self {
                if !value.is_object() {
                    return Self::default();
                }
                serde_json::from_value(value.clone()).unwrap_or_default()
            }

            /// Decode a list, tolerating a non-array (empty list) and
            /// non-object elements (defaulted).
            pub fn list_from_value(value: &Value) -> Vec<Self> {
                match value {
                    Value::Array(items) => items.iter().map(Self::from_value).collect(),
                    _ => Vec::new(),
                }
            }
        }
    };
}

impl_from_value!(RawReservation);
impl_from_value!(RawGuest);
impl_from_value!(RawRoom);
impl_from_value!(RawRoomType);

/// `parseFloat`-style coercion: numbers pass through, strings use their longest
/// valid leading decimal prefix, everything else is 0.
pub fn coerce_f64(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => parse_float_prefix(s).unwrap_or(0.0),
        _ => 0.0,
    }
}

/// Integer coercion with the same prefix rule as [`coerce_f64`], truncating
/// toward zero. `None` when nothing numeric is present.
pub fn coerce_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Value::String(s) => parse_float_prefix(s).map(|f| f.trunc() as i64),
        _ => None,
    }
}

/// Non-negative count, 0 when missing.
pub fn coerce_count(value: &Value) -> u32 {
    coerce_i64(value)
        .map(|v| u32::try_from(v.max(0)).unwrap_or(u32::MAX))
        .unwrap_or(0)
}

/// Strings pass through, numbers and booleans are stringified, anything else
/// is the empty string.
pub fn coerce_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}

static NULL: Value = Value::Null;

/// First present (non-null) value of the candidates.
pub fn first_present<'a>(candidates: &[&'a Value]) -> &'a Value {
    candidates
        .iter()
        .copied()
        .find(|v| !v.is_null())
        .unwrap_or(&NULL)
}

/// Accepts `YYYY-MM-DD`, RFC 3339, or `YYYY-MM-DD HH:MM:SS`; a bare date is
/// taken as midnight.
pub fn coerce_datetime(value: &Value) -> Option<NaiveDateTime> {
    let s = value.as_str()?.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(dt);
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt);
    }
    let date_part = s.get(..10).unwrap_or(s);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

pub fn coerce_utc(value: &Value) -> Option<DateTime<Utc>> {
    coerce_datetime(value).map(|naive| naive.and_utc())
}

/// Array of strings, or a comma-separated string.
pub fn coerce_string_list(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .iter()
            .map(coerce_string)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        Value::String(s) => s
            .split(',')
            .map(|part| part.trim().to_string())
            .filter(|part| !part.is_empty())
            .collect(),
        _ => Vec::new(),
    }
}

fn parse_float_prefix(s: &str) -> Option<f64> {
    let bytes = s.trim_start().as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end += 1;
    }
    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;
    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        digits += frac_end - frac_start;
        if frac_end > frac_start || digits > 0 {
            end = frac_end;
        }
    }
    if digits == 0 {
        return None;
    }
    if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && (bytes[exp_end] == b'+' || bytes[exp_end] == b'-') {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }
    let prefix = core::str::from_utf8(&bytes[..end]).ok()?;
    prefix.parse::<f64>().ok().filter(|f| f.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn float_coercion_matches_parse_float() {
        assert_eq!(coerce_f64(&json!(12.5)), 12.5);
        assert_eq!(coerce_f64(&json!("12.5abc")), 12.5);
        assert_eq!(coerce_f64(&json!("  450.00")), 450.0);
        assert_eq!(coerce_f64(&json!("-3")), -3.0);
        assert_eq!(coerce_f64(&json!(".5")), 0.5);
        assert_eq!(coerce_f64(&json!("5.")), 5.0);
        assert_eq!(coerce_f64(&json!("1e2x")), 100.0);
        assert_eq!(coerce_f64(&json!("abc")), 0.0);
        assert_eq!(coerce_f64(&json!(".")), 0.0);
        assert_eq!(coerce_f64(&json!(null)), 0.0);
        assert_eq!(coerce_f64(&json!({"amount": 1})), 0.0);
    }

    #[test]
    fn integer_and_count_coercion() {
        assert_eq!(coerce_i64(&json!("42")), Some(42));
        assert_eq!(coerce_i64(&json!(7.9)), Some(7));
        assert_eq!(coerce_i64(&json!(true)), None);
        assert_eq!(coerce_count(&json!(-2)), 0);
        assert_eq!(coerce_count(&json!("3 adults")), 3);
        assert_eq!(coerce_count(&Value::Null), 0);
    }

    #[test]
    fn datetime_accepts_common_shapes() {
        let date = NaiveDate::from_ymd_opt(2025, 9, 1).unwrap();
        assert_eq!(coerce_datetime(&json!("2025-09-01")).unwrap().date(), date);
        assert_eq!(coerce_datetime(&json!("2025-09-01T14:00:00Z")).unwrap().date(), date);
        assert_eq!(coerce_datetime(&json!("2025-09-01 14:00:00")).unwrap().date(), date);
        assert_eq!(coerce_datetime(&json!("2025-09-01T14:00:00.000")).unwrap().date(), date);
        assert!(coerce_datetime(&json!("not a date")).is_none());
        assert!(coerce_datetime(&json!(20250901)).is_none());
    }

    #[test]
    fn malformed_records_decode_to_defaults() {
        let malformed = json!({"reservation_id": {"nested": true}, "status": 5});
        let raw = RawReservation::from_value(&malformed);
        assert_eq!(raw.reservation_id, json!({"nested": true}));
        assert_eq!(raw.status, json!(5));
        assert_eq!(raw.guest, Value::Null);

        assert_eq!(RawReservation::from_value(&json!("oops")), RawReservation::default());
        assert_eq!(RawGuest::list_from_value(&json!({"not": "a list"})), Vec::new());
        assert_eq!(RawRoom::list_from_value(&json!([1, {"room_number": "101"}])).len(), 2);
    }

    #[test]
    fn room_type_field_is_renamed() {
        let room = RawRoom::from_value(&json!({"type": "Suite"}));
        assert_eq!(room.type_name, json!("Suite"));
    }

    #[test]
    fn amenities_accept_list_or_csv() {
        assert_eq!(coerce_string_list(&json!(["wifi", " tv ", ""])), vec!["wifi", "tv"]);
        assert_eq!(coerce_string_list(&json!("wifi, minibar")), vec!["wifi", "minibar"]);
        assert!(coerce_string_list(&json!(3)).is_empty());
    }
}
