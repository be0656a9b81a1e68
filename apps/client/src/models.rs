use chrono::{DateTime, Local, NaiveDateTime, TimeZone};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

// ── Wire models (backend responses) ──

/// A bookable printer slot for one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    #[serde(with = "wire_time")]
    pub start: NaiveDateTime,
    #[serde(with = "wire_time")]
    pub end: NaiveDateTime,
    #[serde(default)]
    pub occupied: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Active,
    Cancelled,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    pub id: i64,
    #[serde(with = "wire_time")]
    pub start: NaiveDateTime,
    #[serde(with = "wire_time")]
    pub end: NaiveDateTime,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default = "missing_status")]
    pub status: BookingStatus,
    #[serde(default)]
    pub tg_user: Option<i64>,
    #[serde(default)]
    pub user_name: Option<String>,
}

fn missing_status() -> BookingStatus {
    BookingStatus::Other
}

impl Booking {
    pub fn is_active(&self) -> bool {
        self.status == BookingStatus::Active
    }
}

/// Approved model from the public library.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Model {
    #[serde(default)]
    pub id: Option<i64>,
    pub title: String,
    #[serde(default)]
    pub image: Option<String>,
    pub file: String,
}

/// Model waiting for moderation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingModel {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub submitter: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserStat {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub booking_count: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct AdminCheck {
    pub is_admin: bool,
}

/// Response of `POST /api/book/cancel`. The backend answers 200 even on
/// refusal and reports it through `error`.
#[derive(Debug, Default, Deserialize)]
pub struct CancelResponse {
    #[serde(default)]
    pub ok: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SubmitResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub message: Option<String>,
}

// ── API request types ──

#[derive(Debug, Serialize)]
pub struct BookRequest<'a> {
    #[serde(with = "wire_time")]
    pub start: NaiveDateTime,
    #[serde(with = "wire_time")]
    pub end: NaiveDateTime,
    pub tg_user: i64,
    pub username: Option<&'a str>,
    pub first_name: &'a str,
}

#[derive(Debug, Serialize)]
pub struct CancelRequest {
    pub booking_id: i64,
    pub tg_user: i64,
}

#[derive(Debug, Serialize)]
pub struct ModerationRequest {
    pub pending_id: i64,
}

// ── Telegram host context ──

/// User object embedded in the Mini App `initData`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramUser {
    pub id: i64,
    #[serde(default)]
    pub first_name: String,
    pub username: Option<String>,
    pub photo_url: Option<String>,
}

// ── Timestamps ──

/// Slot and booking timestamps as the backend sends them: naive local ISO
/// strings, RFC 3339 with an offset, or epoch milliseconds.
pub mod wire_time {
    use super::*;

    const FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Millis(i64),
        Text(String),
    }

    pub fn parse(text: &str) -> Option<NaiveDateTime> {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f") {
            return Some(naive);
        }
        DateTime::parse_from_rfc3339(text)
            .ok()
            .map(|dt| dt.with_timezone(&Local).naive_local())
    }

    pub fn from_millis(millis: i64) -> Option<NaiveDateTime> {
        Local
            .timestamp_millis_opt(millis)
            .single()
            .map(|dt| dt.naive_local())
    }

    pub fn serialize<S: Serializer>(value: &NaiveDateTime, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&value.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDateTime, D::Error> {
        match Raw::deserialize(d)? {
            Raw::Millis(ms) => from_millis(ms)
                .ok_or_else(|| serde::de::Error::custom(format!("timestamp out of range: {ms}"))),
            Raw::Text(text) => parse(&text)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {text}"))),
        }
    }
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, 21)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn test_slot_from_naive_iso() {
        let slot: Slot = serde_json::from_str(
            r#"{"start":"2026-10-21T09:00:00","end":"2026-10-21T10:00:00","occupied":true}"#,
        )
        .unwrap();
        assert_eq!(slot.start, at(9, 0));
        assert_eq!(slot.end, at(10, 0));
        assert!(slot.occupied);
    }

    #[test]
    fn test_slot_occupied_defaults_to_false() {
        let slot: Slot =
            serde_json::from_str(r#"{"start":"2026-10-21T09:00:00","end":"2026-10-21T10:00:00"}"#)
                .unwrap();
        assert!(!slot.occupied);
    }

    #[test]
    fn test_slot_from_epoch_millis() {
        let start = Local.from_local_datetime(&at(14, 0)).single().unwrap();
        let ms = start.timestamp_millis();
        let json = format!(r#"{{"start":{},"end":{},"occupied":false}}"#, ms, ms + 1_800_000);
        let slot: Slot = serde_json::from_str(&json).unwrap();
        assert_eq!(slot.start, at(14, 0));
        assert_eq!(slot.end, at(14, 30));
    }

    #[test]
    fn test_fractional_seconds_accepted() {
        assert_eq!(wire_time::parse("2026-10-21T09:00:00.250"), Some(at(9, 0) + chrono::Duration::milliseconds(250)));
    }

    #[test]
    fn test_garbage_timestamp_rejected() {
        let res: Result<Slot, _> =
            serde_json::from_str(r#"{"start":"soon","end":"later","occupied":false}"#);
        assert!(res.is_err());
    }

    #[test]
    fn test_booking_unknown_status() {
        let b: Booking = serde_json::from_str(
            r#"{"id":1,"start":"2026-10-21T09:00:00","end":"2026-10-21T10:00:00","status":"finished"}"#,
        )
        .unwrap();
        assert_eq!(b.status, BookingStatus::Other);
        assert!(!b.is_active());
    }

    #[test]
    fn test_booking_missing_status_is_not_active() {
        let b: Booking = serde_json::from_str(
            r#"{"id":1,"start":"2026-10-21T09:00:00","end":"2026-10-21T10:00:00"}"#,
        )
        .unwrap();
        assert!(!b.is_active());
    }

    #[test]
    fn test_book_request_wire_format() {
        let req = BookRequest {
            start: at(9, 0),
            end: at(10, 0),
            tg_user: 42,
            username: Some("maker"),
            first_name: "Ivan",
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["start"], "2026-10-21T09:00:00");
        assert_eq!(json["end"], "2026-10-21T10:00:00");
        assert_eq!(json["tg_user"], 42);
    }
}
