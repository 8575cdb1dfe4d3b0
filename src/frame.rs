//! Frame — the universal message type for the board protocol.
//!
//! ARCHITECTURE
//! ============
//! Every message on the real-time channel is a Frame. Clients send named
//! events (`joinRoom`, `moveItem`, ...) with a flat payload, the server
//! applies them to the room session and fans out named events to every
//! connection subscribed to that room.
//!
//! DESIGN
//! ======
//! - Flat data: payload is always `Map<String, Value>`.
//! - Inbound frames may omit `id` and `ts`; they are filled on parse.
//! - The room code travels in `data.room` (the shape clients send) or in the
//!   frame-level `room` field. Outbound frames always stamp `room`.

use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// FIELD CONSTANTS
// =============================================================================

/// Frame data key carrying the room code on inbound events.
pub const FRAME_ROOM: &str = "room";

// =============================================================================
// TYPES
// =============================================================================

/// Flat key-value payload. Alias to reduce noise in signatures.
pub type Data = HashMap<String, serde_json::Value>;

/// The universal message type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Frame {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    /// Milliseconds since Unix epoch. Set automatically at construction.
    #[serde(default = "now_ms")]
    pub ts: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room: Option<String>,
    pub event: String,
    #[serde(default)]
    pub data: Data,
}

// =============================================================================
// CONSTRUCTORS
// =============================================================================

/// Current time as milliseconds since Unix epoch.
fn now_ms() -> i64 {
    let Ok(dur) = SystemTime::now().duration_since(UNIX_EPOCH) else {
        return 0;
    };
    i64::try_from(dur.as_millis()).unwrap_or(0)
}

impl Frame {
    /// Create a frame for a named event.
    pub fn new(event: impl Into<String>, data: Data) -> Self {
        Self { id: Uuid::new_v4(), ts: now_ms(), room: None, event: event.into(), data }
    }

    /// Create a frame whose payload is the JSON object form of `value`.
    /// Non-object values land under a `value` key so the payload stays flat.
    pub fn from_value(event: impl Into<String>, value: serde_json::Value) -> Self {
        let data = match value {
            serde_json::Value::Object(map) => map.into_iter().collect(),
            serde_json::Value::Null => Data::new(),
            other => {
                let mut data = Data::new();
                data.insert("value".into(), other);
                data
            }
        };
        Self::new(event, data)
    }
}

// =============================================================================
// BUILDERS
// =============================================================================

impl Frame {
    #[must_use]
    pub fn with_room(mut self, room: impl Into<String>) -> Self {
        self.room = Some(room.into());
        self
    }

    #[must_use]
    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }
}

// =============================================================================
// ACCESSORS
// =============================================================================

impl Frame {
    /// Room code this frame targets: frame-level `room` first, then `data.room`.
    #[must_use]
    pub fn room_code(&self) -> Option<&str> {
        self.room
            .as_deref()
            .or_else(|| self.data.get(FRAME_ROOM).and_then(serde_json::Value::as_str))
    }

    #[must_use]
    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.data.get(key).and_then(serde_json::Value::as_str)
    }

    #[must_use]
    pub fn f64_field(&self, key: &str) -> Option<f64> {
        self.data
            .get(key)
            .and_then(serde_json::Value::as_f64)
            .filter(|v| v.is_finite())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_sets_fields() {
        let frame = Frame::new("clearItems", Data::new());
        assert_eq!(frame.event, "clearItems");
        assert!(frame.room.is_none());
        assert!(frame.data.is_empty());
        assert!(frame.ts > 0);
    }

    #[test]
    fn inbound_frame_without_id_or_ts_parses() {
        let text = r#"{"event":"submitAnswer","data":{"room":"AB23","name":"Dana","text":"hi"}}"#;
        let frame: Frame = serde_json::from_str(text).expect("parse");
        assert_eq!(frame.event, "submitAnswer");
        assert_eq!(frame.room_code(), Some("AB23"));
        assert_eq!(frame.str_field("name"), Some("Dana"));
        assert!(frame.ts > 0);
    }

    #[test]
    fn inbound_frame_without_data_parses_empty() {
        let frame: Frame = serde_json::from_str(r#"{"event":"setQuestion"}"#).expect("parse");
        assert!(frame.data.is_empty());
        assert_eq!(frame.room_code(), None);
    }

    #[test]
    fn frame_level_room_wins_over_data_room() {
        let frame = Frame::new("moveItem", Data::new())
            .with_data("room", "DATA")
            .with_room("TOP1");
        assert_eq!(frame.room_code(), Some("TOP1"));
    }

    #[test]
    fn f64_field_reads_integers_and_floats() {
        let frame = Frame::new("moveItem", Data::new())
            .with_data("x", 12)
            .with_data("y", 40.5)
            .with_data("z", "nope");
        assert_eq!(frame.f64_field("x"), Some(12.0));
        assert_eq!(frame.f64_field("y"), Some(40.5));
        assert_eq!(frame.f64_field("z"), None);
        assert_eq!(frame.f64_field("missing"), None);
    }

    #[test]
    fn from_value_flattens_objects_and_wraps_scalars() {
        let frame = Frame::from_value("roomStyle", serde_json::json!({"boardBackground": "#000"}));
        assert_eq!(frame.str_field("boardBackground"), Some("#000"));

        let frame = Frame::from_value("question", serde_json::json!("why?"));
        assert_eq!(frame.str_field("value"), Some("why?"));

        let frame = Frame::from_value("clearItems", serde_json::Value::Null);
        assert!(frame.data.is_empty());
    }

    #[test]
    fn outbound_json_skips_missing_room() {
        let json = serde_json::to_value(Frame::new("clearItems", Data::new())).expect("serialize");
        assert!(json.get("room").is_none());

        let json = serde_json::to_value(Frame::new("clearItems", Data::new()).with_room("AB23")).expect("serialize");
        assert_eq!(json.get("room").and_then(|v| v.as_str()), Some("AB23"));
    }
}
