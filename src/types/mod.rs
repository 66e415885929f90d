pub mod error;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Direction of a message relative to this dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Sent,
    Received,
}

impl Direction {
    /// Human-readable label used by the renderer and CSV export
    pub fn label(&self) -> &'static str {
        match self {
            Direction::Sent => "Sent",
            Direction::Received => "Received",
        }
    }
}

/// Delivery state reported by the gateway
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    Sent,
    Delivered,
    Failed,
    Pending,
    Received,
    Unknown,
}

impl DeliveryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryStatus::Sent => "sent",
            DeliveryStatus::Delivered => "delivered",
            DeliveryStatus::Failed => "failed",
            DeliveryStatus::Pending => "pending",
            DeliveryStatus::Received => "received",
            DeliveryStatus::Unknown => "unknown",
        }
    }
}

/// A single SMS record as held by the store
///
/// The id is unique within the store and never changes once assigned.
/// Records come from the gateway, from the synthetic fallback generator,
/// or from an optimistic local insert on send.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub phone: String,
    pub content: String,
    pub direction: Direction,
    pub timestamp: DateTime<Utc>,
    pub read: bool,
    pub status: DeliveryStatus,
    /// Storage medium reported by the gateway (SIM, device, ...), informational
    pub storage: Option<String>,
}

impl Message {
    /// Generate an id for messages created locally (optimistic sends,
    /// records the gateway returned without an id)
    pub fn generate_id() -> String {
        uuid::Uuid::new_v4().simple().to_string()
    }
}

/// Aggregate counts displayed by the renderer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub total: usize,
    pub sent: usize,
    pub received: usize,
    pub unread: usize,
}

/// Raw message item as returned by the gateway read endpoint
///
/// The gateway is loose about field names and types: ids may be numbers or
/// strings, and the read flag may appear as `read_status`, `read` or
/// `is_read`. Everything is optional and mapped defensively.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawRecord {
    #[serde(default)]
    pub id: Option<serde_json::Value>,
    #[serde(default)]
    pub number: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub date: Option<serde_json::Value>,
    #[serde(default)]
    pub read_status: Option<serde_json::Value>,
    #[serde(default)]
    pub read: Option<bool>,
    #[serde(default)]
    pub is_read: Option<bool>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub storage: Option<String>,
}

/// Read endpoint payload: either `{ "messages": [...] }` or a bare array
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ReadPayload {
    Wrapped { messages: Vec<RawRecord> },
    Bare(Vec<RawRecord>),
}

impl ReadPayload {
    pub fn into_records(self) -> Vec<RawRecord> {
        match self {
            ReadPayload::Wrapped { messages } => messages,
            ReadPayload::Bare(records) => records,
        }
    }
}

impl RawRecord {
    /// Map a raw gateway record into a store message
    pub fn into_message(self) -> Message {
        let direction = match self.kind.as_deref() {
            Some("deliver") => Direction::Received,
            _ => Direction::Sent,
        };

        let read = self.resolve_read_flag(direction);
        let status = map_state(self.state.as_deref(), direction);

        Message {
            id: self
                .id
                .and_then(value_to_id)
                .unwrap_or_else(Message::generate_id),
            phone: self.number.unwrap_or_default(),
            content: self.text.unwrap_or_default(),
            direction,
            timestamp: self.date.as_ref().and_then(parse_date).unwrap_or_else(Utc::now),
            read,
            status,
            storage: self.storage,
        }
    }

    /// Resolve the read flag from the fallback chain the gateway uses:
    /// `read_status` (0/1 or bool), then `read`, then `is_read`. Sent
    /// messages default to read; received ones to unread.
    fn resolve_read_flag(&self, direction: Direction) -> bool {
        if let Some(value) = &self.read_status {
            return match value {
                serde_json::Value::Bool(b) => *b,
                serde_json::Value::Number(n) => n.as_i64() == Some(1),
                serde_json::Value::String(s) => s == "1" || s == "true",
                _ => false,
            };
        }
        if let Some(read) = self.read {
            return read;
        }
        if let Some(is_read) = self.is_read {
            return is_read;
        }
        direction == Direction::Sent
    }
}

fn value_to_id(value: serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) if !s.is_empty() => Some(s),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn map_state(state: Option<&str>, direction: Direction) -> DeliveryStatus {
    match state {
        Some("sent") => DeliveryStatus::Sent,
        Some("received") => DeliveryStatus::Received,
        Some("delivered") => DeliveryStatus::Delivered,
        Some("failed") => DeliveryStatus::Failed,
        Some("pending") => DeliveryStatus::Pending,
        _ => match direction {
            Direction::Sent => DeliveryStatus::Sent,
            Direction::Received => DeliveryStatus::Received,
        },
    }
}

/// Parse the gateway `date` field: RFC 3339, `Y-m-d H:M:S`, or unix seconds
fn parse_date(value: &serde_json::Value) -> Option<DateTime<Utc>> {
    match value {
        serde_json::Value::String(s) => {
            if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
                return Some(dt.with_timezone(&Utc));
            }
            if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
                return Some(Utc.from_utc_datetime(&naive));
            }
            s.parse::<i64>()
                .ok()
                .and_then(|secs| Utc.timestamp_opt(secs, 0).single())
        }
        serde_json::Value::Number(n) => n
            .as_i64()
            .and_then(|secs| Utc.timestamp_opt(secs, 0).single()),
        _ => None,
    }
}
