//! Wire-level frames for the WebSocket adapter.
//!
//! ```text
//! client -> {"hello":"world"}
//! server -> {"type":"ACK","data":{"hello":"world"}}
//! server -> {"type":"TEAM_CREATED","data":{...},"timestamp":"2026-03-02T09:00:00Z"}
//! ```

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::domain::Notification;

/// Echo of a client message.
#[derive(Debug, Serialize)]
pub struct AckFrame {
    #[serde(rename = "type")]
    kind: &'static str,
    data: Value,
}

impl AckFrame {
    pub fn new(data: Value) -> Self {
        Self { kind: "ACK", data }
    }
}

/// Server-pushed notification stamped with its send time.
#[derive(Debug, Serialize)]
pub struct BroadcastFrame<'a> {
    #[serde(flatten)]
    notification: &'a Notification,
    timestamp: String,
}

impl<'a> BroadcastFrame<'a> {
    pub fn new(notification: &'a Notification, at: DateTime<Utc>) -> Self {
        Self {
            notification,
            timestamp: at.to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}
