// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The message bus envelope: `{id, ts, type, from, to, payload}`.

use hub_core::simple_display;
use serde::{Deserialize, Serialize};

/// Envelope message type discriminator.
///
/// Envelope payloads are NOT `any`-typed: every consumer matches
/// exhaustively on `MessageType`, and an envelope whose `payload` doesn't
/// deserialize to the shape its `type` implies is logged and dropped
/// rather than causing a panic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
 Registration,
 Heartbeat,
 Progress,
 Complete,
 Failed,
 Request,
 Response,
 Assignment,
}

simple_display! {
 MessageType {
 Registration => "registration",
 Heartbeat => "heartbeat",
 Progress => "progress",
 Complete => "complete",
 Failed => "failed",
 Request => "request",
 Response => "response",
 Assignment => "assignment",
 }
}

/// A message bus envelope. `payload` is kept as `serde_json::Value` at this
/// layer; typed accessors in `hub-bus` deserialize it into the concrete
/// payload type implied by `message_type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
 pub id: String,
 pub ts: i64,
 #[serde(rename = "type")]
 pub message_type: MessageType,
 pub from: String,
 pub to: String,
 pub payload: serde_json::Value,
}

impl Envelope {
 pub fn new(
 id: impl Into<String>,
 ts: i64,
 message_type: MessageType,
 from: impl Into<String>,
 to: impl Into<String>,
 payload: serde_json::Value,
 ) -> Self {
 Self { id: id.into(), ts, message_type, from: from.into(), to: to.into(), payload }
 }
}

#[cfg(test)]
mod tests {
 use super::*;

 #[test]
 fn envelope_round_trips_through_json() {
 let env = Envelope::new(
 "msg-1-abc",
 1000,
 MessageType::Heartbeat,
 "worker-agent-1",
 "hub",
 serde_json::json!({"state": "working"}),
 );
 let json = serde_json::to_string(&env).unwrap();
 assert!(json.contains("\"type\":\"heartbeat\""));
 let back: Envelope = serde_json::from_str(&json).unwrap();
 assert_eq!(env, back);
 }

 #[test]
 fn unknown_type_tag_fails_to_deserialize_rather_than_silently_coercing() {
 let json = r#"{"id":"x","ts":0,"type":"bogus","from":"a","to":"b","payload":null}"#;
 assert!(serde_json::from_str::<Envelope>(json).is_err());
 }
}
