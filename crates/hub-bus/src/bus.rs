// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The message bus: topic-addressed envelope pub/sub layered over a
//! `KvStore`, plus a request/response correlation helper.

use crate::error::BusError;
use crate::kv::KvStore;
use hub_wire::{Envelope, MessageType, RequestPayload, ResponsePayload};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Topic-addressed messaging over a `KvStore`. Delivery is at-least-once
/// within a single connected session; messages published while the
/// underlying store is disconnected are lost, same as a direct `KvStore`
/// caller would see.
pub struct MessageBus {
 kv: Arc<dyn KvStore>,
 subscriptions: Mutex<Vec<JoinHandle<()>>>,
}

impl MessageBus {
 pub fn new(kv: Arc<dyn KvStore>) -> Self {
 Self { kv, subscriptions: Mutex::new(Vec::new()) }
 }

 pub async fn publish(&self, channel: &str, envelope: &Envelope) -> Result<(), BusError> {
 let body = serde_json::to_string(envelope)
.map_err(|e| BusError::Transport(e.to_string()))?;
 self.kv.publish(channel, &body).await?;
 Ok(())
 }

 /// Subscribes to `channel`, invoking `handler` once per envelope that
 /// successfully decodes. An envelope that fails to decode (unknown
 /// `type` tag or malformed payload) is dropped rather than passed on,
 /// matching the exhaustive-match-or-drop convention used at every
 /// consumer.
 pub fn subscribe<F>(&self, channel: &str, handler: F) -> Result<(), BusError>
 where
 F: Fn(Envelope) + Send + Sync + 'static,
 {
 let mut rx = self.kv.subscribe(channel)?;
 let channel = channel.to_string();
 let handle = tokio::spawn(async move {
 loop {
 match rx.recv().await {
 Ok(body) => match serde_json::from_str::<Envelope>(&body) {
 Ok(envelope) => handler(envelope),
 Err(error) => {
 tracing::warn!(channel = %channel, %error, "dropping undecodable envelope");
 }
 },
 Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
 tracing::warn!(channel = %channel, skipped, "subscriber lagged, messages dropped");
 }
 Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
 }
 }
 });
 self.subscriptions.lock().push(handle);
 Ok(())
 }

 pub fn unsubscribe_all(&self) {
 for handle in self.subscriptions.lock().drain(..) {
 handle.abort();
 }
 }

 /// Publishes a request envelope on `channel` carrying a fresh
 /// correlation id, subscribes to `from`'s response channel, and resolves
 /// with the matching response body or `Timeout` past the deadline.
 pub async fn request(
 &self,
 channel: &str,
 from: &str,
 to: &str,
 body: serde_json::Value,
 timeout: Option<Duration>,
 ) -> Result<serde_json::Value, BusError> {
 let correlation_id = nanoid::nanoid!(12);
 let response_channel = crate::channels::agent_responses(from);
 let mut rx = self.kv.subscribe(&response_channel)?;

 let request_payload = RequestPayload { correlation_id: correlation_id.clone(), body };
 let payload = serde_json::to_value(&request_payload)
.map_err(|e| BusError::Transport(e.to_string()))?;
 let envelope = Envelope::new(
 nanoid::nanoid!(16),
 0,
 MessageType::Request,
 from,
 to,
 payload,
 );
 self.publish(channel, &envelope).await?;

 let deadline = timeout.unwrap_or(DEFAULT_REQUEST_TIMEOUT);
 let wait = async {
 loop {
 let raw = rx.recv().await.map_err(|_| BusError::Transport("response channel closed".into()))?;
 let envelope: Envelope = serde_json::from_str(&raw)
.map_err(|e| BusError::Transport(e.to_string()))?;
 if envelope.message_type != MessageType::Response {
 continue;
 }
 let response: ResponsePayload = serde_json::from_value(envelope.payload)
.map_err(|e| BusError::Transport(e.to_string()))?;
 if response.correlation_id == correlation_id {
 return Ok(response.body);
 }
 }
 };

 match tokio::time::timeout(deadline, wait).await {
 Ok(result) => result,
 Err(_) => Err(BusError::Timeout),
 }
 }
}
