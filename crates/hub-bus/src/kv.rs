// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The KV store capability interface and an in-process implementation
//! used for tests and single-host mode. No specific product is named; a
//! real deployment plugs in an adapter that talks to an external store over
//! this same trait.

use crate::connection::ConnectionState;
use crate::error::BusError;
use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::broadcast;

#[async_trait]
pub trait KvStore: Send + Sync {
 async fn get(&self, key: &str) -> Result<Option<String>, BusError>;
 async fn set(&self, key: &str, value: &str) -> Result<(), BusError>;
 async fn del(&self, keys: &[&str]) -> Result<u64, BusError>;
 async fn expire(&self, key: &str, seconds: u64) -> Result<bool, BusError>;
 async fn sadd(&self, key: &str, members: &[&str]) -> Result<u64, BusError>;
 async fn smembers(&self, key: &str) -> Result<Vec<String>, BusError>;
 async fn scan(&self, pattern: &str) -> Result<Vec<String>, BusError>;
 async fn publish(&self, channel: &str, payload: &str) -> Result<u64, BusError>;
 fn subscribe(&self, channel: &str) -> Result<broadcast::Receiver<String>, BusError>;
 fn connection_state(&self) -> ConnectionState;
}

/// An in-process `KvStore`: a `DashMap` for key/value and set storage, and a
/// `tokio::sync::broadcast` channel per pub/sub channel name. Suitable for
/// single-host deployments and for tests that don't want a real backend.
pub struct InProcessKv {
 strings: DashMap<String, String>,
 sets: DashMap<String, std::collections::HashSet<String>>,
 channels: DashMap<String, broadcast::Sender<String>>,
 state: Mutex<ConnectionState>,
}

impl Default for InProcessKv {
 fn default() -> Self {
 Self::new()
 }
}

impl InProcessKv {
 pub fn new() -> Self {
 Self {
 strings: DashMap::new(),
 sets: DashMap::new(),
 channels: DashMap::new(),
 state: Mutex::new(ConnectionState::Connected),
 }
 }

 pub fn shared() -> Arc<Self> {
 Arc::new(Self::new())
 }

 /// Simulates a disconnection; subsequent operations fail with `NotConnected`.
 pub fn set_disconnected(&self) {
 *self.state.lock() = ConnectionState::Disconnected;
 }

 pub fn set_connected(&self) {
 *self.state.lock() = ConnectionState::Connected;
 }

 fn require_connected(&self) -> Result<(), BusError> {
 if *self.state.lock() == ConnectionState::Connected {
 Ok(())
 } else {
 Err(BusError::NotConnected)
 }
 }

 fn channel_sender(&self, channel: &str) -> broadcast::Sender<String> {
 self.channels
.entry(channel.to_string())
.or_insert_with(|| broadcast::channel(1024).0)
.clone()
 }
}

#[async_trait]
impl KvStore for InProcessKv {
 async fn get(&self, key: &str) -> Result<Option<String>, BusError> {
 self.require_connected()?;
 Ok(self.strings.get(key).map(|v| v.clone()))
 }

 async fn set(&self, key: &str, value: &str) -> Result<(), BusError> {
 self.require_connected()?;
 self.strings.insert(key.to_string(), value.to_string());
 Ok(())
 }

 async fn del(&self, keys: &[&str]) -> Result<u64, BusError> {
 self.require_connected()?;
 let mut removed = 0u64;
 for key in keys {
 if self.strings.remove(*key).is_some() {
 removed += 1;
 }
 if self.sets.remove(*key).is_some() {
 removed += 1;
 }
 }
 Ok(removed)
 }

 async fn expire(&self, key: &str, _seconds: u64) -> Result<bool, BusError> {
 self.require_connected()?;
 // No TTL bookkeeping in the in-process backend; presence is enough
 // for tests that only assert the key still exists.
 Ok(self.strings.contains_key(key) || self.sets.contains_key(key))
 }

 async fn sadd(&self, key: &str, members: &[&str]) -> Result<u64, BusError> {
 self.require_connected()?;
 let mut entry = self.sets.entry(key.to_string()).or_default();
 let mut added = 0u64;
 for member in members {
 if entry.insert(member.to_string()) {
 added += 1;
 }
 }
 Ok(added)
 }

 async fn smembers(&self, key: &str) -> Result<Vec<String>, BusError> {
 self.require_connected()?;
 Ok(self
.sets
.get(key)
.map(|set| set.iter().cloned().collect())
.unwrap_or_default())
 }

 async fn scan(&self, pattern: &str) -> Result<Vec<String>, BusError> {
 self.require_connected()?;
 let prefix = pattern.trim_end_matches('*');
 Ok(self
.strings
.iter()
.map(|entry| entry.key.clone())
.filter(|key| key.starts_with(prefix))
.collect())
 }

 async fn publish(&self, channel: &str, payload: &str) -> Result<u64, BusError> {
 self.require_connected()?;
 let sender = self.channel_sender(channel);
 Ok(sender.send(payload.to_string()).unwrap_or(0) as u64)
 }

 fn subscribe(&self, channel: &str) -> Result<broadcast::Receiver<String>, BusError> {
 if *self.state.lock() != ConnectionState::Connected {
 return Err(BusError::NotConnected);
 }
 Ok(self.channel_sender(channel).subscribe())
 }

 fn connection_state(&self) -> ConnectionState {
 *self.state.lock()
 }
}
