// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Example agent binary built on [`AgentRuntime`] and [`EchoWorker`]:
//! registers, heartbeats, and completes every assignment it's handed
//! without doing any real work. Useful for exercising the hub end to end
//! and as a template for a real worker.
//!
//! `AGENT_ID` and `AGENT_TYPE` come from the supervisor's spawn environment.
//! `KV_URL` is read but only `inprocess://` is meaningful here:
//! [`InProcessKv`] lives in the hub process's own memory, so a binary
//! spawned as a genuine child process gets its own empty, disconnected
//! store rather than the hub's. This binary is a same-process demo
//! harness, not a deployable worker — a real deployment needs a `KvStore`
//! adapter that talks to an external store over the network, which is out
//! of scope here.

use std::sync::Arc;
use std::time::Duration;

use hub_bus::{channels, InProcessKv, MessageBus};
use hub_core::{AgentType, Capabilities, ModelTier, SystemClock};
use hub_supervisor::{AgentRuntime, EchoWorker, RuntimeConfig};
use hub_wire::{AssignmentPayload, Envelope, MessageType};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
 tracing_subscriber::fmt().with_env_filter(tracing_subscriber::EnvFilter::from_default_env()).init();

 let agent_id = std::env::var("AGENT_ID").unwrap_or_else(|_| format!("echo-agent-{}", nanoid::nanoid!(6)));
 let agent_type = match std::env::var("AGENT_TYPE").as_deref() {
 Ok("planning") => AgentType::Planning,
 Ok("qc") => AgentType::Qc,
 Ok("review") => AgentType::Review,
 _ => AgentType::Worker,
 };

 let kv = InProcessKv::shared();
 let bus = Arc::new(MessageBus::new(kv));
 let runtime = Arc::new(AgentRuntime::new(
 agent_id.clone(),
 agent_type,
 Capabilities { max_complexity: 10, preferred_tier: ModelTier::Sonnet },
 bus.clone(),
 Arc::new(EchoWorker),
 Arc::new(SystemClock),
 RuntimeConfig::default(),
 ));

 if let Err(error) = runtime.start().await {
 error!(%error, "failed to register with hub");
 std::process::exit(1);
 }
 info!(%agent_id, %agent_type, "registered");

 let assignment_runtime = runtime.clone();
 let assignment_channel = channels::agent_assignments(&agent_id);
 if let Err(error) = bus.subscribe(&assignment_channel, move |envelope: Envelope| {
 if envelope.message_type != MessageType::Assignment {
 return;
 }
 let runtime = assignment_runtime.clone();
 tokio::spawn(async move {
 let payload: AssignmentPayload = match serde_json::from_value(envelope.payload) {
 Ok(payload) => payload,
 Err(error) => {
 warn!(%error, "dropping malformed assignment payload");
 return;
 }
 };
 if let Err(error) = runtime.handle_assignment(payload.assignment).await {
 warn!(%error, "assignment handling failed");
 }
 });
 }) {
 error!(%error, "failed to subscribe to assignment channel");
 std::process::exit(1);
 }

 let heartbeat_runtime = runtime.clone();
 tokio::spawn(async move {
 let mut interval = tokio::time::interval(Duration::from_millis(30_000));
 loop {
 interval.tick().await;
 if let Err(error) = heartbeat_runtime.emit_heartbeat(None, 0).await {
 warn!(%error, "failed to emit heartbeat");
 }
 }
 });

 if let Err(error) = tokio::signal::ctrl_c().await {
 error!(%error, "failed to listen for shutdown signal");
 }
}
