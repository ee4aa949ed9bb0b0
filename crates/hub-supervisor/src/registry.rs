// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent registry: in-memory map of live agents, kept current by
//! heartbeat receipt, swept periodically for crash detection.

use hub_core::{Agent, AgentId};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy)]
pub struct RegistrySweepConfig {
 pub heartbeat_timeout_ms: u64,
}

impl Default for RegistrySweepConfig {
 fn default() -> Self {
 Self { heartbeat_timeout_ms: 90_000 }
 }
}

#[derive(Default)]
pub struct AgentRegistry {
 agents: HashMap<AgentId, Agent>,
}

impl AgentRegistry {
 pub fn new() -> Self {
 Self::default()
 }

 pub fn register(&mut self, agent: Agent) {
 self.agents.insert(agent.id.clone(), agent);
 }

 pub fn deregister(&mut self, agent_id: &AgentId) {
 self.agents.remove(agent_id);
 }

 pub fn get(&self, agent_id: &AgentId) -> Option<&Agent> {
 self.agents.get(agent_id)
 }

 pub fn get_mut(&mut self, agent_id: &AgentId) -> Option<&mut Agent> {
 self.agents.get_mut(agent_id)
 }

 pub fn all(&self) -> impl Iterator<Item = &Agent> {
 self.agents.values()
 }

 /// Updates `last_heartbeat_ms` for the agent that sent a heartbeat.
 pub fn record_heartbeat(&mut self, agent_id: &AgentId, now_ms: u64) {
 if let Some(agent) = self.agents.get_mut(agent_id) {
 agent.last_heartbeat_ms = now_ms;
 }
 }

 /// Sweeps for agents whose last heartbeat is older than the timeout and
 /// returns their ids (the crashed set). Caller passes these to the
 /// supervisor to decide on respawning.
 ///
 /// Strictly greater-than on the gap, mirroring the heartbeat aliveness
 /// check's `>` boundary convention (distinct from lease expiry's `>=`).
 pub fn sweep_crashed(&self, now_ms: u64, config: RegistrySweepConfig) -> Vec<AgentId> {
 self.agents
.values()
.filter(|agent| now_ms.saturating_sub(agent.last_heartbeat_ms) > config.heartbeat_timeout_ms)
.map(|agent| agent.id.clone())
.collect()
 }
}
