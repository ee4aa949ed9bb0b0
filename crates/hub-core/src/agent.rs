// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent identifier, attributes, and lifecycle state.

use crate::ids::{AgentId, PrId};
use crate::pr::ModelTier;
use crate::simple_display;
use serde::{Deserialize, Serialize};

/// Kind of agent, used by the assignment manager's compatibility table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentType {
 Planning,
 Worker,
 Qc,
 Review,
}

simple_display! {
 AgentType {
 Planning => "planning",
 Worker => "worker",
 Qc => "qc",
 Review => "review",
 }
}

/// The agent lifecycle state machine, distinct from the PR state
/// machine. `Stopped` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentLifecycle {
 Initializing,
 Idle,
 Working,
 Completing,
 Failed,
 ShuttingDown,
 Stopped,
}

simple_display! {
 AgentLifecycle {
 Initializing => "initializing",
 Idle => "idle",
 Working => "working",
 Completing => "completing",
 Failed => "failed",
 ShuttingDown => "shutting_down",
 Stopped => "stopped",
 }
}

impl AgentLifecycle {
 pub fn is_terminal(self) -> bool {
 matches!(self, AgentLifecycle::Stopped)
 }
}

/// What an agent is capable of handling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Capabilities {
 pub max_complexity: u8,
 pub preferred_tier: ModelTier,
}

/// Registry record for one live agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
 pub id: AgentId,
 pub agent_type: AgentType,
 pub pid: Option<u32>,
 pub started_at_ms: u64,
 pub last_heartbeat_ms: u64,
 pub assigned_pr: Option<PrId>,
 pub lifecycle: AgentLifecycle,
 pub capabilities: Capabilities,
}

impl Agent {
 pub fn new(id: AgentId, agent_type: AgentType, started_at_ms: u64, capabilities: Capabilities) -> Self {
 Self {
 id,
 agent_type,
 pid: None,
 started_at_ms,
 last_heartbeat_ms: started_at_ms,
 assigned_pr: None,
 lifecycle: AgentLifecycle::Initializing,
 capabilities,
 }
 }

 pub fn is_idle(&self) -> bool {
 self.lifecycle == AgentLifecycle::Idle
 }
}

#[cfg(test)]
#[path = "agent_tests.rs"]
mod tests;
