// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Transition tables and checked transitions for the PR cold-state machine
//! and the agent lifecycle machine.
//!
//! Both tables are plain data so the "transition relation equals the table"
//! testable property can be checked directly against them.

use crate::agent::AgentLifecycle;
use crate::pr::ColdState;
use thiserror::Error;

/// A transition was attempted that the table does not allow.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid transition from {from} to {to}; valid targets: {valid:?}")]
pub struct InvalidTransition {
 pub from: String,
 pub to: String,
 pub valid: Vec<String>,
}

/// Cold-state transition edges, verbatim from the fixed transition table.
pub const COLD_EDGES: &[(ColdState, ColdState)] = &[
 (ColdState::New, ColdState::Ready),
 (ColdState::New, ColdState::Blocked),
 (ColdState::Blocked, ColdState::Ready),
 (ColdState::Ready, ColdState::Planned),
 (ColdState::Planned, ColdState::Completed),
 (ColdState::Completed, ColdState::Approved),
 (ColdState::Completed, ColdState::Broken),
 (ColdState::Broken, ColdState::Planned),
];

/// Valid targets for a given cold state, in table order.
pub fn cold_valid_targets(from: ColdState) -> Vec<ColdState> {
 COLD_EDGES.iter().filter(|(f, _)| *f == from).map(|(_, t)| *t).collect()
}

/// Check (and describe) a proposed cold-state transition without mutating
/// anything; callers apply the new state themselves once accepted.
pub fn check_cold_transition(from: ColdState, to: ColdState) -> Result<(), InvalidTransition> {
 if cold_valid_targets(from).contains(&to) {
 Ok(())
 } else {
 Err(InvalidTransition {
 from: from.to_string(),
 to: to.to_string(),
 valid: cold_valid_targets(from).iter().map(|s| s.to_string()).collect(),
 })
 }
}

/// Agent lifecycle transition edges, verbatim from the fixed transition table.
pub const AGENT_EDGES: &[(AgentLifecycle, AgentLifecycle)] = &[
 (AgentLifecycle::Initializing, AgentLifecycle::Idle),
 (AgentLifecycle::Idle, AgentLifecycle::Working),
 (AgentLifecycle::Working, AgentLifecycle::Completing),
 (AgentLifecycle::Working, AgentLifecycle::Failed),
 (AgentLifecycle::Completing, AgentLifecycle::Idle),
 (AgentLifecycle::Failed, AgentLifecycle::Idle),
 (AgentLifecycle::Idle, AgentLifecycle::ShuttingDown),
 (AgentLifecycle::Working, AgentLifecycle::ShuttingDown),
 (AgentLifecycle::Failed, AgentLifecycle::ShuttingDown),
 (AgentLifecycle::ShuttingDown, AgentLifecycle::Stopped),
];

pub fn agent_valid_targets(from: AgentLifecycle) -> Vec<AgentLifecycle> {
 AGENT_EDGES.iter().filter(|(f, _)| *f == from).map(|(_, t)| *t).collect()
}

pub fn check_agent_transition(from: AgentLifecycle, to: AgentLifecycle) -> Result<(), InvalidTransition> {
 if agent_valid_targets(from).contains(&to) {
 Ok(())
 } else {
 Err(InvalidTransition {
 from: from.to_string(),
 to: to.to_string(),
 valid: agent_valid_targets(from).iter().map(|s| s.to_string()).collect(),
 })
 }
}

/// Bounded transition history (last `CAPACITY` entries per PR/agent);
/// overflow truncates the oldest entry first.
#[derive(Debug, Clone, Default)]
pub struct TransitionHistory<T> {
 entries: std::collections::VecDeque<(T, u64)>,
}

const HISTORY_CAPACITY: usize = 100;

impl<T: Clone> TransitionHistory<T> {
 pub fn new() -> Self {
 Self { entries: std::collections::VecDeque::new() }
 }

 pub fn record(&mut self, state: T, at_ms: u64) {
 if self.entries.len() >= HISTORY_CAPACITY {
 self.entries.pop_front();
 }
 self.entries.push_back((state, at_ms));
 }

 pub fn len(&self) -> usize {
 self.entries.len()
 }

 pub fn is_empty(&self) -> bool {
 self.entries.is_empty()
 }

 pub fn iter(&self) -> impl Iterator<Item = &(T, u64)> {
 self.entries.iter()
 }
}

#[cfg(test)]
#[path = "state_machine_tests.rs"]
mod tests;
