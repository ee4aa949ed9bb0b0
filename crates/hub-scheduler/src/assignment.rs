// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Assignment manager: matches selected PRs to compatible idle agents.

use hub_core::{Agent, AgentId, AgentType, ColdState, PrId};
use std::collections::BTreeMap;

/// Agent types eligible to pick up a PR in a given cold state (fixed table).
/// Returns `&[]` for cold states that aren't ever agent-eligible directly
/// (`blocked`), so callers never need a wildcard match.
pub fn eligible_agent_types(cold_state: ColdState) -> &'static [AgentType] {
 match cold_state {
 ColdState::New | ColdState::Ready => &[AgentType::Planning],
 ColdState::Planned | ColdState::Broken => &[AgentType::Worker],
 ColdState::Completed => &[AgentType::Qc],
 ColdState::Approved => &[AgentType::Review],
 ColdState::Blocked => &[],
 }
}

pub fn max_assignments_per_agent(agent_type: AgentType) -> usize {
 match agent_type {
 AgentType::Worker => 1,
 AgentType::Qc | AgentType::Review => 2,
 AgentType::Planning => 1,
 }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
 FirstAvailable,
 LoadBalanced,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignmentRecord {
 pub pr_id: PrId,
 pub agent_id: AgentId,
 pub assigned_at_ms: u64,
}

/// Tracks in-flight assignment counts per agent so `max_assignments_per_agent`
/// can be enforced independently of `Agent.assigned_pr` (which only records
/// a single slot and can't represent qc/review's concurrency of 2).
#[derive(Debug, Default)]
pub struct AssignmentManager {
 strategy: Strategy,
 in_flight: BTreeMap<AgentId, usize>,
}

impl Default for Strategy {
 fn default() -> Self {
 Strategy::FirstAvailable
 }
}

impl AssignmentManager {
 pub fn new(strategy: Strategy) -> Self {
 Self { strategy, in_flight: BTreeMap::new() }
 }

 fn capacity_remaining(&self, agent: &Agent) -> usize {
 let used = self.in_flight.get(&agent.id).copied().unwrap_or(0);
 max_assignments_per_agent(agent.agent_type).saturating_sub(used)
 }

 fn candidate_agents<'a>(
 &self,
 agents: &'a [Agent],
 cold_state: ColdState,
 ) -> Vec<&'a Agent> {
 let eligible = eligible_agent_types(cold_state);
 agents
.iter()
.filter(|agent| eligible.contains(&agent.agent_type))
.filter(|agent| agent.is_idle() || self.in_flight.contains_key(&agent.id))
.filter(|agent| self.capacity_remaining(agent) > 0)
.collect()
 }

 fn pick<'a>(&self, candidates: Vec<&'a Agent>) -> Option<&'a Agent> {
 match self.strategy {
 Strategy::FirstAvailable => candidates.into_iter().next(),
 Strategy::LoadBalanced => candidates
.into_iter()
.min_by_key(|agent| (self.in_flight.get(&agent.id).copied().unwrap_or(0), agent.started_at_ms)),
 }
 }

 /// Assigns each `(pr_id, cold_state)` pair to a compatible agent in
 /// order, recording the new load so later picks in the same batch see
 /// it. PRs with no compatible idle agent are silently skipped; the
 /// caller's `selected` set simply shrinks to `assignments.len()`.
 pub fn assign(
 &mut self,
 selected: &[(PrId, ColdState)],
 agents: &[Agent],
 now_ms: u64,
 ) -> Vec<AssignmentRecord> {
 let mut records = Vec::new();
 for (pr_id, cold_state) in selected {
 let candidates = self.candidate_agents(agents, *cold_state);
 let Some(agent) = self.pick(candidates) else { continue };
 *self.in_flight.entry(agent.id.clone()).or_insert(0) += 1;
 records.push(AssignmentRecord {
 pr_id: pr_id.clone(),
 agent_id: agent.id.clone(),
 assigned_at_ms: now_ms,
 });
 }
 records
 }

 pub fn release(&mut self, agent_id: &AgentId) {
 if let Some(count) = self.in_flight.get_mut(agent_id) {
 *count = count.saturating_sub(1);
 if *count == 0 {
 self.in_flight.remove(agent_id);
 }
 }
 }
}

#[cfg(test)]
mod tests {
 use super::*;
 use hub_core::{Capabilities, ModelTier};

 fn agent(id: &str, agent_type: AgentType, started_at_ms: u64) -> Agent {
 let mut agent = Agent::new(
 AgentId::new(id),
 agent_type,
 started_at_ms,
 Capabilities { max_complexity: 10, preferred_tier: ModelTier::Sonnet },
 );
 agent.lifecycle = hub_core::AgentLifecycle::Idle;
 agent
 }

 #[test]
 fn compatibility_table_matches_fixed_mapping() {
 assert_eq!(eligible_agent_types(ColdState::New), &[AgentType::Planning]);
 assert_eq!(eligible_agent_types(ColdState::Ready), &[AgentType::Planning]);
 assert_eq!(eligible_agent_types(ColdState::Planned), &[AgentType::Worker]);
 assert_eq!(eligible_agent_types(ColdState::Broken), &[AgentType::Worker]);
 assert_eq!(eligible_agent_types(ColdState::Completed), &[AgentType::Qc]);
 assert_eq!(eligible_agent_types(ColdState::Approved), &[AgentType::Review]);
 assert!(eligible_agent_types(ColdState::Blocked).is_empty());
 }

 #[test]
 fn first_available_picks_registration_order() {
 let agents = vec![agent("worker-agent-1", AgentType::Worker, 0), agent("worker-agent-2", AgentType::Worker, 0)];
 let mut manager = AssignmentManager::new(Strategy::FirstAvailable);
 let records = manager.assign(&[(PrId::new("PR-1"), ColdState::Planned)], &agents, 100);
 assert_eq!(records[0].agent_id, AgentId::new("worker-agent-1"));
 }

 #[test]
 fn worker_capped_at_one_concurrent_assignment() {
 let agents = vec![agent("worker-agent-1", AgentType::Worker, 0)];
 let mut manager = AssignmentManager::new(Strategy::FirstAvailable);
 let first = manager.assign(&[(PrId::new("PR-1"), ColdState::Planned)], &agents, 100);
 assert_eq!(first.len(), 1);
 let second = manager.assign(&[(PrId::new("PR-2"), ColdState::Planned)], &agents, 100);
 assert!(second.is_empty());
 }

 #[test]
 fn qc_allows_two_concurrent_assignments() {
 let agents = vec![agent("qc-agent-1", AgentType::Qc, 0)];
 let mut manager = AssignmentManager::new(Strategy::FirstAvailable);
 let selected = [(PrId::new("PR-1"), ColdState::Completed), (PrId::new("PR-2"), ColdState::Completed)];
 let records = manager.assign(&selected, &agents, 100);
 assert_eq!(records.len(), 2);
 let third = manager.assign(&[(PrId::new("PR-3"), ColdState::Completed)], &agents, 100);
 assert!(third.is_empty());
 }

 #[test]
 fn load_balanced_prefers_least_loaded_then_earliest_registered() {
 let agents = vec![
 agent("qc-agent-1", AgentType::Qc, 0),
 agent("qc-agent-2", AgentType::Qc, 10),
 ];
 let mut manager = AssignmentManager::new(Strategy::LoadBalanced);
 manager.assign(&[(PrId::new("PR-1"), ColdState::Completed)], &agents, 100);
 let records = manager.assign(&[(PrId::new("PR-2"), ColdState::Completed)], &agents, 100);
 assert_eq!(records[0].agent_id, AgentId::new("qc-agent-2"));
 }

 #[test]
 fn release_frees_capacity_for_reassignment() {
 let agents = vec![agent("worker-agent-1", AgentType::Worker, 0)];
 let mut manager = AssignmentManager::new(Strategy::FirstAvailable);
 manager.assign(&[(PrId::new("PR-1"), ColdState::Planned)], &agents, 100);
 manager.release(&AgentId::new("worker-agent-1"));
 let records = manager.assign(&[(PrId::new("PR-2"), ColdState::Planned)], &agents, 200);
 assert_eq!(records.len(), 1);
 }
}
