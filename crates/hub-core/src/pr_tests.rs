// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn complexity() -> Complexity {
    Complexity { score: 5, estimated_minutes: 50, suggested_model: ModelTier::Sonnet, rationale: String::new() }
}

#[test]
fn priority_ordering_is_critical_first() {
    let mut v = vec![Priority::Low, Priority::Critical, Priority::Medium, Priority::High];
    v.sort();
    v.reverse();
    assert_eq!(v, vec![Priority::Critical, Priority::High, Priority::Medium, Priority::Low]);
}

#[test]
fn new_pr_has_no_hot_assignment() {
    let pr = Pr::new("PR-001", "Do the thing", complexity());
    assert_eq!(pr.cold_state, ColdState::New);
    assert!(pr.hot.is_none());
    assert!(pr.agent_id().is_none());
    assert!(pr.hot_state().is_none());
}

#[test]
fn hot_assignment_binds_state_and_agent_together() {
    let mut pr = Pr::new("PR-002", "Other thing", complexity());
    pr.hot = Some(HotAssignment { state: HotState::InProgress, agent_id: AgentId::new("worker-agent-1") });
    assert_eq!(pr.hot_state(), Some(HotState::InProgress));
    assert_eq!(pr.agent_id().map(|a| a.as_str()), Some("worker-agent-1"));
}

#[test]
fn approved_is_terminal() {
    assert!(ColdState::Approved.is_terminal());
    assert!(!ColdState::Completed.is_terminal());
    assert!(!ColdState::New.is_terminal());
}
