// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Test-only builders, available to dependent crates via the `test-support`
//! feature, keeping test fixtures in the library rather than duplicating
//! them per consumer.

use crate::agent::{Agent, AgentLifecycle, AgentType, Capabilities};
use crate::ids::AgentId;
use crate::pr::{Complexity, ModelTier, Pr, Priority};

/// Build a `Pr` with sensible defaults, overridable field by field.
pub struct PrBuilder {
    pr: Pr,
}

impl PrBuilder {
    pub fn new(id: impl Into<String>) -> Self {
        let complexity =
            Complexity { score: 5, estimated_minutes: 30, suggested_model: ModelTier::Sonnet, rationale: String::new() };
        Self { pr: Pr::new(id.into(), "test pr", complexity) }
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.pr.priority = priority;
        self
    }

    pub fn files(mut self, files: &[&str]) -> Self {
        self.pr.files = files.iter().map(std::path::PathBuf::from).collect();
        self
    }

    pub fn complexity_score(mut self, score: u8) -> Self {
        self.pr.complexity.score = score;
        self
    }

    pub fn depends_on(mut self, ids: &[&str]) -> Self {
        self.pr.dependencies = ids.iter().map(|s| (*s).into()).collect();
        self
    }

    pub fn cold_state(mut self, state: crate::pr::ColdState) -> Self {
        self.pr.cold_state = state;
        self
    }

    pub fn build(self) -> Pr {
        self.pr
    }
}

/// Build an `Agent` with sensible defaults.
pub struct AgentBuilder {
    agent: Agent,
}

impl AgentBuilder {
    pub fn new(id: impl Into<String>, agent_type: AgentType) -> Self {
        let caps = Capabilities { max_complexity: 10, preferred_tier: ModelTier::Sonnet };
        Self { agent: Agent::new(AgentId::new(id.into()), agent_type, 0, caps) }
    }

    pub fn lifecycle(mut self, lifecycle: AgentLifecycle) -> Self {
        self.agent.lifecycle = lifecycle;
        self
    }

    pub fn build(self) -> Agent {
        self.agent
    }
}
