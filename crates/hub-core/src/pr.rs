// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The PR (work unit) data model: attributes, dynamic state, and the
//! invariants that keep cold and hot state consistent with each other.

use crate::ids::{AgentId, PrId};
use crate::simple_display;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::PathBuf;

/// Priority, ordered so that `Critical > High > Medium > Low` in a
/// descending sort (matches the scheduler's sort key).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
 Low,
 Medium,
 High,
 Critical,
}

simple_display! {
 Priority {
 Low => "low",
 Medium => "medium",
 High => "high",
 Critical => "critical",
 }
}

/// Advisory suggested model tier; never interpreted by the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelTier {
 Haiku,
 Sonnet,
 Opus,
}

simple_display! {
 ModelTier {
 Haiku => "haiku",
 Sonnet => "sonnet",
 Opus => "opus",
 }
}

/// Complexity score and estimate, as emitted by the (out-of-scope) complexity
/// heuristic and carried verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Complexity {
 /// In `[1, 10]`.
 pub score: u8,
 /// In `[1, 600]`.
 pub estimated_minutes: u32,
 pub suggested_model: ModelTier,
 #[serde(default)]
 pub rationale: String,
}

/// Durable PR state, written to the manifest, surviving hub restart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColdState {
 New,
 Ready,
 Blocked,
 Planned,
 Completed,
 Approved,
 Broken,
}

simple_display! {
 ColdState {
 New => "new",
 Ready => "ready",
 Blocked => "blocked",
 Planned => "planned",
 Completed => "completed",
 Approved => "approved",
 Broken => "broken",
 }
}

impl ColdState {
 /// `approved` is terminal.
 pub fn is_terminal(self) -> bool {
 matches!(self, ColdState::Approved)
 }
}

/// Ephemeral PR state, held only in the KV store, discarded on hub crash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HotState {
 Investigating,
 Planning,
 InProgress,
 UnderReview,
}

simple_display! {
 HotState {
 Investigating => "investigating",
 Planning => "planning",
 InProgress => "in-progress",
 UnderReview => "under-review",
 }
}

/// The hot half of a PR's dynamic state. Bundling `state` and `agent_id`
/// together in one `Option` makes "hot_state is present iff agent_id is
/// present" a type-level guarantee rather than a convention two independent
/// fields could drift out of sync on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HotAssignment {
 pub state: HotState,
 pub agent_id: AgentId,
}

/// A PR (work unit): attributes plus dynamic state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pr {
 pub id: PrId,
 pub title: String,
 /// Other PR ids this PR depends on. Must be acyclic; enforced by
 /// the dependency graph at build time, not here.
 pub dependencies: BTreeSet<PrId>,
 pub files: BTreeSet<PathBuf>,
 pub priority: Priority,
 pub complexity: Complexity,
 pub cold_state: ColdState,
 /// `None` means no agent currently owns this PR.
 pub hot: Option<HotAssignment>,
 pub last_transition: u64,
}

impl Pr {
 pub fn new(id: impl Into<PrId>, title: impl Into<String>, complexity: Complexity) -> Self {
 Self {
 id: id.into(),
 title: title.into(),
 dependencies: BTreeSet::new(),
 files: BTreeSet::new(),
 priority: Priority::Medium,
 complexity,
 cold_state: ColdState::New,
 hot: None,
 last_transition: 0,
 }
 }

 /// The agent currently owning this PR, if any; at most one.
 pub fn agent_id(&self) -> Option<&AgentId> {
 self.hot.as_ref().map(|h| &h.agent_id)
 }

 pub fn hot_state(&self) -> Option<HotState> {
 self.hot.as_ref().map(|h| h.state)
 }
}

#[cfg(test)]
#[path = "pr_tests.rs"]
mod tests;
