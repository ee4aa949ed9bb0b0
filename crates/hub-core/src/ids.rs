// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Identifier newtypes for PRs, agents, and leases.

use crate::define_string_id;

define_string_id! {
 /// Stable identifier for a PR (work unit), e.g. `"PR-001"`.
 ///
 /// Unlike [`AgentId`], a `PrId` is assigned externally by the manifest,
 /// not generated by the hub.
 pub struct PrId
}

define_string_id! {
 /// Identifier for a live agent process, e.g. `"worker-agent-3"`.
 pub struct AgentId
}

define_string_id! {
 /// Identifier for a file lease.
 pub struct LeaseId
}

impl AgentId {
 /// Allocate the next id for an agent of the given type, following the
 /// `${type}-agent-${n}` convention.
 pub fn allocate(agent_type: &str, n: u64) -> Self {
 Self(format!("{agent_type}-agent-{n}"))
 }
}

impl LeaseId {
 /// Generate a fresh, random lease id.
 pub fn generate() -> Self {
 Self(format!("lease-{}", nanoid::nanoid!(12)))
 }
}
