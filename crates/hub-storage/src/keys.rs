// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! KV key layout helpers. Centralized so every reader/writer of the
//! per-PR and per-agent keys agrees on the exact string shape.

use hub_core::PrId;

pub fn pr_cold_state(pr_id: &PrId) -> String {
 format!("pr:{pr_id}:cold_state")
}

pub fn pr_hot_state(pr_id: &PrId) -> String {
 format!("pr:{pr_id}:hot_state")
}

pub fn pr_agent(pr_id: &PrId) -> String {
 format!("pr:{pr_id}:agent")
}

pub fn pr_hot_state_timestamp(pr_id: &PrId) -> String {
 format!("pr:{pr_id}:hot_state_timestamp")
}

pub const STATE_PRS: &str = "state:prs";

pub fn agent_info(agent_id: &str) -> String {
 format!("agent:{agent_id}:info")
}

/// Extracts the pr_id from a `pr:<id>:*` key, or `None` if it doesn't match
/// that shape. Used to find orphaned cache keys during crash recovery.
pub fn pr_id_from_key(key: &str) -> Option<&str> {
 let rest = key.strip_prefix("pr:")?;
 let (id, _) = rest.split_once(':')?;
 Some(id)
}

#[cfg(test)]
mod tests {
 use super::*;

 #[test]
 fn key_shapes_match_layout() {
 let id = PrId::new("PR-001");
 assert_eq!(pr_cold_state(&id), "pr:PR-001:cold_state");
 assert_eq!(pr_hot_state(&id), "pr:PR-001:hot_state");
 assert_eq!(pr_agent(&id), "pr:PR-001:agent");
 assert_eq!(pr_hot_state_timestamp(&id), "pr:PR-001:hot_state_timestamp");
 assert_eq!(agent_info("worker-agent-1"), "agent:worker-agent-1:info");
 }

 #[test]
 fn pr_id_extracted_from_key() {
 assert_eq!(pr_id_from_key("pr:PR-001:cold_state"), Some("PR-001"));
 assert_eq!(pr_id_from_key("agent:worker-agent-1:info"), None);
 assert_eq!(pr_id_from_key("malformed"), None);
 }
}
