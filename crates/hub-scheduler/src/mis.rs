// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Greedy priority-biased MIS scheduler. Deliberately suboptimal
//! (exact maximum independent set is NP-hard); adequate because well-factored
//! manifests keep conflict density low.

use crate::graph::Node;
use hub_core::PrId;
use std::cmp::Reverse;
use std::collections::BTreeSet;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockedPr {
 pub id: PrId,
 pub conflicting_with: Vec<PrId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SchedulingResult {
 pub selected: Vec<PrId>,
 pub blocked: Vec<BlockedPr>,
}

/// Runs the scheduling pass. `working_files` is the union of files already
/// claimed by in-progress PRs; `idle_capacity` caps how many new PRs can be
/// selected regardless of how many pass the conflict check.
pub fn schedule(candidates: &[&Node], working_files: &BTreeSet<PathBuf>, idle_capacity: usize) -> SchedulingResult {
 let mut sorted: Vec<&Node> = candidates.to_vec();
 sorted.sort_by_key(|node| (Reverse(node.priority), Reverse(node.complexity.score), node.id.clone()));

 let mut chosen_files = working_files.clone();
 let mut result = SchedulingResult::default();

 for node in sorted {
 if result.selected.len() >= idle_capacity {
 result.blocked.push(BlockedPr { id: node.id.clone(), conflicting_with: Vec::new() });
 continue;
 }
 if node.files.is_disjoint(&chosen_files) {
 chosen_files.extend(node.files.iter().cloned());
 result.selected.push(node.id.clone());
 } else {
 let conflicting_with = conflicting_peer_ids(node, candidates, &result.selected);
 result.blocked.push(BlockedPr { id: node.id.clone(), conflicting_with });
 }
 }

 result
}

fn conflicting_peer_ids(node: &Node, candidates: &[&Node], selected: &[PrId]) -> Vec<PrId> {
 candidates
.iter()
.filter(|peer| selected.contains(&peer.id) && !peer.files.is_disjoint(&node.files))
.map(|peer| peer.id.clone())
.collect()
}

#[cfg(test)]
mod tests {
 use super::*;
 use crate::graph::DependencyGraph;
 use hub_core::{ColdState, Complexity, ModelTier, Priority};

 fn node(
 id: &str,
 priority: Priority,
 score: u8,
 files: &[&str],
 ) -> (PrId, BTreeSet<PrId>, BTreeSet<PathBuf>, ColdState, Priority, Complexity) {
 (
 PrId::new(id),
 BTreeSet::new(),
 files.iter().map(PathBuf::from).collect(),
 ColdState::New,
 priority,
 Complexity { score, estimated_minutes: 10, suggested_model: ModelTier::Haiku, rationale: String::new() },
 )
 }

 #[test]
 fn higher_priority_wins_conflicting_files() {
 let graph = DependencyGraph::build([
 node("PR-low", Priority::Low, 5, &["a.rs"]),
 node("PR-critical", Priority::Critical, 1, &["a.rs"]),
 ])
.unwrap();
 let nodes: Vec<&Node> =
 [PrId::new("PR-low"), PrId::new("PR-critical")].iter().map(|id| graph.get(id).unwrap()).collect();
 let result = schedule(&nodes, &BTreeSet::new(), 10);
 assert_eq!(result.selected, vec![PrId::new("PR-critical")]);
 assert_eq!(result.blocked.len(), 1);
 assert_eq!(result.blocked[0].id, PrId::new("PR-low"));
 assert_eq!(result.blocked[0].conflicting_with, vec![PrId::new("PR-critical")]);
 }

 #[test]
 fn disjoint_files_both_selected() {
 let graph = DependencyGraph::build([
 node("PR-1", Priority::Medium, 3, &["a.rs"]),
 node("PR-2", Priority::Medium, 3, &["b.rs"]),
 ])
.unwrap();
 let nodes: Vec<&Node> =
 [PrId::new("PR-1"), PrId::new("PR-2")].iter().map(|id| graph.get(id).unwrap()).collect();
 let result = schedule(&nodes, &BTreeSet::new(), 10);
 assert_eq!(result.selected.len(), 2);
 assert!(result.blocked.is_empty());
 }

 #[test]
 fn working_files_forbid_new_selections_on_overlap() {
 let graph = DependencyGraph::build([node("PR-1", Priority::High, 5, &["a.rs"])]).unwrap();
 let nodes: Vec<&Node> = [PrId::new("PR-1")].iter().map(|id| graph.get(id).unwrap()).collect();
 let working: BTreeSet<PathBuf> = [PathBuf::from("a.rs")].into_iter().collect();
 let result = schedule(&nodes, &working, 10);
 assert!(result.selected.is_empty());
 assert_eq!(result.blocked.len(), 1);
 }

 #[test]
 fn idle_capacity_caps_selection_count() {
 let graph = DependencyGraph::build([
 node("PR-1", Priority::Medium, 3, &["a.rs"]),
 node("PR-2", Priority::Medium, 3, &["b.rs"]),
 node("PR-3", Priority::Medium, 3, &["c.rs"]),
 ])
.unwrap();
 let nodes: Vec<&Node> = [PrId::new("PR-1"), PrId::new("PR-2"), PrId::new("PR-3")]
.iter()
.map(|id| graph.get(id).unwrap())
.collect();
 let result = schedule(&nodes, &BTreeSet::new(), 2);
 assert_eq!(result.selected.len(), 2);
 assert_eq!(result.blocked.len(), 1);
 }

 #[test]
 fn tiebreak_by_id_is_deterministic() {
 let graph = DependencyGraph::build([
 node("PR-b", Priority::Medium, 3, &["a.rs"]),
 node("PR-a", Priority::Medium, 3, &["a.rs"]),
 ])
.unwrap();
 let nodes: Vec<&Node> =
 [PrId::new("PR-b"), PrId::new("PR-a")].iter().map(|id| graph.get(id).unwrap()).collect();
 let result = schedule(&nodes, &BTreeSet::new(), 10);
 assert_eq!(result.selected, vec![PrId::new("PR-a")]);
 }
}
