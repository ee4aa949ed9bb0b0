// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dependency graph over PRs: availability, completion propagation,
//! cycle detection, and ancestor/descendant queries.

use hub_core::{ColdState, Complexity, PrId, Priority};
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GraphError {
 #[error("dependency cycle detected involving: {0:?}")]
 Cycle(Vec<PrId>),
 #[error("unknown pr id: {0}")]
 UnknownPr(PrId),
}

/// One node in the dependency graph. Mirrors the subset of `Pr` the
/// scheduler needs; built by projecting the manifest/cold-state model.
#[derive(Debug, Clone)]
pub struct Node {
 pub id: PrId,
 pub deps: BTreeSet<PrId>,
 pub dependents: BTreeSet<PrId>,
 pub files: BTreeSet<PathBuf>,
 pub state: ColdState,
 pub priority: Priority,
 pub complexity: Complexity,
}

/// States a dependency must reach before a dependent becomes available.
const SATISFYING_STATES: [ColdState; 2] = [ColdState::Completed, ColdState::Approved];

/// States from which a PR can be selected for work at all.
const AVAILABLE_STATES: [ColdState; 5] = [
 ColdState::New,
 ColdState::Ready,
 ColdState::Planned,
 ColdState::Broken,
 ColdState::Completed,
];

pub struct DependencyGraph {
 nodes: BTreeMap<PrId, Node>,
}

impl DependencyGraph {
 /// Builds the graph from `(id, deps, files, state, priority, complexity)`
 /// tuples, populating reverse (dependent) edges in a second pass, then
 /// checks for cycles.
 pub fn build(
 entries: impl IntoIterator<
 Item = (PrId, BTreeSet<PrId>, BTreeSet<PathBuf>, ColdState, Priority, Complexity),
 >,
 ) -> Result<Self, GraphError> {
 let mut nodes = BTreeMap::new();
 for (id, deps, files, state, priority, complexity) in entries {
 nodes.insert(
 id.clone(),
 Node { id, deps, dependents: BTreeSet::new(), files, state, priority, complexity },
 );
 }

 let edges: Vec<(PrId, PrId)> = nodes
.values()
.flat_map(|node| node.deps.iter().map(|dep| (dep.clone(), node.id.clone())))
.collect();
 for (dep, dependent) in edges {
 if let Some(dep_node) = nodes.get_mut(&dep) {
 dep_node.dependents.insert(dependent);
 }
 }

 let graph = Self { nodes };
 if let Some(cycle) = graph.find_cycle() {
 return Err(GraphError::Cycle(cycle));
 }
 Ok(graph)
 }

 pub fn get(&self, id: &PrId) -> Option<&Node> {
 self.nodes.get(id)
 }

 pub fn len(&self) -> usize {
 self.nodes.len()
 }

 pub fn is_empty(&self) -> bool {
 self.nodes.is_empty()
 }

 /// Kahn's algorithm: if a topological order covering every node can't be
 /// produced, the leftover nodes form at least one cycle.
 fn find_cycle(&self) -> Option<Vec<PrId>> {
 let mut in_degree: BTreeMap<PrId, usize> =
 self.nodes.keys().map(|id| (id.clone(), 0)).collect();
 for node in self.nodes.values() {
 for dep in &node.deps {
 if self.nodes.contains_key(dep) {
 *in_degree.entry(node.id.clone()).or_default() += 1;
 }
 }
 }

 let mut queue: VecDeque<PrId> = in_degree
.iter()
.filter(|(_, &deg)| deg == 0)
.map(|(id, _)| id.clone())
.collect();
 let mut visited = 0usize;

 while let Some(id) = queue.pop_front() {
 visited += 1;
 if let Some(node) = self.nodes.get(&id) {
 for dependent in &node.dependents {
 if let Some(deg) = in_degree.get_mut(dependent) {
 *deg -= 1;
 if *deg == 0 {
 queue.push_back(dependent.clone());
 }
 }
 }
 }
 }

 if visited == self.nodes.len() {
 None
 } else {
 Some(
 in_degree
.into_iter()
.filter(|(_, deg)| *deg > 0)
.map(|(id, _)| id)
.collect(),
 )
 }
 }

 /// PRs eligible for selection right now: in an available state with
 /// every dependency satisfied. `blocked` nodes are excluded even if
 /// their deps happen to be satisfied already.
 pub fn available(&self) -> Vec<&Node> {
 self.nodes
.values()
.filter(|node| AVAILABLE_STATES.contains(&node.state))
.filter(|node| self.deps_satisfied(node))
.collect()
 }

 fn deps_satisfied(&self, node: &Node) -> bool {
 node.deps.iter().all(|dep| {
 self.nodes
.get(dep)
.map(|dep_node| SATISFYING_STATES.contains(&dep_node.state))
.unwrap_or(false)
 })
 }

 pub fn mark_complete(&mut self, id: &PrId) -> Result<(), GraphError> {
 let node = self.nodes.get_mut(id).ok_or_else(|| GraphError::UnknownPr(id.clone()))?;
 node.state = ColdState::Completed;
 Ok(())
 }

 /// Sets a node's cold state directly. Unlike `mark_complete`, the caller
 /// decides the target state; used when a completion's next state depends
 /// on which stage of the lifecycle just finished (planning vs. worker vs.
 /// qc vs. review).
 pub fn set_state(&mut self, id: &PrId, state: ColdState) -> Result<(), GraphError> {
 let node = self.nodes.get_mut(id).ok_or_else(|| GraphError::UnknownPr(id.clone()))?;
 node.state = state;
 Ok(())
 }

 /// BFS over ancestors (transitive dependencies), returned in the order
 /// discovered so the result is topological relative to the start node.
 pub fn dependency_chain(&self, id: &PrId) -> Vec<PrId> {
 let mut seen = BTreeSet::new();
 let mut order = Vec::new();
 let mut queue = VecDeque::new();
 if let Some(node) = self.nodes.get(id) {
 queue.extend(node.deps.iter().cloned());
 }
 while let Some(current) = queue.pop_front() {
 if !seen.insert(current.clone()) {
 continue;
 }
 order.push(current.clone());
 if let Some(node) = self.nodes.get(&current) {
 queue.extend(node.deps.iter().cloned());
 }
 }
 order
 }

 /// Transitive closure of `dependents` reachable forward from `id`.
 pub fn dependents(&self, id: &PrId) -> BTreeSet<PrId> {
 let mut seen = BTreeSet::new();
 let mut queue = VecDeque::new();
 if let Some(node) = self.nodes.get(id) {
 queue.extend(node.dependents.iter().cloned());
 }
 while let Some(current) = queue.pop_front() {
 if !seen.insert(current.clone()) {
 continue;
 }
 if let Some(node) = self.nodes.get(&current) {
 queue.extend(node.dependents.iter().cloned());
 }
 }
 seen
 }
}

#[cfg(test)]
#[path = "graph_tests.rs"]
mod tests;
