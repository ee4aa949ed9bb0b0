// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Conflict detector: pairwise file-overlap check over a small
//! candidate set. Candidate sets are bounded by the agent pool size, so the
//! O(n^2) approach is deliberately simple rather than indexed.

use crate::graph::Node;
use std::collections::BTreeSet;
use std::path::PathBuf;

pub fn has_conflict(a: &Node, b: &Node) -> bool {
 !a.files.is_disjoint(&b.files)
}

pub fn conflicting_files(a: &Node, b: &Node) -> BTreeSet<PathBuf> {
 a.files.intersection(&b.files).cloned().collect()
}

/// Fraction of node pairs that conflict, in `[0, 1]`. `0.0` for fewer than
/// two nodes.
pub fn density(nodes: &[&Node]) -> f64 {
 let n = nodes.len();
 if n < 2 {
 return 0.0;
 }
 let mut conflicts = 0usize;
 for i in 0..n {
 for j in (i + 1)..n {
 if has_conflict(nodes[i], nodes[j]) {
 conflicts += 1;
 }
 }
 }
 let total_pairs = n * (n - 1) / 2;
 conflicts as f64 / total_pairs as f64
}
