// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Manifest-level types: one YAML frontmatter block per PR, embedded in a
//! markdown document.

use hub_core::pr::{ColdState, Complexity, Priority};
use hub_core::PrId;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A single estimated file entry. `action`/`description` are opaque
/// metadata to the core — carried through for round-trip fidelity only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimatedFile {
 pub path: PathBuf,
 #[serde(default)]
 pub action: String,
 #[serde(default)]
 pub description: String,
}

/// The YAML frontmatter of one manifest entry, as written on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestFrontmatter {
 pub pr_id: String,
 pub title: String,
 pub cold_state: ColdState,
 pub priority: Priority,
 pub complexity: Complexity,
 #[serde(default)]
 pub dependencies: Vec<String>,
 #[serde(default)]
 pub estimated_files: Vec<EstimatedFile>,
}

/// One PR as loaded from the manifest: structured frontmatter plus the
/// opaque markdown body (title/description/acceptance criteria — never
/// interpreted by the core, only round-tripped).
#[derive(Debug, Clone, PartialEq)]
pub struct ManifestEntry {
 pub frontmatter: ManifestFrontmatter,
 pub body: String,
}

impl ManifestEntry {
 pub fn pr_id(&self) -> &str {
 &self.frontmatter.pr_id
 }

 /// Project this entry onto the plain `hub_core::Pr` the scheduler and
 /// graph operate on — file paths only, metadata dropped.
 pub fn to_pr(&self) -> hub_core::Pr {
 let fm = &self.frontmatter;
 let mut pr = hub_core::Pr::new(PrId::new(fm.pr_id.clone()), fm.title.clone(), fm.complexity.clone());
 pr.priority = fm.priority;
 pr.cold_state = fm.cold_state;
 pr.dependencies = fm.dependencies.iter().cloned().map(PrId::new).collect();
 pr.files = fm.estimated_files.iter().map(|f| f.path.clone()).collect();
 pr
 }
}

/// An ordered manifest document: all PRs in file order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Manifest {
 pub entries: Vec<ManifestEntry>,
}

impl Manifest {
 pub fn get(&self, pr_id: &str) -> Option<&ManifestEntry> {
 self.entries.iter().find(|e| e.pr_id() == pr_id)
 }

 pub fn get_mut(&mut self, pr_id: &str) -> Option<&mut ManifestEntry> {
 self.entries.iter_mut().find(|e| e.pr_id() == pr_id)
 }

 pub fn pr_ids(&self) -> impl Iterator<Item = &str> {
 self.entries.iter().map(|e| e.pr_id())
 }
}
