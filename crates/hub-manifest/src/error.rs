// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

/// Manifest load/validate failures. All are `Structure` kind: a bad
/// manifest fails the whole load, no partial graph is ever exposed.
#[derive(Debug, Error)]
pub enum ManifestError {
 #[error("unclosed frontmatter block starting at line {line}")]
 UnclosedFrontmatter { line: usize },

 #[error("invalid YAML frontmatter at line {line}: {source}")]
 InvalidYaml { line: usize, #[source] source: serde_yaml::Error },

 #[error("duplicate pr_id: {0}")]
 DuplicatePrId(String),

 #[error("pr_id {pr_id} depends on unknown pr_id {dependency}")]
 UnknownDependency { pr_id: String, dependency: String },

 #[error("pr_id {pr_id}: complexity.score {score} out of range [1, 10]")]
 ComplexityScoreOutOfRange { pr_id: String, score: u8 },

 #[error("pr_id {pr_id}: complexity.estimated_minutes {minutes} out of range [1, 600]")]
 EstimatedMinutesOutOfRange { pr_id: String, minutes: u32 },

 #[error("manifest contains no PR entries")]
 Empty,
}

impl ManifestError {
 pub fn kind(&self) -> hub_core::ErrorKind {
 hub_core::ErrorKind::Structure
 }
}
