// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The manifest markdown/YAML parser.
//!
//! A manifest is a markdown document containing one or more
//! `---`-delimited YAML frontmatter blocks, each optionally followed by a
//! free-text markdown body that is carried through opaquely.

use crate::error::ManifestError;
use crate::types::{Manifest, ManifestEntry, ManifestFrontmatter};
use std::collections::HashSet;

const DELIMITER: &str = "---";

/// Parse a manifest document. Validates the per-entry invariants required
/// at load: `pr_id` unique, enum fields in range, `complexity.score`
/// in `[1,10]`, `complexity.estimated_minutes` in `[1,600]`, and every
/// dependency resolves to another PR's `pr_id`. Cycle detection is the
/// dependency graph's responsibility, not the parser's.
pub fn parse(source: &str) -> Result<Manifest, ManifestError> {
 let mut entries = Vec::new();
 let lines: Vec<&str> = source.lines().collect();
 let mut i = 0;

 while i < lines.len() {
 if lines[i].trim() != DELIMITER {
 i += 1;
 continue;
 }
 let start_line = i;
 i += 1;
 let yaml_start = i;
 while i < lines.len() && lines[i].trim() != DELIMITER {
 i += 1;
 }
 if i >= lines.len() {
 return Err(ManifestError::UnclosedFrontmatter { line: start_line + 1 });
 }
 let yaml_text = lines[yaml_start..i].join("\n");
 i += 1; // consume closing delimiter

 let body_start = i;
 while i < lines.len() && lines[i].trim() != DELIMITER {
 i += 1;
 }
 let body = lines[body_start..i].join("\n").trim().to_string();

 let frontmatter: ManifestFrontmatter = serde_yaml::from_str(&yaml_text)
.map_err(|source| ManifestError::InvalidYaml { line: yaml_start + 1, source })?;

 entries.push(ManifestEntry { frontmatter, body });
 }

 if entries.is_empty() {
 return Err(ManifestError::Empty);
 }

 validate(&entries)?;
 Ok(Manifest { entries })
}

fn validate(entries: &[ManifestEntry]) -> Result<(), ManifestError> {
 let mut seen = HashSet::new();
 for entry in entries {
 if !seen.insert(entry.pr_id().to_string()) {
 return Err(ManifestError::DuplicatePrId(entry.pr_id().to_string()));
 }
 let score = entry.frontmatter.complexity.score;
 if !(1..=10).contains(&score) {
 return Err(ManifestError::ComplexityScoreOutOfRange { pr_id: entry.pr_id().to_string(), score });
 }
 let minutes = entry.frontmatter.complexity.estimated_minutes;
 if !(1..=600).contains(&minutes) {
 return Err(ManifestError::EstimatedMinutesOutOfRange { pr_id: entry.pr_id().to_string(), minutes });
 }
 }
 for entry in entries {
 for dep in &entry.frontmatter.dependencies {
 if !seen.contains(dep) {
 return Err(ManifestError::UnknownDependency {
 pr_id: entry.pr_id().to_string(),
 dependency: dep.clone(),
 });
 }
 }
 }
 Ok(())
}

/// Re-serialize a manifest, preserving body text untouched and re-emitting
/// only the YAML frontmatter. Textually equivalent to the source modulo
/// whitespace normalization, since `serde_yaml` controls key order and
/// quoting.
pub fn to_markdown(manifest: &Manifest) -> String {
 let mut out = String::new();
 for entry in &manifest.entries {
 out.push_str(DELIMITER);
 out.push('\n');
 let yaml = serde_yaml::to_string(&entry.frontmatter).unwrap_or_default();
 out.push_str(yaml.trim_end());
 out.push('\n');
 out.push_str(DELIMITER);
 out.push('\n');
 if !entry.body.is_empty() {
 out.push_str(&entry.body);
 out.push('\n');
 }
 }
 out
}

#[cfg(test)]
#[path = "parse_tests.rs"]
mod tests;
