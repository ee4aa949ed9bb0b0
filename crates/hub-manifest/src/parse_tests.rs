// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn sample() -> &'static str {
    "---\n\
pr_id: PR-001\n\
title: Add widget\n\
cold_state: new\n\
priority: high\n\
complexity: {score: 5, estimated_minutes: 50, suggested_model: sonnet, rationale: \"straightforward\"}\n\
dependencies: []\n\
estimated_files:\n\
  - {path: src/widget.rs, action: create, description: \"new module\"}\n\
---\n\
Implement the widget.\n\
\n\
Acceptance: renders without panicking.\n\
---\n\
pr_id: PR-002\n\
title: Wire up widget\n\
cold_state: new\n\
priority: medium\n\
complexity: {score: 3, estimated_minutes: 20, suggested_model: haiku, rationale: \"glue\"}\n\
dependencies: [PR-001]\n\
---\n\
Wire PR-001's widget into the app.\n"
}

#[test]
fn parses_two_entries_in_order() {
    let manifest = parse(sample()).unwrap();
    assert_eq!(manifest.entries.len(), 2);
    assert_eq!(manifest.entries[0].pr_id(), "PR-001");
    assert_eq!(manifest.entries[1].pr_id(), "PR-002");
    assert!(manifest.entries[0].body.contains("Acceptance"));
    assert_eq!(manifest.entries[1].frontmatter.dependencies, vec!["PR-001".to_string()]);
}

#[test]
fn rejects_duplicate_pr_id() {
    let doc = sample().replace("PR-002", "PR-001");
    let err = parse(&doc).unwrap_err();
    assert!(matches!(err, ManifestError::DuplicatePrId(id) if id == "PR-001"));
}

#[test]
fn rejects_unknown_dependency() {
    let doc = sample().replace("[PR-001]", "[PR-999]");
    let err = parse(&doc).unwrap_err();
    assert!(matches!(err, ManifestError::UnknownDependency { dependency, .. } if dependency == "PR-999"));
}

#[test]
fn rejects_unclosed_frontmatter() {
    let doc = "---\npr_id: PR-001\n";
    let err = parse(doc).unwrap_err();
    assert!(matches!(err, ManifestError::UnclosedFrontmatter { .. }));
}

#[test]
fn rejects_complexity_score_out_of_range() {
    let doc = sample().replace("score: 5", "score: 11");
    let err = parse(&doc).unwrap_err();
    assert!(matches!(err, ManifestError::ComplexityScoreOutOfRange { score: 11, .. }));
}

#[test]
fn rejects_empty_manifest() {
    let err = parse("no frontmatter here").unwrap_err();
    assert!(matches!(err, ManifestError::Empty));
}

#[test]
fn round_trip_preserves_pr_ids_and_bodies() {
    let manifest = parse(sample()).unwrap();
    let regenerated = to_markdown(&manifest);
    let reparsed = parse(&regenerated).unwrap();
    assert_eq!(manifest.entries.len(), reparsed.entries.len());
    for (a, b) in manifest.entries.iter().zip(reparsed.entries.iter()) {
        assert_eq!(a.frontmatter, b.frontmatter);
        assert_eq!(a.body, b.body);
    }
}

#[test]
fn to_pr_projects_paths_and_drops_metadata() {
    let manifest = parse(sample()).unwrap();
    let pr = manifest.entries[0].to_pr();
    assert_eq!(pr.id.as_str(), "PR-001");
    assert_eq!(pr.files.len(), 1);
    assert!(pr.files.contains(std::path::Path::new("src/widget.rs")));
}
