// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! State synchronizer: hydration at boot, crash recovery, periodic
//! display sync, and conflict detection/resolution between the KV store's
//! cached view and the manifest's durable truth.

use crate::keys;
use hub_bus::KvStore;
use hub_core::{ColdState, PrId};
use hub_manifest::Manifest;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
 #[error("kv error during sync: {0}")]
 Kv(#[from] hub_bus::BusError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictKind {
 /// Hot state present but cold state is terminal/incompatible.
 HotGitDifferent,
 /// PR in manifest but no cold-state cache entry.
 Missing,
 /// Cache key for a pr_id that isn't in the manifest.
 Orphaned,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
 ClearKv,
 HydrateKv,
}

pub fn resolution_for(kind: ConflictKind) -> Resolution {
 match kind {
 ConflictKind::HotGitDifferent => Resolution::ClearKv,
 ConflictKind::Missing => Resolution::HydrateKv,
 ConflictKind::Orphaned => Resolution::ClearKv,
 }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conflict {
 pub pr_id: PrId,
 pub kind: ConflictKind,
}

pub struct StateSynchronizer {
 kv: Arc<dyn KvStore>,
}

impl StateSynchronizer {
 pub fn new(kv: Arc<dyn KvStore>) -> Self {
 Self { kv }
 }

 /// Hydration (boot): writes each manifest PR's cold state into the KV
 /// store so it's queryable without reparsing the manifest, and mirrors
 /// the full set of known pr_ids under `state:prs`.
 pub async fn hydrate(&self, manifest: &Manifest) -> Result<(), SyncError> {
 let mut pr_ids = Vec::with_capacity(manifest.entries.len());
 for entry in &manifest.entries {
 let pr_id = PrId::new(entry.pr_id());
 self.kv.set(&keys::pr_cold_state(&pr_id), &entry.frontmatter.cold_state.to_string()).await?;
 pr_ids.push(entry.pr_id().to_string());
 }
 let members: Vec<&str> = pr_ids.iter().map(String::as_str).collect();
 if !members.is_empty() {
 self.kv.sadd(keys::STATE_PRS, &members).await?;
 }
 Ok(())
 }

 /// Crash recovery: clears every hot_state / agent / hot_state_timestamp
 /// key, plus any cache key whose pr_id isn't in the manifest, and resets
 /// `state:prs` so the following `hydrate` repopulates it from scratch
 /// rather than keeping pr_ids the manifest no longer lists.
 pub async fn recover_from_crash(&self, manifest: &Manifest) -> Result<(), SyncError> {
 let known_ids: std::collections::BTreeSet<&str> = manifest.pr_ids().collect();

 let mut stale_keys = Vec::new();
 for pattern in ["pr:*:hot_state", "pr:*:agent", "pr:*:hot_state_timestamp"] {
 stale_keys.extend(self.kv.scan(pattern).await?);
 }
 for key in &stale_keys {
 self.kv.del(&[key.as_str()]).await?;
 }

 let cold_state_keys = self.kv.scan("pr:*:cold_state").await?;
 for key in cold_state_keys {
 if let Some(id) = keys::pr_id_from_key(&key) {
 if !known_ids.contains(id) {
 self.kv.del(&[key.as_str()]).await?;
 }
 }
 }

 self.kv.del(&[keys::STATE_PRS]).await?;
 Ok(())
 }

 /// Periodic display sync: deliberately a no-op for correctness.
 /// Exists so a caller can wire a recurring timer to it without the
 /// timer itself needing to know the duty is presentational only.
 pub async fn periodic_display_sync(&self) -> Result<(), SyncError> {
 Ok(())
 }

 /// Compares the manifest against the KV store's cached cold state and
 /// returns every detected conflict. Every resolution is idempotent, so
 /// calling this (and applying `resolve`) repeatedly is safe.
 pub async fn detect_conflicts(&self, manifest: &Manifest) -> Result<Vec<Conflict>, SyncError> {
 let mut conflicts = Vec::new();
 let known_ids: std::collections::BTreeSet<&str> = manifest.pr_ids().collect();

 for entry in &manifest.entries {
 let pr_id = PrId::new(entry.pr_id());
 let cached = self.kv.get(&keys::pr_cold_state(&pr_id)).await?;
 if cached.is_none() {
 conflicts.push(Conflict { pr_id: pr_id.clone(), kind: ConflictKind::Missing });
 }

 let hot_state = self.kv.get(&keys::pr_hot_state(&pr_id)).await?;
 if hot_state.is_some() && entry.frontmatter.cold_state == ColdState::Approved {
 conflicts.push(Conflict { pr_id, kind: ConflictKind::HotGitDifferent });
 }
 }

 for key in self.kv.scan("pr:*:cold_state").await? {
 if let Some(id) = keys::pr_id_from_key(&key) {
 if !known_ids.contains(id) {
 conflicts.push(Conflict { pr_id: PrId::new(id), kind: ConflictKind::Orphaned });
 }
 }
 }

 Ok(conflicts)
 }

 pub async fn resolve(&self, conflict: &Conflict, manifest: &Manifest) -> Result<(), SyncError> {
 match resolution_for(conflict.kind) {
 Resolution::ClearKv => {
 let hot_state = keys::pr_hot_state(&conflict.pr_id);
 let agent = keys::pr_agent(&conflict.pr_id);
 self.kv.del(&[hot_state.as_str(), agent.as_str()]).await?;
 if conflict.kind == ConflictKind::Orphaned {
 let cold_state = keys::pr_cold_state(&conflict.pr_id);
 self.kv.del(&[cold_state.as_str()]).await?;
 }
 }
 Resolution::HydrateKv => {
 if let Some(entry) = manifest.get(conflict.pr_id.as_str()) {
 self.kv
.set(&keys::pr_cold_state(&conflict.pr_id), &entry.frontmatter.cold_state.to_string())
.await?;
 }
 }
 }
 Ok(())
 }
}

#[cfg(test)]
mod tests {
 use super::*;
 use hub_bus::InProcessKv;

 fn manifest_with(entries: Vec<hub_manifest::ManifestEntry>) -> Manifest {
 Manifest { entries }
 }

 fn entry(id: &str, cold_state: ColdState) -> hub_manifest::ManifestEntry {
 hub_manifest::ManifestEntry {
 frontmatter: hub_manifest::ManifestFrontmatter {
 pr_id: id.to_string(),
 title: "t".to_string(),
 cold_state,
 priority: hub_core::Priority::Medium,
 complexity: hub_core::Complexity {
 score: 1,
 estimated_minutes: 10,
 suggested_model: hub_core::ModelTier::Haiku,
 rationale: String::new(),
 },
 dependencies: vec![],
 estimated_files: vec![],
 },
 body: String::new(),
 }
 }

 #[tokio::test]
 async fn hydrate_writes_cold_state_for_every_entry() {
 let kv = InProcessKv::shared();
 let sync = StateSynchronizer::new(kv.clone());
 let manifest = manifest_with(vec![entry("PR-1", ColdState::New)]);
 sync.hydrate(&manifest).await.unwrap();
 let cached = kv.get("pr:PR-1:cold_state").await.unwrap();
 assert_eq!(cached, Some("new".to_string()));
 }

 #[tokio::test]
 async fn hydrate_mirrors_known_pr_ids_into_state_prs() {
 let kv = InProcessKv::shared();
 let sync = StateSynchronizer::new(kv.clone());
 let manifest = manifest_with(vec![entry("PR-1", ColdState::New), entry("PR-2", ColdState::Ready)]);
 sync.hydrate(&manifest).await.unwrap();
 let mut members = kv.smembers(keys::STATE_PRS).await.unwrap();
 members.sort();
 assert_eq!(members, vec!["PR-1".to_string(), "PR-2".to_string()]);
 }

 #[tokio::test]
 async fn crash_recovery_resets_state_prs() {
 let kv = InProcessKv::shared();
 kv.sadd(keys::STATE_PRS, &["PR-GONE"]).await.unwrap();
 let sync = StateSynchronizer::new(kv.clone());
 let manifest = manifest_with(vec![]);
 sync.recover_from_crash(&manifest).await.unwrap();
 assert_eq!(kv.smembers(keys::STATE_PRS).await.unwrap(), Vec::<String>::new());
 }

 #[tokio::test]
 async fn crash_recovery_clears_hot_state_and_agent_keys() {
 let kv = InProcessKv::shared();
 kv.set("pr:PR-1:hot_state", "in-progress").await.unwrap();
 kv.set("pr:PR-1:agent", "worker-agent-1").await.unwrap();
 kv.set("pr:PR-1:cold_state", "planned").await.unwrap();
 let sync = StateSynchronizer::new(kv.clone());
 let manifest = manifest_with(vec![entry("PR-1", ColdState::Planned)]);
 sync.recover_from_crash(&manifest).await.unwrap();
 assert_eq!(kv.get("pr:PR-1:hot_state").await.unwrap(), None);
 assert_eq!(kv.get("pr:PR-1:agent").await.unwrap(), None);
 assert_eq!(kv.get("pr:PR-1:cold_state").await.unwrap(), Some("planned".to_string()));
 }

 #[tokio::test]
 async fn crash_recovery_clears_orphaned_cold_state() {
 let kv = InProcessKv::shared();
 kv.set("pr:PR-GONE:cold_state", "new").await.unwrap();
 let sync = StateSynchronizer::new(kv.clone());
 let manifest = manifest_with(vec![]);
 sync.recover_from_crash(&manifest).await.unwrap();
 assert_eq!(kv.get("pr:PR-GONE:cold_state").await.unwrap(), None);
 }

 #[tokio::test]
 async fn detect_conflicts_flags_missing_cache_entry() {
 let kv = InProcessKv::shared();
 let sync = StateSynchronizer::new(kv.clone());
 let manifest = manifest_with(vec![entry("PR-1", ColdState::New)]);
 let conflicts = sync.detect_conflicts(&manifest).await.unwrap();
 assert_eq!(conflicts, vec![Conflict { pr_id: PrId::new("PR-1"), kind: ConflictKind::Missing }]);
 }

 #[tokio::test]
 async fn resolve_missing_hydrates_cache() {
 let kv = InProcessKv::shared();
 let sync = StateSynchronizer::new(kv.clone());
 let manifest = manifest_with(vec![entry("PR-1", ColdState::New)]);
 let conflict = Conflict { pr_id: PrId::new("PR-1"), kind: ConflictKind::Missing };
 sync.resolve(&conflict, &manifest).await.unwrap();
 assert_eq!(kv.get("pr:PR-1:cold_state").await.unwrap(), Some("new".to_string()));
 }
}
