// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! File lease tracking: acquiring, renewing, and releasing per-file
//! exclusive holds, with TTL expiry so a crashed holder never blocks a
//! file forever.
//!
//! Test-file/parent-file pairing: this implementation
//! pairs a test file with its parent by the convention of stripping a
//! `test_` prefix or `_test`/`.test` suffix from the file stem and matching
//! against the remaining candidate leases' file stems. When no match is
//! found `parent_file` is left `None` rather than guessed.

use hub_core::{AgentId, Lease, LeaseId, PrId};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LeaseError {
 #[error("file {0} is already leased by another agent")]
 AlreadyLeased(PathBuf),
 #[error("no lease held on {0}")]
 NotHeld(PathBuf),
 #[error("lease for {0} is held by a different agent")]
 WrongHolder(PathBuf),
}

#[derive(Default)]
pub struct LeaseTracker {
 by_file: HashMap<PathBuf, Lease>,
}

impl LeaseTracker {
 pub fn new() -> Self {
 Self::default()
 }

 /// Acquires a lease if the file isn't already held by a live (unexpired)
 /// lease; an expired lease is silently reclaimed.
 pub fn acquire(
 &mut self,
 file_path: PathBuf,
 agent_id: AgentId,
 pr_id: PrId,
 now_ms: u64,
 ttl_ms: u64,
 ) -> Result<Lease, LeaseError> {
 if let Some(existing) = self.by_file.get(&file_path) {
 if !existing.is_expired(now_ms) {
 return Err(LeaseError::AlreadyLeased(file_path));
 }
 }
 let is_test_file = is_test_file_path(&file_path);
 let parent_file = if is_test_file { self.find_parent(&file_path) } else { None };
 let lease = Lease {
 id: LeaseId::generate(),
 file_path: file_path.clone(),
 agent_id,
 pr_id,
 acquired_at_ms: now_ms,
 expires_at_ms: now_ms + ttl_ms,
 is_test_file,
 parent_file,
 };
 self.by_file.insert(file_path, lease.clone());
 Ok(lease)
 }

 /// Re-checks the lease is still held by `agent_id` before a write;
 /// callers must re-check before each write, not just at acquire time.
 pub fn check(&self, file_path: &Path, agent_id: &AgentId, now_ms: u64) -> Result<(), LeaseError> {
 let lease = self.by_file.get(file_path).ok_or_else(|| LeaseError::NotHeld(file_path.to_path_buf()))?;
 if lease.is_expired(now_ms) {
 return Err(LeaseError::NotHeld(file_path.to_path_buf()));
 }
 if &lease.agent_id != agent_id {
 return Err(LeaseError::WrongHolder(file_path.to_path_buf()));
 }
 Ok(())
 }

 pub fn release(&mut self, file_path: &Path, agent_id: &AgentId) -> Result<(), LeaseError> {
 match self.by_file.get(file_path) {
 Some(lease) if &lease.agent_id == agent_id => {
 self.by_file.remove(file_path);
 Ok(())
 }
 Some(_) => Err(LeaseError::WrongHolder(file_path.to_path_buf())),
 None => Err(LeaseError::NotHeld(file_path.to_path_buf())),
 }
 }

 /// Clears every lease held by `agent_id`, e.g. after a crash.
 pub fn release_all_for_agent(&mut self, agent_id: &AgentId) {
 self.by_file.retain(|_, lease| &lease.agent_id != agent_id);
 }

 fn find_parent(&self, test_file: &Path) -> Option<PathBuf> {
 let stem = test_stem(test_file)?;
 self.by_file
.keys()
.filter(|candidate| !is_test_file_path(candidate))
.find(|candidate| candidate.file_stem().and_then(|s| s.to_str()) == Some(stem.as_str()))
.cloned()
 }
}

fn is_test_file_path(path: &Path) -> bool {
 path.file_stem()
.and_then(|s| s.to_str())
.map(|stem| stem.starts_with("test_") || stem.ends_with("_test") || stem.ends_with(".test"))
.unwrap_or(false)
}

fn test_stem(path: &Path) -> Option<String> {
 let stem = path.file_stem()?.to_str()?;
 Some(
 stem.strip_prefix("test_")
.or_else(|| stem.strip_suffix("_test"))
.or_else(|| stem.strip_suffix(".test"))
.unwrap_or(stem)
.to_string(),
 )
}
