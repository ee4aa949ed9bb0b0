// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! File leases: pessimistic, TTL-bounded exclusive holds on a file.

use crate::ids::{AgentId, LeaseId, PrId};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lease {
 pub id: LeaseId,
 pub file_path: PathBuf,
 pub agent_id: AgentId,
 pub pr_id: PrId,
 pub acquired_at_ms: u64,
 pub expires_at_ms: u64,
 pub is_test_file: bool,
 /// For a test file, the source file it covers, paired by naming
 /// convention.
 pub parent_file: Option<PathBuf>,
}

impl Lease {
 pub fn is_expired(&self, now_ms: u64) -> bool {
 now_ms >= self.expires_at_ms
 }
}
