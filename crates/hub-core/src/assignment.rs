// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The assignment payload dispatched to exactly one agent.

use crate::ids::PrId;
use crate::pr::{Complexity, Priority};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
 pub pr_id: PrId,
 pub assigned_at_ms: u64,
 pub priority: Priority,
 pub complexity: Complexity,
 pub estimated_duration_minutes: u32,
 pub files: Vec<PathBuf>,
}
