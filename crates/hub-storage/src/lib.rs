// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! hub-storage: KV key layout, file lease tracking, and the state
//! synchronizer reconciling the KV store's cached view with the manifest.

pub mod keys;
mod leases;
mod sync;

pub use leases::{LeaseError, LeaseTracker};
pub use sync::{resolution_for, Conflict, ConflictKind, Resolution, StateSynchronizer, SyncError};
