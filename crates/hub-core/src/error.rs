// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The shared error taxonomy: every crate-local error type maps onto
//! one of these kinds so the propagation policy (retry / abort / refuse /
//! shut down) can be driven generically at the boundaries that need it
//! (agent `failed` messages, the daemon's top-level exit code).

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A coarse error kind, not a type — individual crates keep their own
/// precise `thiserror` enums and expose `.kind` to classify into this set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
 /// KV disconnect, timeout, network refused — retry with backoff.
 Transient,
 /// Invalid state transition, duplicate pr_id — abort the operation, log, surface.
 Invariant,
 /// Unclosed frontmatter, cycle in deps — manifest load fails, hub refuses to start.
 Structure,
 /// Capacity exceeded, budget exceeded — refuse operation, surface actionable reason.
 Resource,
 /// Out of memory, repeated crash-loop — shut down the offending component.
 Fatal,
}

impl ErrorKind {
 /// Whether an operation classified with this kind should be retried.
 pub fn is_retryable(self) -> bool {
 matches!(self, ErrorKind::Transient)
 }
}

/// A categorized error with a human message, suitable for serializing into
/// an agent `failed` envelope payload as `{category, recoverable, message}`.
#[derive(Debug, Clone, Error, Serialize, Deserialize)]
#[error("{kind:?}: {message}")]
pub struct HubError {
 pub kind: ErrorKind,
 pub message: String,
}

impl HubError {
 pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
 Self { kind, message: message.into() }
 }

 pub fn transient(message: impl Into<String>) -> Self {
 Self::new(ErrorKind::Transient, message)
 }

 pub fn invariant(message: impl Into<String>) -> Self {
 Self::new(ErrorKind::Invariant, message)
 }

 pub fn structure(message: impl Into<String>) -> Self {
 Self::new(ErrorKind::Structure, message)
 }

 pub fn resource(message: impl Into<String>) -> Self {
 Self::new(ErrorKind::Resource, message)
 }

 pub fn fatal(message: impl Into<String>) -> Self {
 Self::new(ErrorKind::Fatal, message)
 }

 pub fn recoverable(&self) -> bool {
 self.kind.is_retryable()
 }
}
