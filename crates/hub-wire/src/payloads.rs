// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Typed payload shapes for each `MessageType`, used to give the envelope's
//! `serde_json::Value` payload a concrete, exhaustively-matched meaning at
//! each consumer.

use hub_core::agent::{AgentType, Capabilities};
use hub_core::error::HubError;
use hub_core::{Assignment, PrId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistrationPayload {
 pub agent_id: String,
 pub agent_type: AgentType,
 pub capabilities: Capabilities,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeartbeatPayload {
 pub state: String,
 pub assigned_pr: Option<PrId>,
 pub memory_mb: u64,
 pub ts: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressPayload {
 pub pr_id: PrId,
 pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletePayload {
 pub pr_id: PrId,
 pub result: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailedPayload {
 pub pr_id: Option<PrId>,
 pub error: HubError,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignmentPayload {
 pub assignment: Assignment,
}

/// A request/response payload wrapper carrying the correlation id used by
/// `hub-bus`'s request/response helper.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestPayload {
 pub correlation_id: String,
 pub body: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponsePayload {
 pub correlation_id: String,
 pub body: serde_json::Value,
}
