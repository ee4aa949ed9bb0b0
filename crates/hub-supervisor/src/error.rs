// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use hub_core::{AgentId, ErrorKind};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error("max concurrent agents ({0}) reached")]
    CapacityExceeded(usize),
    #[error("agent {0} is not registered")]
    UnknownAgent(AgentId),
    #[error("failed to spawn agent process: {0}")]
    SpawnFailed(String),
    #[error("restart budget exhausted for agent {0}")]
    RestartBudgetExhausted(AgentId),
}

impl SupervisorError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SupervisorError::CapacityExceeded(_) => ErrorKind::Resource,
            SupervisorError::UnknownAgent(_) => ErrorKind::Invariant,
            SupervisorError::SpawnFailed(_) => ErrorKind::Transient,
            SupervisorError::RestartBudgetExhausted(_) => ErrorKind::Fatal,
        }
    }
}
