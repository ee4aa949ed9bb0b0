// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon-level error type. Library code here still returns precise
//! `thiserror` variants; only `main.rs` collapses everything behind
//! `anyhow::Error` to produce a human-facing exit code.

use hub_core::ErrorKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DaemonError {
    #[error("config error: {0}")]
    Config(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("daemon is already running (pid {0})")]
    AlreadyRunning(u32),
    #[error("daemon is not running")]
    NotRunning,
    #[error("manifest error: {0}")]
    Manifest(#[from] hub_manifest::ManifestError),
    #[error("dependency graph error: {0}")]
    Graph(#[from] hub_scheduler::GraphError),
    #[error("bus error: {0}")]
    Bus(#[from] hub_bus::BusError),
    #[error("storage error: {0}")]
    Storage(#[from] hub_storage::SyncError),
    #[error("supervisor error: {0}")]
    Supervisor(#[from] hub_supervisor::SupervisorError),
    #[error("protocol error: {0}")]
    Protocol(#[from] hub_wire::ProtocolError),
}

impl DaemonError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DaemonError::Config(_) => ErrorKind::Structure,
            DaemonError::Io(_) => ErrorKind::Transient,
            DaemonError::AlreadyRunning(_) => ErrorKind::Invariant,
            DaemonError::NotRunning => ErrorKind::Invariant,
            DaemonError::Manifest(_) => ErrorKind::Structure,
            DaemonError::Graph(_) => ErrorKind::Structure,
            DaemonError::Bus(_) => ErrorKind::Transient,
            DaemonError::Storage(_) => ErrorKind::Transient,
            DaemonError::Supervisor(_) => ErrorKind::Resource,
            DaemonError::Protocol(_) => ErrorKind::Transient,
        }
    }
}
