// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Local control connection: a Unix socket at `<workdir>/.hub/hub.sock`
//! carrying length-prefixed JSON requests/responses (`hub-wire`'s codec),
//! used by `hub status` / `hub stop` to talk to an already-running daemon
//! without going through the message bus.
//!
//! One request per connection: an accept-loop-spawns-a-task-per-connection
//! pattern, simplified here since the control protocol has no long-lived
//! streaming commands.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::net::{UnixListener, UnixStream};
use tracing::{error, warn};

use crate::error::DaemonError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum IpcRequest {
 Status,
 Shutdown { force: bool },
 /// Dispatch one PR (`pr_id = Some`) or sweep for all currently
 /// schedulable work (`pr_id = None`). `dry_run` reports what the
 /// scheduler would pick without actually dispatching it.
 Run { pr_id: Option<String>, dry_run: bool },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSummary {
 pub id: String,
 pub agent_type: String,
 pub lifecycle: String,
 pub assigned_pr: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusSnapshot {
 pub pid: u32,
 pub uptime_ms: u64,
 pub agents: Vec<AgentSummary>,
 pub prs_completed: usize,
 pub prs_total: usize,
}

/// One PR's outcome from a `run` request: its cold state after the
/// request was handled, and whether this request actually dispatched it
/// (always `false` for a dry run).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResult {
 pub pr_id: String,
 pub cold_state: String,
 pub dispatched: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum IpcResponse {
 Status(StatusSnapshot),
 ShuttingDown,
 Run(Vec<RunResult>),
 Error(String),
}

/// What the IPC server needs from the orchestrator: a status snapshot, a
/// way to request shutdown, and a way to run one or all schedulable PRs.
/// Kept as a narrow trait so `ipc` doesn't depend on `orchestrator`'s
/// internals.
#[async_trait::async_trait]
pub trait DaemonHandle: Send + Sync {
 async fn status(&self) -> StatusSnapshot;
 async fn request_shutdown(&self, force: bool);
 async fn run_now(&self, pr_id: Option<String>, dry_run: bool) -> Vec<RunResult>;
}

/// Runs the accept loop until the socket is removed out from under it
/// (on shutdown, the orchestrator removes the socket file, which fails
/// future binds but doesn't interrupt an already-bound listener — the
/// orchestrator aborts this task explicitly instead).
pub async fn serve(socket_path: PathBuf, handle: Arc<dyn DaemonHandle>) -> Result<(), DaemonError> {
 if socket_path.exists() {
 std::fs::remove_file(&socket_path)?;
 }
 if let Some(parent) = socket_path.parent() {
 std::fs::create_dir_all(parent)?;
 }
 let listener = UnixListener::bind(&socket_path)?;

 loop {
 let (stream, _addr) = listener.accept().await?;
 let handle = Arc::clone(&handle);
 tokio::spawn(async move {
 if let Err(error) = handle_connection(stream, handle).await {
 warn!(%error, "ipc connection error");
 }
 });
 }
}

async fn handle_connection(mut stream: UnixStream, handle: Arc<dyn DaemonHandle>) -> Result<(), DaemonError> {
 let request: IpcRequest = hub_wire::read_message(&mut stream).await?;
 let response = match request {
 IpcRequest::Status => IpcResponse::Status(handle.status().await),
 IpcRequest::Shutdown { force } => {
 handle.request_shutdown(force).await;
 IpcResponse::ShuttingDown
 }
 IpcRequest::Run { pr_id, dry_run } => IpcResponse::Run(handle.run_now(pr_id, dry_run).await),
 };
 hub_wire::write_message(&mut stream, &response).await?;
 Ok(())
}

/// Connects to an already-running daemon's control socket and sends one
/// request, returning its response.
pub async fn send(socket_path: &Path, request: &IpcRequest) -> Result<IpcResponse, DaemonError> {
 let mut stream = UnixStream::connect(socket_path).await?;
 hub_wire::write_message(&mut stream, request).await?;
 let response = hub_wire::read_message(&mut stream).await?;
 Ok(response)
}
