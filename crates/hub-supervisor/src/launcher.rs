// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process launching abstraction, so the supervisor's restart/capacity
//! logic can be exercised without spawning real OS processes.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;

/// Entry point table: one command per agent type. Fixed for now;
/// overridable per-deployment by constructing a `ProcessLauncher` that
/// looks up a different table.
#[derive(Debug, Clone)]
pub struct EntryPoints {
 table: HashMap<hub_core::AgentType, PathBuf>,
}

impl EntryPoints {
 pub fn new(table: HashMap<hub_core::AgentType, PathBuf>) -> Self {
 Self { table }
 }

 /// Builds the table from `HUB_<TYPE>_CMD` environment variables
 /// (`HUB_PLANNING_CMD`, `HUB_WORKER_CMD`, `HUB_QC_CMD`, `HUB_REVIEW_CMD`),
 /// falling back to the `hub-agent-echo` demo binary resolved on `PATH`
 /// for any agent type left unset.
 pub fn from_env() -> Self {
 let default = PathBuf::from("hub-agent-echo");
 let mut table = HashMap::new();
 for (agent_type, var) in [
 (hub_core::AgentType::Planning, "HUB_PLANNING_CMD"),
 (hub_core::AgentType::Worker, "HUB_WORKER_CMD"),
 (hub_core::AgentType::Qc, "HUB_QC_CMD"),
 (hub_core::AgentType::Review, "HUB_REVIEW_CMD"),
 ] {
 let command = std::env::var(var).map(PathBuf::from).unwrap_or_else(|_| default.clone());
 table.insert(agent_type, command);
 }
 Self::new(table)
 }

 pub fn command_for(&self, agent_type: hub_core::AgentType) -> Option<&PathBuf> {
 self.table.get(&agent_type)
 }
}

#[derive(Debug, Clone)]
pub struct SpawnSpec {
 pub command: PathBuf,
 pub env: Vec<(String, String)>,
 /// Per-agent captured stdout/stderr destination (`agents/<id>.log`).
 /// `None` leaves the child's output unpiped.
 pub log_path: Option<PathBuf>,
}

#[async_trait]
pub trait ProcessLauncher: Send + Sync {
 /// Spawns a process, returning an opaque OS pid.
 async fn spawn(&self, spec: SpawnSpec) -> std::io::Result<u32>;
 /// Sends a graceful-shutdown signal (SIGTERM on unix).
 async fn terminate(&self, pid: u32) -> std::io::Result<()>;
 /// Forcibly kills the process (SIGKILL on unix).
 async fn kill(&self, pid: u32) -> std::io::Result<()>;
 /// Returns `true` once the process has exited.
 async fn has_exited(&self, pid: u32) -> bool;
}

/// Real launcher backed by `tokio::process::Command`.
pub struct TokioProcessLauncher;

#[async_trait]
impl ProcessLauncher for TokioProcessLauncher {
 async fn spawn(&self, spec: SpawnSpec) -> std::io::Result<u32> {
 let mut command = tokio::process::Command::new(&spec.command);
 for (key, value) in &spec.env {
 command.env(key, value);
 }
 command.kill_on_drop(false);

 if spec.log_path.is_some() {
 command.stdout(std::process::Stdio::piped());
 command.stderr(std::process::Stdio::piped());
 }
 let mut child = command.spawn()?;
 let pid = child.id().ok_or_else(|| std::io::Error::other("process exited immediately"))?;

 if let Some(log_path) = spec.log_path {
 let stdout = child.stdout.take();
 let stderr = child.stderr.take();
 spawn_log_writer(log_path, stdout, stderr);
 }

 // Reap the child so it doesn't linger as a zombie once it exits.
 // The supervisor decides on restarts from the registry's heartbeat
 // sweep, not from this exit status, so the result is discarded.
 tokio::spawn(async move {
 let _ = child.wait().await;
 });

 Ok(pid)
 }

 async fn terminate(&self, pid: u32) -> std::io::Result<()> {
 send_signal(pid, Some(nix::sys::signal::Signal::SIGTERM))
 }

 async fn kill(&self, pid: u32) -> std::io::Result<()> {
 send_signal(pid, Some(nix::sys::signal::Signal::SIGKILL))
 }

 async fn has_exited(&self, pid: u32) -> bool {
 // `None` sends no signal; it only probes whether the pid still exists.
 send_signal(pid, None).is_err()
 }
}

fn send_signal(pid: u32, signal: Option<nix::sys::signal::Signal>) -> std::io::Result<()> {
 nix::sys::signal::kill(nix::unistd::Pid::from_raw(pid as i32), signal)
.map_err(|errno| std::io::Error::from_raw_os_error(errno as i32))
}

/// Copies a child's stdout/stderr line-by-line into its own log file
/// (`agents/<id>.log`), interleaved as lines arrive. Spawned once per child
/// and left to run until both streams close.
fn spawn_log_writer(
 log_path: PathBuf,
 stdout: Option<tokio::process::ChildStdout>,
 stderr: Option<tokio::process::ChildStderr>,
) {
 tokio::spawn(async move {
 use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

 let file = match tokio::fs::OpenOptions::new().create(true).append(true).open(&log_path).await {
 Ok(file) => file,
 Err(error) => {
 tracing::warn!(%error, path = %log_path.display(), "failed to open agent log file");
 return;
 }
 };
 let file = tokio::sync::Mutex::new(file);

 let stdout_task = async {
 if let Some(stdout) = stdout {
 let mut lines = BufReader::new(stdout).lines();
 while let Ok(Some(line)) = lines.next_line().await {
 let mut file = file.lock().await;
 let _ = file.write_all(format!("{line}\n").as_bytes()).await;
 }
 }
 };
 let stderr_task = async {
 if let Some(stderr) = stderr {
 let mut lines = BufReader::new(stderr).lines();
 while let Ok(Some(line)) = lines.next_line().await {
 let mut file = file.lock().await;
 let _ = file.write_all(format!("{line}\n").as_bytes()).await;
 }
 }
 };
 tokio::join!(stdout_task, stderr_task);
 });
}

#[cfg(any(test, feature = "test-support"))]
pub mod fake {
 use super::*;
 use parking_lot::Mutex;
 use std::collections::HashSet;
 use std::sync::atomic::{AtomicU32, Ordering};

 #[derive(Default)]
 pub struct FakeLauncher {
 next_pid: AtomicU32,
 exited: Mutex<HashSet<u32>>,
 pub fail_spawn: Mutex<bool>,
 }

 impl FakeLauncher {
 pub fn new() -> Self {
 Self { next_pid: AtomicU32::new(1000), exited: Mutex::new(HashSet::new()), fail_spawn: Mutex::new(false) }
 }

 pub fn mark_exited(&self, pid: u32) {
 self.exited.lock().insert(pid);
 }
 }

 #[async_trait]
 impl ProcessLauncher for FakeLauncher {
 async fn spawn(&self, _spec: SpawnSpec) -> std::io::Result<u32> {
 if *self.fail_spawn.lock() {
 return Err(std::io::Error::other("fake spawn failure"));
 }
 Ok(self.next_pid.fetch_add(1, Ordering::SeqCst))
 }

 async fn terminate(&self, pid: u32) -> std::io::Result<()> {
 self.exited.lock().insert(pid);
 Ok(())
 }

 async fn kill(&self, pid: u32) -> std::io::Result<()> {
 self.exited.lock().insert(pid);
 Ok(())
 }

 async fn has_exited(&self, pid: u32) -> bool {
 self.exited.lock().contains(&pid)
 }
 }
}
