// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `hubd`: the agent orchestration hub's daemon binary. `start` boots the
//! hub in the current process (or, by default, a detached child of it);
//! `stop`/`status`/`restart` talk to an already-running daemon over its
//! control socket. Library code throughout this crate returns precise
//! `thiserror` variants; only here do they collapse behind `anyhow::Error`
//! to produce a human-facing exit code.

use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use hub_daemon::config::Config;
use hub_daemon::ipc::{self, DaemonHandle, IpcRequest, IpcResponse, RunResult};
use hub_daemon::orchestrator::Hub;
use hub_daemon::pidfile::{is_process_alive, read_pid, PidFile};
use hub_daemon::{logging, EntryPoints, TokioProcessLauncher};

const EXIT_OK: i32 = 0;
const EXIT_FAILURE: i32 = 1;
const EXIT_NOT_RUNNING: i32 = 2;
const EXIT_ALREADY_RUNNING: i32 = 3;

#[derive(Parser)]
#[command(name = "hubd", about = "Agent orchestration hub daemon")]
struct Cli {
 /// Path to a TOML configuration overlay.
 #[arg(long, global = true)]
 config: Option<PathBuf>,

 #[command(subcommand)]
 command: Command,
}

#[derive(Subcommand)]
enum Command {
 /// Start the daemon.
 Start {
 /// Run in the foreground instead of detaching.
 #[arg(long)]
 foreground: bool,
 #[arg(long)]
 verbose: bool,
 },
 /// Stop a running daemon.
 Stop {
 /// Skip the graceful drain and tear down agents immediately.
 #[arg(long)]
 force: bool,
 #[arg(long, default_value = "5000")]
 timeout: u64,
 },
 /// Report the daemon's current status.
 Status {
 #[arg(long)]
 json: bool,
 },
 /// Stop then start the daemon.
 Restart,
 /// Dispatch one PR, or sweep for all currently schedulable work.
 Run {
 /// The PR to dispatch; every schedulable PR if omitted.
 pr_id: Option<String>,
 /// Poll until the targeted PR(s) reach a terminal cold state.
 #[arg(long)]
 watch: bool,
 /// Report what would be dispatched without actually dispatching it.
 #[arg(long)]
 dry_run: bool,
 },
}

fn main() -> std::process::ExitCode {
 let cli = Cli::parse();
 let code = match run(cli) {
 Ok(code) => code,
 Err(error) => {
 eprintln!("hubd: {error:#}");
 EXIT_FAILURE
 }
 };
 std::process::ExitCode::from(code as u8)
}

fn run(cli: Cli) -> Result<i32> {
 let config = Config::load(cli.config.as_deref()).context("loading configuration")?;
 match cli.command {
 Command::Start { foreground, verbose } => start(config, foreground, verbose),
 Command::Stop { force, timeout } => stop(&config, force, timeout),
 Command::Status { json } => status(&config, json),
 Command::Restart => {
 let _ = stop(&config, false, 5_000);
 start(config, false, false)
 }
 Command::Run { pr_id, watch, dry_run } => run_pr(&config, pr_id, watch, dry_run),
 }
}

fn start(config: Config, foreground: bool, verbose: bool) -> Result<i32> {
 if let Some(pid) = read_pid(&config.pid_path()) {
 if is_process_alive(pid) {
 eprintln!("hubd: already running (pid {pid})");
 return Ok(EXIT_ALREADY_RUNNING);
 }
 }

 if !foreground {
 return spawn_detached(&config);
 }

 let log_level = if verbose { "debug" } else { config.log_level.as_str() };
 let _logging_guard = logging::init(log_level, &config.hub_dir(), true)?;

 let runtime = tokio::runtime::Runtime::new().context("building tokio runtime")?;
 runtime.block_on(run_foreground(config))
}

/// Re-executes the current binary with `--foreground`, detached from this
/// controlling terminal (stdio redirected, no session leader change —
/// a simplification from a true double-fork daemonize, since spawning a
/// new session requires `unsafe` `pre_exec`, forbidden workspace-wide).
fn spawn_detached(config: &Config) -> Result<i32> {
 std::fs::create_dir_all(config.hub_dir()).context("creating hub directory")?;
 let log_file = std::fs::OpenOptions::new().create(true).append(true).open(config.log_path())?;
 let exe = std::env::current_exe().context("resolving current executable")?;

 let mut command = std::process::Command::new(exe);
 command.arg("start").arg("--foreground");
 command.stdin(Stdio::null());
 command.stdout(log_file.try_clone()?);
 command.stderr(log_file);
 let child = command.spawn().context("spawning detached daemon process")?;
 println!("hubd: started (pid {})", child.id());
 Ok(EXIT_OK)
}

async fn run_foreground(config: Config) -> Result<i32> {
 let pidfile = PidFile::acquire(&config.lock_path(), &config.pid_path())
.map_err(|error| anyhow!("{error}"))?;

 let kv: Arc<dyn hub_bus::KvStore> = hub_bus::InProcessKv::shared();
 let launcher = Arc::new(TokioProcessLauncher);
 let entry_points = EntryPoints::from_env();

 let hub = Hub::boot(config.clone(), kv, launcher, entry_points).await.context("booting hub")?;

 let socket_path = config.socket_path();
 let serve_handle: Arc<dyn DaemonHandle> = hub.clone();
 let ipc_task = tokio::spawn(async move {
 if let Err(error) = ipc::serve(socket_path, serve_handle).await {
 tracing::error!(%error, "ipc server exited");
 }
 });

 let shutdown_notify = hub.shutdown_notify();
 let hub_for_signals = hub.clone();
 tokio::spawn(async move {
 let mut sigterm = match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate) {
 Ok(signal) => signal,
 Err(error) => {
 tracing::error!(%error, "failed to install SIGTERM handler");
 return;
 }
 };
 tokio::select! {
 _ = tokio::signal::ctrl_c() => {}
 _ = sigterm.recv() => {}
 }
 hub_for_signals.request_shutdown(false).await;
 shutdown_notify.notify_one();
 });

 hub.run().await.context("running hub")?;
 ipc_task.abort();
 pidfile.remove().context("removing pid file")?;
 Ok(EXIT_OK)
}

fn stop(config: &Config, force: bool, timeout_ms: u64) -> Result<i32> {
 let Some(pid) = read_pid(&config.pid_path()) else {
 eprintln!("hubd: not running");
 return Ok(EXIT_NOT_RUNNING);
 };
 if !is_process_alive(pid) {
 eprintln!("hubd: not running");
 return Ok(EXIT_NOT_RUNNING);
 }

 let runtime = tokio::runtime::Runtime::new().context("building tokio runtime")?;
 runtime.block_on(async move {
 let response = ipc::send(&config.socket_path(), &IpcRequest::Shutdown { force }).await?;
 match response {
 IpcResponse::ShuttingDown => {
 let deadline = tokio::time::Instant::now() + std::time::Duration::from_millis(timeout_ms);
 while tokio::time::Instant::now() < deadline && is_process_alive(pid) {
 tokio::time::sleep(std::time::Duration::from_millis(100)).await;
 }
 println!("hubd: stopped");
 Ok(EXIT_OK)
 }
 IpcResponse::Error(message) => Err(anyhow!("daemon reported an error: {message}")),
 IpcResponse::Status(_) => Err(anyhow!("unexpected response to shutdown request")),
 }
 })
}

fn status(config: &Config, json: bool) -> Result<i32> {
 let Some(pid) = read_pid(&config.pid_path()) else {
 eprintln!("hubd: not running");
 return Ok(EXIT_NOT_RUNNING);
 };
 if !is_process_alive(pid) {
 eprintln!("hubd: not running");
 return Ok(EXIT_NOT_RUNNING);
 }

 let runtime = tokio::runtime::Runtime::new().context("building tokio runtime")?;
 runtime.block_on(async move {
 let response = ipc::send(&config.socket_path(), &IpcRequest::Status).await?;
 match response {
 IpcResponse::Status(snapshot) => {
 if json {
 println!("{}", serde_json::to_string_pretty(&snapshot)?);
 } else {
 println!("hubd: running (pid {})", snapshot.pid);
 println!("uptime: {}ms", snapshot.uptime_ms);
 println!("prs: {}/{} completed", snapshot.prs_completed, snapshot.prs_total);
 println!("agents:");
 for agent in &snapshot.agents {
 println!(
 " {} ({}) [{}] pr={}",
 agent.id,
 agent.agent_type,
 agent.lifecycle,
 agent.assigned_pr.as_deref().unwrap_or("-")
 );
 }
 }
 Ok(EXIT_OK)
 }
 IpcResponse::Error(message) => Err(anyhow!("daemon reported an error: {message}")),
 IpcResponse::ShuttingDown => Err(anyhow!("unexpected response to status request")),
 }
 })
}

/// Dispatches one PR (or sweeps for all schedulable work) on an
/// already-running daemon. `--watch` polls until every targeted PR
/// reaches a terminal cold state (`approved` or `broken`); `--dry-run`
/// reports what would be dispatched without dispatching it.
fn run_pr(config: &Config, pr_id: Option<String>, watch: bool, dry_run: bool) -> Result<i32> {
 if read_pid(&config.pid_path()).filter(|pid| is_process_alive(*pid)).is_none() {
 eprintln!("hubd: not running");
 return Ok(EXIT_NOT_RUNNING);
 }

 let runtime = tokio::runtime::Runtime::new().context("building tokio runtime")?;
 runtime.block_on(async move {
 let mut results = send_run(config, pr_id.clone(), dry_run).await?;
 if watch && !dry_run {
 let deadline = tokio::time::Instant::now() + std::time::Duration::from_secs(300);
 while tokio::time::Instant::now() < deadline && results.iter().any(|r| !is_terminal_cold_state(&r.cold_state)) {
 tokio::time::sleep(std::time::Duration::from_millis(500)).await;
 results = send_run(config, pr_id.clone(), false).await?;
 }
 }

 print_run_results(&results, dry_run);
 let any_failed = results.iter().any(|r| r.cold_state == "broken");
 Ok(if any_failed { EXIT_FAILURE } else { EXIT_OK })
 })
}

async fn send_run(config: &Config, pr_id: Option<String>, dry_run: bool) -> Result<Vec<RunResult>> {
 match ipc::send(&config.socket_path(), &IpcRequest::Run { pr_id, dry_run }).await? {
 IpcResponse::Run(results) => Ok(results),
 IpcResponse::Error(message) => Err(anyhow!("daemon reported an error: {message}")),
 _ => Err(anyhow!("unexpected response to run request")),
 }
}

fn is_terminal_cold_state(cold_state: &str) -> bool {
 matches!(cold_state, "approved" | "broken")
}

fn print_run_results(results: &[RunResult], dry_run: bool) {
 for result in results {
 let mark = if dry_run {
 if result.dispatched { "→" } else { "·" }
 } else {
 match result.cold_state.as_str() {
 "approved" | "completed" => "✓",
 "broken" => "✗",
 _ => "…",
 }
 };
 println!("{mark} {} ({})", result.pr_id, result.cold_state);
 }
 let done = results.iter().filter(|r| matches!(r.cold_state.as_str(), "approved" | "completed")).count();
 println!("{done}/{} done", results.len());
}
