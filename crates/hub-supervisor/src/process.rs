// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process supervisor: spawns agent child processes, watches for
//! crash exits, and enforces the restart budget and concurrency cap.

use crate::error::SupervisorError;
use crate::launcher::{EntryPoints, ProcessLauncher, SpawnSpec};
use hub_core::{AgentId, AgentType};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct SupervisorConfig {
 pub max_concurrent_agents: usize,
 pub restart_budget: u32,
 pub restart_delay: Duration,
 pub shutdown_timeout: Duration,
 /// Base directory for per-agent captured output (`<dir>/<agent_id>.log`).
 /// `None` disables output capture entirely.
 pub agents_log_dir: Option<std::path::PathBuf>,
}

impl Default for SupervisorConfig {
 fn default() -> Self {
 Self {
 max_concurrent_agents: 5,
 restart_budget: 2,
 restart_delay: Duration::from_millis(100),
 shutdown_timeout: Duration::from_secs(5),
 agents_log_dir: None,
 }
 }
}

#[derive(Debug, Clone)]
struct Tracked {
 pid: u32,
 agent_type: AgentType,
 restarts_used: u32,
}

/// Owns the live set of spawned agent processes. `tokio::process::Child`
/// handles, timers, and pid bookkeeping belong to the supervisor
/// exclusively.
pub struct Supervisor<L: ProcessLauncher> {
 launcher: Arc<L>,
 entry_points: EntryPoints,
 config: SupervisorConfig,
 env_base: Vec<(String, String)>,
 tracked: HashMap<AgentId, Tracked>,
 next_id_per_type: HashMap<AgentType, u64>,
}

impl<L: ProcessLauncher> Supervisor<L> {
 pub fn new(
 launcher: Arc<L>,
 entry_points: EntryPoints,
 config: SupervisorConfig,
 env_base: Vec<(String, String)>,
 ) -> Self {
 Self {
 launcher,
 entry_points,
 config,
 env_base,
 tracked: HashMap::new(),
 next_id_per_type: HashMap::new(),
 }
 }

 pub fn agent_count(&self) -> usize {
 self.tracked.len()
 }

 fn next_agent_id(&mut self, agent_type: AgentType) -> AgentId {
 let counter = self.next_id_per_type.entry(agent_type).or_insert(0);
 *counter += 1;
 AgentId::allocate(&agent_type.to_string(), *counter)
 }

 /// Spawns a fresh agent of the given type, allocating its id from the
 /// `${type}-agent-${n}` sequence.
 pub async fn spawn(&mut self, agent_type: AgentType) -> Result<AgentId, SupervisorError> {
 if self.tracked.len() >= self.config.max_concurrent_agents {
 return Err(SupervisorError::CapacityExceeded(self.config.max_concurrent_agents));
 }
 let agent_id = self.next_agent_id(agent_type);
 self.spawn_with_id(agent_id.clone(), agent_type).await?;
 Ok(agent_id)
 }

 async fn spawn_with_id(&mut self, agent_id: AgentId, agent_type: AgentType) -> Result<(), SupervisorError> {
 let command = self
.entry_points
.command_for(agent_type)
.ok_or_else(|| SupervisorError::SpawnFailed(format!("no entry point for {agent_type}")))?
.clone();

 let mut env = self.env_base.clone();
 env.push(("AGENT_ID".to_string(), agent_id.to_string()));
 env.push(("AGENT_TYPE".to_string(), agent_type.to_string()));

 let log_path = if let Some(dir) = &self.config.agents_log_dir {
 tokio::fs::create_dir_all(dir).await.map_err(|e| SupervisorError::SpawnFailed(e.to_string()))?;
 Some(dir.join(format!("{agent_id}.log")))
 } else {
 None
 };

 let pid = self
.launcher
.spawn(SpawnSpec { command, env, log_path })
.await
.map_err(|e| SupervisorError::SpawnFailed(e.to_string()))?;

 self.tracked.insert(agent_id, Tracked { pid, agent_type, restarts_used: 0 });
 Ok(())
 }

 /// Graceful shutdown: sends SIGTERM, waits up to `shutdown_timeout`
 /// polling `has_exited`, force-kills if still alive, then deregisters.
 pub async fn terminate(&mut self, agent_id: &AgentId) -> Result<(), SupervisorError> {
 let tracked = self.tracked.get(agent_id).ok_or_else(|| SupervisorError::UnknownAgent(agent_id.clone()))?;
 let pid = tracked.pid;

 self.launcher.terminate(pid).await.map_err(|e| SupervisorError::SpawnFailed(e.to_string()))?;

 let deadline = tokio::time::Instant::now() + self.config.shutdown_timeout;
 while tokio::time::Instant::now() < deadline {
 if self.launcher.has_exited(pid).await {
 break;
 }
 tokio::time::sleep(Duration::from_millis(50)).await;
 }
 if !self.launcher.has_exited(pid).await {
 self.launcher.kill(pid).await.map_err(|e| SupervisorError::SpawnFailed(e.to_string()))?;
 }

 self.tracked.remove(agent_id);
 Ok(())
 }

 /// Terminates every tracked agent. Each `terminate` call needs `&mut
 /// self`, so agents are stopped one at a time rather than truly
 /// concurrently; each still observes its own `shutdown_timeout`.
 pub async fn shutdown_all(&mut self) {
 let ids: Vec<AgentId> = self.tracked.keys().cloned().collect();
 for id in &ids {
 let _ = self.terminate(id).await;
 }
 }

 /// Called when the registry's heartbeat sweep or a process exit
 /// notification reports `agent_id` has died. Respawns preserving the
 /// id if the restart budget, reset on clean exit, allows it.
 pub async fn handle_exit(&mut self, agent_id: &AgentId, exit_code: Option<i32>) -> Result<bool, SupervisorError> {
 let tracked =
 self.tracked.get(agent_id).cloned().ok_or_else(|| SupervisorError::UnknownAgent(agent_id.clone()))?;

 if exit_code == Some(0) {
 self.tracked.remove(agent_id);
 return Ok(false);
 }

 if tracked.restarts_used >= self.config.restart_budget {
 self.tracked.remove(agent_id);
 return Err(SupervisorError::RestartBudgetExhausted(agent_id.clone()));
 }

 tokio::time::sleep(self.config.restart_delay).await;
 self.spawn_with_id(agent_id.clone(), tracked.agent_type).await?;
 if let Some(entry) = self.tracked.get_mut(agent_id) {
 entry.restarts_used = tracked.restarts_used + 1;
 }
 Ok(true)
 }
}

#[cfg(test)]
mod tests {
 use super::*;
 use crate::launcher::fake::FakeLauncher;
 use std::path::PathBuf;

 fn entry_points() -> EntryPoints {
 let mut table = HashMap::new();
 table.insert(AgentType::Worker, PathBuf::from("/usr/bin/hub-worker"));
 table.insert(AgentType::Planning, PathBuf::from("/usr/bin/hub-planning"));
 EntryPoints::new(table)
 }

 #[tokio::test]
 async fn spawn_allocates_sequential_ids() {
 let launcher = Arc::new(FakeLauncher::new());
 let mut supervisor = Supervisor::new(launcher, entry_points(), SupervisorConfig::default(), vec![]);
 let a = supervisor.spawn(AgentType::Worker).await.unwrap();
 let b = supervisor.spawn(AgentType::Worker).await.unwrap();
 assert_eq!(a, AgentId::new("worker-agent-1"));
 assert_eq!(b, AgentId::new("worker-agent-2"));
 }

 #[tokio::test]
 async fn spawn_fails_at_capacity() {
 let launcher = Arc::new(FakeLauncher::new());
 let config = SupervisorConfig { max_concurrent_agents: 1,..Default::default() };
 let mut supervisor = Supervisor::new(launcher, entry_points(), config, vec![]);
 supervisor.spawn(AgentType::Worker).await.unwrap();
 let result = supervisor.spawn(AgentType::Worker).await;
 assert!(matches!(result, Err(SupervisorError::CapacityExceeded(1))));
 }

 #[tokio::test]
 async fn terminate_deregisters_agent() {
 let launcher = Arc::new(FakeLauncher::new());
 let mut supervisor = Supervisor::new(launcher.clone(), entry_points(), SupervisorConfig::default(), vec![]);
 let id = supervisor.spawn(AgentType::Worker).await.unwrap();
 supervisor.terminate(&id).await.unwrap();
 assert_eq!(supervisor.agent_count(), 0);
 }

 #[tokio::test]
 async fn clean_exit_does_not_restart() {
 let launcher = Arc::new(FakeLauncher::new());
 let mut supervisor = Supervisor::new(launcher, entry_points(), SupervisorConfig::default(), vec![]);
 let id = supervisor.spawn(AgentType::Worker).await.unwrap();
 let restarted = supervisor.handle_exit(&id, Some(0)).await.unwrap();
 assert!(!restarted);
 assert_eq!(supervisor.agent_count(), 0);
 }

 #[tokio::test]
 async fn crash_respawns_preserving_id_until_budget_exhausted() {
 let launcher = Arc::new(FakeLauncher::new());
 let config = SupervisorConfig { restart_budget: 2, restart_delay: Duration::from_millis(1),..Default::default() };
 let mut supervisor = Supervisor::new(launcher, entry_points(), config, vec![]);
 let id = supervisor.spawn(AgentType::Worker).await.unwrap();

 assert!(supervisor.handle_exit(&id, Some(1)).await.unwrap());
 assert!(supervisor.handle_exit(&id, Some(1)).await.unwrap());
 let result = supervisor.handle_exit(&id, Some(1)).await;
 assert!(matches!(result, Err(SupervisorError::RestartBudgetExhausted(_))));
 assert_eq!(supervisor.agent_count(), 0);
 }
}
