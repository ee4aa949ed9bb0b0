// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The orchestrator: boots the dependency graph from the manifest,
//! runs the scheduling/assignment control loop, and reacts to agent
//! lifecycle messages delivered over the bus.
//!
//! Agent lifecycle is tracked authoritatively by the hub's own dispatch and
//! completion bookkeeping, not by parsing a heartbeat's `state` string back
//! into `AgentLifecycle` — there's no `FromStr` for it (display-only, by
//! design), and trusting a self-reported string for something the hub
//! already knows from its own assignment records would just be a second,
//! possibly-stale source of truth. A heartbeat's `state` field is logging
//! input only; the registry's `lifecycle` field is driven entirely by
//! assignment/completion/failure events this module observes directly.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::PathBuf;
use std::sync::Arc;

use hub_bus::{channels, KvStore, MessageBus};
use hub_core::{
 Agent, AgentId, AgentLifecycle, AgentType, Assignment, ColdState, HotState, PrId, SystemClock,
};
use hub_manifest::Manifest;
use hub_scheduler::{AssignmentManager, DependencyGraph, Strategy};
use hub_storage::StateSynchronizer;
use hub_supervisor::{AgentRegistry, EntryPoints, ProcessLauncher, Supervisor};
use hub_wire::{
 AssignmentPayload, CompletePayload, Envelope, FailedPayload, HeartbeatPayload, MessageType,
 ProgressPayload, RegistrationPayload,
};
use tokio::sync::{Mutex, Notify};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::DaemonError;
use crate::ipc::{AgentSummary, DaemonHandle, RunResult, StatusSnapshot};

/// What the hub dispatched a PR to, so a later `complete`/`failed` message
/// knows which stage of the lifecycle just ran without needing to ask the
/// agent what kind it is.
#[derive(Debug, Clone)]
struct Dispatch {
 agent_id: AgentId,
 agent_type: AgentType,
}

struct HubState<L: ProcessLauncher> {
 manifest: Manifest,
 graph: DependencyGraph,
 registry: AgentRegistry,
 supervisor: Supervisor<L>,
 assignment_manager: AssignmentManager,
 /// PRs currently out with an agent. Scheduler selections are monotone:
 /// once a PR lands here it drops out of `available` candidacy until
 /// completion or failure removes it again, regardless of its cold state.
 assigned: BTreeMap<PrId, Dispatch>,
 draining: bool,
}

pub struct Hub<L: ProcessLauncher> {
 config: Config,
 kv: Arc<dyn KvStore>,
 bus: Arc<MessageBus>,
 state: Mutex<HubState<L>>,
 started_at_ms: u64,
 shutdown_notify: Arc<Notify>,
}

/// The cold-state target of a completion, grounded directly in `COLD_EDGES`
/// and the assignment manager's eligibility table: each agent type only
/// ever picks up PRs in the states its table names, and each of those
/// states has exactly one "forward" edge for that agent type to take.
/// Review's job runs against an already-terminal `approved` PR and never
/// changes its cold state.
fn advance_state(agent_type: AgentType, current: ColdState, success: bool) -> Option<ColdState> {
 match (agent_type, current, success) {
 (AgentType::Planning, ColdState::New, true) => Some(ColdState::Ready),
 (AgentType::Planning, ColdState::Ready, true) => Some(ColdState::Planned),
 (AgentType::Worker, ColdState::Planned, true) => Some(ColdState::Completed),
 (AgentType::Worker, ColdState::Broken, true) => Some(ColdState::Planned),
 (AgentType::Qc, ColdState::Completed, true) => Some(ColdState::Approved),
 (AgentType::Qc, ColdState::Completed, false) => Some(ColdState::Broken),
 _ => None,
 }
}

/// The hot stage a dispatch enters, derived from the same agent-type/
/// cold-state pairing `advance_state` drives forward: planning has two
/// passes over a PR (investigating it new, then planning it once ready),
/// worker executes it, and qc/review both review it.
fn hot_state_for(agent_type: AgentType, cold_state: ColdState) -> HotState {
 match agent_type {
 AgentType::Planning if cold_state == ColdState::New => HotState::Investigating,
 AgentType::Planning => HotState::Planning,
 AgentType::Worker => HotState::InProgress,
 AgentType::Qc | AgentType::Review => HotState::UnderReview,
 }
}

impl<L: ProcessLauncher + 'static> Hub<L> {
 /// Boot sequence: parse the manifest, reconcile the KV store against it
 /// (crash recovery, then hydration), and build the in-memory dependency
 /// graph the scheduler runs against.
 pub async fn boot(
 config: Config,
 kv: Arc<dyn KvStore>,
 launcher: Arc<L>,
 entry_points: EntryPoints,
 ) -> Result<Arc<Self>, DaemonError> {
 let manifest_text = tokio::fs::read_to_string(&config.manifest_path).await?;
 let manifest = hub_manifest::parse(&manifest_text)?;

 let synchronizer = StateSynchronizer::new(kv.clone());
 synchronizer.recover_from_crash(&manifest).await?;
 synchronizer.hydrate(&manifest).await?;

 let entries = manifest.entries.iter().map(|entry| {
 let pr = entry.to_pr();
 (pr.id, pr.dependencies, pr.files, pr.cold_state, pr.priority, pr.complexity)
 });
 let graph = DependencyGraph::build(entries)?;

 let registry = AgentRegistry::new();
 let env_base = vec![("KV_URL".to_string(), config.kv_url.clone())];
 let supervisor = Supervisor::new(launcher, entry_points, config.supervisor_config(), env_base);
 let assignment_manager = AssignmentManager::new(Strategy::FirstAvailable);
 let bus = Arc::new(MessageBus::new(kv.clone()));
 let started_at_ms = SystemClock.epoch_ms();

 Ok(Arc::new(Self {
 config,
 kv,
 bus,
 state: Mutex::new(HubState {
 manifest,
 graph,
 registry,
 supervisor,
 assignment_manager,
 assigned: BTreeMap::new(),
 draining: false,
 }),
 started_at_ms,
 shutdown_notify: Arc::new(Notify::new()),
 }))
 }

 pub fn shutdown_notify(&self) -> Arc<Notify> {
 self.shutdown_notify.clone()
 }

 fn subscribe(self: &Arc<Self>) -> Result<(), DaemonError> {
 let hub = self.clone();
 self.bus.subscribe(channels::HUB_MESSAGES, move |envelope| {
 let hub = hub.clone();
 tokio::spawn(async move {
 hub.handle_envelope(envelope).await;
 });
 })?;
 Ok(())
 }

 /// Runs the control loop until a shutdown is requested: ticks the
 /// scheduler/assignment pass on `sweep_interval`, reacting to envelopes
 /// from the bus subscription in between ticks.
 pub async fn run(self: Arc<Self>) -> Result<(), DaemonError> {
 self.subscribe()?;
 let sweep_interval = self.config.sweep_interval();
 loop {
 tokio::select! {
 _ = tokio::time::sleep(sweep_interval) => {
 if let Err(error) = self.tick().await {
 warn!(%error, "tick failed");
 }
 }
 _ = self.shutdown_notify.notified() => {
 info!("shutdown requested, draining");
 self.drain().await;
 break;
 }
 }
 }
 Ok(())
 }

 async fn drain(&self) {
 self.bus.unsubscribe_all();
 let mut state = self.state.lock().await;
 state.supervisor.shutdown_all().await;
 }

 /// One control-loop pass: sweep crashed agents, spawn agents to cover
 /// uncovered candidate types, run the MIS scheduler over what's left,
 /// and dispatch the resulting assignments.
 async fn tick(&self) -> Result<(), DaemonError> {
 let now_ms = SystemClock.epoch_ms();
 let mut state = self.state.lock().await;
 if state.draining {
 return Ok(());
 }

 let crashed = state.registry.sweep_crashed(now_ms, self.config.registry_sweep_config());
 for agent_id in crashed {
 warn!(%agent_id, "agent missed its heartbeat deadline, treating as crashed");
 self.release_agent(&mut state, &agent_id);
 state.registry.deregister(&agent_id);
 let agent_info_key = hub_storage::keys::agent_info(agent_id.as_str());
 if let Err(error) = self.kv.del(&[agent_info_key.as_str()]).await {
 warn!(%agent_id, %error, "failed to clear crashed agent's kv mirror");
 }
 if let Err(error) = state.supervisor.handle_exit(&agent_id, None).await {
 warn!(%agent_id, %error, "agent exceeded its restart budget");
 }
 }

 self.ensure_capacity(&mut state).await;

 let selected = self.select_candidates(&state);
 let selected_with_state: Vec<(PrId, ColdState)> =
 selected.iter().filter_map(|id| state.graph.get(id).map(|node| (id.clone(), node.state))).collect();
 let agents_snapshot: Vec<Agent> = state.registry.all().cloned().collect();
 let records = state.assignment_manager.assign(&selected_with_state, &agents_snapshot, now_ms);

 for record in records {
 self.dispatch(&mut state, record, now_ms).await;
 }

 Ok(())
 }

 /// The pr_ids the scheduler would select to run right now, without
 /// creating assignment records or agent bindings. Shared by `tick`'s real
 /// dispatch pass and `run_now`'s dry-run reporting.
 fn select_candidates(&self, state: &HubState<L>) -> Vec<PrId> {
 let candidates: Vec<&hub_scheduler::Node> =
 state.graph.available().into_iter().filter(|node| !state.assigned.contains_key(&node.id)).collect();
 let working_files: BTreeSet<PathBuf> = state
.assigned
.keys()
.filter_map(|id| state.graph.get(id))
.flat_map(|node| node.files.iter().cloned())
.collect();
 let idle_capacity = state.registry.all().filter(|agent| agent.is_idle()).count();

 let result = hub_scheduler::schedule(&candidates, &working_files, idle_capacity);
 if !result.blocked.is_empty() {
 debug!(blocked = result.blocked.len(), "scheduler left prs blocked this tick");
 }
 result.selected
 }

 /// Spawns agents to cover candidate types with no idle agent available,
 /// up to the configured concurrency cap. The registry gains no entry
 /// here; the spawned process registers itself once its `AgentRuntime`
 /// publishes its own registration envelope.
 async fn ensure_capacity(&self, state: &mut HubState<L>) {
 let needed_types: HashSet<AgentType> = state
.graph
.available()
.into_iter()
.filter(|node| !state.assigned.contains_key(&node.id))
.flat_map(|node| hub_scheduler::eligible_agent_types(node.state).iter().copied())
.collect();

 for agent_type in needed_types {
 let has_idle = state.registry.all().any(|agent| agent.agent_type == agent_type && agent.is_idle());
 if has_idle || state.supervisor.agent_count() >= self.config.max_concurrent_agents {
 continue;
 }
 match state.supervisor.spawn(agent_type).await {
 Ok(agent_id) => info!(%agent_id, %agent_type, "spawned agent to cover pending work"),
 Err(error) => warn!(%agent_type, %error, "failed to spawn agent"),
 }
 }
 }

 async fn dispatch(&self, state: &mut HubState<L>, record: hub_scheduler::AssignmentRecord, now_ms: u64) {
 let Some(node) = state.graph.get(&record.pr_id) else { return };
 let cold_state = node.state;
 let assignment = Assignment {
 pr_id: record.pr_id.clone(),
 assigned_at_ms: record.assigned_at_ms,
 priority: node.priority,
 complexity: node.complexity.clone(),
 estimated_duration_minutes: node.complexity.estimated_minutes,
 files: node.files.iter().cloned().collect(),
 };
 let Some(agent_type) = state.registry.get(&record.agent_id).map(|agent| agent.agent_type) else { return };

 state
.assigned
.insert(record.pr_id.clone(), Dispatch { agent_id: record.agent_id.clone(), agent_type });
 if let Some(agent) = state.registry.get_mut(&record.agent_id) {
 agent.assigned_pr = Some(record.pr_id.clone());
 agent.lifecycle = AgentLifecycle::Working;
 }

 let pr_agent_key = hub_storage::keys::pr_agent(&record.pr_id);
 if let Err(error) = self.kv.set(&pr_agent_key, record.agent_id.as_str()).await {
 warn!(%error, pr_id = %record.pr_id, "failed to record pr->agent assignment in kv");
 }

 let hot_state = hot_state_for(agent_type, cold_state);
 let pr_hot_state_key = hub_storage::keys::pr_hot_state(&record.pr_id);
 if let Err(error) = self.kv.set(&pr_hot_state_key, &hot_state.to_string()).await {
 warn!(%error, pr_id = %record.pr_id, "failed to record pr hot state in kv");
 }
 let pr_hot_state_timestamp_key = hub_storage::keys::pr_hot_state_timestamp(&record.pr_id);
 if let Err(error) = self.kv.set(&pr_hot_state_timestamp_key, &now_ms.to_string()).await {
 warn!(%error, pr_id = %record.pr_id, "failed to record pr hot state timestamp in kv");
 }

 let payload = match serde_json::to_value(&AssignmentPayload { assignment }) {
 Ok(value) => value,
 Err(error) => {
 warn!(%error, pr_id = %record.pr_id, "failed to encode assignment payload");
 return;
 }
 };
 let envelope =
 Envelope::new(nanoid::nanoid!(16), now_ms as i64, MessageType::Assignment, "hub", record.agent_id.as_str(), payload);
 if let Err(error) = self.bus.publish(&channels::agent_assignments(record.agent_id.as_str()), &envelope).await {
 warn!(%error, agent_id = %record.agent_id, "failed to publish assignment");
 }
 }

 /// Releases whatever PR `agent_id` was holding (if any) back into
 /// availability, without changing its cold state — used for both crash
 /// recovery and ordinary completion/failure handling.
 fn release_agent(&self, state: &mut HubState<L>, agent_id: &AgentId) {
 let stale_pr = state.assigned.iter().find(|(_, d)| &d.agent_id == agent_id).map(|(id, _)| id.clone());
 if let Some(pr_id) = stale_pr {
 state.assigned.remove(&pr_id);
 }
 state.assignment_manager.release(agent_id);
 }

 /// Mirrors a registry record into `agent:<id>:info`, the KV-store
 /// snapshot an external status query (or a freshly-booted hub) reads
 /// instead of needing this process's in-memory registry.
 async fn mirror_agent_info(&self, agent: &Agent) {
 let key = hub_storage::keys::agent_info(agent.id.as_str());
 let value = match serde_json::to_string(agent) {
 Ok(value) => value,
 Err(error) => {
 warn!(%error, agent_id = %agent.id, "failed to encode agent info for kv mirror");
 return;
 }
 };
 if let Err(error) = self.kv.set(&key, &value).await {
 warn!(%error, agent_id = %agent.id, "failed to mirror agent info in kv");
 }
 }

 async fn handle_envelope(self: Arc<Self>, envelope: Envelope) {
 match envelope.message_type {
 MessageType::Registration => self.on_registration(envelope).await,
 MessageType::Heartbeat => self.on_heartbeat(envelope).await,
 MessageType::Progress => self.on_progress(envelope),
 MessageType::Complete => self.on_complete(envelope).await,
 MessageType::Failed => self.on_failed(envelope).await,
 MessageType::Request | MessageType::Response | MessageType::Assignment => {
 // Agents exchange these on their own per-agent channels;
 // the hub's shared channel never carries them.
 }
 }
 }

 async fn on_registration(&self, envelope: Envelope) {
 let payload: RegistrationPayload = match serde_json::from_value(envelope.payload) {
 Ok(payload) => payload,
 Err(error) => {
 warn!(%error, "dropping malformed registration payload");
 return;
 }
 };
 let now_ms = SystemClock.epoch_ms();
 let mut agent = Agent::new(AgentId::new(payload.agent_id.clone()), payload.agent_type, now_ms, payload.capabilities);
 agent.lifecycle = AgentLifecycle::Idle;

 self.mirror_agent_info(&agent).await;
 let mut state = self.state.lock().await;
 state.registry.register(agent);
 info!(agent_id = %payload.agent_id, agent_type = %payload.agent_type, "agent registered");
 }

 async fn on_heartbeat(&self, envelope: Envelope) {
 if serde_json::from_value::<HeartbeatPayload>(envelope.payload.clone()).is_err() {
 warn!("dropping malformed heartbeat payload");
 return;
 }
 let now_ms = SystemClock.epoch_ms();
 let agent_id = AgentId::new(envelope.from);
 let mut state = self.state.lock().await;
 state.registry.record_heartbeat(&agent_id, now_ms);
 let snapshot = state.registry.get(&agent_id).cloned();
 drop(state);
 if let Some(agent) = snapshot {
 self.mirror_agent_info(&agent).await;
 }
 }

 fn on_progress(&self, envelope: Envelope) {
 match serde_json::from_value::<ProgressPayload>(envelope.payload) {
 Ok(payload) => info!(agent_id = %envelope.from, pr_id = %payload.pr_id, message = %payload.message, "progress"),
 Err(error) => warn!(%error, "dropping malformed progress payload"),
 }
 }

 async fn on_complete(&self, envelope: Envelope) {
 let payload: CompletePayload = match serde_json::from_value(envelope.payload) {
 Ok(payload) => payload,
 Err(error) => {
 warn!(%error, "dropping malformed complete payload");
 return;
 }
 };
 let agent_id = AgentId::new(envelope.from.clone());
 let mut state = self.state.lock().await;

 let Some(dispatch) = state.assigned.remove(&payload.pr_id) else {
 warn!(pr_id = %payload.pr_id, "completion for a pr the hub has no record of dispatching");
 return;
 };
 state.assignment_manager.release(&agent_id);
 if let Some(agent) = state.registry.get_mut(&agent_id) {
 agent.assigned_pr = None;
 agent.lifecycle = AgentLifecycle::Idle;
 }

 self.advance_and_persist(&mut state, &payload.pr_id, dispatch.agent_type, true).await;
 info!(agent_id = %envelope.from, pr_id = %payload.pr_id, "pr completed");
 }

 async fn on_failed(&self, envelope: Envelope) {
 let payload: FailedPayload = match serde_json::from_value(envelope.payload) {
 Ok(payload) => payload,
 Err(error) => {
 warn!(%error, "dropping malformed failed payload");
 return;
 }
 };
 let agent_id = AgentId::new(envelope.from.clone());
 let mut state = self.state.lock().await;

 if let Some(agent) = state.registry.get_mut(&agent_id) {
 agent.assigned_pr = None;
 agent.lifecycle = AgentLifecycle::Idle;
 }

 let Some(pr_id) = payload.pr_id.clone() else {
 warn!(agent_id = %envelope.from, error = %payload.error, "agent reported a failure with no pr_id");
 return;
 };
 let Some(dispatch) = state.assigned.remove(&pr_id) else { return };
 state.assignment_manager.release(&agent_id);

 self.advance_and_persist(&mut state, &pr_id, dispatch.agent_type, false).await;
 warn!(agent_id = %envelope.from, pr_id = %pr_id, error = %payload.error, "agent reported pr failure");
 }

 async fn advance_and_persist(&self, state: &mut HubState<L>, pr_id: &PrId, agent_type: AgentType, success: bool) {
 let pr_agent_key = hub_storage::keys::pr_agent(pr_id);
 let pr_hot_state_key = hub_storage::keys::pr_hot_state(pr_id);
 let pr_hot_state_timestamp_key = hub_storage::keys::pr_hot_state_timestamp(pr_id);
 if let Err(error) =
 self.kv.del(&[pr_agent_key.as_str(), pr_hot_state_key.as_str(), pr_hot_state_timestamp_key.as_str()]).await
 {
 warn!(%error, pr_id = %pr_id, "failed to clear pr hot state after release");
 }

 let Some(current) = state.graph.get(pr_id).map(|node| node.state) else { return };
 let Some(next) = advance_state(agent_type, current, success) else { return };
 if let Err(error) = hub_core::check_cold_transition(current, next) {
 warn!(%error, pr_id = %pr_id, "computed cold-state advance rejected by the transition table");
 return;
 }
 if state.graph.set_state(pr_id, next).is_err() {
 return;
 }
 if let Some(entry) = state.manifest.get_mut(pr_id.as_str()) {
 entry.frontmatter.cold_state = next;
 }
 if let Err(error) = self.kv.set(&hub_storage::keys::pr_cold_state(pr_id), &next.to_string()).await {
 warn!(%error, pr_id = %pr_id, "failed to update cold state in kv");
 }
 let markdown = hub_manifest::to_markdown(&state.manifest);
 if let Err(error) = tokio::fs::write(&self.config.manifest_path, markdown).await {
 warn!(%error, "failed to persist manifest after a cold-state transition");
 }
 }
}

#[async_trait::async_trait]
impl<L: ProcessLauncher + 'static> DaemonHandle for Hub<L> {
 async fn status(&self) -> StatusSnapshot {
 let state = self.state.lock().await;
 let agents = state
.registry
.all()
.map(|agent| AgentSummary {
 id: agent.id.to_string(),
 agent_type: agent.agent_type.to_string(),
 lifecycle: agent.lifecycle.to_string(),
 assigned_pr: agent.assigned_pr.as_ref().map(|pr_id| pr_id.to_string()),
 })
.collect();
 let prs_total = state.manifest.entries.len();
 let prs_completed = state
.manifest
.entries
.iter()
.filter(|entry| matches!(entry.frontmatter.cold_state, ColdState::Completed | ColdState::Approved))
.count();

 StatusSnapshot {
 pid: std::process::id(),
 uptime_ms: SystemClock.epoch_ms().saturating_sub(self.started_at_ms),
 agents,
 prs_completed,
 prs_total,
 }
 }

 async fn request_shutdown(&self, _force: bool) {
 {
 let mut state = self.state.lock().await;
 state.draining = true;
 }
 self.shutdown_notify.notify_one();
 }

 /// Forces an out-of-band scheduling pass (bypassing `sweep_interval`)
 /// scoped to `pr_id` if given, otherwise every currently schedulable PR.
 /// A dry run reports what the scheduler would select without dispatching
 /// it; a real run dispatches through the normal `tick` path first.
 async fn run_now(&self, pr_id: Option<String>, dry_run: bool) -> Vec<RunResult> {
 if !dry_run {
 if let Err(error) = self.tick().await {
 warn!(%error, "run request's tick failed");
 }
 }

 let state = self.state.lock().await;
 let targets: Vec<PrId> = match &pr_id {
 Some(id) => vec![PrId::new(id.clone())],
 None => state.manifest.entries.iter().map(|entry| PrId::new(entry.pr_id())).collect(),
 };
 let selected: BTreeSet<PrId> = if dry_run { self.select_candidates(&state).into_iter().collect() } else { BTreeSet::new() };

 targets
.into_iter()
.filter_map(|id| {
 state.graph.get(&id).map(|node| RunResult {
 pr_id: id.to_string(),
 cold_state: node.state.to_string(),
 dispatched: if dry_run { selected.contains(&id) } else { state.assigned.contains_key(&id) },
 })
 })
.collect()
 }
}

#[cfg(test)]
mod tests {
 use super::*;
 use hub_core::{Capabilities, ModelTier};
 use hub_supervisor::launcher::fake::FakeLauncher;
 use std::collections::HashMap;

 fn manifest_text() -> &'static str {
 "---\n\
pr_id: PR-001\n\
title: Add widget\n\
cold_state: new\n\
priority: high\n\
complexity: {score: 5, estimated_minutes: 50, suggested_model: sonnet, rationale: \"straightforward\"}\n\
dependencies: []\n\
estimated_files:\n\
 - {path: src/widget.rs, action: create, description: \"new module\"}\n\
---\n\
Implement the widget.\n"
 }

 fn entry_points() -> EntryPoints {
 let mut table = HashMap::new();
 table.insert(AgentType::Planning, PathBuf::from("/bin/true"));
 table.insert(AgentType::Worker, PathBuf::from("/bin/true"));
 table.insert(AgentType::Qc, PathBuf::from("/bin/true"));
 table.insert(AgentType::Review, PathBuf::from("/bin/true"));
 EntryPoints::new(table)
 }

 async fn boot_hub(manifest: &str) -> (Arc<Hub<FakeLauncher>>, tempfile::TempDir) {
 let dir = tempfile::tempdir().unwrap();
 let manifest_path = dir.path().join("MANIFEST.md");
 std::fs::write(&manifest_path, manifest).unwrap();
 let config = Config { manifest_path: manifest_path.clone(), work_dir: dir.path().to_path_buf(),..Config::default() };

 let kv: Arc<dyn KvStore> = hub_bus::InProcessKv::shared();
 let launcher = Arc::new(FakeLauncher::new());
 let hub = Hub::boot(config, kv, launcher, entry_points()).await.unwrap();
 (hub, dir)
 }

 fn registration_envelope(agent_id: &str, agent_type: AgentType) -> Envelope {
 let payload = RegistrationPayload {
 agent_id: agent_id.to_string(),
 agent_type,
 capabilities: Capabilities { max_complexity: 10, preferred_tier: ModelTier::Sonnet },
 };
 Envelope::new(
 nanoid::nanoid!(8),
 0,
 MessageType::Registration,
 agent_id,
 "hub",
 serde_json::to_value(payload).unwrap(),
 )
 }

 #[tokio::test]
 async fn boot_hydrates_graph_and_kv_from_the_manifest() {
 let (hub, _dir) = boot_hub(manifest_text()).await;
 let snapshot = hub.status().await;
 assert_eq!(snapshot.prs_total, 1);
 assert_eq!(snapshot.prs_completed, 0);

 let stored = hub.kv.get(&hub_storage::keys::pr_cold_state(&PrId::new("PR-001"))).await.unwrap();
 assert_eq!(stored, Some("new".to_string()));
 }

 #[tokio::test]
 async fn tick_spawns_a_planning_agent_for_a_new_pr_with_no_idle_agent() {
 let (hub, _dir) = boot_hub(manifest_text()).await;
 hub.tick().await.unwrap();

 let state = hub.state.lock().await;
 assert_eq!(state.supervisor.agent_count(), 1);
 assert!(state.assigned.is_empty(), "nothing to dispatch to until the spawned agent registers");
 }

 #[tokio::test]
 async fn registered_idle_agent_gets_dispatched_on_the_next_tick() {
 let (hub, _dir) = boot_hub(manifest_text()).await;
 hub.on_registration(registration_envelope("planning-agent-1", AgentType::Planning)).await;

 hub.tick().await.unwrap();

 let state = hub.state.lock().await;
 let pr_id = PrId::new("PR-001");
 assert!(state.assigned.contains_key(&pr_id));
 let agent = state.registry.get(&AgentId::new("planning-agent-1")).unwrap();
 assert_eq!(agent.lifecycle, AgentLifecycle::Working);
 assert_eq!(agent.assigned_pr, Some(pr_id.clone()));

 drop(state);
 let recorded = hub.kv.get(&hub_storage::keys::pr_agent(&pr_id)).await.unwrap();
 assert_eq!(recorded, Some("planning-agent-1".to_string()));
 let hot_state = hub.kv.get(&hub_storage::keys::pr_hot_state(&pr_id)).await.unwrap();
 assert_eq!(hot_state, Some("investigating".to_string()));
 assert!(hub.kv.get(&hub_storage::keys::pr_hot_state_timestamp(&pr_id)).await.unwrap().is_some());
 }

 #[tokio::test]
 async fn registration_mirrors_agent_info_into_kv() {
 let (hub, _dir) = boot_hub(manifest_text()).await;
 hub.on_registration(registration_envelope("planning-agent-1", AgentType::Planning)).await;

 let stored = hub.kv.get(&hub_storage::keys::agent_info("planning-agent-1")).await.unwrap().unwrap();
 let agent: Agent = serde_json::from_str(&stored).unwrap();
 assert_eq!(agent.id, AgentId::new("planning-agent-1"));
 assert_eq!(agent.lifecycle, AgentLifecycle::Idle);
 }

 #[tokio::test]
 async fn completion_clears_the_hot_state_triad() {
 let (hub, _dir) = boot_hub(manifest_text()).await;
 hub.on_registration(registration_envelope("planning-agent-1", AgentType::Planning)).await;
 hub.tick().await.unwrap();

 let pr_id = PrId::new("PR-001");
 assert!(hub.kv.get(&hub_storage::keys::pr_hot_state(&pr_id)).await.unwrap().is_some());

 let complete = Envelope::new(
 nanoid::nanoid!(8),
 1,
 MessageType::Complete,
 "planning-agent-1",
 "hub",
 serde_json::to_value(CompletePayload { pr_id: pr_id.clone(), result: serde_json::json!({}) }).unwrap(),
 );
 hub.on_complete(complete).await;

 assert_eq!(hub.kv.get(&hub_storage::keys::pr_agent(&pr_id)).await.unwrap(), None);
 assert_eq!(hub.kv.get(&hub_storage::keys::pr_hot_state(&pr_id)).await.unwrap(), None);
 assert_eq!(hub.kv.get(&hub_storage::keys::pr_hot_state_timestamp(&pr_id)).await.unwrap(), None);
 }

 #[tokio::test]
 async fn complete_advances_cold_state_and_persists_the_manifest() {
 let (hub, dir) = boot_hub(manifest_text()).await;
 hub.on_registration(registration_envelope("planning-agent-1", AgentType::Planning)).await;
 hub.tick().await.unwrap();

 let complete = Envelope::new(
 nanoid::nanoid!(8),
 1,
 MessageType::Complete,
 "planning-agent-1",
 "hub",
 serde_json::to_value(CompletePayload { pr_id: PrId::new("PR-001"), result: serde_json::json!({}) }).unwrap(),
 );
 hub.on_complete(complete).await;

 let state = hub.state.lock().await;
 assert!(!state.assigned.contains_key(&PrId::new("PR-001")));
 let agent = state.registry.get(&AgentId::new("planning-agent-1")).unwrap();
 assert_eq!(agent.lifecycle, AgentLifecycle::Idle);
 assert_eq!(state.graph.get(&PrId::new("PR-001")).unwrap().state, ColdState::Ready);
 drop(state);

 let persisted = tokio::fs::read_to_string(dir.path().join("MANIFEST.md")).await.unwrap();
 let reparsed = hub_manifest::parse(&persisted).unwrap();
 assert_eq!(reparsed.entries[0].frontmatter.cold_state, ColdState::Ready);
 }

 #[tokio::test]
 async fn failed_completion_releases_the_agent_without_advancing_past_its_failure_target() {
 let (hub, _dir) = boot_hub(manifest_text()).await;
 hub.on_registration(registration_envelope("qc-agent-1", AgentType::Qc)).await;

 // Force the pr into a state a qc agent would pick up, bypassing the
 // scheduler so this test isolates on_failed's own bookkeeping.
 {
 let mut state = hub.state.lock().await;
 state.graph.set_state(&PrId::new("PR-001"), ColdState::Completed).unwrap();
 state.assigned.insert(PrId::new("PR-001"), Dispatch { agent_id: AgentId::new("qc-agent-1"), agent_type: AgentType::Qc });
 }

 let failed = Envelope::new(
 nanoid::nanoid!(8),
 1,
 MessageType::Failed,
 "qc-agent-1",
 "hub",
 serde_json::to_value(FailedPayload { pr_id: Some(PrId::new("PR-001")), error: hub_core::HubError::invariant("qc rejected the pr") })
.unwrap(),
 );
 hub.on_failed(failed).await;

 let state = hub.state.lock().await;
 assert!(!state.assigned.contains_key(&PrId::new("PR-001")));
 assert_eq!(state.graph.get(&PrId::new("PR-001")).unwrap().state, ColdState::Broken);
 let agent = state.registry.get(&AgentId::new("qc-agent-1")).unwrap();
 assert_eq!(agent.lifecycle, AgentLifecycle::Idle);
 }

 #[tokio::test]
 async fn heartbeat_updates_last_seen_without_touching_lifecycle() {
 let (hub, _dir) = boot_hub(manifest_text()).await;
 hub.on_registration(registration_envelope("planning-agent-1", AgentType::Planning)).await;
 let seen_at_registration = hub.state.lock().await.registry.get(&AgentId::new("planning-agent-1")).unwrap().last_heartbeat_ms;

 tokio::time::sleep(std::time::Duration::from_millis(5)).await;
 let payload = HeartbeatPayload { state: "working".to_string(), assigned_pr: None, memory_mb: 128, ts: 42 };
 let heartbeat =
 Envelope::new(nanoid::nanoid!(8), 42, MessageType::Heartbeat, "planning-agent-1", "hub", serde_json::to_value(payload).unwrap());
 hub.on_heartbeat(heartbeat).await;

 let state = hub.state.lock().await;
 let agent = state.registry.get(&AgentId::new("planning-agent-1")).unwrap();
 // The agent was registered idle and never dispatched; a heartbeat's
 // self-reported `state` string must not override that.
 assert_eq!(agent.lifecycle, AgentLifecycle::Idle);
 assert!(agent.last_heartbeat_ms > seen_at_registration);
 }

 #[tokio::test]
 async fn malformed_progress_payload_is_dropped_without_panicking() {
 let (hub, _dir) = boot_hub(manifest_text()).await;
 let envelope = Envelope::new(nanoid::nanoid!(8), 0, MessageType::Progress, "whoever", "hub", serde_json::json!("not an object"));
 hub.on_progress(envelope);
 }

 #[test]
 fn advance_state_follows_the_per_agent_type_cold_edges() {
 assert_eq!(advance_state(AgentType::Planning, ColdState::New, true), Some(ColdState::Ready));
 assert_eq!(advance_state(AgentType::Planning, ColdState::Ready, true), Some(ColdState::Planned));
 assert_eq!(advance_state(AgentType::Worker, ColdState::Planned, true), Some(ColdState::Completed));
 assert_eq!(advance_state(AgentType::Worker, ColdState::Broken, true), Some(ColdState::Planned));
 assert_eq!(advance_state(AgentType::Qc, ColdState::Completed, true), Some(ColdState::Approved));
 assert_eq!(advance_state(AgentType::Qc, ColdState::Completed, false), Some(ColdState::Broken));
 assert_eq!(advance_state(AgentType::Review, ColdState::Approved, true), None);
 assert_eq!(advance_state(AgentType::Worker, ColdState::Planned, false), None);
 }

 #[test]
 fn hot_state_follows_the_per_agent_type_stage() {
 assert_eq!(hot_state_for(AgentType::Planning, ColdState::New), HotState::Investigating);
 assert_eq!(hot_state_for(AgentType::Planning, ColdState::Ready), HotState::Planning);
 assert_eq!(hot_state_for(AgentType::Worker, ColdState::Planned), HotState::InProgress);
 assert_eq!(hot_state_for(AgentType::Qc, ColdState::Completed), HotState::UnderReview);
 assert_eq!(hot_state_for(AgentType::Review, ColdState::Approved), HotState::UnderReview);
 }

 #[tokio::test]
 async fn request_shutdown_sets_draining_and_notifies() {
 let (hub, _dir) = boot_hub(manifest_text()).await;
 let notify = hub.shutdown_notify;
 hub.request_shutdown(false).await;
 assert!(hub.state.lock().await.draining);
 notify.notified().await;
 }
}
