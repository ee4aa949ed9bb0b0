// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent runtime base: lifecycle, heartbeat, communication, and
//! recovery wired around the two domain hooks a concrete worker implements.

use crate::recovery::{action_for, ErrorCategory, RecoveryAction, RetryPolicy, RetryTracker};
use async_trait::async_trait;
use hub_bus::{channels, MessageBus};
use hub_core::{Assignment, Clock, ErrorKind, HubError, PrId};
use hub_wire::{CompletePayload, Envelope, FailedPayload, HeartbeatPayload, MessageType, RegistrationPayload};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Result of processing one assignment (`do_work`'s return value).
#[derive(Debug, Clone, PartialEq)]
pub struct WorkResult {
 pub success: bool,
 pub output: serde_json::Value,
}

/// The two domain hooks a concrete agent implements; everything else
/// (lifecycle, heartbeat, bus wiring, recovery) is handled by `AgentRuntime`.
#[async_trait]
pub trait Worker: Send + Sync {
 async fn validate_assignment(&self, assignment: &Assignment) -> bool;
 async fn do_work(&self, assignment: &Assignment) -> Result<WorkResult, HubError>;
}

/// A worker that immediately reports success without doing anything,
/// useful for exercising the runtime's lifecycle and bus plumbing in tests
/// and as a template for new worker implementations.
pub struct EchoWorker;

#[async_trait]
impl Worker for EchoWorker {
 async fn validate_assignment(&self, _assignment: &Assignment) -> bool {
 true
 }

 async fn do_work(&self, assignment: &Assignment) -> Result<WorkResult, HubError> {
 Ok(WorkResult { success: true, output: serde_json::json!({"echoed": assignment.pr_id.as_str()}) })
 }
}

#[derive(Debug, Clone, Copy)]
pub struct RuntimeConfig {
 pub heartbeat_interval: Duration,
 pub heartbeat_timeout: Duration,
 pub retry_policy: RetryPolicy,
 /// How many completed pr_ids to remember for idempotent reassignment.
 pub completion_cache_size: usize,
}

impl Default for RuntimeConfig {
 fn default() -> Self {
 Self {
 heartbeat_interval: Duration::from_millis(30_000),
 heartbeat_timeout: Duration::from_millis(90_000),
 retry_policy: RetryPolicy::default(),
 completion_cache_size: 256,
 }
 }
}

/// Bounded memory of completed `pr_id`s and their results. Because bus
/// delivery is at-least-once, the hub may redeliver an `assignment` for a
/// pr_id this runtime already finished; serving the cached result instead
/// of re-invoking `do_work` is the concrete idempotence mechanism for the
/// requirement.
struct CompletionCache {
 capacity: usize,
 order: Vec<PrId>,
 results: HashMap<PrId, WorkResult>,
}

impl CompletionCache {
 fn new(capacity: usize) -> Self {
 Self { capacity, order: Vec::new(), results: HashMap::new() }
 }

 fn get(&self, pr_id: &PrId) -> Option<&WorkResult> {
 self.results.get(pr_id)
 }

 fn insert(&mut self, pr_id: PrId, result: WorkResult) {
 if !self.results.contains_key(&pr_id) {
 self.order.push(pr_id.clone());
 }
 self.results.insert(pr_id, result);
 while self.order.len() > self.capacity {
 let oldest = self.order.remove(0);
 self.results.remove(&oldest);
 }
 }
}

pub struct AgentRuntime<W: Worker, C: Clock> {
 agent_id: String,
 agent_type: hub_core::AgentType,
 capabilities: hub_core::Capabilities,
 bus: Arc<MessageBus>,
 worker: Arc<W>,
 clock: Arc<C>,
 config: RuntimeConfig,
 lifecycle: Mutex<hub_core::AgentLifecycle>,
 completions: Mutex<CompletionCache>,
 /// `tokio::sync::Mutex`, not `parking_lot`: retrying holds this across
 /// the backoff sleep between attempts.
 retries: tokio::sync::Mutex<RetryTracker>,
}

impl<W: Worker + 'static, C: Clock + 'static> AgentRuntime<W, C> {
 pub fn new(
 agent_id: impl Into<String>,
 agent_type: hub_core::AgentType,
 capabilities: hub_core::Capabilities,
 bus: Arc<MessageBus>,
 worker: Arc<W>,
 clock: Arc<C>,
 config: RuntimeConfig,
 ) -> Self {
 Self {
 agent_id: agent_id.into(),
 agent_type,
 capabilities,
 bus,
 worker,
 clock,
 config,
 lifecycle: Mutex::new(hub_core::AgentLifecycle::Initializing),
 completions: Mutex::new(CompletionCache::new(config.completion_cache_size)),
 retries: tokio::sync::Mutex::new(RetryTracker::new()),
 }
 }

 pub fn lifecycle(&self) -> hub_core::AgentLifecycle {
 *self.lifecycle.lock()
 }

 /// Startup sequence: publish registration, transition to idle.
 /// Subscribing to the assignment channel and starting the heartbeat
 /// timer are the caller's responsibility (they run as independent
 /// tasks so this method itself stays a one-shot handshake).
 pub async fn start(&self) -> Result<(), HubError> {
 let payload = RegistrationPayload {
 agent_id: self.agent_id.clone(),
 agent_type: self.agent_type,
 capabilities: self.capabilities.clone(),
 };
 let envelope = Envelope::new(
 nanoid::nanoid!(16),
 self.clock.epoch_ms() as i64,
 MessageType::Registration,
 &self.agent_id,
 "hub",
 serde_json::to_value(&payload).map_err(|e| HubError::structure(e.to_string()))?,
 );
 self.bus
.publish(channels::HUB_MESSAGES, &envelope)
.await
.map_err(|e| HubError::transient(e.to_string()))?;
 *self.lifecycle.lock() = hub_core::AgentLifecycle::Idle;
 Ok(())
 }

 pub async fn emit_heartbeat(&self, assigned_pr: Option<PrId>, memory_mb: u64) -> Result<(), HubError> {
 let payload = HeartbeatPayload {
 state: self.lifecycle().to_string(),
 assigned_pr,
 memory_mb,
 ts: self.clock.epoch_ms() as i64,
 };
 let envelope = Envelope::new(
 nanoid::nanoid!(16),
 self.clock.epoch_ms() as i64,
 MessageType::Heartbeat,
 &self.agent_id,
 "hub",
 serde_json::to_value(&payload).map_err(|e| HubError::structure(e.to_string()))?,
 );
 self.bus
.publish(channels::HUB_MESSAGES, &envelope)
.await
.map_err(|e| HubError::transient(e.to_string()))
 }

 /// Runs the full assignment-handling sequence. Returns the
 /// `WorkResult` on success so callers (mainly tests) can inspect it.
 pub async fn handle_assignment(&self, assignment: Assignment) -> Result<WorkResult, HubError> {
 if !self.worker.validate_assignment(&assignment).await {
 let failed = FailedPayload {
 pr_id: Some(assignment.pr_id.clone()),
 error: HubError::new(ErrorKind::Invariant, "assignment failed validation"),
 };
 self.publish_failed(failed).await?;
 return Err(HubError::invariant("assignment failed validation"));
 }

 if let Some(cached) = self.completions.lock().get(&assignment.pr_id).cloned() {
 return Ok(cached);
 }

 *self.lifecycle.lock() = hub_core::AgentLifecycle::Working;

 let result = self.worker.do_work(&assignment).await;
 match result {
 Ok(work_result) if work_result.success => {
 self.completions.lock().insert(assignment.pr_id.clone(), work_result.clone());
 *self.lifecycle.lock() = hub_core::AgentLifecycle::Completing;
 let payload = CompletePayload { pr_id: assignment.pr_id.clone(), result: work_result.output.clone() };
 let envelope = Envelope::new(
 nanoid::nanoid!(16),
 self.clock.epoch_ms() as i64,
 MessageType::Complete,
 &self.agent_id,
 "hub",
 serde_json::to_value(&payload).map_err(|e| HubError::structure(e.to_string()))?,
 );
 self.bus
.publish(channels::HUB_MESSAGES, &envelope)
.await
.map_err(|e| HubError::transient(e.to_string()))?;
 *self.lifecycle.lock() = hub_core::AgentLifecycle::Idle;
 Ok(work_result)
 }
 Ok(work_result) => {
 let failed = FailedPayload {
 pr_id: Some(assignment.pr_id.clone()),
 error: HubError::new(ErrorKind::Invariant, "do_work reported failure"),
 };
 self.publish_failed(failed).await?;
 *self.lifecycle.lock() = hub_core::AgentLifecycle::Failed;
 self.recover_from_failure().await;
 Ok(work_result)
 }
 Err(error) => match self.route_error(&assignment, error.clone()).await? {
 Some(work_result) => Ok(work_result),
 None => Err(error),
 },
 }
 }

 async fn publish_failed(&self, payload: FailedPayload) -> Result<(), HubError> {
 let envelope = Envelope::new(
 nanoid::nanoid!(16),
 self.clock.epoch_ms() as i64,
 MessageType::Failed,
 &self.agent_id,
 "hub",
 serde_json::to_value(&payload).map_err(|e| HubError::structure(e.to_string()))?,
 );
 self.bus
.publish(channels::HUB_MESSAGES, &envelope)
.await
.map_err(|e| HubError::transient(e.to_string()))
 }

 async fn recover_from_failure(&self) {
 *self.lifecycle.lock() = hub_core::AgentLifecycle::Idle;
 }

 /// Categorizes `error` and routes it through the matching recovery
 /// action. `Transient` errors go through the retry tracker and re-run
 /// `do_work`, returning `Ok(Some(result))` on eventual success so the
 /// caller can treat it as if the first attempt had succeeded; everything
 /// else reports/fails/shuts down without retrying (retry only ever
 /// applies to the category it's defined for) and returns `Ok(None)` to
 /// signal "handled, still propagate the original error".
 async fn route_error(&self, assignment: &Assignment, error: HubError) -> Result<Option<WorkResult>, HubError> {
 let category = match error.kind {
 ErrorKind::Transient => ErrorCategory::Transient,
 ErrorKind::Invariant | ErrorKind::Structure => ErrorCategory::Assignment,
 ErrorKind::Resource => ErrorCategory::Execution,
 ErrorKind::Fatal => ErrorCategory::Fatal,
 };
 match action_for(category) {
 RecoveryAction::Retry => self.retry_assignment(assignment).await.map(Some),
 RecoveryAction::Report => {
 self.publish_failed(FailedPayload { pr_id: Some(assignment.pr_id.clone()), error }).await?;
 Ok(None)
 }
 RecoveryAction::Fail => {
 self.publish_failed(FailedPayload { pr_id: Some(assignment.pr_id.clone()), error }).await?;
 *self.lifecycle.lock() = hub_core::AgentLifecycle::Failed;
 self.recover_from_failure().await;
 Ok(None)
 }
 RecoveryAction::Shutdown => {
 *self.lifecycle.lock() = hub_core::AgentLifecycle::ShuttingDown;
 Err(error)
 }
 }
 }

 /// Re-runs `do_work` through the retry tracker's backoff policy. On
 /// eventual success, completes the assignment exactly like a first-try
 /// success (cache, publish `Complete`, return to idle). On exhaustion,
 /// reports failure exactly like `RecoveryAction::Fail` and propagates.
 async fn retry_assignment(&self, assignment: &Assignment) -> Result<WorkResult, HubError> {
 let policy = self.config.retry_policy;
 let worker = Arc::clone(&self.worker);
 let pr_id = assignment.pr_id.clone();
 let retried = {
 let mut retries = self.retries.lock().await;
 retries
.retry(pr_id.as_str(), policy, || {
 let worker = Arc::clone(&worker);
 let assignment = assignment.clone();
 async move { worker.do_work(&assignment).await }
 })
.await
 };

 match retried {
 Ok(work_result) if work_result.success => {
 self.completions.lock().insert(pr_id.clone(), work_result.clone());
 *self.lifecycle.lock() = hub_core::AgentLifecycle::Completing;
 let payload = CompletePayload { pr_id, result: work_result.output.clone() };
 let envelope = Envelope::new(
 nanoid::nanoid!(16),
 self.clock.epoch_ms() as i64,
 MessageType::Complete,
 &self.agent_id,
 "hub",
 serde_json::to_value(&payload).map_err(|e| HubError::structure(e.to_string()))?,
 );
 self.bus
.publish(channels::HUB_MESSAGES, &envelope)
.await
.map_err(|e| HubError::transient(e.to_string()))?;
 *self.lifecycle.lock() = hub_core::AgentLifecycle::Idle;
 Ok(work_result)
 }
 Ok(work_result) => {
 let error = HubError::new(ErrorKind::Invariant, "do_work reported failure after retrying");
 self.publish_failed(FailedPayload { pr_id: Some(pr_id), error }).await?;
 *self.lifecycle.lock() = hub_core::AgentLifecycle::Failed;
 self.recover_from_failure().await;
 Ok(work_result)
 }
 Err(exhausted) => {
 let error = HubError::transient(exhausted.to_string());
 self.publish_failed(FailedPayload { pr_id: Some(pr_id), error: error.clone() }).await?;
 *self.lifecycle.lock() = hub_core::AgentLifecycle::Failed;
 self.recover_from_failure().await;
 Err(error)
 }
 }
 }
}

#[cfg(test)]
mod tests {
 use super::*;
 use hub_bus::InProcessKv;
 use hub_core::{Capabilities, FakeClock, ModelTier, Priority};
 use std::sync::atomic::{AtomicU32, Ordering};

 /// Fails `do_work` for its first `fail_for` calls, then succeeds.
 struct FlakyWorker {
 attempts: AtomicU32,
 fail_for: u32,
 }

 #[async_trait]
 impl Worker for FlakyWorker {
 async fn validate_assignment(&self, _assignment: &Assignment) -> bool {
 true
 }

 async fn do_work(&self, assignment: &Assignment) -> Result<WorkResult, HubError> {
 let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
 if attempt < self.fail_for {
 Err(HubError::transient("kv hiccup"))
 } else {
 Ok(WorkResult { success: true, output: serde_json::json!({"echoed": assignment.pr_id.as_str()}) })
 }
 }
 }

 fn flaky_runtime(fail_for: u32) -> AgentRuntime<FlakyWorker, FakeClock> {
 let kv = InProcessKv::shared();
 let bus = Arc::new(MessageBus::new(kv));
 let config = RuntimeConfig {
 retry_policy: RetryPolicy { initial_delay: Duration::from_millis(1), factor: 1, max_attempts: 5 },
 ..RuntimeConfig::default()
 };
 AgentRuntime::new(
 "worker-agent-1",
 hub_core::AgentType::Worker,
 Capabilities { max_complexity: 10, preferred_tier: ModelTier::Sonnet },
 bus,
 Arc::new(FlakyWorker { attempts: AtomicU32::new(0), fail_for }),
 Arc::new(FakeClock::new()),
 config,
 )
 }

 fn assignment(pr_id: &str) -> Assignment {
 Assignment {
 pr_id: PrId::new(pr_id),
 assigned_at_ms: 0,
 priority: Priority::Medium,
 complexity: hub_core::Complexity {
 score: 1,
 estimated_minutes: 5,
 suggested_model: ModelTier::Haiku,
 rationale: String::new(),
 },
 estimated_duration_minutes: 5,
 files: vec![],
 }
 }

 fn runtime() -> AgentRuntime<EchoWorker, FakeClock> {
 let kv = InProcessKv::shared();
 let bus = Arc::new(MessageBus::new(kv));
 AgentRuntime::new(
 "worker-agent-1",
 hub_core::AgentType::Worker,
 Capabilities { max_complexity: 10, preferred_tier: ModelTier::Sonnet },
 bus,
 Arc::new(EchoWorker),
 Arc::new(FakeClock::new()),
 RuntimeConfig::default(),
 )
 }

 #[tokio::test]
 async fn start_transitions_to_idle() {
 let runtime = runtime();
 runtime.start().await.unwrap();
 assert_eq!(runtime.lifecycle(), hub_core::AgentLifecycle::Idle);
 }

 #[tokio::test]
 async fn successful_assignment_returns_to_idle() {
 let runtime = runtime();
 runtime.start().await.unwrap();
 let result = runtime.handle_assignment(assignment("PR-1")).await.unwrap();
 assert!(result.success);
 assert_eq!(runtime.lifecycle(), hub_core::AgentLifecycle::Idle);
 }

 #[tokio::test]
 async fn reassignment_of_completed_pr_replays_cached_result_without_redoing_work() {
 let runtime = runtime();
 runtime.start().await.unwrap();
 let first = runtime.handle_assignment(assignment("PR-1")).await.unwrap();
 let second = runtime.handle_assignment(assignment("PR-1")).await.unwrap();
 assert_eq!(first, second);
 }

 #[tokio::test]
 async fn transient_failure_retries_and_recovers() {
 let runtime = flaky_runtime(2);
 runtime.start().await.unwrap();
 let result = runtime.handle_assignment(assignment("PR-1")).await.unwrap();
 assert!(result.success);
 assert_eq!(runtime.lifecycle(), hub_core::AgentLifecycle::Idle);
 }

 #[tokio::test]
 async fn transient_failure_exhausting_retries_reports_and_fails() {
 let runtime = flaky_runtime(100);
 runtime.start().await.unwrap();
 let result = runtime.handle_assignment(assignment("PR-1")).await;
 assert!(result.is_err());
 assert_eq!(runtime.lifecycle(), hub_core::AgentLifecycle::Failed);
 }
}
