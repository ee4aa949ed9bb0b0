// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error categorization and recovery: the action an agent runtime
//! takes for a given failure category, plus the `retry` helper that tracks
//! attempts per key.

use std::collections::HashMap;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
 Transient,
 Assignment,
 Execution,
 Fatal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryAction {
 Retry,
 Report,
 Fail,
 Shutdown,
}

pub fn action_for(category: ErrorCategory) -> RecoveryAction {
 match category {
 ErrorCategory::Transient => RecoveryAction::Retry,
 ErrorCategory::Assignment => RecoveryAction::Report,
 ErrorCategory::Execution => RecoveryAction::Fail,
 ErrorCategory::Fatal => RecoveryAction::Shutdown,
 }
}

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
 pub initial_delay: Duration,
 pub factor: u32,
 pub max_attempts: u32,
}

impl Default for RetryPolicy {
 fn default() -> Self {
 Self { initial_delay: Duration::from_secs(1), factor: 2, max_attempts: 3 }
 }
}

impl RetryPolicy {
 pub fn delay_for(&self, attempt: u32) -> Duration {
 let exp = attempt.saturating_sub(1).min(20);
 self.initial_delay * self.factor.saturating_pow(exp)
 }
}

#[derive(Debug, thiserror::Error)]
#[error("retries exhausted for {key} after {attempts} attempts")]
pub struct RetriesExhausted {
 pub key: String,
 pub attempts: u32,
}

/// Tracks retry attempts per key. On success the counter for that
/// key is cleared; exhausting `max_retries` is the caller's signal to stop.
#[derive(Default)]
pub struct RetryTracker {
 attempts: HashMap<String, u32>,
}

impl RetryTracker {
 pub fn new() -> Self {
 Self::default()
 }

 /// Runs `operation`, retrying with the policy's backoff on failure.
 /// Clears the attempt counter for `key` on success.
 pub async fn retry<T, E, F, Fut>(
 &mut self,
 key: &str,
 policy: RetryPolicy,
 mut operation: F,
 ) -> Result<T, RetriesExhausted>
 where
 F: FnMut() -> Fut,
 Fut: std::future::Future<Output = Result<T, E>>,
 {
 loop {
 let attempt = *self.attempts.get(key).unwrap_or(&0) + 1;
 match operation().await {
 Ok(value) => {
 self.attempts.remove(key);
 return Ok(value);
 }
 Err(_) if attempt < policy.max_attempts => {
 self.attempts.insert(key.to_string(), attempt);
 tokio::time::sleep(policy.delay_for(attempt)).await;
 }
 Err(_) => {
 self.attempts.remove(key);
 return Err(RetriesExhausted { key: key.to_string(), attempts: attempt });
 }
 }
 }
 }

 pub fn attempts_for(&self, key: &str) -> u32 {
 *self.attempts.get(key).unwrap_or(&0)
 }
}

#[cfg(test)]
mod tests {
 use super::*;
 use std::sync::atomic::{AtomicU32, Ordering};

 #[test]
 fn category_to_action_table_matches_fixed_mapping() {
 assert_eq!(action_for(ErrorCategory::Transient), RecoveryAction::Retry);
 assert_eq!(action_for(ErrorCategory::Assignment), RecoveryAction::Report);
 assert_eq!(action_for(ErrorCategory::Execution), RecoveryAction::Fail);
 assert_eq!(action_for(ErrorCategory::Fatal), RecoveryAction::Shutdown);
 }

 #[test]
 fn backoff_doubles_per_attempt() {
 let policy = RetryPolicy::default();
 assert_eq!(policy.delay_for(1), Duration::from_secs(1));
 assert_eq!(policy.delay_for(2), Duration::from_secs(2));
 assert_eq!(policy.delay_for(3), Duration::from_secs(4));
 }

 #[tokio::test]
 async fn retry_clears_counter_on_eventual_success() {
 let mut tracker = RetryTracker::new();
 let calls = AtomicU32::new(0);
 let policy = RetryPolicy { initial_delay: Duration::from_millis(1), factor: 1, max_attempts: 3 };

 let result: Result<u32, RetriesExhausted> = tracker
.retry("pr-1", policy, || async {
 let n = calls.fetch_add(1, Ordering::SeqCst);
 if n < 1 {
 Err::<u32, ()>(())
 } else {
 Ok(42)
 }
 })
.await;

 assert_eq!(result.unwrap(), 42);
 assert_eq!(tracker.attempts_for("pr-1"), 0);
 }

 #[tokio::test]
 async fn retry_exhausts_after_max_attempts() {
 let mut tracker = RetryTracker::new();
 let policy = RetryPolicy { initial_delay: Duration::from_millis(1), factor: 1, max_attempts: 2 };

 let result: Result<u32, RetriesExhausted> =
 tracker.retry("pr-1", policy, || async { Err::<u32, ()>(()) }).await;

 assert!(result.is_err());
 assert_eq!(tracker.attempts_for("pr-1"), 0);
 }
}
