// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Connection lifecycle and reconnect policy for a `KvStore` backend.

use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
 Disconnected,
 Connecting,
 Connected,
 Closed,
}

/// Exponential backoff with the defaults: 10 max attempts, 500ms
/// initial delay, factor 2, capped at 5s.
#[derive(Debug, Clone, Copy)]
pub struct BackoffPolicy {
 pub max_attempts: u32,
 pub initial_delay: Duration,
 pub factor: u32,
 pub cap: Duration,
}

impl Default for BackoffPolicy {
 fn default() -> Self {
 Self {
 max_attempts: 10,
 initial_delay: Duration::from_millis(500),
 factor: 2,
 cap: Duration::from_secs(5),
 }
 }
}

impl BackoffPolicy {
 /// Delay before reconnect attempt `attempt` (1-indexed). Returns `None`
 /// once `attempt` exceeds `max_attempts`, meaning the caller should give up.
 pub fn delay_for(&self, attempt: u32) -> Option<Duration> {
 if attempt == 0 || attempt > self.max_attempts {
 return None;
 }
 let exp = attempt.saturating_sub(1).min(20);
 let multiplier = self.factor.saturating_pow(exp);
 let millis = self
.initial_delay
.as_millis()
.saturating_mul(multiplier as u128)
.min(self.cap.as_millis());
 Some(Duration::from_millis(millis as u64))
 }
}

#[cfg(test)]
mod tests {
 use super::*;

 #[test]
 fn delay_doubles_until_cap() {
 let policy = BackoffPolicy::default();
 assert_eq!(policy.delay_for(1), Some(Duration::from_millis(500)));
 assert_eq!(policy.delay_for(2), Some(Duration::from_millis(1000)));
 assert_eq!(policy.delay_for(3), Some(Duration::from_millis(2000)));
 assert_eq!(policy.delay_for(4), Some(Duration::from_millis(4000)));
 // 500 * 2^4 = 8000, capped at 5000
 assert_eq!(policy.delay_for(5), Some(Duration::from_millis(5000)));
 assert_eq!(policy.delay_for(10), Some(Duration::from_millis(5000)));
 }

 #[test]
 fn exhausted_after_max_attempts() {
 let policy = BackoffPolicy::default();
 assert_eq!(policy.delay_for(11), None);
 assert_eq!(policy.delay_for(0), None);
 }
}
