// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon configuration. Loaded once at startup from the environment,
//! optionally overlaid by a TOML file, into an immutable [`Config`].
//! Nothing downstream reads an environment variable directly — the
//! supervisor's per-agent environment is built explicitly from this
//! struct instead of being inherited.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::DaemonError;

#[derive(Debug, Clone)]
pub struct Config {
 pub kv_url: String,
 pub work_dir: PathBuf,
 pub log_level: String,
 pub heartbeat_interval_ms: u64,
 pub heartbeat_timeout_ms: u64,
 pub restart_budget: u32,
 pub restart_delay_ms: u64,
 pub max_concurrent_agents: usize,
 pub shutdown_timeout_ms: u64,
 pub request_timeout_ms: u64,
 pub sweep_interval_ms: u64,
 pub backoff_initial_delay_ms: u64,
 pub backoff_factor: u32,
 pub backoff_cap_ms: u64,
 pub backoff_max_attempts: u32,
 pub manifest_path: PathBuf,
}

/// Mirrors [`Config`] with every field optional, for deserializing a
/// `--config PATH` TOML overlay. Any field present overrides the
/// environment-derived value; absent fields are left untouched.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
struct ConfigOverlay {
 kv_url: Option<String>,
 work_dir: Option<PathBuf>,
 log_level: Option<String>,
 heartbeat_interval_ms: Option<u64>,
 heartbeat_timeout_ms: Option<u64>,
 restart_budget: Option<u32>,
 restart_delay_ms: Option<u64>,
 max_concurrent_agents: Option<usize>,
 shutdown_timeout_ms: Option<u64>,
 request_timeout_ms: Option<u64>,
 sweep_interval_ms: Option<u64>,
 backoff_initial_delay_ms: Option<u64>,
 backoff_factor: Option<u32>,
 backoff_cap_ms: Option<u64>,
 backoff_max_attempts: Option<u32>,
 manifest_path: Option<PathBuf>,
}

impl Default for Config {
 fn default() -> Self {
 let work_dir = PathBuf::from(".");
 Self {
 kv_url: "inprocess://".to_string(),
 manifest_path: work_dir.join("MANIFEST.md"),
 work_dir,
 log_level: "info".to_string(),
 heartbeat_interval_ms: 30_000,
 heartbeat_timeout_ms: 90_000,
 restart_budget: 2,
 restart_delay_ms: 100,
 max_concurrent_agents: 5,
 shutdown_timeout_ms: 5_000,
 request_timeout_ms: 5_000,
 sweep_interval_ms: 30_000,
 backoff_initial_delay_ms: 500,
 backoff_factor: 2,
 backoff_cap_ms: 5_000,
 backoff_max_attempts: 10,
 }
 }
}

impl Config {
 /// Builds the effective configuration: defaults, then environment
 /// variables, then an optional TOML overlay (`KV_URL`, `WORK_DIR`,
 /// `LOG_LEVEL` plus the heartbeat/restart/backoff tunables).
 pub fn load(overlay_path: Option<&Path>) -> Result<Self, DaemonError> {
 let mut config = Self::default();
 config.apply_env();

 if let Some(path) = overlay_path {
 let text = std::fs::read_to_string(path)?;
 let overlay: ConfigOverlay =
 toml::from_str(&text).map_err(|e| DaemonError::Config(format!("{}: {e}", path.display())))?;
 config.apply_overlay(overlay);
 }

 config.validate()?;
 Ok(config)
 }

 fn apply_env(&mut self) {
 if let Ok(v) = std::env::var("KV_URL") {
 self.kv_url = v;
 }
 if let Ok(v) = std::env::var("WORK_DIR") {
 self.manifest_path = PathBuf::from(&v).join("MANIFEST.md");
 self.work_dir = PathBuf::from(v);
 }
 if let Ok(v) = std::env::var("LOG_LEVEL") {
 self.log_level = v;
 }
 }

 fn apply_overlay(&mut self, overlay: ConfigOverlay) {
 macro_rules! take {
 ($field:ident) => {
 if let Some(v) = overlay.$field {
 self.$field = v;
 }
 };
 }
 take!(kv_url);
 take!(work_dir);
 take!(log_level);
 take!(heartbeat_interval_ms);
 take!(heartbeat_timeout_ms);
 take!(restart_budget);
 take!(restart_delay_ms);
 take!(max_concurrent_agents);
 take!(shutdown_timeout_ms);
 take!(request_timeout_ms);
 take!(sweep_interval_ms);
 take!(backoff_initial_delay_ms);
 take!(backoff_factor);
 take!(backoff_cap_ms);
 take!(backoff_max_attempts);
 take!(manifest_path);
 }

 fn validate(&self) -> Result<(), DaemonError> {
 if self.max_concurrent_agents == 0 {
 return Err(DaemonError::Config("max_concurrent_agents must be at least 1".to_string()));
 }
 if self.heartbeat_timeout_ms <= self.heartbeat_interval_ms {
 return Err(DaemonError::Config("heartbeat_timeout_ms must exceed heartbeat_interval_ms".to_string()));
 }
 Ok(())
 }

 pub fn hub_dir(&self) -> PathBuf {
 self.work_dir.join(".hub")
 }

 pub fn pid_path(&self) -> PathBuf {
 self.hub_dir().join("hub.pid")
 }

 pub fn lock_path(&self) -> PathBuf {
 self.hub_dir().join("hub.lock")
 }

 pub fn log_path(&self) -> PathBuf {
 self.hub_dir().join("hub.log")
 }

 pub fn agents_log_dir(&self) -> PathBuf {
 self.hub_dir().join("agents")
 }

 pub fn socket_path(&self) -> PathBuf {
 self.hub_dir().join("hub.sock")
 }

 pub fn heartbeat_interval(&self) -> Duration {
 Duration::from_millis(self.heartbeat_interval_ms)
 }

 pub fn heartbeat_timeout(&self) -> Duration {
 Duration::from_millis(self.heartbeat_timeout_ms)
 }

 pub fn restart_delay(&self) -> Duration {
 Duration::from_millis(self.restart_delay_ms)
 }

 pub fn shutdown_timeout(&self) -> Duration {
 Duration::from_millis(self.shutdown_timeout_ms)
 }

 pub fn request_timeout(&self) -> Duration {
 Duration::from_millis(self.request_timeout_ms)
 }

 pub fn sweep_interval(&self) -> Duration {
 Duration::from_millis(self.sweep_interval_ms)
 }

 pub fn backoff_policy(&self) -> hub_bus::BackoffPolicy {
 hub_bus::BackoffPolicy {
 max_attempts: self.backoff_max_attempts,
 initial_delay: Duration::from_millis(self.backoff_initial_delay_ms),
 factor: self.backoff_factor,
 cap: Duration::from_millis(self.backoff_cap_ms),
 }
 }

 pub fn supervisor_config(&self) -> hub_supervisor::SupervisorConfig {
 hub_supervisor::SupervisorConfig {
 max_concurrent_agents: self.max_concurrent_agents,
 restart_budget: self.restart_budget,
 restart_delay: self.restart_delay(),
 shutdown_timeout: self.shutdown_timeout(),
 agents_log_dir: Some(self.agents_log_dir()),
 }
 }

 pub fn registry_sweep_config(&self) -> hub_supervisor::RegistrySweepConfig {
 hub_supervisor::RegistrySweepConfig { heartbeat_timeout_ms: self.heartbeat_timeout_ms }
 }
}
