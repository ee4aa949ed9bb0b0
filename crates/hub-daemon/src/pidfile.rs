// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! PID file and exclusive lock handling, owned by the daemon process
//! itself, which is the sole writer.
//!
//! Acquires the lock file first (an `OpenOptions` that doesn't truncate
//! before the lock is held, so a concurrent `hub start` never wipes the
//! running daemon's PID), then writes the PID, then proceeds.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PidFileError {
 #[error("hub is already running (pid {0})")]
 AlreadyRunning(u32),
 #[error("io error: {0}")]
 Io(#[from] std::io::Error),
}

/// Holds the open, locked lock file for the lifetime of the daemon
/// process. The OS releases the `flock` automatically when this (and every
/// other handle to the fd) is dropped, but `remove` additionally deletes
/// the pid/lock files so a clean shutdown leaves no stale path behind.
pub struct PidFile {
 lock_file: File,
 lock_path: PathBuf,
 pid_path: PathBuf,
}

impl PidFile {
 /// Acquires the exclusive lock and writes the current process's PID.
 /// Fails with `AlreadyRunning` (reporting the existing PID) if another
 /// process holds the lock.
 pub fn acquire(lock_path: &Path, pid_path: &Path) -> Result<Self, PidFileError> {
 if let Some(parent) = lock_path.parent() {
 std::fs::create_dir_all(parent)?;
 }

 let lock_file = OpenOptions::new().write(true).create(true).truncate(false).open(lock_path)?;
 fs2::FileExt::try_lock_exclusive(&lock_file).map_err(|_| {
 let existing = read_pid(pid_path).unwrap_or(0);
 PidFileError::AlreadyRunning(existing)
 })?;

 let pid = std::process::id();
 write_pid(&lock_file, pid_path, pid)?;

 Ok(Self { lock_file, lock_path: lock_path.to_path_buf(), pid_path: pid_path.to_path_buf() })
 }

 pub fn remove(self) -> std::io::Result<()> {
 fs2::FileExt::unlock(&self.lock_file)?;
 let _ = std::fs::remove_file(&self.pid_path);
 let _ = std::fs::remove_file(&self.lock_path);
 Ok(())
 }
}

fn write_pid(lock_file: &File, pid_path: &Path, pid: u32) -> std::io::Result<()> {
 let mut lock_file = lock_file.try_clone()?;
 lock_file.set_len(0)?;
 use std::io::Seek;
 lock_file.seek(std::io::SeekFrom::Start(0))?;
 writeln!(lock_file, "{pid}")?;

 let mut pid_file = OpenOptions::new().write(true).create(true).truncate(true).open(pid_path)?;
 writeln!(pid_file, "{pid}")?;
 Ok(())
}

/// Reads the decimal PID from `pid_path`, if present and parseable.
pub fn read_pid(pid_path: &Path) -> Option<u32> {
 std::fs::read_to_string(pid_path).ok()?.trim().parse().ok()
}

/// Probes whether `pid` still refers to a live process, by sending no
/// signal (signal `None`) and checking whether the kernel accepts the pid.
pub fn is_process_alive(pid: u32) -> bool {
 nix::sys::signal::kill(nix::unistd::Pid::from_raw(pid as i32), None).is_ok()
}
