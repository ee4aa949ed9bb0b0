// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Logging setup: `tracing-subscriber` with an
//! `EnvFilter` driven by `Config::log_level`, writing to stdout in
//! foreground mode or to a rolling file at `<workdir>/.hub/hub.log`
//! otherwise.

use std::path::Path;
use tracing_subscriber::EnvFilter;

/// Guard returned by file-backed logging setup; dropping it flushes the
/// non-blocking writer. Foreground mode returns `None` since stdout needs
/// no such guard.
pub struct LoggingGuard(Option<tracing_appender::non_blocking::WorkerGuard>);

pub fn init(log_level: &str, hub_dir: &Path, foreground: bool) -> std::io::Result<LoggingGuard> {
    let filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    if foreground {
        tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
        Ok(LoggingGuard(None))
    } else {
        std::fs::create_dir_all(hub_dir)?;
        let appender = tracing_appender::rolling::never(hub_dir, "hub.log");
        let (writer, guard) = tracing_appender::non_blocking(appender);
        tracing_subscriber::fmt().with_env_filter(filter).with_target(false).with_writer(writer).with_ansi(false).init();
        Ok(LoggingGuard(Some(guard)))
    }
}
