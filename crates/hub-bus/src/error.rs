// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use hub_core::ErrorKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BusError {
    #[error("not connected to the kv store")]
    NotConnected,
    #[error("kv operation timed out")]
    Timeout,
    #[error("transport error: {0}")]
    Transport(String),
    #[error("no subscriber registered for channel {0}")]
    NoSubscriber(String),
}

impl BusError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            BusError::NotConnected | BusError::Timeout | BusError::Transport(_) => {
                ErrorKind::Transient
            }
            BusError::NoSubscriber(_) => ErrorKind::Invariant,
        }
    }
}
