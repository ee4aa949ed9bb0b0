// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! hub-wire: the message bus envelope, its typed payload shapes, and the
//! length-prefixed JSON framing used over the daemon's local control
//! connection.

mod codec;
mod envelope;
mod payloads;

pub use codec::{decode, encode, read_message, write_message, ProtocolError};
pub use envelope::{Envelope, MessageType};
pub use payloads::{
    AssignmentPayload, CompletePayload, FailedPayload, HeartbeatPayload, ProgressPayload,
    RegistrationPayload, RequestPayload, ResponsePayload,
};
