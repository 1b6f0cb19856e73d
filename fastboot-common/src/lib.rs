// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Host side of the fastboot bootloader protocol.
//!
//! - [`protocol`]: command and response framing
//! - [`transfer`]: chunked data phases
//! - [`session`]: request/response exchanges over a [`Transport`]
//! - [`require`]: device requirement lines
//! - [`queue`]: the ordered action queue that drives a device
//! - [`transport`]: backend capability traits, matching and acquisition
//!
//! Platform USB code lives outside this crate; anything implementing
//! [`Backend`] can drive the engine.

pub mod error;
pub mod protocol;
pub mod queue;
pub mod report;
pub mod require;
pub mod session;
pub mod transfer;
pub mod transport;

// Re-export commonly used types
pub use error::{Error, Result};
pub use protocol::{Command, Response};
pub use protocol::{DEFAULT_VENDOR_ID, MAX_COMMAND_LEN, MAX_RESPONSE_LEN};
pub use queue::{Action, ActionKind, Engine, Outcome, State, Summary};
pub use report::{NullReporter, Reporter};
pub use require::{parse_requirements, Requirement};
pub use transport::{acquire, list_devices, Backend, DeviceDescriptor, Matcher, Transport};
