// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Error taxonomy shared by the codec, the transfer path and the queue engine.

use std::io;

use thiserror::Error;

use crate::queue::State;

/// Everything that can stop a fastboot session.
#[derive(Debug, Error)]
pub enum Error {
    // --- Configuration errors (detected before any transport I/O) ---
    /// Command text exceeds the wire limit.
    #[error("command too large: {len} bytes (max: {max})")]
    CommandTooLong { len: usize, max: usize },

    /// Command text contains bytes outside printable ASCII.
    #[error("command contains non-ASCII characters: {0:?}")]
    CommandNotAscii(String),

    /// Payload does not fit the 32-bit size field of a download command.
    #[error("payload too large: {0} bytes")]
    PayloadTooLarge(usize),

    /// Requirement line that cannot be turned into a constraint.
    #[error("malformed requirement line {line:?}: {reason}")]
    MalformedRequirement { line: String, reason: &'static str },

    /// Queue operation attempted in the wrong engine state.
    #[error("command queue is {0:?}")]
    InvalidState(State),

    // --- Protocol violations ---
    /// Fewer than four bytes arrived where a response tag was expected.
    #[error("status read failed: {len} byte response")]
    ShortResponse { len: usize },

    /// Response began with something other than OKAY/FAIL/INFO/DATA.
    #[error("unknown status code {0:?}")]
    UnknownTag(String),

    /// DATA frame without a valid 8-digit hex length.
    #[error("invalid DATA length field {0:?}")]
    BadDataLength(String),

    /// Device asked for a data phase the command did not announce.
    #[error("unexpected DATA request ({0} bytes)")]
    UnexpectedData(u32),

    /// Device acknowledged a command that needs a data phase without one.
    #[error("expected DATA, device answered OKAY {0:?}")]
    MissingData(String),

    /// Device asked for more bytes than the host has to send.
    #[error("data size too large: device requested {requested} bytes, {available} available")]
    DataTooLarge { requested: u32, available: usize },

    // --- Device-reported failure ---
    /// FAIL frame; the message is the device's text verbatim.
    #[error("remote: {0}")]
    Remote(String),

    // --- Transport I/O ---
    #[error("transport: {0}")]
    Io(#[from] io::Error),

    /// Endpoint accepted fewer bytes than submitted.
    #[error("short write at offset {offset}: {written} of {expected} bytes")]
    ShortWrite {
        offset: usize,
        written: usize,
        expected: usize,
    },

    /// Endpoint returned zero bytes before the declared length was read.
    #[error("unexpected end of data: {received} of {expected} bytes")]
    UnexpectedEof { received: usize, expected: usize },

    // --- Requirement mismatch ---
    #[error("requirements not met: device {name} is '{actual}', update {} '{expected}'", rule_verb(.invert))]
    RequirementMismatch {
        name: String,
        expected: String,
        actual: String,
        invert: bool,
    },
}

impl Error {
    /// True for errors caught before the device was touched.
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            Error::CommandTooLong { .. }
                | Error::CommandNotAscii(_)
                | Error::PayloadTooLarge(_)
                | Error::MalformedRequirement { .. }
                | Error::InvalidState(_)
        )
    }

    /// True when the device's protocol state can no longer be trusted.
    pub fn is_protocol(&self) -> bool {
        matches!(
            self,
            Error::ShortResponse { .. }
                | Error::UnknownTag(_)
                | Error::BadDataLength(_)
                | Error::UnexpectedData(_)
                | Error::MissingData(_)
                | Error::DataTooLarge { .. }
        )
    }
}

fn rule_verb(invert: &bool) -> &'static str {
    if *invert {
        "rejects"
    } else {
        "requires"
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
