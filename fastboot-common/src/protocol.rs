// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Wire format of the fastboot protocol.
//!
//! A request is the raw ASCII command text, sent as a single bulk write with no
//! terminator. Every reply starts with a four byte tag:
//! - `OKAY`: command done, optional message follows
//! - `FAIL`: command failed, message follows
//! - `INFO`: intermediate message, more frames follow
//! - `DATA`: eight hex digits giving the size of the data phase

use std::fmt;

use crate::error::{Error, Result};

// --- USB interface identification ---

/// Vendor id matched when no override is given (Lab126).
pub const DEFAULT_VENDOR_ID: u16 = 0x1949;
pub const FASTBOOT_CLASS: u8 = 0xff;
pub const FASTBOOT_SUBCLASS: u8 = 0x42;
pub const FASTBOOT_PROTOCOL: u8 = 0x03;

// --- Framing ---

/// Longest command the device accepts.
pub const MAX_COMMAND_LEN: usize = 64;
/// Largest response frame, tag included.
pub const MAX_RESPONSE_LEN: usize = 64;
pub const TAG_LEN: usize = 4;
/// Hex digits following a `DATA` tag.
pub const DATA_LEN_DIGITS: usize = 8;

pub const TAG_OKAY: &[u8; TAG_LEN] = b"OKAY";
pub const TAG_FAIL: &[u8; TAG_LEN] = b"FAIL";
pub const TAG_INFO: &[u8; TAG_LEN] = b"INFO";
pub const TAG_DATA: &[u8; TAG_LEN] = b"DATA";

/// Host requests understood by the bootloader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    GetVar(String),
    SetVar { name: String, value: String },
    /// Announce a host-to-device data phase of the given size.
    Download(u32),
    /// Ask the device to send back its staged data.
    Upload,
    Flash(String),
    Erase(String),
    Verify(String),
    Check(String),
    EraseAll,
    Boot,
    Continue,
    Reboot,
    RebootBootloader,
    Powerdown,
    Pass,
    Fail,
    Oem(Vec<String>),
    Raw(String),
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::GetVar(name) => write!(f, "getvar:{name}"),
            Command::SetVar { name, value } => write!(f, "setvar:{name}:{value}"),
            Command::Download(size) => write!(f, "download:{size:08x}"),
            Command::Upload => f.write_str("upload"),
            Command::Flash(partition) => write!(f, "flash:{partition}"),
            Command::Erase(partition) => write!(f, "erase:{partition}"),
            Command::Verify(partition) => write!(f, "verify:{partition}"),
            Command::Check(partition) => write!(f, "check:{partition}"),
            Command::EraseAll => f.write_str("eraseall"),
            Command::Boot => f.write_str("boot"),
            Command::Continue => f.write_str("continue"),
            Command::Reboot => f.write_str("reboot"),
            Command::RebootBootloader => f.write_str("reboot-bootloader"),
            Command::Powerdown => f.write_str("powerdown"),
            Command::Pass => f.write_str("pass"),
            Command::Fail => f.write_str("fail"),
            Command::Oem(args) => write!(f, "oem {}", args.join(" ")),
            Command::Raw(text) => f.write_str(text),
        }
    }
}

impl Command {
    /// Render and validate the request frame.
    pub fn encode(&self) -> Result<Vec<u8>> {
        encode_command(&self.to_string())
    }
}

/// Validate command text and turn it into a request frame.
///
/// The limit is checked here rather than at write time so an oversized
/// command never reaches the device.
pub fn encode_command(text: &str) -> Result<Vec<u8>> {
    if text.len() > MAX_COMMAND_LEN {
        return Err(Error::CommandTooLong {
            len: text.len(),
            max: MAX_COMMAND_LEN,
        });
    }
    if !text.bytes().all(|b| b.is_ascii() && !b.is_ascii_control()) {
        return Err(Error::CommandNotAscii(text.to_string()));
    }
    Ok(text.as_bytes().to_vec())
}

/// One decoded reply frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    Okay(String),
    Fail(String),
    Info(String),
    Data(u32),
}

impl Response {
    /// Decode a frame as returned by a single bulk read.
    pub fn decode(frame: &[u8]) -> Result<Self> {
        if frame.len() < TAG_LEN {
            return Err(Error::ShortResponse { len: frame.len() });
        }
        let (tag, body) = frame.split_at(TAG_LEN);

        match tag {
            t if t == TAG_OKAY => Ok(Response::Okay(message_text(body))),
            t if t == TAG_FAIL => Ok(Response::Fail(message_text(body))),
            t if t == TAG_INFO => Ok(Response::Info(message_text(body))),
            t if t == TAG_DATA => parse_data_len(body).map(Response::Data),
            _ => Err(Error::UnknownTag(String::from_utf8_lossy(tag).into_owned())),
        }
    }

    /// OKAY and FAIL end an exchange; INFO and DATA do not.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Response::Okay(_) | Response::Fail(_))
    }
}

/// Message bodies are not length-prefixed; some bootloaders pad with NULs.
fn message_text(body: &[u8]) -> String {
    let end = body.iter().position(|&b| b == 0).unwrap_or(body.len());
    String::from_utf8_lossy(&body[..end]).into_owned()
}

fn parse_data_len(body: &[u8]) -> Result<u32> {
    let text = String::from_utf8_lossy(body);
    if body.len() != DATA_LEN_DIGITS || !body.iter().all(u8::is_ascii_hexdigit) {
        return Err(Error::BadDataLength(text.into_owned()));
    }
    u32::from_str_radix(&text, 16).map_err(|_| Error::BadDataLength(text.into_owned()))
}
