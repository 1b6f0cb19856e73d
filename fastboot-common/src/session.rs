// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Request/response exchanges over an open transport.
//!
//! Each exchange sends one command and reads frames until OKAY or FAIL,
//! relaying INFO frames to the reporter as they arrive.

use crate::error::{Error, Result};
use crate::protocol::{encode_command, Command, Response, MAX_RESPONSE_LEN};
use crate::report::Reporter;
use crate::transfer;
use crate::transport::Transport;

/// Send one command frame.
pub fn send_command(transport: &mut dyn Transport, text: &str) -> Result<()> {
    let frame = encode_command(text)?;
    log::debug!("> {text}");
    let written = transport.write(&frame)?;
    if written != frame.len() {
        return Err(Error::ShortWrite {
            offset: 0,
            written,
            expected: frame.len(),
        });
    }
    Ok(())
}

/// Read and decode a single response frame.
pub fn read_response(transport: &mut dyn Transport) -> Result<Response> {
    let mut buf = [0u8; MAX_RESPONSE_LEN];
    let n = transport.read(&mut buf)?;
    let response = Response::decode(&buf[..n])?;
    log::debug!("< {response:?}");
    Ok(response)
}

/// Frames that can end the INFO loop.
enum Reply {
    Okay(String),
    Fail(String),
    Data(u32),
}

/// Read frames until one that is not INFO.
fn next_reply(transport: &mut dyn Transport, reporter: &mut dyn Reporter) -> Result<Reply> {
    loop {
        match read_response(transport)? {
            Response::Info(message) => reporter.info(&message),
            Response::Okay(message) => return Ok(Reply::Okay(message)),
            Response::Fail(message) => return Ok(Reply::Fail(message)),
            Response::Data(size) => return Ok(Reply::Data(size)),
        }
    }
}

/// Read the closing frame of an exchange.
fn finish(transport: &mut dyn Transport, reporter: &mut dyn Reporter) -> Result<String> {
    match next_reply(transport, reporter)? {
        Reply::Okay(message) => Ok(message),
        Reply::Fail(message) => Err(Error::Remote(message)),
        Reply::Data(size) => Err(Error::UnexpectedData(size)),
    }
}

/// Read the DATA frame that opens a data phase.
fn data_phase(transport: &mut dyn Transport, reporter: &mut dyn Reporter) -> Result<u32> {
    match next_reply(transport, reporter)? {
        Reply::Data(size) => Ok(size),
        Reply::Okay(message) => Err(Error::MissingData(message)),
        Reply::Fail(message) => Err(Error::Remote(message)),
    }
}

/// Run a command without a data phase; returns the OKAY message.
pub fn command(
    transport: &mut dyn Transport,
    text: &str,
    reporter: &mut dyn Reporter,
) -> Result<String> {
    send_command(transport, text)?;
    finish(transport, reporter)
}

/// Query a bootloader variable.
pub fn getvar(
    transport: &mut dyn Transport,
    name: &str,
    reporter: &mut dyn Reporter,
) -> Result<String> {
    command(transport, &Command::GetVar(name.to_string()).to_string(), reporter)
}

/// Announce `data` with a download command and stream it to the device.
pub fn send_payload(
    transport: &mut dyn Transport,
    data: &[u8],
    reporter: &mut dyn Reporter,
) -> Result<String> {
    let size = u32::try_from(data.len()).map_err(|_| Error::PayloadTooLarge(data.len()))?;
    send_command(transport, &Command::Download(size).to_string())?;

    let requested = data_phase(transport, reporter)?;
    let requested_len = requested as usize;
    if requested_len > data.len() {
        return Err(Error::DataTooLarge {
            requested,
            available: data.len(),
        });
    }
    if requested_len < data.len() {
        log::warn!(
            "device requested {requested_len} of {} bytes, sending prefix only",
            data.len()
        );
    }

    transfer::send(transport, &data[..requested_len], reporter)?;
    finish(transport, reporter)
}

/// Ask the device for its staged data and read it back.
pub fn fetch_payload(transport: &mut dyn Transport, reporter: &mut dyn Reporter) -> Result<Vec<u8>> {
    send_command(transport, &Command::Upload.to_string())?;

    let size = data_phase(transport, reporter)? as usize;
    let data = transfer::receive(transport, size, reporter)?;
    finish(transport, reporter)?;
    Ok(data)
}

/// Send a reboot-style command without waiting for an acknowledgement.
///
/// The device may reset or drop off the bus at any point after the write,
/// so no reply is read. Whatever it sends is left on the endpoint.
pub fn send_and_detach(transport: &mut dyn Transport, text: &str) -> Result<()> {
    send_command(transport, text)?;
    log::debug!("not waiting for a reply to {text:?}");
    Ok(())
}
