// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Chunked bulk data phase in both directions.

use crate::error::{Error, Result};
use crate::report::Reporter;
use crate::transport::Transport;

/// Write `data` in order, in pieces of at most `max_transfer_size` bytes.
///
/// A short write is fatal; nothing is retried.
pub fn send(transport: &mut dyn Transport, data: &[u8], reporter: &mut dyn Reporter) -> Result<()> {
    let chunk_size = transport.max_transfer_size().max(1);
    let total = data.len();
    let mut offset = 0;

    for chunk in data.chunks(chunk_size) {
        let written = transport.write(chunk)?;
        if written != chunk.len() {
            return Err(Error::ShortWrite {
                offset,
                written,
                expected: chunk.len(),
            });
        }
        offset += written;
        log::trace!("sent {offset}/{total} bytes");
        reporter.transfer_progress(offset, total);
    }

    Ok(())
}

/// Read exactly `len` bytes, accumulating partial reads.
///
/// `len` comes from the device, so the buffer grows with the bytes that
/// actually arrive instead of being allocated up front.
pub fn receive(
    transport: &mut dyn Transport,
    len: usize,
    reporter: &mut dyn Reporter,
) -> Result<Vec<u8>> {
    let chunk_size = transport.max_transfer_size().max(1);
    let mut data = Vec::with_capacity(len.min(chunk_size));
    let mut chunk = vec![0u8; chunk_size.min(len)];

    while data.len() < len {
        let want = chunk.len().min(len - data.len());
        let n = transport.read(&mut chunk[..want])?;
        if n == 0 {
            return Err(Error::UnexpectedEof {
                received: data.len(),
                expected: len,
            });
        }
        data.extend_from_slice(&chunk[..n]);
        log::trace!("received {}/{len} bytes", data.len());
        reporter.transfer_progress(data.len(), len);
    }

    Ok(data)
}
