// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Scripted transport, backend and reporter shared by the integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::io;
use std::time::Duration;

use fastboot_common::transport::{Backend, DeviceDescriptor, Transport};
use fastboot_common::{Error, Reporter};

/// One scripted result for a read call.
pub enum ReadStep {
    Frame(Vec<u8>),
    Fail(io::ErrorKind),
}

/// Transport that replays canned reads and records every write.
pub struct MockTransport {
    reads: VecDeque<ReadStep>,
    pub writes: Vec<Vec<u8>>,
    pub max_transfer: usize,
    /// Fail the write with this index (0-based).
    pub fail_write_at: Option<usize>,
    /// Accept at most this many bytes per write.
    pub write_limit: Option<usize>,
    pub close_calls: usize,
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            reads: VecDeque::new(),
            writes: Vec::new(),
            max_transfer: 16 * 1024,
            fail_write_at: None,
            write_limit: None,
            close_calls: 0,
        }
    }

    pub fn with_max_transfer(mut self, max: usize) -> Self {
        self.max_transfer = max;
        self
    }

    /// Queue a raw frame for a later read.
    pub fn reply(mut self, frame: &[u8]) -> Self {
        self.reads.push_back(ReadStep::Frame(frame.to_vec()));
        self
    }

    pub fn reply_error(mut self, kind: io::ErrorKind) -> Self {
        self.reads.push_back(ReadStep::Fail(kind));
        self
    }

    /// Frames written as UTF-8, for asserting on commands.
    pub fn written_text(&self) -> Vec<String> {
        self.writes
            .iter()
            .map(|w| String::from_utf8_lossy(w).into_owned())
            .collect()
    }

    pub fn unread(&self) -> usize {
        self.reads.len()
    }
}

impl Transport for MockTransport {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.reads.pop_front() {
            Some(ReadStep::Frame(frame)) => {
                let n = frame.len().min(buf.len());
                buf[..n].copy_from_slice(&frame[..n]);
                if n < frame.len() {
                    self.reads
                        .push_front(ReadStep::Frame(frame[n..].to_vec()));
                }
                Ok(n)
            }
            Some(ReadStep::Fail(kind)) => Err(io::Error::new(kind, "scripted failure")),
            None => Err(io::Error::new(io::ErrorKind::NotConnected, "script exhausted")),
        }
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if buf.len() > self.max_transfer {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "transfer exceeds maximum size",
            ));
        }
        if self.fail_write_at == Some(self.writes.len()) {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "scripted failure"));
        }
        let n = self.write_limit.map_or(buf.len(), |limit| buf.len().min(limit));
        self.writes.push(buf[..n].to_vec());
        Ok(n)
    }

    fn max_transfer_size(&self) -> usize {
        self.max_transfer
    }

    fn close(&mut self) {
        self.close_calls += 1;
    }
}

/// Backend whose device shows up after a number of failed polls.
pub struct MockBackend {
    pub devices: Vec<DeviceDescriptor>,
    pub attach_after: usize,
    pub open_calls: usize,
}

impl MockBackend {
    pub fn new(devices: Vec<DeviceDescriptor>) -> Self {
        Self {
            devices,
            attach_after: 0,
            open_calls: 0,
        }
    }

    fn attached(&self) -> &[DeviceDescriptor] {
        if self.open_calls > self.attach_after {
            &self.devices
        } else {
            &[]
        }
    }
}

impl Backend for MockBackend {
    type Channel = MockTransport;

    fn enumerate(&mut self, visit: &mut dyn FnMut(&DeviceDescriptor)) -> io::Result<()> {
        self.devices.iter().for_each(|d| visit(d));
        Ok(())
    }

    fn open(
        &mut self,
        predicate: &dyn Fn(&DeviceDescriptor) -> bool,
    ) -> io::Result<Option<MockTransport>> {
        self.open_calls += 1;
        Ok(self
            .attached()
            .iter()
            .any(|d| predicate(d))
            .then(MockTransport::new))
    }
}

/// A descriptor that the default matcher accepts.
pub fn fastboot_device(serial: &str) -> DeviceDescriptor {
    DeviceDescriptor {
        vendor_id: 0x1949,
        product_id: 0xd0d0,
        interface_class: 0xff,
        interface_subclass: 0x42,
        interface_protocol: 0x03,
        serial_number: serial.to_string(),
        writable: true,
    }
}

/// Every reporter event, flattened to text in arrival order.
#[derive(Default)]
pub struct RecordingReporter {
    pub events: Vec<String>,
    pub progress: Vec<(usize, usize)>,
}

impl RecordingReporter {
    pub fn infos(&self) -> Vec<&str> {
        self.events
            .iter()
            .filter_map(|e| e.strip_prefix("info:"))
            .collect()
    }
}

impl Reporter for RecordingReporter {
    fn step_started(&mut self, description: &str) {
        self.events.push(format!("start:{description}"));
    }

    fn step_succeeded(&mut self, _elapsed: Duration) {
        self.events.push("okay".to_string());
    }

    fn step_failed(&mut self, error: &Error) {
        self.events.push(format!("failed:{error}"));
    }

    fn info(&mut self, message: &str) {
        self.events.push(format!("info:{message}"));
    }

    fn value(&mut self, label: &str, value: &str) {
        self.events.push(format!("value:{label}={value}"));
    }

    fn notice(&mut self, text: &str) {
        self.events.push(format!("notice:{text}"));
    }

    fn transfer_progress(&mut self, done: usize, total: usize) {
        self.progress.push((done, total));
    }

    fn finished(&mut self, _elapsed: Duration) {
        self.events.push("finished".to_string());
    }
}
