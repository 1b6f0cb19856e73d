// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Transport capability interface and device matching.
//!
//! Platform backends implement [`Backend`] and hand out [`Transport`]
//! channels. Everything above this module talks to `dyn Transport` only.

use std::io;
use std::thread;
use std::time::Duration;

use crate::protocol::{DEFAULT_VENDOR_ID, FASTBOOT_CLASS, FASTBOOT_PROTOCOL, FASTBOOT_SUBCLASS};

/// Delay between attempts while waiting for a device to attach.
pub const ACQUIRE_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Printed once when the first acquisition attempt finds nothing.
pub const WAITING_NOTICE: &str = "< waiting for device >";

/// Snapshot of one candidate USB interface.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DeviceDescriptor {
    pub vendor_id: u16,
    pub product_id: u16,
    pub interface_class: u8,
    pub interface_subclass: u8,
    pub interface_protocol: u8,
    pub serial_number: String,
    /// False when the host lacks permission to open the device.
    pub writable: bool,
}

impl DeviceDescriptor {
    /// Serial as shown by `devices`.
    pub fn display_serial(&self) -> &str {
        if !self.writable {
            "no permissions"
        } else if self.serial_number.is_empty() {
            "????????????"
        } else {
            &self.serial_number
        }
    }
}

/// Decides which interfaces are fastboot targets.
#[derive(Debug, Clone, Default)]
pub struct Matcher {
    vendor_id: Option<u16>,
    serial: Option<String>,
}

impl Matcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept this vendor in addition to the default one.
    pub fn with_vendor_id(mut self, vendor_id: u16) -> Self {
        self.vendor_id = Some(vendor_id);
        self
    }

    /// Only accept the device with exactly this serial number.
    pub fn with_serial(mut self, serial: impl Into<String>) -> Self {
        self.serial = Some(serial.into());
        self
    }

    pub fn serial(&self) -> Option<&str> {
        self.serial.as_deref()
    }

    pub fn matches(&self, desc: &DeviceDescriptor) -> bool {
        let vendor_ok =
            self.vendor_id == Some(desc.vendor_id) || desc.vendor_id == DEFAULT_VENDOR_ID;
        if !vendor_ok {
            return false;
        }
        if desc.interface_class != FASTBOOT_CLASS
            || desc.interface_subclass != FASTBOOT_SUBCLASS
            || desc.interface_protocol != FASTBOOT_PROTOCOL
        {
            return false;
        }
        match &self.serial {
            Some(serial) => *serial == desc.serial_number,
            None => true,
        }
    }
}

/// Open bulk IN/OUT endpoint pair.
///
/// Calls block until the transfer completes or fails hard. Transfers larger
/// than [`max_transfer_size`](Transport::max_transfer_size) must be rejected,
/// never truncated.
pub trait Transport {
    /// Read one bulk transfer into `buf`, returning the bytes received.
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Write `buf` as one bulk transfer, returning the bytes accepted.
    fn write(&mut self, buf: &[u8]) -> io::Result<usize>;

    /// Largest single transfer the platform allows.
    fn max_transfer_size(&self) -> usize;

    /// Release the endpoints. Safe to call more than once.
    fn close(&mut self);
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        (**self).read(buf)
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        (**self).write(buf)
    }

    fn max_transfer_size(&self) -> usize {
        (**self).max_transfer_size()
    }

    fn close(&mut self) {
        (**self).close()
    }
}

/// Platform USB stack.
pub trait Backend {
    type Channel: Transport;

    /// Call `visit` once for every attached interface.
    fn enumerate(&mut self, visit: &mut dyn FnMut(&DeviceDescriptor)) -> io::Result<()>;

    /// Open the first interface accepted by `predicate`, if any is attached.
    fn open(
        &mut self,
        predicate: &dyn Fn(&DeviceDescriptor) -> bool,
    ) -> io::Result<Option<Self::Channel>>;
}

/// Descriptors of every attached device the matcher accepts.
pub fn list_devices<B: Backend + ?Sized>(
    backend: &mut B,
    matcher: &Matcher,
) -> io::Result<Vec<DeviceDescriptor>> {
    let mut found = Vec::new();
    backend.enumerate(&mut |desc| {
        if matcher.matches(desc) {
            found.push(desc.clone());
        }
    })?;
    Ok(found)
}

/// Block until a matching device can be opened.
///
/// Prints [`WAITING_NOTICE`] once on the first miss, then polls every
/// [`ACQUIRE_POLL_INTERVAL`] forever.
pub fn acquire<B: Backend + ?Sized>(backend: &mut B, matcher: &Matcher) -> B::Channel {
    acquire_with(backend, matcher, ACQUIRE_POLL_INTERVAL, || {
        eprintln!("{WAITING_NOTICE}")
    })
}

/// [`acquire`] with an explicit poll interval and waiting notice.
pub fn acquire_with<B, F>(
    backend: &mut B,
    matcher: &Matcher,
    interval: Duration,
    on_wait: F,
) -> B::Channel
where
    B: Backend + ?Sized,
    F: FnOnce(),
{
    let mut on_wait = Some(on_wait);
    let predicate = |desc: &DeviceDescriptor| matcher.matches(desc);

    loop {
        match backend.open(&predicate) {
            Ok(Some(channel)) => {
                log::debug!("device acquired");
                return channel;
            }
            Ok(None) => {}
            // Enumeration can fail transiently while devices re-attach.
            Err(e) => log::warn!("device scan failed: {e}"),
        }
        if let Some(notify) = on_wait.take() {
            notify();
        }
        thread::sleep(interval);
    }
}
