// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! libusb transport backend.

use std::io;
use std::time::Duration;

use fastboot_common::transport::{Backend, DeviceDescriptor, Transport};
use rusb::{
    Context, Device, DeviceHandle, Direction, InterfaceDescriptor, TransferType, UsbContext,
};

/// Largest bulk transfer usbfs accepts in one URB.
#[cfg(target_os = "linux")]
pub const MAX_TRANSFER_SIZE: usize = 16 * 1024;
#[cfg(not(target_os = "linux"))]
pub const MAX_TRANSFER_SIZE: usize = 1024 * 1024;

/// Zero means wait forever; libusb only returns on completion or a hard error.
const BULK_TIMEOUT: Duration = Duration::ZERO;
const STRING_TIMEOUT: Duration = Duration::from_millis(500);

/// Backend over every device libusb can see.
pub struct UsbBackend {
    context: Context,
}

impl UsbBackend {
    pub fn new() -> rusb::Result<Self> {
        Ok(Self {
            context: Context::new()?,
        })
    }

    /// Candidate interfaces of every attached device, with their descriptors.
    fn candidates(&self) -> rusb::Result<Vec<Candidate>> {
        let mut found = Vec::new();
        for device in self.context.devices()?.iter() {
            match candidates_of(&device) {
                Ok(mut list) => found.append(&mut list),
                Err(e) => log::debug!(
                    "skipping device {:03}:{:03}: {}",
                    device.bus_number(),
                    device.address(),
                    e
                ),
            }
        }
        Ok(found)
    }
}

impl Backend for UsbBackend {
    type Channel = UsbChannel;

    fn enumerate(&mut self, visit: &mut dyn FnMut(&DeviceDescriptor)) -> io::Result<()> {
        for candidate in self.candidates().map_err(map_rusb_error)? {
            visit(&candidate.descriptor);
        }
        Ok(())
    }

    fn open(
        &mut self,
        predicate: &dyn Fn(&DeviceDescriptor) -> bool,
    ) -> io::Result<Option<UsbChannel>> {
        let candidates = self.candidates().map_err(map_rusb_error)?;
        for candidate in candidates {
            if !predicate(&candidate.descriptor) {
                continue;
            }
            let (Some(ep_in), Some(ep_out)) = (candidate.ep_in, candidate.ep_out) else {
                log::debug!("interface {} has no bulk endpoint pair", candidate.interface);
                continue;
            };
            match UsbChannel::open(&candidate.device, candidate.interface, ep_in, ep_out) {
                Ok(channel) => return Ok(Some(channel)),
                Err(e) => log::warn!(
                    "cannot open {}: {}",
                    candidate.descriptor.display_serial(),
                    e
                ),
            }
        }
        Ok(None)
    }
}

/// One interface of one device, as seen during a scan.
struct Candidate {
    device: Device<Context>,
    descriptor: DeviceDescriptor,
    interface: u8,
    ep_in: Option<u8>,
    ep_out: Option<u8>,
}

fn candidates_of(device: &Device<Context>) -> rusb::Result<Vec<Candidate>> {
    let dev_desc = device.device_descriptor()?;
    let config = device.active_config_descriptor()?;

    // Opening is the only portable permission check; it also yields the serial.
    let (serial_number, writable) = match device.open() {
        Ok(handle) => {
            let serial = handle
                .read_languages(STRING_TIMEOUT)
                .ok()
                .and_then(|langs| langs.first().copied())
                .and_then(|lang| {
                    handle
                        .read_serial_number_string(lang, &dev_desc, STRING_TIMEOUT)
                        .ok()
                })
                .unwrap_or_default();
            (serial, true)
        }
        Err(_) => (String::new(), false),
    };

    let mut found = Vec::new();
    for interface in config.interfaces() {
        for alt in interface.descriptors() {
            let (ep_in, ep_out) = bulk_endpoints(&alt);
            found.push(Candidate {
                device: device.clone(),
                descriptor: DeviceDescriptor {
                    vendor_id: dev_desc.vendor_id(),
                    product_id: dev_desc.product_id(),
                    interface_class: alt.class_code(),
                    interface_subclass: alt.sub_class_code(),
                    interface_protocol: alt.protocol_code(),
                    serial_number: serial_number.clone(),
                    writable,
                },
                interface: alt.interface_number(),
                ep_in,
                ep_out,
            });
        }
    }
    Ok(found)
}

fn bulk_endpoints(alt: &InterfaceDescriptor<'_>) -> (Option<u8>, Option<u8>) {
    let mut ep_in = None;
    let mut ep_out = None;
    for endpoint in alt.endpoint_descriptors() {
        if endpoint.transfer_type() != TransferType::Bulk {
            continue;
        }
        match endpoint.direction() {
            Direction::In if ep_in.is_none() => ep_in = Some(endpoint.address()),
            Direction::Out if ep_out.is_none() => ep_out = Some(endpoint.address()),
            _ => {}
        }
    }
    (ep_in, ep_out)
}

/// Claimed fastboot interface with its bulk endpoint pair.
pub struct UsbChannel {
    handle: Option<DeviceHandle<Context>>,
    interface: u8,
    ep_in: u8,
    ep_out: u8,
}

impl UsbChannel {
    fn open(device: &Device<Context>, interface: u8, ep_in: u8, ep_out: u8) -> rusb::Result<Self> {
        let mut handle = device.open()?;

        // Not supported on every platform; claiming below reports real problems.
        if let Err(e) = handle.set_auto_detach_kernel_driver(true) {
            log::debug!("auto-detach unavailable: {e}");
        }
        handle.claim_interface(interface)?;

        log::debug!(
            "claimed interface {} on {:03}:{:03} (in {:#04x}, out {:#04x})",
            interface,
            device.bus_number(),
            device.address(),
            ep_in,
            ep_out
        );

        Ok(Self {
            handle: Some(handle),
            interface,
            ep_in,
            ep_out,
        })
    }

    fn handle(&self) -> io::Result<&DeviceHandle<Context>> {
        self.handle
            .as_ref()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "channel closed"))
    }

    fn check_len(len: usize) -> io::Result<()> {
        if len > MAX_TRANSFER_SIZE {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("bulk transfer of {len} bytes exceeds {MAX_TRANSFER_SIZE}"),
            ));
        }
        Ok(())
    }
}

impl Transport for UsbChannel {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Self::check_len(buf.len())?;
        self.handle()?
            .read_bulk(self.ep_in, buf, BULK_TIMEOUT)
            .map_err(map_rusb_error)
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Self::check_len(buf.len())?;
        self.handle()?
            .write_bulk(self.ep_out, buf, BULK_TIMEOUT)
            .map_err(map_rusb_error)
    }

    fn max_transfer_size(&self) -> usize {
        MAX_TRANSFER_SIZE
    }

    fn close(&mut self) {
        if let Some(mut handle) = self.handle.take() {
            if let Err(e) = handle.release_interface(self.interface) {
                log::debug!("release of interface {} failed: {}", self.interface, e);
            }
        }
    }
}

impl Drop for UsbChannel {
    fn drop(&mut self) {
        self.close();
    }
}

/// Map libusb errors onto the closest I/O error kind.
pub fn map_rusb_error(err: rusb::Error) -> io::Error {
    let kind = match err {
        rusb::Error::Timeout => io::ErrorKind::TimedOut,
        rusb::Error::Pipe => io::ErrorKind::BrokenPipe,
        rusb::Error::NoDevice => io::ErrorKind::NotConnected,
        rusb::Error::NotFound => io::ErrorKind::NotFound,
        rusb::Error::Access => io::ErrorKind::PermissionDenied,
        rusb::Error::InvalidParam => io::ErrorKind::InvalidInput,
        rusb::Error::Interrupted => io::ErrorKind::Interrupted,
        rusb::Error::NoMem => io::ErrorKind::OutOfMemory,
        rusb::Error::NotSupported => io::ErrorKind::Unsupported,
        _ => io::ErrorKind::Other,
    };
    io::Error::new(kind, err)
}
