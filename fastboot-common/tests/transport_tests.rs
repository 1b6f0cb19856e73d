// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Device matching, listing and acquisition tests.

mod common;

use std::cell::Cell;
use std::time::Duration;

use common::{fastboot_device, MockBackend, MockTransport};
use fastboot_common::transport::{
    acquire_with, list_devices, DeviceDescriptor, Matcher, Transport, ACQUIRE_POLL_INTERVAL,
    WAITING_NOTICE,
};

// =============================================================================
// Matcher
// =============================================================================

#[test]
fn test_default_vendor_matches() {
    assert!(Matcher::new().matches(&fastboot_device("ABC")));
}

#[test]
fn test_other_vendor_needs_override() {
    let desc = DeviceDescriptor {
        vendor_id: 0x18d1,
        ..fastboot_device("ABC")
    };
    assert!(!Matcher::new().matches(&desc));
    assert!(Matcher::new().with_vendor_id(0x18d1).matches(&desc));
}

#[test]
fn test_override_keeps_default_vendor() {
    let matcher = Matcher::new().with_vendor_id(0x18d1);
    assert!(matcher.matches(&fastboot_device("ABC")));
}

#[test]
fn test_interface_triple_must_match() {
    let base = fastboot_device("ABC");
    for desc in [
        DeviceDescriptor {
            interface_class: 0x08,
            ..base.clone()
        },
        DeviceDescriptor {
            interface_subclass: 0x00,
            ..base.clone()
        },
        DeviceDescriptor {
            interface_protocol: 0x01,
            ..base.clone()
        },
    ] {
        assert!(!Matcher::new().matches(&desc), "{:?}", desc);
    }
}

#[test]
fn test_serial_filter_is_exact_and_case_sensitive() {
    let matcher = Matcher::new().with_serial("B0F1");
    assert!(matcher.matches(&fastboot_device("B0F1")));
    assert!(!matcher.matches(&fastboot_device("b0f1")));
    assert!(!matcher.matches(&fastboot_device("B0F12")));
    assert!(!matcher.matches(&fastboot_device("")));
}

// =============================================================================
// Descriptor display
// =============================================================================

#[test]
fn test_display_serial() {
    assert_eq!(fastboot_device("B0F1").display_serial(), "B0F1");
    assert_eq!(fastboot_device("").display_serial(), "????????????");
    let locked = DeviceDescriptor {
        writable: false,
        ..fastboot_device("B0F1")
    };
    assert_eq!(locked.display_serial(), "no permissions");
}

// =============================================================================
// Listing
// =============================================================================

#[test]
fn test_list_devices_filters_without_opening() {
    let other = DeviceDescriptor {
        vendor_id: 0x046d,
        ..fastboot_device("mouse")
    };
    let mut backend = MockBackend::new(vec![
        fastboot_device("one"),
        other,
        fastboot_device("two"),
    ]);

    let found = list_devices(&mut backend, &Matcher::new()).unwrap();

    let serials: Vec<&str> = found.iter().map(|d| d.serial_number.as_str()).collect();
    assert_eq!(serials, vec!["one", "two"]);
    assert_eq!(backend.open_calls, 0);
}

// =============================================================================
// Acquisition
// =============================================================================

#[test]
fn test_acquire_polls_once_per_second() {
    assert_eq!(ACQUIRE_POLL_INTERVAL, Duration::from_secs(1));
}

#[test]
fn test_waiting_notice_text() {
    assert_eq!(WAITING_NOTICE, "< waiting for device >");
}

#[test]
fn test_acquire_immediate_does_not_announce() {
    let mut backend = MockBackend::new(vec![fastboot_device("one")]);
    let waited = Cell::new(false);

    let _channel = acquire_with(&mut backend, &Matcher::new(), Duration::ZERO, || {
        waited.set(true)
    });

    assert!(!waited.get());
    assert_eq!(backend.open_calls, 1);
}

#[test]
fn test_acquire_waits_for_attachment() {
    let mut backend = MockBackend::new(vec![fastboot_device("one")]);
    backend.attach_after = 5;
    let notices = Cell::new(0);

    let _channel = acquire_with(&mut backend, &Matcher::new(), Duration::from_millis(1), || {
        notices.set(notices.get() + 1)
    });

    assert_eq!(notices.get(), 1);
    assert_eq!(backend.open_calls, 6);
}

#[test]
fn test_acquire_honours_serial_filter() {
    let mut backend = MockBackend::new(vec![fastboot_device("wanted")]);
    backend.attach_after = 2;
    let matcher = Matcher::new().with_serial("wanted");

    let _channel = acquire_with(&mut backend, &matcher, Duration::ZERO, || {});

    assert_eq!(backend.open_calls, 3);
}

// =============================================================================
// Boxed transports
// =============================================================================

#[test]
fn test_boxed_transport_forwards() {
    let mut boxed: Box<dyn Transport> = Box::new(MockTransport::new().with_max_transfer(512));
    assert_eq!(boxed.max_transfer_size(), 512);
    assert_eq!(boxed.write(b"getvar:x").unwrap(), 8);
    boxed.close();
    boxed.close();
}
