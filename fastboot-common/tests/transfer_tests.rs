// SPDX-License-Identifier: MIT
// Copyright (c) 2026 ADNT Sarl <info@adnt.io>

//! Chunked send/receive tests.

mod common;

use common::{MockTransport, RecordingReporter};
use fastboot_common::transfer::{receive, send};
use fastboot_common::{Error, NullReporter};

fn payload(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 7 % 251) as u8).collect()
}

// --- send ---

#[test]
fn test_send_chunk_count_and_order() {
    for (len, max) in [(0, 4), (1, 4), (4, 4), (5, 4), (17, 4), (1000, 64), (3, 1)] {
        let data = payload(len);
        let mut transport = MockTransport::new().with_max_transfer(max);

        send(&mut transport, &data, &mut NullReporter).unwrap();

        assert_eq!(transport.writes.len(), len.div_ceil(max), "len={len} max={max}");
        assert!(transport.writes.iter().all(|w| w.len() <= max));
        assert_eq!(transport.writes.concat(), data);
    }
}

#[test]
fn test_send_reports_progress() {
    let data = payload(10);
    let mut transport = MockTransport::new().with_max_transfer(4);
    let mut reporter = RecordingReporter::default();

    send(&mut transport, &data, &mut reporter).unwrap();

    assert_eq!(reporter.progress, vec![(4, 10), (8, 10), (10, 10)]);
}

#[test]
fn test_send_short_write_is_fatal() {
    let data = payload(12);
    let mut transport = MockTransport::new().with_max_transfer(8);
    transport.write_limit = Some(5);

    match send(&mut transport, &data, &mut NullReporter) {
        Err(Error::ShortWrite {
            offset,
            written,
            expected,
        }) => {
            assert_eq!(offset, 0);
            assert_eq!(written, 5);
            assert_eq!(expected, 8);
        }
        other => panic!("expected ShortWrite, got {:?}", other),
    }
    // No retry of the short chunk, no further chunks
    assert_eq!(transport.writes.len(), 1);
}

#[test]
fn test_send_io_error_propagates() {
    let data = payload(20);
    let mut transport = MockTransport::new().with_max_transfer(8);
    transport.fail_write_at = Some(1);

    let err = send(&mut transport, &data, &mut NullReporter).unwrap_err();
    assert!(matches!(err, Error::Io(_)));
    assert_eq!(transport.writes.len(), 1);
}

// --- receive ---

#[test]
fn test_receive_zero_length_reads_nothing() {
    let mut transport = MockTransport::new().reply(b"OKAY");
    let data = receive(&mut transport, 0, &mut NullReporter).unwrap();
    assert!(data.is_empty());
    assert_eq!(transport.unread(), 1);
}

#[test]
fn test_receive_accumulates_partial_reads() {
    let mut transport = MockTransport::new()
        .with_max_transfer(16)
        .reply(b"abc")
        .reply(b"defgh")
        .reply(b"ij");
    let mut reporter = RecordingReporter::default();

    let data = receive(&mut transport, 10, &mut reporter).unwrap();

    assert_eq!(data, b"abcdefghij");
    assert_eq!(reporter.progress, vec![(3, 10), (8, 10), (10, 10)]);
}

#[test]
fn test_receive_respects_max_transfer() {
    // One 10-byte frame delivered through 4-byte reads
    let mut transport = MockTransport::new()
        .with_max_transfer(4)
        .reply(b"0123456789");
    let mut reporter = RecordingReporter::default();

    let data = receive(&mut transport, 10, &mut reporter).unwrap();

    assert_eq!(data, b"0123456789");
    assert_eq!(reporter.progress, vec![(4, 10), (8, 10), (10, 10)]);
}

#[test]
fn test_receive_zero_byte_read_is_eof() {
    let mut transport = MockTransport::new().reply(b"abc").reply(b"");
    match receive(&mut transport, 8, &mut NullReporter) {
        Err(Error::UnexpectedEof { received, expected }) => {
            assert_eq!(received, 3);
            assert_eq!(expected, 8);
        }
        other => panic!("expected UnexpectedEof, got {:?}", other),
    }
}

#[test]
fn test_receive_io_error_propagates() {
    let mut transport = MockTransport::new()
        .reply(b"ab")
        .reply_error(std::io::ErrorKind::BrokenPipe);
    assert!(matches!(
        receive(&mut transport, 4, &mut NullReporter),
        Err(Error::Io(_))
    ));
}

#[test]
fn test_receive_huge_declared_length_allocates_lazily() {
    let mut transport = MockTransport::new().reply(b"abc").reply(b"");
    match receive(&mut transport, u32::MAX as usize, &mut NullReporter) {
        Err(Error::UnexpectedEof { received, expected }) => {
            assert_eq!(received, 3);
            assert_eq!(expected, u32::MAX as usize);
        }
        other => panic!("expected UnexpectedEof, got {:?}", other),
    }
}
