//! Byte-level tests for the container format

mod common;

use common::*;
use kafka_replay::error::{FramingError, ReplayError};
use kafka_replay::transcoder::constants::MAX_FIELD_SIZE;
use kafka_replay::transcoder::{
    decode_record, encode_header, encode_record, Decoder, Encoder, Entry, ProtocolVersion,
};
use std::io::Cursor;
use tempfile::tempdir;

// ============================================================================
// Exact layout
// ============================================================================

#[test]
fn test_keyed_record_layout() {
    let mut encoder = Encoder::new(Vec::new()).unwrap();
    let written = encoder
        .write(1706872530, b"Hello, World!", Some(b"user-123".as_slice()))
        .unwrap();
    assert_eq!(written, 45);
    assert_eq!(encoder.total_bytes(), 65);

    let bytes = encoder.into_inner().unwrap();
    assert_eq!(bytes.len(), 65);
    assert_eq!(&bytes[..4], &2i32.to_be_bytes());
    assert!(bytes[4..20].iter().all(|b| *b == 0));
    assert_eq!(&bytes[20..28], &1706872530i64.to_be_bytes());
    assert_eq!(&bytes[20..28], &[0, 0, 0, 0, 0x65, 0xBC, 0xCE, 0xD2]);
    assert_eq!(&bytes[28..36], &8i64.to_be_bytes());
    assert_eq!(&bytes[36..44], &13i64.to_be_bytes());
    assert_eq!(&bytes[44..52], b"user-123");
    assert_eq!(&bytes[52..], b"Hello, World!");
}

#[test]
fn test_unkeyed_record_layout() {
    let record = encode_record(1706872530, None, b"Hello, World!").unwrap();
    assert_eq!(record.len(), 37);
    assert_eq!(&record[8..16], &0i64.to_be_bytes());
    assert_eq!(&record[16..24], &13i64.to_be_bytes());
    assert_eq!(&record[24..], b"Hello, World!");
}

#[test]
fn test_header_is_fixed_and_versioned() {
    let header = encode_header(ProtocolVersion::Current);
    assert_eq!(header.len(), 20);
    assert_eq!(Decoder::new(Cursor::new(header.to_vec())).unwrap().version(), ProtocolVersion::Current);

    let mut bogus = header.to_vec();
    bogus[..4].copy_from_slice(&3i32.to_be_bytes());
    assert!(matches!(
        Decoder::new(Cursor::new(bogus)),
        Err(ReplayError::Framing(FramingError::UnsupportedVersion(3)))
    ));
}

// ============================================================================
// Legacy compatibility
// ============================================================================

#[test]
fn test_legacy_container_decodes_without_keys() {
    let bytes = legacy_container(&[
        (1_600_000_000, b"first".as_slice()),
        (1_600_000_001, b"".as_slice()),
        (1_600_000_002, b"third".as_slice()),
    ]);

    let entries = decode_all(bytes);
    assert_eq!(entries.len(), 3);
    assert!(entries.iter().all(|e| e.key.is_none()));
    assert_eq!(entries[0], Entry::new(1_600_000_000, "first"));
    assert_eq!(entries[1].payload.len(), 0);
    assert_eq!(entries[2].timestamp, 1_600_000_002);
}

#[test]
fn test_legacy_record_read_with_current_layout_differs() {
    // the same bytes mean different things under each layout
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&5i64.to_be_bytes());
    bytes.extend_from_slice(&3i64.to_be_bytes());
    bytes.extend_from_slice(b"abc");

    let legacy = decode_record(ProtocolVersion::Legacy, &mut Cursor::new(bytes.clone()))
        .unwrap()
        .unwrap();
    assert_eq!(legacy.payload, "abc");

    let current = decode_record(ProtocolVersion::Current, &mut Cursor::new(bytes));
    assert!(matches!(
        current,
        Err(ReplayError::Framing(FramingError::Truncated { .. }))
    ));
}

// ============================================================================
// Bounds & truncation
// ============================================================================

fn record_prefix(key_size: i64, payload_size: i64) -> Vec<u8> {
    let mut bytes = encode_header(ProtocolVersion::Current).to_vec();
    bytes.extend_from_slice(&1i64.to_be_bytes());
    bytes.extend_from_slice(&key_size.to_be_bytes());
    bytes.extend_from_slice(&payload_size.to_be_bytes());
    bytes
}

#[test]
fn test_oversized_payload_is_fatal() {
    let mut decoder = decoder_for(record_prefix(0, MAX_FIELD_SIZE + 1));
    let err = decoder.read().unwrap_err();
    assert!(matches!(
        err,
        ReplayError::Framing(FramingError::SizeOutOfBounds { field: "payload size", .. })
    ));
}

#[test]
fn test_oversized_key_is_fatal() {
    let mut decoder = decoder_for(record_prefix(MAX_FIELD_SIZE + 1, 1));
    let err = decoder.read().unwrap_err();
    assert!(matches!(
        err,
        ReplayError::Framing(FramingError::SizeOutOfBounds { field: "key size", .. })
    ));
}

#[test]
fn test_negative_size_is_fatal() {
    let mut decoder = decoder_for(record_prefix(-1, 4));
    assert!(decoder.read().unwrap_err().is_framing());
}

#[test]
fn test_size_at_bound_is_accepted_but_truncated_here() {
    // a legal size whose bytes are missing reports truncation, not bounds
    let mut decoder = decoder_for(record_prefix(0, MAX_FIELD_SIZE));
    assert!(matches!(
        decoder.read().unwrap_err(),
        ReplayError::Framing(FramingError::Truncated { field: "payload", .. })
    ));
}

#[test]
fn test_every_truncation_point_is_reported() {
    let full = current_container(&[Entry::with_key(7, "key", "payload")]);
    for cut in 21..full.len() {
        let mut decoder = decoder_for(full[..cut].to_vec());
        let err = decoder.read().unwrap_err();
        assert!(
            matches!(err, ReplayError::Framing(FramingError::Truncated { .. })),
            "cut at {} gave {:?}",
            cut,
            err
        );
    }

    // a clean boundary is the end of the container
    let mut decoder = decoder_for(full[..20].to_vec());
    assert!(decoder.read().unwrap().is_none());
}

// ============================================================================
// Files
// ============================================================================

#[test]
fn test_file_roundtrip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("capture.bin");
    let entries = vec![
        Entry::with_key(1706872530, "user-123", "Hello, World!"),
        Entry::new(1706872531, ""),
        Entry::with_key(1706872532, "user-456", vec![0u8, 159, 146, 150]),
    ];

    let mut encoder = Encoder::create(&path).unwrap();
    for entry in &entries {
        encoder
            .write(entry.timestamp, &entry.payload, entry.key.as_deref())
            .unwrap();
    }
    let total = encoder.total_bytes();
    encoder.close().unwrap();
    assert_eq!(std::fs::metadata(&path).unwrap().len(), total);

    let mut decoder = Decoder::open_path(&path).unwrap();
    for expected in &entries {
        assert_eq!(decoder.read().unwrap().as_ref(), Some(expected));
    }
    assert!(decoder.read().unwrap().is_none());
    decoder.close().unwrap();
}
