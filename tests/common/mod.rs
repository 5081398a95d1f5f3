//! Shared test fixtures for kafka-replay integration tests
//!
//! # Usage
//!
//! In your test file, add:
//! ```rust,ignore
//! mod common;
//! use common::*;
//! ```

#![allow(dead_code)]

use kafka_replay::testing::{HandleTracker, TrackedReader};
use kafka_replay::transcoder::{encode_header, Decoder, Encoder, Entry, ProtocolVersion};
use std::io::Cursor;

// ============================================================================
// Container Builders
// ============================================================================

/// Encode `entries` into an in-memory current-layout container
pub fn current_container(entries: &[Entry]) -> Vec<u8> {
    let mut encoder = Encoder::new(Vec::new()).expect("encoder");
    for entry in entries {
        encoder
            .write(entry.timestamp, &entry.payload, entry.key.as_deref())
            .expect("write entry");
    }
    encoder.into_inner().expect("into_inner")
}

/// Build a legacy-layout container by hand: no key size, no key
pub fn legacy_container(records: &[(i64, &[u8])]) -> Vec<u8> {
    let mut bytes = encode_header(ProtocolVersion::Legacy).to_vec();
    for (timestamp, payload) in records {
        bytes.extend_from_slice(&timestamp.to_be_bytes());
        bytes.extend_from_slice(&(payload.len() as i64).to_be_bytes());
        bytes.extend_from_slice(payload);
    }
    bytes
}

/// Decoder over an in-memory container
pub fn decoder_for(bytes: Vec<u8>) -> Decoder<Cursor<Vec<u8>>> {
    Decoder::new(Cursor::new(bytes)).expect("decoder")
}

/// Decoder whose reader is registered with `tracker`
pub fn tracked_decoder(
    tracker: &HandleTracker,
    bytes: Vec<u8>,
) -> Decoder<TrackedReader<Cursor<Vec<u8>>>> {
    Decoder::new(tracker.reader(Cursor::new(bytes))).expect("decoder")
}

/// Decode every record of a container
pub fn decode_all(bytes: Vec<u8>) -> Vec<Entry> {
    let mut decoder = decoder_for(bytes);
    let mut entries = Vec::new();
    while let Some(entry) = decoder.read().expect("read entry") {
        entries.push(entry);
    }
    entries
}

// ============================================================================
// Fixtures
// ============================================================================

/// `count` unkeyed entries, one second apart
pub fn sequential_entries(count: usize) -> Vec<Entry> {
    (0..count)
        .map(|i| Entry::new(1_706_872_530 + i as i64, format!("message-{}", i)))
        .collect()
}

/// Ten log lines, exactly two of which contain `ERROR`
pub fn log_payloads() -> Vec<&'static str> {
    vec![
        "INFO service started",
        "DEBUG cache warm",
        "ERROR connection refused",
        "INFO request ok",
        "WARN slow response",
        "INFO request ok",
        "DEBUG gc pause",
        "ERROR timeout after 30s",
        "INFO request ok",
        "INFO shutting down",
    ]
}
