//! Protocol versions and their record layouts
//!
//! A container's header selects exactly one [`RecordLayout`]; the decoder
//! resolves it once and applies it to every record that follows.
//!
//! ```text
//! legacy  (v1): timestamp(8) | payload_size(8) | payload
//! current (v2): timestamp(8) | key_size(8) | payload_size(8) | key | payload
//! ```

use crate::error::{FramingError, Result};
use crate::transcoder::constants::{
    MAX_FIELD_SIZE, PAYLOAD_SIZE_FIELD_SIZE, PROTOCOL_VERSION_CURRENT, PROTOCOL_VERSION_LEGACY,
    TIMESTAMP_SIZE,
};
use crate::transcoder::entry::Entry;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::{ErrorKind, Read};

const READ_CHUNK_SIZE: usize = 64 * 1024;

/// Container protocol version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProtocolVersion {
    /// Version 1: no keys, read-only
    Legacy,
    /// Version 2: keyed records, the only version ever written
    Current,
}

impl ProtocolVersion {
    /// Numeric value stored in the header
    pub fn as_i32(self) -> i32 {
        match self {
            ProtocolVersion::Legacy => PROTOCOL_VERSION_LEGACY,
            ProtocolVersion::Current => PROTOCOL_VERSION_CURRENT,
        }
    }

    /// Record layout strategy for this version
    pub fn layout(self) -> &'static dyn RecordLayout {
        match self {
            ProtocolVersion::Legacy => &LegacyLayout,
            ProtocolVersion::Current => &CurrentLayout,
        }
    }
}

impl TryFrom<i32> for ProtocolVersion {
    type Error = FramingError;

    fn try_from(value: i32) -> std::result::Result<Self, Self::Error> {
        match value {
            PROTOCOL_VERSION_LEGACY => Ok(ProtocolVersion::Legacy),
            PROTOCOL_VERSION_CURRENT => Ok(ProtocolVersion::Current),
            other => Err(FramingError::UnsupportedVersion(other)),
        }
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.as_i32())
    }
}

/// Strategy for parsing one record of a given layout
pub trait RecordLayout: Send + Sync {
    /// Version this layout belongs to
    fn version(&self) -> ProtocolVersion;

    /// Read exactly one record.
    ///
    /// Returns `Ok(None)` when the reader is exhausted exactly at a record
    /// boundary, and [`FramingError::Truncated`] when it ends inside one.
    fn read_record(&self, reader: &mut dyn Read) -> Result<Option<Entry>>;
}

/// Version 1 layout: `timestamp | payload_size | payload`
#[derive(Debug, Clone, Copy, Default)]
pub struct LegacyLayout;

impl RecordLayout for LegacyLayout {
    fn version(&self) -> ProtocolVersion {
        ProtocolVersion::Legacy
    }

    fn read_record(&self, reader: &mut dyn Read) -> Result<Option<Entry>> {
        let Some(timestamp) = read_timestamp(reader)? else {
            return Ok(None);
        };
        let payload_size = read_size(reader, "payload size")?;
        let payload = read_body(reader, "payload", payload_size)?;

        Ok(Some(Entry {
            timestamp,
            key: None,
            payload,
        }))
    }
}

/// Version 2 layout: `timestamp | key_size | payload_size | key | payload`
#[derive(Debug, Clone, Copy, Default)]
pub struct CurrentLayout;

impl RecordLayout for CurrentLayout {
    fn version(&self) -> ProtocolVersion {
        ProtocolVersion::Current
    }

    fn read_record(&self, reader: &mut dyn Read) -> Result<Option<Entry>> {
        let Some(timestamp) = read_timestamp(reader)? else {
            return Ok(None);
        };
        // Both lengths are validated before any variable-size data is touched
        let key_size = read_size(reader, "key size")?;
        let payload_size = read_size(reader, "payload size")?;

        let key = if key_size > 0 {
            Some(read_body(reader, "key", key_size)?)
        } else {
            None
        };
        let payload = read_body(reader, "payload", payload_size)?;

        Ok(Some(Entry {
            timestamp,
            key,
            payload,
        }))
    }
}

/// Fill `buf` from `reader`, stopping early only at end of input.
///
/// Returns the number of bytes read.
pub(crate) fn read_full(reader: &mut dyn Read, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

fn read_exact_field(reader: &mut dyn Read, field: &'static str, buf: &mut [u8]) -> Result<()> {
    let got = read_full(reader, buf)?;
    if got < buf.len() {
        return Err(FramingError::truncated(field, buf.len(), got).into());
    }
    Ok(())
}

fn read_timestamp(reader: &mut dyn Read) -> Result<Option<i64>> {
    let mut buf = [0u8; TIMESTAMP_SIZE];
    let got = read_full(reader, &mut buf)?;
    match got {
        0 => Ok(None),
        TIMESTAMP_SIZE => Ok(Some(i64::from_be_bytes(buf))),
        partial => Err(FramingError::truncated("timestamp", TIMESTAMP_SIZE, partial).into()),
    }
}

// Key and payload size fields share the same width
fn read_size(reader: &mut dyn Read, field: &'static str) -> Result<usize> {
    let mut buf = [0u8; PAYLOAD_SIZE_FIELD_SIZE];
    read_exact_field(reader, field, &mut buf)?;
    let size = i64::from_be_bytes(buf);
    check_size(field, size)?;
    Ok(size as usize)
}

// Grows with the input instead of trusting the declared size up front
fn read_body(reader: &mut dyn Read, field: &'static str, size: usize) -> Result<Bytes> {
    let mut buf = Vec::with_capacity(size.min(READ_CHUNK_SIZE));
    let got = (&mut *reader).take(size as u64).read_to_end(&mut buf)?;
    if got < size {
        return Err(FramingError::truncated(field, size, got).into());
    }
    Ok(Bytes::from(buf))
}

/// Validate a key or payload length against the per-field bound
pub(crate) fn check_size(field: &'static str, size: i64) -> std::result::Result<(), FramingError> {
    if !(0..=MAX_FIELD_SIZE).contains(&size) {
        return Err(FramingError::size_out_of_bounds(field, size, MAX_FIELD_SIZE));
    }
    Ok(())
}
