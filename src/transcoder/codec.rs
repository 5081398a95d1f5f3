//! Pure encode/decode functions for container headers and records
//!
//! Nothing here owns a file or a cursor; [`Encoder`](super::Encoder) and
//! [`Decoder`](super::Decoder) layer the sequential I/O on top.

use crate::error::{FramingError, Result};
use crate::transcoder::constants::{CURRENT_RECORD_PREFIX_SIZE, HEADER_SIZE, HEADER_VERSION_SIZE};
use crate::transcoder::entry::Entry;
use crate::transcoder::layout::{check_size, read_full, ProtocolVersion};
use bytes::{BufMut, Bytes, BytesMut};
use std::io::Read;

/// Serialize a container header for `version`
///
/// The reserved bytes are always zero.
pub fn encode_header(version: ProtocolVersion) -> [u8; HEADER_SIZE] {
    let mut header = [0u8; HEADER_SIZE];
    header[..HEADER_VERSION_SIZE].copy_from_slice(&version.as_i32().to_be_bytes());
    header
}

/// Parse a container header, consuming exactly [`HEADER_SIZE`] bytes
pub fn decode_header<R: Read>(reader: &mut R) -> Result<ProtocolVersion> {
    let mut header = [0u8; HEADER_SIZE];
    let got = read_full(reader, &mut header)?;
    if got < HEADER_SIZE {
        return Err(FramingError::truncated("header", HEADER_SIZE, got).into());
    }

    let mut version = [0u8; HEADER_VERSION_SIZE];
    version.copy_from_slice(&header[..HEADER_VERSION_SIZE]);
    // Reserved bytes are read but not interpreted
    Ok(ProtocolVersion::try_from(i32::from_be_bytes(version))?)
}

/// Number of bytes a current-layout record occupies on the wire
pub fn encoded_record_len(key: Option<&[u8]>, payload: &[u8]) -> usize {
    CURRENT_RECORD_PREFIX_SIZE + key.map_or(0, <[u8]>::len) + payload.len()
}

/// Serialize one current-layout record
///
/// An absent key and an empty key both serialize as `key_size = 0`.
pub fn encode_record(timestamp: i64, key: Option<&[u8]>, payload: &[u8]) -> Result<Bytes> {
    let mut buf = BytesMut::with_capacity(encoded_record_len(key, payload));
    encode_record_into(&mut buf, timestamp, key, payload)?;
    Ok(buf.freeze())
}

/// Append one current-layout record to `buf`
///
/// Fails with [`FramingError::SizeOutOfBounds`] rather than produce a record
/// no decoder would accept.
pub fn encode_record_into(
    buf: &mut BytesMut,
    timestamp: i64,
    key: Option<&[u8]>,
    payload: &[u8],
) -> Result<()> {
    let key = key.unwrap_or_default();
    check_size("key size", key.len() as i64)?;
    check_size("payload size", payload.len() as i64)?;

    buf.reserve(encoded_record_len(Some(key), payload));
    buf.put_i64(timestamp);
    buf.put_i64(key.len() as i64);
    buf.put_i64(payload.len() as i64);
    buf.put_slice(key);
    buf.put_slice(payload);
    Ok(())
}

/// Parse one record using the layout selected by `version`
///
/// Returns `Ok(None)` at a clean end of input.
pub fn decode_record<R: Read>(version: ProtocolVersion, reader: &mut R) -> Result<Option<Entry>> {
    version.layout().read_record(reader)
}
