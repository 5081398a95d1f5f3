//! Wire-format constants for recording containers
//!
//! All multi-byte integers in a container are big-endian.

/// Size of the version field at the start of the header (int32)
pub const HEADER_VERSION_SIZE: usize = 4;

/// Reserved header space; zero on write, read but not interpreted
pub const HEADER_RESERVED_SIZE: usize = 16;

/// Total container header size, identical for every protocol version
pub const HEADER_SIZE: usize = HEADER_VERSION_SIZE + HEADER_RESERVED_SIZE;

/// Size of the timestamp field (int64 whole seconds since the Unix epoch)
pub const TIMESTAMP_SIZE: usize = 8;

/// Size of the key size field (int64)
pub const KEY_SIZE_FIELD_SIZE: usize = 8;

/// Size of the payload size field (int64)
pub const PAYLOAD_SIZE_FIELD_SIZE: usize = 8;

/// Fixed prefix of a current-layout record: timestamp, key size, payload size
pub const CURRENT_RECORD_PREFIX_SIZE: usize =
    TIMESTAMP_SIZE + KEY_SIZE_FIELD_SIZE + PAYLOAD_SIZE_FIELD_SIZE;

/// Fixed prefix of a legacy-layout record: timestamp, payload size
pub const LEGACY_RECORD_PREFIX_SIZE: usize = TIMESTAMP_SIZE + PAYLOAD_SIZE_FIELD_SIZE;

/// Upper bound for any key or payload length field (100 MiB)
pub const MAX_FIELD_SIZE: i64 = 100 * 1024 * 1024;

/// Protocol version written by this implementation
pub const PROTOCOL_VERSION_CURRENT: i32 = 2;

/// Read-only legacy protocol version (records carry no key)
pub const PROTOCOL_VERSION_LEGACY: i32 = 1;
