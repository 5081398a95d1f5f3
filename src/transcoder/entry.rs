//! Logical record type carried by a container

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single record decoded from (or destined for) a container
///
/// The timestamp has whole-second granularity; sub-second precision is not
/// representable on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// Seconds since the Unix epoch, UTC
    pub timestamp: i64,

    /// Record key; always `None` for legacy containers
    pub key: Option<Bytes>,

    /// Record payload, possibly empty
    pub payload: Bytes,
}

impl Entry {
    /// Create a new entry without a key
    pub fn new(timestamp: i64, payload: impl Into<Bytes>) -> Self {
        Self {
            timestamp,
            key: None,
            payload: payload.into(),
        }
    }

    /// Create a new entry with a key
    pub fn with_key(timestamp: i64, key: impl Into<Bytes>, payload: impl Into<Bytes>) -> Self {
        Self {
            timestamp,
            key: Some(key.into()),
            payload: payload.into(),
        }
    }

    /// Timestamp as a UTC datetime, if it is within chrono's representable range
    pub fn datetime(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.timestamp, 0)
    }

    /// Returns true if the payload contains `needle` as a contiguous byte run
    pub fn payload_contains(&self, needle: &[u8]) -> bool {
        contains_bytes(&self.payload, needle)
    }
}

/// Literal byte-substring search used by the find filters
///
/// An empty needle matches every haystack.
pub fn contains_bytes(haystack: &[u8], needle: &[u8]) -> bool {
    if needle.is_empty() {
        return true;
    }
    if needle.len() > haystack.len() {
        return false;
    }
    haystack.windows(needle.len()).any(|window| window == needle)
}
