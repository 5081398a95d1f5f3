//! Configuration module for kafka-replay
//!
//! - `defaults` - Default constants and values
//! - `file` - TOML configuration file support
//!
//! The session configuration structs themselves live next to the sessions
//! they drive ([`RecordConfig`](crate::replay::RecordConfig) and
//! [`ReplayConfig`](crate::replay::ReplayConfig)); this module gathers them
//! into a loadable file.

mod defaults;
pub mod file;

pub use defaults::*;
pub use file::ConfigFile;

/// Serde adapter for byte-substring filters
///
/// Filters are written as plain strings in config files and converted to
/// bytes, the same way a `--find` flag would be.
pub(crate) mod find_filter {
    use bytes::Bytes;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<Bytes>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(bytes) => serializer.serialize_some(&String::from_utf8_lossy(bytes)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Bytes>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value: Option<String> = Option::deserialize(deserializer)?;
        Ok(value.filter(|s| !s.is_empty()).map(Bytes::from))
    }
}
