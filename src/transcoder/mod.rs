//! Container transcoding
//!
//! A container is a 20-byte header followed by back-to-back records:
//!
//! ```text
//! +---------+----------------+   +-----------+----------+--------------+-----+---------+
//! | version | reserved (16)  |   | timestamp | key_size | payload_size | key | payload | ...
//! | i32 BE  | zero           |   | i64 BE    | i64 BE   | i64 BE       |     |         |
//! +---------+----------------+   +-----------+----------+--------------+-----+---------+
//! ```
//!
//! Version 2 is the only version written. Version 1 containers, whose records
//! have no key fields, remain readable and decode with every key absent.
//!
//! # Example
//!
//! ```
//! use kafka_replay::transcoder::{Decoder, Encoder};
//! use std::io::Cursor;
//!
//! let mut encoder = Encoder::new(Vec::new())?;
//! encoder.write(1706872530, b"Hello, World!", Some(b"user-123".as_slice()))?;
//! assert_eq!(encoder.total_bytes(), 65);
//!
//! let bytes = encoder.into_inner()?;
//! let mut decoder = Decoder::new(Cursor::new(bytes))?;
//! let entry = decoder.read()?.expect("one record");
//! assert_eq!(entry.key.as_deref(), Some(b"user-123".as_slice()));
//! assert!(decoder.read()?.is_none());
//! # Ok::<(), kafka_replay::ReplayError>(())
//! ```

pub mod codec;
pub mod constants;
mod decoder;
mod encoder;
mod entry;
pub mod layout;

pub use codec::{decode_header, decode_record, encode_header, encode_record, encoded_record_len};
pub use decoder::Decoder;
pub use encoder::Encoder;
pub use entry::{contains_bytes, Entry};
pub use layout::{CurrentLayout, LegacyLayout, ProtocolVersion, RecordLayout};
