#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

//! # kafka-replay
//!
//! Record a keyed, timestamped message stream into a compact container file
//! and replay it back later, paced, filtered, looped or as a dry run.
//!
//! ## Features
//!
//! - **Byte-exact container format**: 20-byte header, length-prefixed records
//! - **Legacy compatibility**: v1 containers (no keys) are still readable
//! - **Record sessions**: live source into a container, with limit, filter and duration cap
//! - **Replay sessions**: container into a batch sink, with pacing, looping and partition pinning
//! - **Prompt cancellation**: every wait races a shared cancellation token
//!
//! ## Quick Start
//!
//! ```bash
//! # Print a recording as JSON lines
//! $ kafka-replay cat capture.bin
//!
//! # Count records containing a substring
//! $ kafka-replay count capture.bin --find ERROR
//!
//! # Check that every record decodes, at replay speed
//! $ kafka-replay verify capture.bin --rate 100
//! ```
//!
//! ## Library Usage
//!
//! ```no_run
//! use kafka_replay::transcoder::{Decoder, Encoder};
//! use kafka_replay::Result;
//!
//! fn main() -> Result<()> {
//!     let mut encoder = Encoder::create("capture.bin")?;
//!     encoder.write(1706872530, b"Hello, World!", Some(b"user-123".as_slice()))?;
//!     encoder.close()?;
//!
//!     let mut decoder = Decoder::open_path("capture.bin")?;
//!     while let Some(entry) = decoder.read()? {
//!         println!("{} {:?}", entry.timestamp, entry.payload);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! Live collaborators plug in through [`replay::RecordSource`] and
//! [`replay::BatchSink`]; see the [`replay`] module.

pub mod config;
pub mod error;
pub mod replay;
pub mod testing;
pub mod transcoder;

pub use config::ConfigFile;
pub use error::{ReplayError, Result};
pub use replay::{RecordConfig, RecordSession, ReplayConfig, ReplaySession};
pub use transcoder::{Decoder, Encoder, Entry, ProtocolVersion};
