//! Record & replay sessions for container files
//!
//! This module connects the framing codec to live collaborators:
//! - A record session drains a [`RecordSource`] into an [`Encoder`](crate::transcoder::Encoder)
//! - A replay session drains a [`Decoder`](crate::transcoder::Decoder) into a [`BatchSink`]
//! - [`cat`] prints a container without touching any collaborator
//!
//! Both sessions are single cooperative loops. They own their inputs and
//! outputs, close them on every exit path and stop promptly when their
//! [`CancellationToken`](tokio_util::sync::CancellationToken) fires, even
//! while waiting on the source or a pacing tick.
//!
//! # Usage
//!
//! ## Recording
//!
//! ```rust,ignore
//! use kafka_replay::replay::{RecordConfig, RecordSession};
//! use kafka_replay::transcoder::Encoder;
//!
//! let mut session = RecordSession::new(RecordConfig::new().with_limit(1000));
//! let output = std::fs::File::create("capture.bin")?;
//! let outcome = session.run(consumer, output).await;
//! println!("wrote {} records", outcome.stats.records_written);
//! ```
//!
//! ## Replaying
//!
//! ```rust,ignore
//! use kafka_replay::replay::{ReplayConfig, ReplaySession};
//! use kafka_replay::transcoder::Decoder;
//!
//! let mut session = ReplaySession::new(ReplayConfig::new().with_rate(100).with_loop());
//! let outcome = session.run(Decoder::open_path("capture.bin")?, producer).await;
//! ```

pub mod capture;
pub mod cat;
pub mod playback;
pub mod sink;
pub mod source;

pub use capture::{
    RecordConfig, RecordOutcome, RecordSession, RecordState, RecorderStats, StopReason,
};
pub use cat::{cat, CatConfig, CatFormat};
pub use playback::{ReplayConfig, ReplayOutcome, ReplaySession, ReplayState, ReplayerStats};
pub use sink::{Acks, BatchSink, DiscardSink, DispatchRecord};
pub use source::{RecordSource, SourcePoll, SourceRecord};
