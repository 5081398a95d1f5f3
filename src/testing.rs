//! In-memory collaborators for exercising record and replay sessions
//!
//! - [`MemorySource`]: a scripted [`RecordSource`] with idle polls, failures
//!   and optional seeking
//! - [`MemorySink`]: a [`BatchSink`] that keeps every batch it accepts and can
//!   be told to reject one
//! - [`HandleTracker`]: wraps readers and writers to count the ones still open
//!
//! Sources and sinks are moved into a session, so each keeps its observable
//! state behind a cloneable probe.
//!
//! # Example
//!
//! ```ignore
//! use kafka_replay::replay::{RecordConfig, RecordSession};
//! use kafka_replay::testing::MemorySource;
//!
//! let source = MemorySource::from_payloads(["a", "b", "c"]);
//! let probe = source.probe();
//! let outcome = RecordSession::new(RecordConfig::new().with_limit(2))
//!     .run(source, Vec::new())
//!     .await;
//! assert!(probe.is_closed());
//! ```

use crate::error::{Result, SinkError, SourceError};
use crate::replay::sink::{Acks, BatchSink, DispatchRecord};
use crate::replay::source::{RecordSource, SourcePoll, SourceRecord};
use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Timestamp given to the first scripted record (ms since epoch)
pub const BASE_TIMESTAMP_MS: i64 = 1_706_872_530_000;

// ============================================================================
// Source
// ============================================================================

enum Step {
    Record { offset: i64, record: SourceRecord },
    Idle,
    Fail(String),
}

#[derive(Debug, Default)]
struct SourceState {
    reads: u64,
    seeks: Vec<i64>,
    closed: bool,
}

/// Observes a [`MemorySource`] after it has been moved into a session
#[derive(Debug, Clone, Default)]
pub struct SourceProbe {
    state: Arc<Mutex<SourceState>>,
}

impl SourceProbe {
    /// Records handed out so far
    pub fn reads(&self) -> u64 {
        self.state.lock().reads
    }

    /// Offsets passed to `seek`, in call order
    pub fn seeks(&self) -> Vec<i64> {
        self.state.lock().seeks.clone()
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }
}

/// Scripted live source
///
/// Steps are played back in order. Once the script is exhausted the source
/// behaves like an idle live stream: `read_next` never completes.
pub struct MemorySource {
    steps: VecDeque<Step>,
    next_offset: i64,
    seekable: bool,
    probe: SourceProbe,
}

impl Default for MemorySource {
    fn default() -> Self {
        Self::new()
    }
}

impl MemorySource {
    pub fn new() -> Self {
        Self {
            steps: VecDeque::new(),
            next_offset: 0,
            seekable: false,
            probe: SourceProbe::default(),
        }
    }

    /// One unkeyed record per payload, one second apart
    pub fn from_payloads<I, P>(payloads: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<Bytes>,
    {
        payloads
            .into_iter()
            .fold(Self::new(), |source, payload| source.push_payload(payload))
    }

    /// Allow `seek`; records before the target offset are dropped
    pub fn seekable(mut self) -> Self {
        self.seekable = true;
        self
    }

    pub fn push_record(mut self, record: SourceRecord) -> Self {
        let offset = self.next_offset;
        self.next_offset += 1;
        self.steps.push_back(Step::Record { offset, record });
        self
    }

    pub fn push_payload(self, payload: impl Into<Bytes>) -> Self {
        let timestamp_ms = self.next_timestamp();
        self.push_record(SourceRecord::new(timestamp_ms, None, payload))
    }

    pub fn push_keyed(self, key: impl Into<Bytes>, payload: impl Into<Bytes>) -> Self {
        let timestamp_ms = self.next_timestamp();
        self.push_record(SourceRecord::new(timestamp_ms, Some(key.into()), payload))
    }

    /// Report `NoDataYet` once
    pub fn push_idle(mut self) -> Self {
        self.steps.push_back(Step::Idle);
        self
    }

    /// Fail the next read with a source error
    pub fn push_error(mut self, message: impl Into<String>) -> Self {
        self.steps.push_back(Step::Fail(message.into()));
        self
    }

    pub fn probe(&self) -> SourceProbe {
        self.probe.clone()
    }

    fn next_timestamp(&self) -> i64 {
        BASE_TIMESTAMP_MS + self.next_offset * 1000
    }
}

#[async_trait]
impl RecordSource for MemorySource {
    async fn read_next(&mut self) -> Result<SourcePoll> {
        match self.steps.pop_front() {
            Some(Step::Record { record, .. }) => {
                self.probe.state.lock().reads += 1;
                Ok(SourcePoll::Record(record))
            }
            Some(Step::Idle) => Ok(SourcePoll::NoDataYet),
            Some(Step::Fail(message)) => Err(SourceError::operation("read", message).into()),
            None => std::future::pending().await,
        }
    }

    async fn seek(&mut self, offset: i64) -> Result<()> {
        self.probe.state.lock().seeks.push(offset);
        if !self.seekable {
            return Err(SourceError::SeekUnsupported("scripted source is not seekable".into()).into());
        }
        self.steps
            .retain(|step| !matches!(step, Step::Record { offset: o, .. } if *o < offset));
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        self.probe.state.lock().closed = true;
        Ok(())
    }
}

// ============================================================================
// Sink
// ============================================================================

#[derive(Debug, Default)]
struct SinkState {
    batches: Vec<Vec<DispatchRecord>>,
    acks: Vec<Acks>,
    calls: usize,
    closed: bool,
}

/// Observes a [`MemorySink`] after it has been moved into a session
#[derive(Debug, Clone, Default)]
pub struct SinkProbe {
    state: Arc<Mutex<SinkState>>,
}

impl SinkProbe {
    /// Accepted batches, in dispatch order
    pub fn batches(&self) -> Vec<Vec<DispatchRecord>> {
        self.state.lock().batches.clone()
    }

    /// Every accepted record, flattened
    pub fn records(&self) -> Vec<DispatchRecord> {
        self.state.lock().batches.iter().flatten().cloned().collect()
    }

    pub fn batch_sizes(&self) -> Vec<usize> {
        self.state.lock().batches.iter().map(Vec::len).collect()
    }

    /// Acks setting of each dispatch call, accepted or not
    pub fn acks(&self) -> Vec<Acks> {
        self.state.lock().acks.clone()
    }

    /// Number of dispatch calls, including rejected ones
    pub fn dispatch_calls(&self) -> usize {
        self.state.lock().calls
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }
}

/// Batch sink that keeps what it accepts
#[derive(Debug, Default)]
pub struct MemorySink {
    fail_on_call: Option<usize>,
    probe: SinkProbe,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject the `n`th dispatch call (1-based)
    pub fn fail_on_call(mut self, n: usize) -> Self {
        self.fail_on_call = Some(n);
        self
    }

    pub fn probe(&self) -> SinkProbe {
        self.probe.clone()
    }
}

#[async_trait]
impl BatchSink for MemorySink {
    async fn dispatch_batch(&mut self, batch: &[DispatchRecord], acks: Acks) -> Result<()> {
        let mut state = self.probe.state.lock();
        state.calls += 1;
        state.acks.push(acks);
        if self.fail_on_call == Some(state.calls) {
            return Err(SinkError::batch_rejected(batch.len(), "broker unavailable").into());
        }
        state.batches.push(batch.to_vec());
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        self.probe.state.lock().closed = true;
        Ok(())
    }
}

// ============================================================================
// Handle tracking
// ============================================================================

/// Counts wrapped readers and writers that have not been dropped yet
#[derive(Debug, Clone, Default)]
pub struct HandleTracker {
    open: Arc<AtomicUsize>,
}

impl HandleTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reader<R>(&self, inner: R) -> TrackedReader<R> {
        TrackedReader {
            inner,
            _guard: self.guard(),
        }
    }

    pub fn writer<W>(&self, inner: W) -> TrackedWriter<W> {
        TrackedWriter {
            inner,
            _guard: self.guard(),
        }
    }

    /// Wrapped handles still alive
    pub fn open_handles(&self) -> usize {
        self.open.load(Ordering::SeqCst)
    }

    fn guard(&self) -> HandleGuard {
        self.open.fetch_add(1, Ordering::SeqCst);
        HandleGuard {
            open: self.open.clone(),
        }
    }
}

#[derive(Debug)]
struct HandleGuard {
    open: Arc<AtomicUsize>,
}

impl Drop for HandleGuard {
    fn drop(&mut self) {
        self.open.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Reader registered with a [`HandleTracker`]
#[derive(Debug)]
pub struct TrackedReader<R> {
    inner: R,
    _guard: HandleGuard,
}

impl<R: Read> Read for TrackedReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

impl<R: Seek> Seek for TrackedReader<R> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.inner.seek(pos)
    }
}

/// Writer registered with a [`HandleTracker`]
#[derive(Debug)]
pub struct TrackedWriter<W> {
    inner: W,
    _guard: HandleGuard,
}

impl<W: Write> Write for TrackedWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
