//! Replay session: container into a live sink

use crate::config::{
    DEFAULT_BATCH_BYTES, DEFAULT_BATCH_SIZE, DEFAULT_REPLAY_RATE, MAX_REPLAY_RATE,
};
use crate::error::{ConfigError, ReplayError, Result};
use crate::replay::sink::{Acks, BatchSink, DispatchRecord};
use crate::transcoder::{contains_bytes, Decoder, Entry};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::io::{Read, Seek};
use std::time::Duration;
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Configuration for a replay session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplayConfig {
    /// Records per second (0 = as fast as possible)
    pub rate: u32,

    /// Start over from the first record at end of container
    pub loop_replay: bool,

    /// Pin every dispatched record to this partition
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partition: Option<i32>,

    /// Decode, filter and pace without dispatching
    pub dry_run: bool,

    /// Only replay payloads containing this byte sequence
    #[serde(
        with = "crate::config::find_filter",
        skip_serializing_if = "Option::is_none"
    )]
    pub find: Option<Bytes>,

    /// Dispatch with the recorded timestamp instead of the current time
    pub preserve_timestamps: bool,

    /// Acknowledgment strength requested from the sink
    pub acks: Acks,

    /// Records per dispatched batch
    pub batch_size: usize,

    /// Payload bytes per dispatched batch
    pub batch_bytes: usize,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            rate: DEFAULT_REPLAY_RATE,
            loop_replay: false,
            partition: None,
            dry_run: false,
            find: None,
            preserve_timestamps: false,
            acks: Acks::default(),
            batch_size: DEFAULT_BATCH_SIZE,
            batch_bytes: DEFAULT_BATCH_BYTES,
        }
    }
}

impl ReplayConfig {
    /// Create a replay config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set replay rate in records per second
    pub fn with_rate(mut self, rate: u32) -> Self {
        self.rate = rate;
        self
    }

    /// Enable loop replay
    pub fn with_loop(mut self) -> Self {
        self.loop_replay = true;
        self
    }

    /// Pin all records to one partition
    pub fn with_partition(mut self, partition: i32) -> Self {
        self.partition = Some(partition);
        self
    }

    /// Enable dry run
    pub fn with_dry_run(mut self) -> Self {
        self.dry_run = true;
        self
    }

    /// Only replay payloads containing `find`
    pub fn with_find(mut self, find: impl Into<Bytes>) -> Self {
        let find = find.into();
        self.find = (!find.is_empty()).then_some(find);
        self
    }

    /// Keep recorded timestamps on dispatched records
    pub fn with_preserve_timestamps(mut self) -> Self {
        self.preserve_timestamps = true;
        self
    }

    pub fn with_acks(mut self, acks: Acks) -> Self {
        self.acks = acks;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_batch_bytes(mut self, batch_bytes: usize) -> Self {
        self.batch_bytes = batch_bytes;
        self
    }

    /// Reject settings that cannot drive a session
    pub fn validate(&self) -> Result<()> {
        if self.rate > MAX_REPLAY_RATE {
            return Err(ConfigError::invalid_setting(
                "rate",
                format!("must be at most {} records per second", MAX_REPLAY_RATE),
            )
            .into());
        }
        if self.batch_size == 0 {
            return Err(ConfigError::invalid_setting("batch_size", "must be at least 1").into());
        }
        if self.batch_bytes == 0 {
            return Err(ConfigError::invalid_setting("batch_bytes", "must be at least 1").into());
        }
        Ok(())
    }

    fn tick_period(&self) -> Option<Duration> {
        (self.rate > 0).then(|| Duration::from_secs(1) / self.rate)
    }
}

/// Lifecycle of a replay session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplayState {
    #[default]
    Idle,
    Running,
    /// Rewound to the first record for another cycle
    Looping,
    Completed,
    Cancelled,
    Failed,
}

/// Statistics about a replay session
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReplayerStats {
    /// Records that passed the filter and were queued for dispatch
    pub records_replayed: u64,
    /// Records handed to the sink in accepted batches
    pub records_dispatched: u64,
    /// Records rejected by the find filter
    pub records_skipped: u64,
    /// Accepted batches
    pub batches_dispatched: u64,
    /// Payload bytes replayed
    pub bytes_replayed: u64,
    /// Completed passes over the container
    pub cycles: u64,
    /// Replay start time (ms since epoch)
    pub start_time: i64,
    /// Session duration in milliseconds
    pub duration_ms: i64,
    /// Final (or current) state
    pub state: ReplayState,
}

/// Result of a replay session
#[derive(Debug)]
pub struct ReplayOutcome {
    pub stats: ReplayerStats,
    pub error: Option<ReplayError>,
}

impl ReplayOutcome {
    /// Whether the session ended through its cancellation token
    pub fn is_cancelled(&self) -> bool {
        self.error.as_ref().is_some_and(ReplayError::is_cancelled)
    }

    /// Convert into a `Result`, treating cancellation as an error
    pub fn into_result(self) -> Result<ReplayerStats> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(self.stats),
        }
    }
}

#[derive(Default)]
struct Batch {
    records: Vec<DispatchRecord>,
    bytes: usize,
}

impl Batch {
    fn push(&mut self, record: DispatchRecord) {
        self.bytes += record.payload.len();
        self.records.push(record);
    }

    fn is_full(&self, config: &ReplayConfig) -> bool {
        self.records.len() >= config.batch_size || self.bytes >= config.batch_bytes
    }

    fn clear(&mut self) {
        self.records.clear();
        self.bytes = 0;
    }
}

enum LoopExit {
    Completed,
    Cancelled,
    Failed(ReplayError),
}

/// Drives a container decoder into a batch sink
pub struct ReplaySession {
    config: ReplayConfig,
    cancel: CancellationToken,
    state: ReplayState,
}

impl ReplaySession {
    /// Create a new replay session
    pub fn new(config: ReplayConfig) -> Self {
        Self {
            config,
            cancel: CancellationToken::new(),
            state: ReplayState::Idle,
        }
    }

    /// Use an externally owned cancellation token
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Token that cancels this session when triggered
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Current lifecycle state
    pub fn state(&self) -> ReplayState {
        self.state
    }

    pub fn config(&self) -> &ReplayConfig {
        &self.config
    }

    /// Replay every record of `decoder` into `sink`
    ///
    /// Both the decoder and the sink are closed before this returns, on every
    /// exit path.
    pub async fn run<R, K>(&mut self, mut decoder: Decoder<R>, mut sink: K) -> ReplayOutcome
    where
        R: Read + Seek + Send,
        K: BatchSink,
    {
        let started = Instant::now();
        let mut stats = ReplayerStats {
            start_time: chrono::Utc::now().timestamp_millis(),
            state: ReplayState::Running,
            ..Default::default()
        };
        self.state = ReplayState::Running;

        info!(
            version = %decoder.version(),
            rate = self.config.rate,
            loop_replay = self.config.loop_replay,
            partition = ?self.config.partition,
            dry_run = self.config.dry_run,
            find = self.config.find.is_some(),
            acks = %self.config.acks,
            "Starting replay session"
        );

        let exit = match self.config.validate() {
            Ok(()) => self.replay_loop(&mut decoder, &mut sink, &mut stats).await,
            Err(e) => LoopExit::Failed(e),
        };

        let exit = match sink.close().await {
            Err(e) if matches!(exit, LoopExit::Completed) => LoopExit::Failed(e),
            Err(e) => {
                warn!(error = %e, "Failed to close replay sink");
                exit
            }
            Ok(()) => exit,
        };
        let exit = match decoder.close() {
            Err(e) if matches!(exit, LoopExit::Completed) => LoopExit::Failed(e),
            Err(e) => {
                warn!(error = %e, "Failed to close container decoder");
                exit
            }
            Ok(()) => exit,
        };

        let error = match exit {
            LoopExit::Completed => {
                stats.state = ReplayState::Completed;
                None
            }
            LoopExit::Cancelled => {
                stats.state = ReplayState::Cancelled;
                Some(ReplayError::Cancelled)
            }
            LoopExit::Failed(e) => {
                error!(error = %e, "Replay session failed");
                stats.state = ReplayState::Failed;
                Some(e)
            }
        };
        self.state = stats.state;
        stats.duration_ms = started.elapsed().as_millis() as i64;

        info!(
            records = stats.records_replayed,
            dispatched = stats.records_dispatched,
            batches = stats.batches_dispatched,
            cycles = stats.cycles,
            duration_ms = stats.duration_ms,
            state = ?stats.state,
            "Replay session finished"
        );

        ReplayOutcome { stats, error }
    }

    async fn replay_loop<R, K>(
        &mut self,
        decoder: &mut Decoder<R>,
        sink: &mut K,
        stats: &mut ReplayerStats,
    ) -> LoopExit
    where
        R: Read + Seek + Send,
        K: BatchSink,
    {
        let mut ticker = self.config.tick_period().map(|period| {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker
        });
        if let Some(ticker) = ticker.as_mut() {
            // the first tick completes immediately
            ticker.tick().await;
        }

        let mut batch = Batch::default();
        let mut replayed_this_cycle = 0u64;

        loop {
            if self.cancel.is_cancelled() {
                self.flush_best_effort(&mut batch, sink, stats).await;
                return LoopExit::Cancelled;
            }

            let entry = match decoder.read() {
                Ok(Some(entry)) => entry,
                Ok(None) => {
                    if let Err(e) = self.flush(&mut batch, sink, stats).await {
                        return LoopExit::Failed(e);
                    }
                    stats.cycles += 1;
                    if !self.config.loop_replay {
                        return LoopExit::Completed;
                    }
                    if replayed_this_cycle == 0 {
                        warn!(
                            cycle = stats.cycles,
                            "Pass replayed no records; not looping"
                        );
                        return LoopExit::Completed;
                    }
                    if let Err(e) = decoder.reset() {
                        return LoopExit::Failed(e);
                    }
                    self.state = ReplayState::Looping;
                    replayed_this_cycle = 0;
                    debug!(cycle = stats.cycles, "Restarting replay from first record");
                    tokio::task::yield_now().await;
                    continue;
                }
                Err(e) => {
                    self.flush_best_effort(&mut batch, sink, stats).await;
                    return LoopExit::Failed(e);
                }
            };

            if let Some(needle) = self.config.find.as_deref() {
                if !contains_bytes(&entry.payload, needle) {
                    stats.records_skipped += 1;
                    continue;
                }
            }

            if let Some(ticker) = ticker.as_mut() {
                if !self.wait_tick(ticker).await {
                    self.flush_best_effort(&mut batch, sink, stats).await;
                    return LoopExit::Cancelled;
                }
            }

            stats.bytes_replayed += entry.payload.len() as u64;
            batch.push(self.dispatch_record(entry));
            stats.records_replayed += 1;
            replayed_this_cycle += 1;
            self.state = ReplayState::Running;

            if batch.is_full(&self.config) {
                if let Err(e) = self.flush(&mut batch, sink, stats).await {
                    return LoopExit::Failed(e);
                }
            }
        }
    }

    /// Wait for the next pacing tick; `false` if cancelled first
    async fn wait_tick(&self, ticker: &mut Interval) -> bool {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => false,
            _ = ticker.tick() => true,
        }
    }

    fn dispatch_record(&self, entry: Entry) -> DispatchRecord {
        let timestamp_ms = if self.config.preserve_timestamps {
            entry.timestamp.saturating_mul(1000)
        } else {
            chrono::Utc::now().timestamp_millis()
        };
        DispatchRecord {
            timestamp_ms,
            key: entry.key,
            payload: entry.payload,
            partition: self.config.partition,
        }
    }

    async fn flush<K: BatchSink>(
        &self,
        batch: &mut Batch,
        sink: &mut K,
        stats: &mut ReplayerStats,
    ) -> Result<()> {
        if batch.records.is_empty() {
            return Ok(());
        }
        if self.config.dry_run {
            debug!(records = batch.records.len(), "Dry run, discarding batch");
            batch.clear();
            return Ok(());
        }

        sink.dispatch_batch(&batch.records, self.config.acks).await?;
        stats.batches_dispatched += 1;
        stats.records_dispatched += batch.records.len() as u64;
        debug!(
            records = batch.records.len(),
            bytes = batch.bytes,
            "Dispatched batch"
        );
        batch.clear();
        Ok(())
    }

    async fn flush_best_effort<K: BatchSink>(
        &self,
        batch: &mut Batch,
        sink: &mut K,
        stats: &mut ReplayerStats,
    ) {
        if let Err(e) = self.flush(batch, sink, stats).await {
            warn!(error = %e, "Failed to flush pending batch");
        }
    }
}
