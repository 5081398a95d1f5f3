//! Record session: live source into a container

use crate::config::{DEFAULT_MAX_DURATION_SECS, DEFAULT_RECORD_LIMIT};
use crate::error::{ReplayError, Result, SourceError};
use crate::replay::source::{RecordSource, SourcePoll};
use crate::transcoder::{contains_bytes, Encoder};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Configuration for a record session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordConfig {
    /// Absolute start position applied to the source before recording
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<i64>,

    /// Maximum records to write (0 = unlimited)
    pub limit: u64,

    /// Only record payloads containing this byte sequence
    #[serde(
        with = "crate::config::find_filter",
        skip_serializing_if = "Option::is_none"
    )]
    pub find: Option<Bytes>,

    /// Stop recording after this many seconds (0 = unlimited)
    pub max_duration_secs: u64,
}

impl RecordConfig {
    /// Create a config with defaults: unlimited, unfiltered, current position
    pub fn new() -> Self {
        Self {
            offset: None,
            limit: DEFAULT_RECORD_LIMIT,
            find: None,
            max_duration_secs: DEFAULT_MAX_DURATION_SECS,
        }
    }

    /// Start from an absolute source position
    pub fn with_offset(mut self, offset: i64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Stop after `limit` matching records
    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = limit;
        self
    }

    /// Only record payloads containing `find`
    pub fn with_find(mut self, find: impl Into<Bytes>) -> Self {
        let find = find.into();
        self.find = (!find.is_empty()).then_some(find);
        self
    }

    /// Set maximum duration
    pub fn with_max_duration(mut self, secs: u64) -> Self {
        self.max_duration_secs = secs;
        self
    }

    fn max_duration(&self) -> Option<Duration> {
        (self.max_duration_secs > 0).then(|| Duration::from_secs(self.max_duration_secs))
    }
}

/// Lifecycle of a record session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordState {
    #[default]
    Idle,
    Running,
    /// Stopped normally (limit reached or duration elapsed)
    Stopped,
    Cancelled,
    Failed,
}

/// Why a record session stopped normally
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    LimitReached,
    DurationElapsed,
}

/// Statistics about a record session
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecorderStats {
    /// Records written to the container
    pub records_written: u64,
    /// Records rejected by the find filter
    pub records_skipped: u64,
    /// Polls that found no data available
    pub idle_polls: u64,
    /// Container bytes written, header included
    pub bytes_written: u64,
    /// Session start time (ms since epoch)
    pub start_time: i64,
    /// Session duration in milliseconds
    pub duration_ms: i64,
    /// Final (or current) state
    pub state: RecordState,
    /// Set when the session stopped normally
    pub stop_reason: Option<StopReason>,
}

/// Result of a record session
///
/// Progress counters are always reported, including on failure or
/// cancellation.
#[derive(Debug)]
pub struct RecordOutcome {
    pub stats: RecorderStats,
    pub error: Option<ReplayError>,
}

impl RecordOutcome {
    /// Whether the session ended through its cancellation token
    pub fn is_cancelled(&self) -> bool {
        self.error.as_ref().is_some_and(ReplayError::is_cancelled)
    }

    /// Convert into a `Result`, treating cancellation as an error
    pub fn into_result(self) -> Result<RecorderStats> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(self.stats),
        }
    }
}

enum LoopExit {
    Stopped(StopReason),
    Cancelled,
    Failed(ReplayError),
}

/// Drives a live source into a container encoder
pub struct RecordSession {
    config: RecordConfig,
    cancel: CancellationToken,
    state: RecordState,
}

impl RecordSession {
    /// Create a new record session
    pub fn new(config: RecordConfig) -> Self {
        Self {
            config,
            cancel: CancellationToken::new(),
            state: RecordState::Idle,
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
    pub fn state(&self) -> RecordState {
        self.state
    }

    pub fn config(&self) -> &RecordConfig {
        &self.config
    }

    /// Record from `source` into a new container written to `output`
    ///
    /// Both the source and the container are closed before this returns, on
    /// every exit path.
    pub async fn run<S, W>(&mut self, mut source: S, output: W) -> RecordOutcome
    where
        S: RecordSource,
        W: Write + Send,
    {
        let started = Instant::now();
        let mut stats = RecorderStats {
            start_time: chrono::Utc::now().timestamp_millis(),
            state: RecordState::Running,
            ..Default::default()
        };
        self.state = RecordState::Running;

        info!(
            offset = ?self.config.offset,
            limit = self.config.limit,
            find = self.config.find.is_some(),
            max_duration_secs = self.config.max_duration_secs,
            "Starting record session"
        );

        let exit = match Encoder::new(output) {
            Ok(mut encoder) => {
                let exit = self.record_loop(&mut source, &mut encoder, &mut stats).await;
                stats.bytes_written = encoder.total_bytes();
                match encoder.close() {
                    Err(e) if matches!(exit, LoopExit::Stopped(_)) => LoopExit::Failed(e),
                    Err(e) => {
                        warn!(error = %e, "Failed to close container");
                        exit
                    }
                    Ok(()) => exit,
                }
            }
            Err(e) => LoopExit::Failed(e),
        };

        let exit = match source.close().await {
            Err(e) if matches!(exit, LoopExit::Stopped(_)) => LoopExit::Failed(e),
            Err(e) => {
                warn!(error = %e, "Failed to close record source");
                exit
            }
            Ok(()) => exit,
        };

        let error = match exit {
            LoopExit::Stopped(reason) => {
                stats.state = RecordState::Stopped;
                stats.stop_reason = Some(reason);
                None
            }
            LoopExit::Cancelled => {
                stats.state = RecordState::Cancelled;
                Some(ReplayError::Cancelled)
            }
            LoopExit::Failed(e) => {
                error!(error = %e, "Record session failed");
                stats.state = RecordState::Failed;
                Some(e)
            }
        };
        self.state = stats.state;
        stats.duration_ms = started.elapsed().as_millis() as i64;

        info!(
            records = stats.records_written,
            skipped = stats.records_skipped,
            bytes = stats.bytes_written,
            duration_ms = stats.duration_ms,
            state = ?stats.state,
            "Record session finished"
        );

        RecordOutcome { stats, error }
    }

    async fn record_loop<S, W>(
        &self,
        source: &mut S,
        encoder: &mut Encoder<W>,
        stats: &mut RecorderStats,
    ) -> LoopExit
    where
        S: RecordSource,
        W: Write + Send,
    {
        if let Some(offset) = self.config.offset {
            match source.seek(offset).await {
                Ok(()) => debug!(offset = offset, "Positioned source"),
                Err(ReplayError::Source(SourceError::SeekUnsupported(reason))) => {
                    warn!(offset = offset, reason = %reason, "Source does not support seeking; using its own position");
                }
                Err(e) => {
                    warn!(offset = offset, error = %e, "Failed to position source; using its own position");
                }
            }
        }

        let deadline = self.config.max_duration().map(|d| Instant::now() + d);
        let timer = tokio::time::sleep_until(deadline.unwrap_or_else(Instant::now));
        tokio::pin!(timer);

        let find = self.config.find.as_deref();
        let limit = self.config.limit;

        loop {
            if limit > 0 && stats.records_written >= limit {
                return LoopExit::Stopped(StopReason::LimitReached);
            }
            if self.cancel.is_cancelled() {
                return LoopExit::Cancelled;
            }

            let poll = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return LoopExit::Cancelled,
                _ = &mut timer, if deadline.is_some() => {
                    info!("Recording max duration reached");
                    return LoopExit::Stopped(StopReason::DurationElapsed);
                }
                poll = source.read_next() => poll,
            };

            let record = match poll {
                Ok(SourcePoll::Record(record)) => record,
                Ok(SourcePoll::NoDataYet) => {
                    stats.idle_polls += 1;
                    tokio::task::yield_now().await;
                    continue;
                }
                Err(e) => return LoopExit::Failed(e),
            };

            if let Some(needle) = find {
                if !contains_bytes(&record.payload, needle) {
                    stats.records_skipped += 1;
                    continue;
                }
            }

            if let Err(e) = encoder.write(
                record.timestamp_secs(),
                &record.payload,
                record.key.as_deref(),
            ) {
                return LoopExit::Failed(e);
            }
            stats.records_written += 1;
            stats.bytes_written = encoder.total_bytes();
        }
    }
}
