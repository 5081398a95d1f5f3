//! Default constants for kafka-replay configuration
//!
//! These constants define the default values used when no explicit value is
//! provided in a config file or builder.

/// Maximum records accumulated before a replay batch is dispatched
pub const DEFAULT_BATCH_SIZE: usize = 10_000;

/// Maximum payload bytes accumulated before a replay batch is dispatched (50 MB)
pub const DEFAULT_BATCH_BYTES: usize = 50 * 1024 * 1024;

/// Default replay rate in records per second (0 = unbounded)
pub const DEFAULT_REPLAY_RATE: u32 = 0;

/// Highest replay rate with a non-zero pacing period (one record per nanosecond)
pub const MAX_REPLAY_RATE: u32 = 1_000_000_000;

/// Default record limit (0 = unlimited)
pub const DEFAULT_RECORD_LIMIT: u64 = 0;

/// Default record-session duration limit in seconds (0 = unlimited)
pub const DEFAULT_MAX_DURATION_SECS: u64 = 0;

/// Default log level for the command-line tool
pub const DEFAULT_LOG_LEVEL: &str = "info";
