//! Live record source abstraction for the record session

use crate::error::{Result, SourceError};
use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// A keyed, timestamped record as delivered by a live source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRecord {
    /// Record timestamp (milliseconds since epoch)
    pub timestamp_ms: i64,

    /// Optional record key
    pub key: Option<Bytes>,

    /// Record payload
    pub payload: Bytes,
}

impl SourceRecord {
    /// Create a new source record
    pub fn new(timestamp_ms: i64, key: Option<Bytes>, payload: impl Into<Bytes>) -> Self {
        Self {
            timestamp_ms,
            key,
            payload: payload.into(),
        }
    }

    /// Timestamp truncated to whole seconds, rounding toward negative infinity
    pub fn timestamp_secs(&self) -> i64 {
        self.timestamp_ms.div_euclid(1000)
    }
}

/// Result of one poll against a live source
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourcePoll {
    /// A record is available
    Record(SourceRecord),
    /// Nothing is available right now; the stream may still produce more
    NoDataYet,
}

/// A live, possibly idle, stream of records
///
/// `read_next` may wait for data; callers race it against their own
/// cancellation signal, so implementations must be cancel-safe (dropping the
/// future must not lose a record that was already handed out).
#[async_trait]
pub trait RecordSource: Send {
    /// Wait for the next available record
    async fn read_next(&mut self) -> Result<SourcePoll>;

    /// Move to an absolute position before reading
    ///
    /// Sources that manage their own position (consumer groups, for example)
    /// keep the default, which reports [`SourceError::SeekUnsupported`].
    async fn seek(&mut self, offset: i64) -> Result<()> {
        Err(SourceError::SeekUnsupported(format!(
            "source manages its own position; cannot seek to offset {}",
            offset
        ))
        .into())
    }

    /// Release the source
    async fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

#[async_trait]
impl<S: RecordSource + ?Sized> RecordSource for Box<S> {
    async fn read_next(&mut self) -> Result<SourcePoll> {
        (**self).read_next().await
    }

    async fn seek(&mut self, offset: i64) -> Result<()> {
        (**self).seek(offset).await
    }

    async fn close(&mut self) -> Result<()> {
        (**self).close().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReplayError;

    struct NoSeekSource;

    #[async_trait]
    impl RecordSource for NoSeekSource {
        async fn read_next(&mut self) -> Result<SourcePoll> {
            Ok(SourcePoll::NoDataYet)
        }
    }

    #[test]
    fn test_timestamp_secs_truncates() {
        let record = SourceRecord::new(1706872530_999, None, "x");
        assert_eq!(record.timestamp_secs(), 1706872530);

        let record = SourceRecord::new(-1, None, "x");
        assert_eq!(record.timestamp_secs(), -1);
    }

    #[tokio::test]
    async fn test_default_seek_is_unsupported() {
        let mut source = NoSeekSource;
        let err = source.seek(10).await.unwrap_err();
        assert!(matches!(
            err,
            ReplayError::Source(SourceError::SeekUnsupported(_))
        ));
        assert!(source.close().await.is_ok());
    }

    #[tokio::test]
    async fn test_boxed_source_delegates() {
        let mut source: Box<dyn RecordSource> = Box::new(NoSeekSource);
        assert_eq!(source.read_next().await.unwrap(), SourcePoll::NoDataYet);
    }
}
