//! Live batch sink abstraction for the replay session

use crate::error::Result;
use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::trace;

/// Acknowledgment strength requested from the sink
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Acks {
    /// Wait for the partition leader to acknowledge each batch
    #[default]
    Leader,
    /// Fire and forget; records may be lost if the broker fails
    None,
}

impl fmt::Display for Acks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Acks::Leader => write!(f, "leader"),
            Acks::None => write!(f, "none"),
        }
    }
}

/// A record ready to be handed to the sink
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchRecord {
    /// Record timestamp (milliseconds since epoch)
    pub timestamp_ms: i64,

    /// Optional record key
    pub key: Option<Bytes>,

    /// Record payload
    pub payload: Bytes,

    /// Pinned partition; `None` lets the sink assign one
    pub partition: Option<i32>,
}

/// Accepts ordered batches of records
///
/// A batch is either accepted as a whole (`Ok`) or the call fails; the replay
/// session never retries or rolls back a batch.
#[async_trait]
pub trait BatchSink: Send {
    /// Deliver one batch, in order
    async fn dispatch_batch(&mut self, batch: &[DispatchRecord], acks: Acks) -> Result<()>;

    /// Release the sink
    async fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

#[async_trait]
impl<K: BatchSink + ?Sized> BatchSink for Box<K> {
    async fn dispatch_batch(&mut self, batch: &[DispatchRecord], acks: Acks) -> Result<()> {
        (**self).dispatch_batch(batch, acks).await
    }

    async fn close(&mut self) -> Result<()> {
        (**self).close().await
    }
}

/// Sink that accepts and drops every batch, counting what it saw
#[derive(Debug, Default)]
pub struct DiscardSink {
    records: u64,
    batches: u64,
}

impl DiscardSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> u64 {
        self.records
    }

    pub fn batches(&self) -> u64 {
        self.batches
    }
}

#[async_trait]
impl BatchSink for DiscardSink {
    async fn dispatch_batch(&mut self, batch: &[DispatchRecord], _acks: Acks) -> Result<()> {
        self.records += batch.len() as u64;
        self.batches += 1;
        trace!(records = batch.len(), "Discarded batch");
        Ok(())
    }
}
