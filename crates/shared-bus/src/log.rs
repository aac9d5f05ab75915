//! # Event Log Port
//!
//! The interface Sieve requires from its broker: partitioned append-only
//! topics with per-key ordering, and committed offsets per consumer group.

use async_trait::async_trait;
use thiserror::Error;

/// Errors from log operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LogError {
    /// The topic was never created.
    #[error("Unknown topic: {0}")]
    UnknownTopic(String),

    /// The partition index is out of range for the topic.
    #[error("Unknown partition {partition} of topic {topic}")]
    UnknownPartition { topic: String, partition: u32 },

    /// The topic already exists with a different partition count.
    #[error("Topic {topic} exists with {existing} partitions, requested {requested}")]
    PartitionCountMismatch {
        topic: String,
        existing: u32,
        requested: u32,
    },

    /// The topic was requested with zero partitions.
    #[error("Topic {0} needs at least one partition")]
    NoPartitions(String),

    /// The broker could not be reached.
    #[error("Broker unavailable: {0}")]
    Unavailable(String),
}

/// One keyed record read from a topic partition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub topic: String,
    pub partition: u32,
    pub offset: u64,
    pub key: String,
    pub value: Vec<u8>,
}

/// Where an appended record landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordPosition {
    pub partition: u32,
    pub offset: u64,
}

/// Partitioned, append-only, keyed record log.
#[async_trait]
pub trait EventLog: Send + Sync {
    /// Create a topic. Creating an existing topic with the same partition
    /// count is a no-op.
    async fn create_topic(&self, topic: &str, partitions: u32) -> Result<(), LogError>;

    /// Number of partitions of a topic.
    async fn partition_count(&self, topic: &str) -> Result<u32, LogError>;

    /// Append a record. The partition is chosen from the key, so records
    /// sharing a key are totally ordered.
    async fn append(
        &self,
        topic: &str,
        key: &str,
        value: Vec<u8>,
    ) -> Result<RecordPosition, LogError>;

    /// Read up to `max` records starting at `offset`, waiting until at least
    /// one is available.
    async fn fetch(
        &self,
        topic: &str,
        partition: u32,
        offset: u64,
        max: usize,
    ) -> Result<Vec<Record>, LogError>;

    /// Offset the next appended record of the partition will get.
    async fn end_offset(&self, topic: &str, partition: u32) -> Result<u64, LogError>;

    /// Next offset `group` should consume, if it ever committed one.
    async fn committed(
        &self,
        group: &str,
        topic: &str,
        partition: u32,
    ) -> Result<Option<u64>, LogError>;

    /// Record that `group` has fully handled everything before `offset`.
    async fn commit(
        &self,
        group: &str,
        topic: &str,
        partition: u32,
        offset: u64,
    ) -> Result<(), LogError>;
}
