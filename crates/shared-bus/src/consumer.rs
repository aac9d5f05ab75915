//! # Partition Consumer
//!
//! Reads one partition of one topic, in offset order. A consumer bound to a
//! group resumes from the group's committed offset; an anonymous consumer
//! (used to materialize table views) always starts at the beginning.

use crate::log::{EventLog, LogError, Record};
use crate::shutdown::Shutdown;
use crate::FETCH_BATCH_SIZE;
use std::collections::VecDeque;
use std::future::Future;
use std::sync::Arc;
use tracing::debug;

/// Sequential reader over a single topic partition.
pub struct PartitionConsumer {
    log: Arc<dyn EventLog>,
    group: Option<String>,
    topic: String,
    partition: u32,
    position: u64,
    buffer: VecDeque<Record>,
}

impl PartitionConsumer {
    /// Consumer for `group`, resuming after its last committed record.
    pub async fn for_group(
        log: Arc<dyn EventLog>,
        group: &str,
        topic: &str,
        partition: u32,
    ) -> Result<Self, LogError> {
        let position = log.committed(group, topic, partition).await?.unwrap_or(0);
        debug!(group, topic, partition, position, "Consumer resuming");
        Ok(Self {
            log,
            group: Some(group.to_string()),
            topic: topic.to_string(),
            partition,
            position,
            buffer: VecDeque::new(),
        })
    }

    /// Consumer with no group that reads the partition from offset zero.
    #[must_use]
    pub fn from_beginning(log: Arc<dyn EventLog>, topic: &str, partition: u32) -> Self {
        Self {
            log,
            group: None,
            topic: topic.to_string(),
            partition,
            position: 0,
            buffer: VecDeque::new(),
        }
    }

    #[must_use]
    pub fn topic(&self) -> &str {
        &self.topic
    }

    #[must_use]
    pub fn partition(&self) -> u32 {
        self.partition
    }

    /// Offset of the next record `next` returns.
    #[must_use]
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Next record, waiting for one to be appended if needed.
    ///
    /// Cancel safe: dropping the future before it resolves loses nothing.
    pub async fn next(&mut self) -> Result<Record, LogError> {
        loop {
            if let Some(record) = self.buffer.pop_front() {
                self.position = record.offset + 1;
                return Ok(record);
            }
            let batch = self
                .log
                .fetch(&self.topic, self.partition, self.position, FETCH_BATCH_SIZE)
                .await?;
            self.buffer.extend(batch);
        }
    }

    /// Acknowledge `record` and everything before it. A no-op without a group.
    pub async fn commit(&self, record: &Record) -> Result<(), LogError> {
        match &self.group {
            Some(group) => {
                self.log
                    .commit(group, &self.topic, self.partition, record.offset + 1)
                    .await
            }
            None => Ok(()),
        }
    }
}

/// Drive a consumer until shutdown: handle each record, then commit it.
///
/// The shutdown signal is only observed between records. A handler error
/// stops the loop without committing, so the record is redelivered to the
/// next consumer of the group.
pub async fn run_partition<F, Fut, E>(
    mut consumer: PartitionConsumer,
    mut shutdown: Shutdown,
    mut handle: F,
) -> Result<(), E>
where
    F: FnMut(Record) -> Fut,
    Fut: Future<Output = Result<(), E>>,
    E: From<LogError>,
{
    loop {
        let record = tokio::select! {
            biased;
            () = shutdown.wait() => {
                debug!(
                    topic = consumer.topic(),
                    partition = consumer.partition(),
                    "Consumer stopping"
                );
                return Ok(());
            }
            record = consumer.next() => record?,
        };

        let committed = record.clone();
        handle(record).await?;
        consumer.commit(&committed).await?;
    }
}
