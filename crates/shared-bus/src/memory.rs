//! # In-Memory Log
//!
//! Single-process adapter for the [`EventLog`] port. Topics are vectors of
//! records per partition; fetchers park on a [`Notify`] until the partition
//! grows. Suitable for single-node operation and tests; a deployment
//! against a real broker plugs in another adapter.

use crate::log::{EventLog, LogError, Record, RecordPosition};
use crate::partitioner::{Murmur3Partitioner, Partitioner};
use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Notify;
use tracing::debug;

#[derive(Default)]
struct PartitionLog {
    records: RwLock<Vec<Record>>,
    appended: Notify,
}

struct TopicLog {
    partitions: Vec<PartitionLog>,
}

impl TopicLog {
    fn partition(&self, topic: &str, partition: u32) -> Result<&PartitionLog, LogError> {
        self.partitions
            .get(partition as usize)
            .ok_or_else(|| LogError::UnknownPartition {
                topic: topic.to_string(),
                partition,
            })
    }
}

/// In-memory implementation of the partitioned log.
pub struct InMemoryLog {
    /// Topics by name.
    topics: RwLock<HashMap<String, Arc<TopicLog>>>,

    /// Committed offsets keyed by (group, topic, partition).
    offsets: Mutex<HashMap<(String, String, u32), u64>>,

    /// Key to partition mapping shared by every producer.
    partitioner: Murmur3Partitioner,
}

impl InMemoryLog {
    /// Create an empty log using the murmur3 partitioner.
    #[must_use]
    pub fn new() -> Self {
        Self {
            topics: RwLock::new(HashMap::new()),
            offsets: Mutex::new(HashMap::new()),
            partitioner: Murmur3Partitioner,
        }
    }

    /// Every record of a topic, partition by partition. Test and debugging aid.
    pub fn snapshot(&self, topic: &str) -> Result<Vec<Record>, LogError> {
        let topic_log = self.topic(topic)?;
        Ok(topic_log
            .partitions
            .iter()
            .flat_map(|p| p.records.read().clone())
            .collect())
    }

    fn topic(&self, topic: &str) -> Result<Arc<TopicLog>, LogError> {
        self.topics
            .read()
            .get(topic)
            .cloned()
            .ok_or_else(|| LogError::UnknownTopic(topic.to_string()))
    }
}

impl Default for InMemoryLog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventLog for InMemoryLog {
    async fn create_topic(&self, topic: &str, partitions: u32) -> Result<(), LogError> {
        if partitions == 0 {
            return Err(LogError::NoPartitions(topic.to_string()));
        }

        let mut topics = self.topics.write();
        if let Some(existing) = topics.get(topic) {
            let existing = existing.partitions.len() as u32;
            if existing != partitions {
                return Err(LogError::PartitionCountMismatch {
                    topic: topic.to_string(),
                    existing,
                    requested: partitions,
                });
            }
            return Ok(());
        }

        let log = TopicLog {
            partitions: (0..partitions).map(|_| PartitionLog::default()).collect(),
        };
        topics.insert(topic.to_string(), Arc::new(log));
        debug!(topic, partitions, "Topic created");
        Ok(())
    }

    async fn partition_count(&self, topic: &str) -> Result<u32, LogError> {
        Ok(self.topic(topic)?.partitions.len() as u32)
    }

    async fn append(
        &self,
        topic: &str,
        key: &str,
        value: Vec<u8>,
    ) -> Result<RecordPosition, LogError> {
        let topic_log = self.topic(topic)?;
        let partition = self
            .partitioner
            .partition(key, topic_log.partitions.len() as u32);
        let lane = topic_log.partition(topic, partition)?;

        let offset = {
            let mut records = lane.records.write();
            let offset = records.len() as u64;
            records.push(Record {
                topic: topic.to_string(),
                partition,
                offset,
                key: key.to_string(),
                value,
            });
            offset
        };
        lane.appended.notify_waiters();

        Ok(RecordPosition { partition, offset })
    }

    async fn fetch(
        &self,
        topic: &str,
        partition: u32,
        offset: u64,
        max: usize,
    ) -> Result<Vec<Record>, LogError> {
        let topic_log = self.topic(topic)?;
        let lane = topic_log.partition(topic, partition)?;

        loop {
            // Register interest before checking so an append in between
            // still wakes us.
            let notified = lane.appended.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            {
                let records = lane.records.read();
                let start = offset as usize;
                if start < records.len() {
                    let end = records.len().min(start + max.max(1));
                    return Ok(records[start..end].to_vec());
                }
            }

            notified.await;
        }
    }

    async fn end_offset(&self, topic: &str, partition: u32) -> Result<u64, LogError> {
        let topic_log = self.topic(topic)?;
        let lane = topic_log.partition(topic, partition)?;
        let end = lane.records.read().len() as u64;
        Ok(end)
    }

    async fn committed(
        &self,
        group: &str,
        topic: &str,
        partition: u32,
    ) -> Result<Option<u64>, LogError> {
        let key = (group.to_string(), topic.to_string(), partition);
        Ok(self.offsets.lock().get(&key).copied())
    }

    async fn commit(
        &self,
        group: &str,
        topic: &str,
        partition: u32,
        offset: u64,
    ) -> Result<(), LogError> {
        self.topic(topic)?.partition(topic, partition)?;
        let key = (group.to_string(), topic.to_string(), partition);
        let mut offsets = self.offsets.lock();
        let entry = offsets.entry(key).or_insert(0);
        // Commits never move backwards
        *entry = (*entry).max(offset);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_create_topic_idempotent() {
        let log = InMemoryLog::new();
        log.create_topic("t", 4).await.unwrap();
        log.create_topic("t", 4).await.unwrap();
        assert_eq!(log.partition_count("t").await.unwrap(), 4);

        let err = log.create_topic("t", 2).await.unwrap_err();
        assert!(matches!(err, LogError::PartitionCountMismatch { .. }));
        assert!(matches!(
            log.create_topic("z", 0).await,
            Err(LogError::NoPartitions(_))
        ));
    }

    #[tokio::test]
    async fn test_same_key_same_partition_in_order() {
        let log = InMemoryLog::new();
        log.create_topic("t", 4).await.unwrap();

        let a = log.append("t", "7", b"a".to_vec()).await.unwrap();
        let b = log.append("t", "7", b"b".to_vec()).await.unwrap();
        assert_eq!(a.partition, b.partition);
        assert_eq!(b.offset, a.offset + 1);

        let records = log.fetch("t", a.partition, 0, 10).await.unwrap();
        let values: Vec<_> = records.iter().map(|r| r.value.clone()).collect();
        assert_eq!(values, vec![b"a".to_vec(), b"b".to_vec()]);
    }

    #[tokio::test]
    async fn test_unknown_topic() {
        let log = InMemoryLog::new();
        let err = log.append("missing", "k", vec![]).await.unwrap_err();
        assert_eq!(err, LogError::UnknownTopic("missing".into()));
    }

    #[tokio::test]
    async fn test_fetch_waits_for_append() {
        let log = Arc::new(InMemoryLog::new());
        log.create_topic("t", 1).await.unwrap();

        let reader = log.clone();
        let pending = tokio::spawn(async move { reader.fetch("t", 0, 0, 10).await });

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!pending.is_finished());

        log.append("t", "k", b"v".to_vec()).await.unwrap();
        let records = tokio::time::timeout(Duration::from_secs(1), pending)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].key, "k");
    }

    #[tokio::test]
    async fn test_commit_monotonic() {
        let log = InMemoryLog::new();
        log.create_topic("t", 1).await.unwrap();
        assert_eq!(log.committed("g", "t", 0).await.unwrap(), None);

        log.commit("g", "t", 0, 5).await.unwrap();
        log.commit("g", "t", 0, 3).await.unwrap();
        assert_eq!(log.committed("g", "t", 0).await.unwrap(), Some(5));
        assert_eq!(log.committed("other", "t", 0).await.unwrap(), None);
    }
}
