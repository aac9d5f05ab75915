//! # Changelog-Backed Tables (owner side)
//!
//! A group table is a key/value map owned by exactly one consumer group.
//! Every update is appended to the group's changelog topic first and then
//! written to local storage, so storage can always be rebuilt by replaying
//! the changelog.
//!
//! Durable storage can outlive the changelog (a fresh broker, a truncated
//! topic). Recovery then republishes every stored key the changelog does not
//! mention, so readers materializing the changelog see the same table as
//! the owner.

use crate::log::{EventLog, LogError};
use crate::CHANGELOG_SUFFIX;
use parking_lot::RwLock;
use shared_types::CodecError;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use sv_01_event_codec::Codec;
use thiserror::Error;
use tracing::{debug, info};

/// Changelog topic of a group table.
#[must_use]
pub fn changelog_topic(group: &str) -> String {
    format!("{group}{CHANGELOG_SUFFIX}")
}

/// Table errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TableError {
    /// The changelog append or storage write did not happen.
    #[error("Persistence failed for {table}/{key}: {reason}")]
    Persistence {
        table: String,
        key: String,
        reason: String,
    },

    /// A stored or replayed value could not be decoded.
    #[error("Corrupt value in {table}/{key}: {source}")]
    Corrupt {
        table: String,
        key: String,
        #[source]
        source: CodecError,
    },

    #[error("Log error: {0}")]
    Log(#[from] LogError),
}

/// Local key/value storage behind a group table.
pub trait TableStorage: Send + Sync {
    /// Raw value of `key` in `table`.
    fn get(&self, table: &str, key: &str) -> Result<Option<Vec<u8>>, TableError>;

    /// Overwrite the value of `key` in `table`.
    fn put(&self, table: &str, key: &str, value: &[u8]) -> Result<(), TableError>;

    /// Every key of `table` with its raw value.
    fn entries(&self, table: &str) -> Result<Vec<(String, Vec<u8>)>, TableError>;
}

/// Hash map storage. Lost on restart and rebuilt from the changelog.
#[derive(Default)]
pub struct InMemoryTableStorage {
    tables: RwLock<HashMap<String, HashMap<String, Vec<u8>>>>,
}

impl InMemoryTableStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys held for `table`.
    #[must_use]
    pub fn len(&self, table: &str) -> usize {
        self.tables.read().get(table).map_or(0, HashMap::len)
    }

    #[must_use]
    pub fn is_empty(&self, table: &str) -> bool {
        self.len(table) == 0
    }
}

impl TableStorage for InMemoryTableStorage {
    fn get(&self, table: &str, key: &str) -> Result<Option<Vec<u8>>, TableError> {
        Ok(self
            .tables
            .read()
            .get(table)
            .and_then(|t| t.get(key))
            .cloned())
    }

    fn put(&self, table: &str, key: &str, value: &[u8]) -> Result<(), TableError> {
        self.tables
            .write()
            .entry(table.to_string())
            .or_default()
            .insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn entries(&self, table: &str) -> Result<Vec<(String, Vec<u8>)>, TableError> {
        Ok(self
            .tables
            .read()
            .get(table)
            .map(|t| t.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            .unwrap_or_default())
    }
}

/// What [`TableWriter::recover`] did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Recovery {
    /// Changelog records applied to storage.
    pub replayed: u64,
    /// Stored keys appended to a changelog that had lost them.
    pub republished: u64,
}

/// The single writer of a group table.
pub struct TableWriter<S> {
    group: String,
    changelog: String,
    log: Arc<dyn EventLog>,
    storage: Arc<dyn TableStorage>,
    codec: Arc<dyn Codec<S>>,
}

impl<S> TableWriter<S> {
    #[must_use]
    pub fn new(
        group: &str,
        log: Arc<dyn EventLog>,
        storage: Arc<dyn TableStorage>,
        codec: Arc<dyn Codec<S>>,
    ) -> Self {
        Self {
            group: group.to_string(),
            changelog: changelog_topic(group),
            log,
            storage,
            codec,
        }
    }

    #[must_use]
    pub fn changelog(&self) -> &str {
        &self.changelog
    }

    /// Current value of `key`, if one was ever persisted.
    pub fn get(&self, key: &str) -> Result<Option<S>, TableError> {
        match self.storage.get(&self.group, key)? {
            Some(bytes) => self
                .codec
                .decode(&bytes)
                .map(Some)
                .map_err(|source| self.corrupt(key, source)),
            None => Ok(None),
        }
    }

    /// Persist a new value for `key`: changelog append, then local storage.
    pub async fn persist(&self, key: &str, value: &S) -> Result<(), TableError> {
        let bytes = self
            .codec
            .encode(value)
            .map_err(|e| self.persistence(key, e.to_string()))?;

        self.log
            .append(&self.changelog, key, bytes.clone())
            .await
            .map_err(|e| self.persistence(key, e.to_string()))?;

        self.storage
            .put(&self.group, key, &bytes)
            .map_err(|e| self.persistence(key, e.to_string()))?;

        debug!(table = %self.group, key, "Table value persisted");
        Ok(())
    }

    /// Rebuild local storage from the changelog, then append every stored
    /// key the changelog lacks. Returns records replayed and republished.
    pub async fn recover(&self) -> Result<Recovery, TableError> {
        let partitions = self.log.partition_count(&self.changelog).await?;
        let mut seen = HashSet::new();
        let mut replayed = 0;

        for partition in 0..partitions {
            let end = self.log.end_offset(&self.changelog, partition).await?;
            let mut offset = 0;
            while offset < end {
                let batch = self
                    .log
                    .fetch(&self.changelog, partition, offset, crate::FETCH_BATCH_SIZE)
                    .await?;
                for record in batch {
                    offset = record.offset + 1;
                    self.storage.put(&self.group, &record.key, &record.value)?;
                    seen.insert(record.key);
                    replayed += 1;
                }
            }
        }

        let mut republished = 0;
        for (key, value) in self.storage.entries(&self.group)? {
            if seen.contains(&key) {
                continue;
            }
            self.log
                .append(&self.changelog, &key, value)
                .await
                .map_err(|e| self.persistence(&key, e.to_string()))?;
            republished += 1;
        }

        let recovery = Recovery {
            replayed,
            republished,
        };
        if replayed > 0 || republished > 0 {
            info!(
                table = %self.group,
                replayed,
                republished,
                "Table restored from changelog"
            );
        } else {
            debug!(table = %self.group, "Table empty, nothing to restore");
        }
        Ok(recovery)
    }

    fn persistence(&self, key: &str, reason: String) -> TableError {
        TableError::Persistence {
            table: self.group.clone(),
            key: key.to_string(),
            reason,
        }
    }

    fn corrupt(&self, key: &str, source: CodecError) -> TableError {
        TableError::Corrupt {
            table: self.group.clone(),
            key: key.to_string(),
            source,
        }
    }
}
