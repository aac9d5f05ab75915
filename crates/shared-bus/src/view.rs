//! # Table Views (reader side)
//!
//! A reader never touches the owner's storage. It materializes its own copy
//! of a group table by consuming the table's changelog from the beginning,
//! one task per partition. Reads are synchronous and see whatever the view
//! has applied so far, which may lag the owner.

use crate::consumer::PartitionConsumer;
use crate::log::{EventLog, LogError};
use crate::shutdown::Shutdown;
use crate::table::changelog_topic;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use sv_01_event_codec::Codec;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Read-only access to a table by key.
pub trait TableReader<S>: Send + Sync {
    /// Latest known value of `key`, if any.
    fn get(&self, key: &str) -> Option<S>;
}

impl<S: Clone + Send + Sync> TableReader<S> for HashMap<String, S> {
    fn get(&self, key: &str) -> Option<S> {
        HashMap::get(self, key).cloned()
    }
}

struct ViewState<S> {
    entries: RwLock<HashMap<String, S>>,
    /// Next changelog offset to apply, per partition.
    applied: Vec<AtomicU64>,
    /// Set once a partition's follower has exited.
    halted: Vec<AtomicBool>,
    progress: Notify,
}

/// Locally materialized copy of a group table.
pub struct TableView<S> {
    table: String,
    changelog: String,
    log: Arc<dyn EventLog>,
    state: Arc<ViewState<S>>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl<S: Send + Sync + 'static> TableView<S> {
    /// Start materializing the table owned by `group`. The changelog topic
    /// must already exist.
    pub async fn open(
        group: &str,
        log: Arc<dyn EventLog>,
        codec: Arc<dyn Codec<S>>,
        shutdown: Shutdown,
    ) -> Result<Self, LogError> {
        let changelog = changelog_topic(group);
        let partitions = log.partition_count(&changelog).await?;

        let state = Arc::new(ViewState {
            entries: RwLock::new(HashMap::new()),
            applied: (0..partitions).map(|_| AtomicU64::new(0)).collect(),
            halted: (0..partitions).map(|_| AtomicBool::new(false)).collect(),
            progress: Notify::new(),
        });

        let tasks = (0..partitions)
            .map(|partition| {
                let consumer =
                    PartitionConsumer::from_beginning(log.clone(), &changelog, partition);
                tokio::spawn(follow_partition(
                    group.to_string(),
                    consumer,
                    codec.clone(),
                    state.clone(),
                    shutdown.clone(),
                ))
            })
            .collect();

        debug!(table = group, partitions, "Table view opened");
        Ok(Self {
            table: group.to_string(),
            changelog,
            log,
            state,
            tasks: Mutex::new(tasks),
        })
    }

    /// Wait until the view has applied every changelog record that existed
    /// when this call was made. Fails if a partition's follower stopped
    /// short of that point.
    pub async fn catch_up(&self) -> Result<(), LogError> {
        let lanes = self.state.applied.iter().zip(&self.state.halted);
        for (partition, (applied, halted)) in lanes.enumerate() {
            let end = self.log.end_offset(&self.changelog, partition as u32).await?;
            loop {
                let notified = self.state.progress.notified();
                tokio::pin!(notified);
                notified.as_mut().enable();
                let reached = applied.load(Ordering::Acquire);
                if reached >= end {
                    break;
                }
                if halted.load(Ordering::Acquire) {
                    return Err(LogError::Unavailable(format!(
                        "view of {} partition {partition} stopped at offset {reached}, needed {end}",
                        self.table
                    )));
                }
                notified.await;
            }
        }
        debug!(table = %self.table, keys = self.len(), "Table view caught up");
        Ok(())
    }

    /// Wait for the follower tasks to exit after shutdown.
    pub async fn stopped(&self) {
        let tasks = std::mem::take(&mut *self.tasks.lock());
        for task in tasks {
            if let Err(e) = task.await {
                warn!(table = %self.table, error = %e, "Table view task failed");
            }
        }
    }

    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Number of keys currently materialized.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.entries.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<S: Clone + Send + Sync> TableReader<S> for TableView<S> {
    fn get(&self, key: &str) -> Option<S> {
        self.state.entries.read().get(key).cloned()
    }
}

async fn follow_partition<S>(
    table: String,
    mut consumer: PartitionConsumer,
    codec: Arc<dyn Codec<S>>,
    state: Arc<ViewState<S>>,
    mut shutdown: Shutdown,
) {
    let partition = consumer.partition() as usize;
    loop {
        let record = tokio::select! {
            biased;
            () = shutdown.wait() => break,
            record = consumer.next() => record,
        };

        let record = match record {
            Ok(record) => record,
            Err(e) => {
                warn!(table = %table, partition, error = %e, "Changelog read failed, view stops");
                break;
            }
        };

        match codec.decode(&record.value) {
            Ok(value) => {
                state.entries.write().insert(record.key, value);
            }
            Err(e) => {
                warn!(table = %table, key = %record.key, error = %e, "Skipping undecodable changelog value");
            }
        }

        if let Some(applied) = state.applied.get(partition) {
            applied.store(record.offset + 1, Ordering::Release);
        }
        state.progress.notify_waiters();
    }

    if let Some(halted) = state.halted.get(partition) {
        halted.store(true, Ordering::Release);
    }
    state.progress.notify_waiters();
}
