//! # Stateful Group Runner
//!
//! Drives a table-owning processor: one task per input partition, each
//! record decoded, checked, applied against the current table value and
//! persisted before its offset is committed.
//!
//! The processor itself only supplies a [`StatefulHandler`], a pure
//! transition function. Reading and persisting state belongs to the runner.

use crate::consumer::{run_partition, PartitionConsumer};
use crate::log::{EventLog, LogError, Record};
use crate::shutdown::Shutdown;
use crate::table::{Recovery, TableError, TableStorage, TableWriter};
use shared_types::ProcessorId;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use sv_01_event_codec::Codec;
use thiserror::Error;
use tokio::sync::OnceCell;
use tracing::{debug, error, info, warn};

/// Outcome of applying one event to the current table value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition<S> {
    /// The event changes nothing. No write, no diagnostic.
    Unchanged,
    /// New value to persist, with the diagnostic describing the change.
    Changed {
        state: S,
        action: &'static str,
        subject: String,
    },
}

/// Pure per-key transition logic of a table-owning processor.
pub trait StatefulHandler: Send + Sync + 'static {
    type Event: Send + Sync;
    type State: Clone + Send + Sync + 'static;

    fn processor(&self) -> ProcessorId;

    /// Checks made before any state read. `Err` carries the drop reason.
    fn admit(&self, key: &str, event: &Self::Event) -> Result<(), &'static str>;

    /// Compute the transition for `event` given the key's current value.
    fn apply(&self, current: Option<&Self::State>, event: &Self::Event)
        -> Transition<Self::State>;
}

/// What happened to one input record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Handled {
    /// The payload did not decode.
    Dropped(&'static str),
    /// The event decoded but was rejected before touching state.
    Ignored(&'static str),
    /// Applied, but the value did not change.
    Unchanged,
    /// A new value was persisted.
    Applied,
}

/// Group runner errors. Any of these halts the partition worker.
#[derive(Debug, Error)]
pub enum GroupError {
    #[error("Log error: {0}")]
    Log(#[from] LogError),

    #[error("Table error: {0}")]
    Table(#[from] TableError),

    #[error("Partition worker {partition} panicked: {reason}")]
    WorkerPanicked { partition: u32, reason: String },
}

/// Lock-free counters of a table-owning group.
#[derive(Debug, Default)]
pub struct GroupMetrics {
    applied: AtomicU64,
    unchanged: AtomicU64,
    ignored: AtomicU64,
    dropped: AtomicU64,
    persistence_failures: AtomicU64,
}

/// Point-in-time copy of [`GroupMetrics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GroupMetricsSnapshot {
    pub applied: u64,
    pub unchanged: u64,
    pub ignored: u64,
    pub dropped: u64,
    pub persistence_failures: u64,
}

impl GroupMetrics {
    #[must_use]
    pub fn snapshot(&self) -> GroupMetricsSnapshot {
        GroupMetricsSnapshot {
            applied: self.applied.load(Ordering::Relaxed),
            unchanged: self.unchanged.load(Ordering::Relaxed),
            ignored: self.ignored.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            persistence_failures: self.persistence_failures.load(Ordering::Relaxed),
        }
    }

    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// A consumer group that owns one changelog-backed table.
pub struct TableGroup<H: StatefulHandler> {
    handler: H,
    group: String,
    input: String,
    log: Arc<dyn EventLog>,
    events: Arc<dyn Codec<H::Event>>,
    writer: TableWriter<H::State>,
    restored: OnceCell<Recovery>,
    metrics: Arc<GroupMetrics>,
}

impl<H: StatefulHandler> TableGroup<H> {
    /// Group `group` consuming `input`, with its table in `storage`.
    pub fn new(
        handler: H,
        group: &str,
        input: &str,
        log: Arc<dyn EventLog>,
        storage: Arc<dyn TableStorage>,
        events: Arc<dyn Codec<H::Event>>,
        states: Arc<dyn Codec<H::State>>,
    ) -> Self {
        let writer = TableWriter::new(group, log.clone(), storage, states);
        Self {
            handler,
            group: group.to_string(),
            input: input.to_string(),
            log,
            events,
            writer,
            restored: OnceCell::new(),
            metrics: Arc::new(GroupMetrics::default()),
        }
    }

    #[must_use]
    pub fn group(&self) -> &str {
        &self.group
    }

    #[must_use]
    pub fn processor(&self) -> ProcessorId {
        self.handler.processor()
    }

    #[must_use]
    pub fn metrics(&self) -> Arc<GroupMetrics> {
        self.metrics.clone()
    }

    #[must_use]
    pub fn table(&self) -> &TableWriter<H::State> {
        &self.writer
    }

    /// Handle one input record. `Err` means the record must not be
    /// acknowledged.
    pub async fn handle(&self, record: &Record) -> Result<Handled, TableError> {
        let tag = self.handler.processor().tag();
        let key = record.key.as_str();

        let event = match self.events.decode(&record.value) {
            Ok(event) => event,
            Err(e) => {
                GroupMetrics::bump(&self.metrics.dropped);
                debug!(key, offset = record.offset, error = %e, "[{tag}] Dropping undecodable event");
                return Ok(Handled::Dropped(e.kind()));
            }
        };

        if let Err(reason) = self.handler.admit(key, &event) {
            GroupMetrics::bump(&self.metrics.ignored);
            if reason == KEY_MISMATCH {
                warn!(key, offset = record.offset, "[{tag}] Event does not belong to its record key");
            } else {
                debug!(key, reason, "[{tag}] Ignoring event");
            }
            return Ok(Handled::Ignored(reason));
        }

        let current = self.writer.get(key)?;
        match self.handler.apply(current.as_ref(), &event) {
            Transition::Unchanged => {
                GroupMetrics::bump(&self.metrics.unchanged);
                debug!(key, "[{tag}] No change");
                Ok(Handled::Unchanged)
            }
            Transition::Changed {
                state,
                action,
                subject,
            } => {
                if let Err(e) = self.writer.persist(key, &state).await {
                    GroupMetrics::bump(&self.metrics.persistence_failures);
                    error!(
                        processor = %self.handler.processor(),
                        key,
                        action,
                        error = %e,
                        "[{tag}] Persistence failed"
                    );
                    return Err(e);
                }
                GroupMetrics::bump(&self.metrics.applied);
                info!(key, "[{tag}] {key} {action} {subject}");
                Ok(Handled::Applied)
            }
        }
    }

    /// Create the changelog topic and restore the table from it. Runs
    /// once; later calls return the first recovery.
    pub async fn restore(&self) -> Result<Recovery, GroupError> {
        self.restored
            .get_or_try_init(|| async {
                let partitions = self.log.partition_count(&self.input).await?;
                self.log
                    .create_topic(self.writer.changelog(), partitions)
                    .await?;
                Ok::<_, GroupError>(self.writer.recover().await?)
            })
            .await
            .copied()
    }

    /// Restore the table, then consume every input partition until
    /// shutdown. Returns the first worker error, after all workers exit.
    pub async fn run(self: Arc<Self>, shutdown: Shutdown) -> Result<(), GroupError> {
        let tag = self.handler.processor().tag();
        self.restore().await?;
        let partitions = self.log.partition_count(&self.input).await?;

        let mut workers = Vec::with_capacity(partitions as usize);
        for partition in 0..partitions {
            let consumer =
                PartitionConsumer::for_group(self.log.clone(), &self.group, &self.input, partition)
                    .await?;
            let this = self.clone();
            workers.push((
                partition,
                tokio::spawn(run_partition(consumer, shutdown.clone(), move |record| {
                    let this = this.clone();
                    async move {
                        this.handle(&record).await?;
                        Ok::<(), GroupError>(())
                    }
                })),
            ));
        }
        info!(group = %self.group, input = %self.input, partitions, "[{tag}] Group running");

        let mut first_error = None;
        for (partition, worker) in workers {
            let outcome = match worker.await {
                Ok(result) => result,
                Err(e) => Err(GroupError::WorkerPanicked {
                    partition,
                    reason: e.to_string(),
                }),
            };
            if let Err(e) = outcome {
                error!(group = %self.group, partition, error = %e, "[{tag}] Partition worker halted");
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => {
                info!(group = %self.group, "[{tag}] Group stopped");
                Ok(())
            }
        }
    }
}

/// Reason handlers return from `admit` when the event's own key differs
/// from the record key.
pub const KEY_MISMATCH: &str = "key_mismatch";
