//! # Node Runtime
//!
//! ## Startup Sequence
//!
//! 1. Create every topic with the configured partition count
//! 2. Register the message schema, bind the schema-tagged codec
//! 3. Open table storage
//! 4. Restore each table owner from its changelog, then start it
//! 5. Materialize both table views and wait for them to catch up
//! 6. Start the rekey stage and the filter
//! 7. Start the output sink and, if enabled, the load generator
//!
//! Any failure before step 7 completes is fatal.
//!
//! ## Shutdown
//!
//! One [`ShutdownTrigger`] fans out to every worker. Workers stop between
//! records; [`NodeRuntime::shutdown`] waits for all of them and reports the
//! ones that failed.

use crate::commands::Emitter;
use crate::config::NodeConfig;
use crate::load::LoadGenerator;
use crate::sink::run_sink;
use crate::storage::{open_storage, StorageError};
use crate::topology::create_topics;
use shared_bus::{
    shutdown_channel, EventLog, GroupError, GroupMetrics, LogError, Shutdown, ShutdownTrigger,
    StatefulHandler, TableGroup, TableReader, TableView,
};
use shared_types::topics::{DENY_WORD_GROUP, RELATIONSHIP_GROUP};
use shared_types::{
    CensorState, Message, ProcessorId, RelationshipState, MESSAGE_SCHEMA, MESSAGE_SCHEMA_SUBJECT,
};
use std::sync::Arc;
use sv_01_event_codec::{Codec, JsonCodec, RegistryError, SchemaRegistry, SchemaTaggedCodec};
use sv_02_relationship_table::relationship_group;
use sv_03_deny_word_table::deny_word_group;
use sv_04_message_filter::{FilterMetricsSnapshot, MessageFilter, Repartitioner};
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// Fatal startup errors.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Topic setup failed: {0}")]
    Topology(#[source] LogError),

    #[error("Schema registration failed: {0}")]
    Schema(#[from] RegistryError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Restoring table {table} failed: {source}")]
    Restore {
        table: &'static str,
        #[source]
        source: GroupError,
    },

    #[error("Table view for {table} failed: {source}")]
    View {
        table: &'static str,
        #[source]
        source: LogError,
    },

    #[error("Runtime already started")]
    AlreadyStarted,
}

/// A worker that exited with an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerFailure {
    pub worker: &'static str,
    pub reason: String,
}

type Worker = (&'static str, JoinHandle<Result<(), String>>);

/// Everything [`NodeRuntime::start`] brought up.
struct Running {
    emitter: Emitter,
    filter: Arc<MessageFilter>,
    rekey: Arc<Repartitioner>,
    relationship_metrics: Arc<GroupMetrics>,
    deny_word_metrics: Arc<GroupMetrics>,
    relationships: Arc<TableView<RelationshipState>>,
    censor: Arc<TableView<CensorState>>,
    workers: Vec<Worker>,
}

/// The Sieve node: every processor wired over one log.
pub struct NodeRuntime {
    config: NodeConfig,
    log: Arc<dyn EventLog>,
    registry: Arc<dyn SchemaRegistry>,
    trigger: ShutdownTrigger,
    shutdown: Shutdown,
    running: Option<Running>,
}

impl NodeRuntime {
    pub fn new(
        config: NodeConfig,
        log: Arc<dyn EventLog>,
        registry: Arc<dyn SchemaRegistry>,
    ) -> Self {
        let (trigger, shutdown) = shutdown_channel();
        Self {
            config,
            log,
            registry,
            trigger,
            shutdown,
            running: None,
        }
    }

    pub async fn start(&mut self) -> Result<(), StartupError> {
        if self.running.is_some() {
            return Err(StartupError::AlreadyStarted);
        }
        info!("===========================================");
        info!("  Sieve Node Runtime v{}", env!("CARGO_PKG_VERSION"));
        info!("===========================================");
        info!(
            brokers = %self.config.bootstrap_servers.join(","),
            registry = %self.config.schema_registry_url,
            storage = %self.config.storage.backend,
            "Configuration loaded"
        );

        // Step 1: topics
        create_topics(self.log.as_ref(), self.config.partitions)
            .await
            .map_err(StartupError::Topology)?;

        // Step 2: schema
        let codec = SchemaTaggedCodec::<Message>::register(
            self.registry.as_ref(),
            MESSAGE_SCHEMA_SUBJECT,
            MESSAGE_SCHEMA,
        )
        .await?;
        let messages: Arc<dyn Codec<Message>> = Arc::new(codec);

        // Step 3: storage
        let storage = open_storage(&self.config.storage)?;

        // Step 4: table owners
        let mut workers = Vec::new();
        let owner = relationship_group(self.log.clone(), storage.clone());
        let relationship_metrics = self
            .start_table_owner(RELATIONSHIP_GROUP, owner, &mut workers)
            .await?;
        let owner = deny_word_group(self.log.clone(), storage);
        let deny_word_metrics = self
            .start_table_owner(DENY_WORD_GROUP, owner, &mut workers)
            .await?;

        // Step 5: views
        let relationships =
            Arc::new(self.open_view::<RelationshipState>(RELATIONSHIP_GROUP).await?);
        let censor = Arc::new(self.open_view::<CensorState>(DENY_WORD_GROUP).await?);

        // Step 6: rekey + filter
        let rekey = Arc::new(Repartitioner::new(self.log.clone(), messages.clone()));
        let shutdown = self.shutdown.clone();
        let worker = rekey.clone();
        workers.push((
            ProcessorId::Rekey.name(),
            tokio::spawn(async move { worker.run(shutdown).await.map_err(|e| e.to_string()) }),
        ));

        let filter = Arc::new(MessageFilter::new(
            self.log.clone(),
            relationships.clone(),
            censor.clone(),
            messages.clone(),
        ));
        let shutdown = self.shutdown.clone();
        let worker = filter.clone();
        workers.push((
            ProcessorId::MessageFilter.name(),
            tokio::spawn(async move { worker.run(shutdown).await.map_err(|e| e.to_string()) }),
        ));

        // Step 7: sink + load
        let log = self.log.clone();
        let shutdown = self.shutdown.clone();
        workers.push((
            "filtered-sink",
            tokio::spawn(async move { run_sink(log, shutdown).await.map_err(|e| e.to_string()) }),
        ));

        let emitter = Emitter::new(self.log.clone(), messages);
        if self.config.load.enabled {
            let generator = LoadGenerator::new(emitter.clone(), self.config.load.interval);
            let shutdown = self.shutdown.clone();
            workers.push((
                "load-generator",
                tokio::spawn(async move {
                    generator.run(shutdown).await;
                    Ok(())
                }),
            ));
        }

        info!(workers = workers.len(), "All processors running");
        self.running = Some(Running {
            emitter,
            filter,
            rekey,
            relationship_metrics,
            deny_word_metrics,
            relationships,
            censor,
            workers,
        });
        Ok(())
    }

    /// Restore a table owner before anything reads its changelog, then
    /// spawn it.
    async fn start_table_owner<H: StatefulHandler>(
        &self,
        table: &'static str,
        group: TableGroup<H>,
        workers: &mut Vec<Worker>,
    ) -> Result<Arc<GroupMetrics>, StartupError> {
        let recovery = group
            .restore()
            .await
            .map_err(|source| StartupError::Restore { table, source })?;
        info!(
            table,
            replayed = recovery.replayed,
            republished = recovery.republished,
            "Table owner restored"
        );

        let group = Arc::new(group);
        let metrics = group.metrics();
        let shutdown = self.shutdown.clone();
        workers.push((
            group.processor().name(),
            tokio::spawn(async move { group.run(shutdown).await.map_err(|e| e.to_string()) }),
        ));
        Ok(metrics)
    }

    async fn open_view<S>(&self, table: &'static str) -> Result<TableView<S>, StartupError>
    where
        S: serde::Serialize + serde::de::DeserializeOwned + Send + Sync + 'static,
    {
        let view = TableView::open(
            table,
            self.log.clone(),
            Arc::new(JsonCodec::<S>::new()),
            self.shutdown.clone(),
        )
        .await
        .map_err(|source| StartupError::View { table, source })?;
        view.catch_up()
            .await
            .map_err(|source| StartupError::View { table, source })?;
        info!(table, keys = view.len(), "Table view ready");
        Ok(view)
    }

    /// Publisher for operator commands and messages. `None` before start.
    #[must_use]
    pub fn emitter(&self) -> Option<Emitter> {
        self.running.as_ref().map(|r| r.emitter.clone())
    }

    #[must_use]
    pub fn shutdown_signal(&self) -> Shutdown {
        self.shutdown.clone()
    }

    #[must_use]
    pub fn filter_metrics(&self) -> Option<FilterMetricsSnapshot> {
        self.running.as_ref().map(|r| r.filter.metrics())
    }

    /// Records the rekey stage copied and dropped.
    #[must_use]
    pub fn rekey_counts(&self) -> Option<(u64, u64)> {
        self.running.as_ref().map(|r| r.rekey.counts())
    }

    /// The filter's view of the relationship table.
    #[must_use]
    pub fn relationships(&self) -> Option<Arc<dyn TableReader<RelationshipState>>> {
        self.running
            .as_ref()
            .map(|r| r.relationships.clone() as Arc<dyn TableReader<RelationshipState>>)
    }

    /// The filter's view of the deny-word table.
    #[must_use]
    pub fn deny_words(&self) -> Option<Arc<dyn TableReader<CensorState>>> {
        self.running
            .as_ref()
            .map(|r| r.censor.clone() as Arc<dyn TableReader<CensorState>>)
    }

    /// Applied transitions of the relationship and deny-word tables.
    #[must_use]
    pub fn applied_transitions(&self) -> Option<(u64, u64)> {
        self.running.as_ref().map(|r| {
            (
                r.relationship_metrics.snapshot().applied,
                r.deny_word_metrics.snapshot().applied,
            )
        })
    }

    /// Stop every worker after its current record and wait for all of them.
    pub async fn shutdown(mut self) -> Vec<WorkerFailure> {
        info!("Initiating graceful shutdown...");
        self.trigger.trigger();

        let Some(running) = self.running.take() else {
            return Vec::new();
        };

        let mut failures = Vec::new();
        for (worker, handle) in running.workers {
            let reason = match handle.await {
                Ok(Ok(())) => continue,
                Ok(Err(reason)) => reason,
                Err(e) => e.to_string(),
            };
            error!(worker, %reason, "Worker failed");
            failures.push(WorkerFailure { worker, reason });
        }
        running.relationships.stopped().await;
        running.censor.stopped().await;

        let filter = running.filter.metrics();
        let (rekeyed, rekey_dropped) = running.rekey.counts();
        info!(
            rekeyed,
            rekey_dropped,
            received = filter.received,
            forwarded = filter.forwarded,
            blocked = filter.blocked,
            malformed = filter.malformed,
            "Pipeline totals"
        );
        info!(failed = failures.len(), "Shutdown complete");
        failures
    }
}
