//! # Sieve Node
//!
//! Runs the whole pipeline in one process over the in-memory log:
//!
//! ```text
//! sieve-node [--partitions N] [--no-load] [--emit-interval-ms MS]
//!            [--storage memory|rocksdb] [--data-dir DIR]
//! ```
//!
//! Operator commands (`block`, `unblock`, `deny`, `permit`) are read from
//! stdin. Ctrl+C stops every processor between records.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use node_runtime::config::LoggingConfig;
use node_runtime::console::run_stdin;
use node_runtime::{NodeConfig, NodeRuntime, StorageBackend};
use shared_bus::InMemoryLog;
use sv_01_event_codec::InMemorySchemaRegistry;

#[derive(Debug, Parser)]
#[command(name = "sieve-node", version, about = "Key-partitioned message filtering pipeline")]
struct Args {
    /// Partitions per topic [env: SIEVE_PARTITIONS]
    #[arg(long)]
    partitions: Option<u32>,

    /// Disable the synthetic load generator
    #[arg(long)]
    no_load: bool,

    /// Load generator interval [env: SIEVE_EMIT_INTERVAL_MS]
    #[arg(long)]
    emit_interval_ms: Option<u64>,

    /// Table storage backend [env: SIEVE_STORAGE]
    #[arg(long)]
    storage: Option<StorageBackend>,

    /// Data directory for on-disk storage [env: SIEVE_DATA_DIR]
    #[arg(long)]
    data_dir: Option<PathBuf>,
}

impl Args {
    fn apply(self, config: &mut NodeConfig) {
        if let Some(partitions) = self.partitions {
            config.partitions = partitions;
        }
        if self.no_load {
            config.load.enabled = false;
        }
        if let Some(ms) = self.emit_interval_ms {
            config.load.interval = Duration::from_millis(ms);
        }
        if let Some(storage) = self.storage {
            config.storage.backend = storage;
        }
        if let Some(dir) = self.data_dir {
            config.storage.data_dir = dir;
        }
    }
}

fn init_logging(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);
    if logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = NodeConfig::from_env().context("Invalid environment configuration")?;
    args.apply(&mut config);
    config.validate().context("Invalid configuration")?;

    init_logging(&config.logging);

    let mut runtime = NodeRuntime::new(
        config,
        Arc::new(InMemoryLog::new()),
        Arc::new(InMemorySchemaRegistry::new()),
    );
    runtime.start().await.context("Startup failed")?;

    if let Some(emitter) = runtime.emitter() {
        tokio::spawn(run_stdin(emitter, runtime.shutdown_signal()));
    }

    info!("Node is running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl+C")?;

    let failures = runtime.shutdown().await;
    if !failures.is_empty() {
        bail!("{} worker(s) failed", failures.len());
    }
    Ok(())
}
