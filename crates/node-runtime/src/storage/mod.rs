//! # Table Storage Backends
//!
//! Selects the [`TableStorage`] adapter the table owners write through.

#[cfg(feature = "rocksdb")]
pub mod rocksdb_adapter;

#[cfg(feature = "rocksdb")]
pub use rocksdb_adapter::{RocksDbConfig, RocksDbTableStorage};

use crate::config::{ConfigError, StorageBackend, StorageConfig};
use shared_bus::{InMemoryTableStorage, TableError, TableStorage};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to open table storage: {0}")]
    Open(#[from] TableError),
}

/// Open the configured backend.
pub fn open_storage(config: &StorageConfig) -> Result<Arc<dyn TableStorage>, StorageError> {
    match config.backend {
        StorageBackend::Memory => Ok(Arc::new(InMemoryTableStorage::new())),
        #[cfg(feature = "rocksdb")]
        StorageBackend::RocksDb => {
            let rocks = RocksDbConfig {
                path: config.data_dir.join("tables"),
                sync_writes: config.sync_writes,
                ..RocksDbConfig::default()
            };
            Ok(Arc::new(RocksDbTableStorage::open(rocks)?))
        }
        #[cfg(not(feature = "rocksdb"))]
        StorageBackend::RocksDb => Err(ConfigError::RocksDbUnavailable.into()),
    }
}
