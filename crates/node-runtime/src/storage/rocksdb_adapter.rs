//! # RocksDB Table Storage
//!
//! Durable [`TableStorage`] for the table owners. Each table lives in its
//! own column family, so the relationship and deny-word tables share one
//! database without key collisions. The changelog stays the source of
//! truth; when the table outlives its changelog, recovery republishes the
//! stored values through [`TableStorage::entries`].

use rocksdb::{ColumnFamilyDescriptor, IteratorMode, Options, WriteOptions, DB};
use shared_bus::{TableError, TableStorage};
use shared_types::topics::{DENY_WORD_GROUP, RELATIONSHIP_GROUP};
use std::path::PathBuf;

/// Column families, one per group table.
pub const COLUMN_FAMILIES: &[&str] = &[RELATIONSHIP_GROUP, DENY_WORD_GROUP];

#[derive(Debug, Clone)]
pub struct RocksDbConfig {
    /// Database directory.
    pub path: PathBuf,
    /// Block cache size in bytes (default: 64MB)
    pub block_cache_size: usize,
    /// Write buffer size in bytes (default: 16MB)
    pub write_buffer_size: usize,
    /// fsync after each write
    pub sync_writes: bool,
}

impl Default for RocksDbConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./data/tables"),
            block_cache_size: 64 * 1024 * 1024,
            write_buffer_size: 16 * 1024 * 1024,
            sync_writes: true,
        }
    }
}

impl RocksDbConfig {
    /// Small buffers, no fsync.
    pub fn for_testing(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            block_cache_size: 4 * 1024 * 1024,
            write_buffer_size: 2 * 1024 * 1024,
            sync_writes: false,
        }
    }
}

pub struct RocksDbTableStorage {
    db: DB,
    config: RocksDbConfig,
}

impl RocksDbTableStorage {
    /// Open or create the database with every table's column family.
    pub fn open(config: RocksDbConfig) -> Result<Self, TableError> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);
        opts.set_write_buffer_size(config.write_buffer_size);
        opts.set_compression_type(rocksdb::DBCompressionType::Snappy);

        let mut block_opts = rocksdb::BlockBasedOptions::default();
        block_opts.set_bloom_filter(10.0, false);
        block_opts.set_block_cache(&rocksdb::Cache::new_lru_cache(config.block_cache_size));
        opts.set_block_based_table_factory(&block_opts);

        let cf_descriptors: Vec<ColumnFamilyDescriptor> = COLUMN_FAMILIES
            .iter()
            .map(|name| {
                let mut cf_opts = Options::default();
                cf_opts.set_compression_type(rocksdb::DBCompressionType::Snappy);
                ColumnFamilyDescriptor::new(*name, cf_opts)
            })
            .collect();

        let db = DB::open_cf_descriptors(&opts, &config.path, cf_descriptors).map_err(|e| {
            TableError::Persistence {
                table: "*".to_string(),
                key: config.path.display().to_string(),
                reason: format!("Failed to open RocksDB: {e}"),
            }
        })?;

        Ok(Self { db, config })
    }

    fn failure(table: &str, key: &str, reason: String) -> TableError {
        TableError::Persistence {
            table: table.to_string(),
            key: key.to_string(),
            reason,
        }
    }
}

impl TableStorage for RocksDbTableStorage {
    fn get(&self, table: &str, key: &str) -> Result<Option<Vec<u8>>, TableError> {
        let cf = self
            .db
            .cf_handle(table)
            .ok_or_else(|| Self::failure(table, key, "unknown column family".into()))?;
        self.db
            .get_cf(cf, key.as_bytes())
            .map_err(|e| Self::failure(table, key, format!("RocksDB get failed: {e}")))
    }

    fn put(&self, table: &str, key: &str, value: &[u8]) -> Result<(), TableError> {
        let cf = self
            .db
            .cf_handle(table)
            .ok_or_else(|| Self::failure(table, key, "unknown column family".into()))?;
        let mut write_opts = WriteOptions::default();
        write_opts.set_sync(self.config.sync_writes);
        self.db
            .put_cf_opt(cf, key.as_bytes(), value, &write_opts)
            .map_err(|e| Self::failure(table, key, format!("RocksDB put failed: {e}")))
    }

    fn entries(&self, table: &str) -> Result<Vec<(String, Vec<u8>)>, TableError> {
        let cf = self
            .db
            .cf_handle(table)
            .ok_or_else(|| Self::failure(table, "*", "unknown column family".into()))?;
        self.db
            .iterator_cf(cf, IteratorMode::Start)
            .map(|item| -> Result<(String, Vec<u8>), TableError> {
                let (key, value) = item.map_err(|e| {
                    Self::failure(table, "*", format!("RocksDB iteration failed: {e}"))
                })?;
                let key = String::from_utf8(key.into_vec()).map_err(|e| {
                    Self::failure(table, "*", format!("Non UTF-8 key: {e}"))
                })?;
                Ok((key, value.into_vec()))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_tables_isolated() {
        let dir = TempDir::new().unwrap();
        let storage = RocksDbTableStorage::open(RocksDbConfig::for_testing(dir.path())).unwrap();

        storage.put(RELATIONSHIP_GROUP, "1", b"a").unwrap();
        storage.put(DENY_WORD_GROUP, "1", b"b").unwrap();
        assert_eq!(storage.get(RELATIONSHIP_GROUP, "1").unwrap(), Some(b"a".to_vec()));
        assert_eq!(storage.get(DENY_WORD_GROUP, "1").unwrap(), Some(b"b".to_vec()));
        assert_eq!(storage.get(DENY_WORD_GROUP, "2").unwrap(), None);
    }

    #[test]
    fn test_values_survive_reopen() {
        let dir = TempDir::new().unwrap();
        {
            let storage =
                RocksDbTableStorage::open(RocksDbConfig::for_testing(dir.path())).unwrap();
            storage.put(DENY_WORD_GROUP, "bad", br#"{"denied":true}"#).unwrap();
        }
        let storage = RocksDbTableStorage::open(RocksDbConfig::for_testing(dir.path())).unwrap();
        assert_eq!(
            storage.get(DENY_WORD_GROUP, "bad").unwrap(),
            Some(br#"{"denied":true}"#.to_vec())
        );
    }

    #[test]
    fn test_entries_lists_one_table() {
        let dir = TempDir::new().unwrap();
        let storage = RocksDbTableStorage::open(RocksDbConfig::for_testing(dir.path())).unwrap();
        storage.put(RELATIONSHIP_GROUP, "1", b"a").unwrap();
        storage.put(RELATIONSHIP_GROUP, "2", b"b").unwrap();
        storage.put(DENY_WORD_GROUP, "bad", b"c").unwrap();

        let mut entries = storage.entries(RELATIONSHIP_GROUP).unwrap();
        entries.sort();
        assert_eq!(
            entries,
            vec![("1".to_string(), b"a".to_vec()), ("2".to_string(), b"b".to_vec())]
        );
    }

    #[test]
    fn test_unknown_table_rejected() {
        let dir = TempDir::new().unwrap();
        let storage = RocksDbTableStorage::open(RocksDbConfig::for_testing(dir.path())).unwrap();
        assert!(matches!(
            storage.put("nope", "k", b"v"),
            Err(TableError::Persistence { .. })
        ));
    }
}
