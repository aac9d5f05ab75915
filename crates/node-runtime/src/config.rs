//! # Node Configuration
//!
//! Defaults, overridden by environment variables, overridden by CLI flags.
//!
//! | Variable | Default |
//! |----------|---------|
//! | `KAFKA_BOOTSTRAP_SERVERS` | `127.0.0.1:9094,127.0.0.1:9095,127.0.0.1:9096` |
//! | `SCHEMA_REGISTRY_URL` | `http://schema-registry:8081` |
//! | `SIEVE_PARTITIONS` | `4` |
//! | `SIEVE_EMIT_INTERVAL_MS` | `3000` |
//! | `SIEVE_STORAGE` | `memory` |
//! | `SIEVE_DATA_DIR` | `./data` |
//! | `SIEVE_LOG_LEVEL` | `info` |
//! | `SIEVE_JSON_LOGS` | `false` |

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_BOOTSTRAP_SERVERS: &str = "127.0.0.1:9094,127.0.0.1:9095,127.0.0.1:9096";
pub const DEFAULT_SCHEMA_REGISTRY_URL: &str = "http://schema-registry:8081";
pub const DEFAULT_EMIT_INTERVAL_MS: u64 = 3000;

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A variable or flag holds a value that does not parse.
    #[error("Invalid value {value:?} for {name}: {reason}")]
    Invalid {
        name: String,
        value: String,
        reason: String,
    },

    /// RocksDB storage was requested but the binary was built without it.
    #[error("Storage backend 'rocksdb' requires building with the `rocksdb` feature")]
    RocksDbUnavailable,
}

/// Where table owners keep their local state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageBackend {
    #[default]
    Memory,
    RocksDb,
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "rocksdb" => Ok(Self::RocksDb),
            other => Err(format!("unknown storage backend '{other}' (memory|rocksdb)")),
        }
    }
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Memory => f.write_str("memory"),
            Self::RocksDb => f.write_str("rocksdb"),
        }
    }
}

/// Complete node configuration.
#[derive(Debug, Clone)]
pub struct NodeConfig {
    /// Broker addresses, handed to an external log adapter.
    pub bootstrap_servers: Vec<String>,
    /// Schema registry endpoint, handed to an external registry adapter.
    pub schema_registry_url: String,
    /// Partition count of every topic.
    pub partitions: u32,
    /// Synthetic load generator settings.
    pub load: LoadConfig,
    /// Table storage settings.
    pub storage: StorageConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone)]
pub struct LoadConfig {
    pub enabled: bool,
    pub interval: Duration,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval: Duration::from_millis(DEFAULT_EMIT_INTERVAL_MS),
        }
    }
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Root directory for on-disk backends.
    pub data_dir: PathBuf,
    /// fsync every table write (RocksDB only).
    pub sync_writes: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Memory,
            data_dir: PathBuf::from("./data"),
            sync_writes: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset.
    pub level: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            bootstrap_servers: split_list(DEFAULT_BOOTSTRAP_SERVERS),
            schema_registry_url: DEFAULT_SCHEMA_REGISTRY_URL.to_string(),
            partitions: shared_bus::DEFAULT_PARTITION_COUNT,
            load: LoadConfig::default(),
            storage: StorageConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl NodeConfig {
    /// Defaults overridden by the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each variable.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(servers) = lookup("KAFKA_BOOTSTRAP_SERVERS") {
            config.bootstrap_servers = split_list(&servers);
        }
        if let Some(url) = lookup("SCHEMA_REGISTRY_URL") {
            config.schema_registry_url = url;
        }
        if let Some(value) = lookup("SIEVE_PARTITIONS") {
            config.partitions = parse("SIEVE_PARTITIONS", &value)?;
        }
        if let Some(value) = lookup("SIEVE_EMIT_INTERVAL_MS") {
            let ms: u64 = parse("SIEVE_EMIT_INTERVAL_MS", &value)?;
            config.load.interval = Duration::from_millis(ms);
        }
        if let Some(value) = lookup("SIEVE_STORAGE") {
            config.storage.backend = parse("SIEVE_STORAGE", &value)?;
        }
        if let Some(dir) = lookup("SIEVE_DATA_DIR") {
            config.storage.data_dir = PathBuf::from(dir);
        }
        if let Some(level) = lookup("SIEVE_LOG_LEVEL") {
            config.logging.level = level;
        }
        if let Some(value) = lookup("SIEVE_JSON_LOGS") {
            config.logging.json = parse_flag("SIEVE_JSON_LOGS", &value)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Check values no parser can reject on its own.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.partitions == 0 {
            return Err(invalid("partitions", "0", "must be at least 1"));
        }
        if self.load.interval.is_zero() {
            return Err(invalid("emit interval", "0", "must be positive"));
        }
        if self.storage.backend == StorageBackend::RocksDb && !cfg!(feature = "rocksdb") {
            return Err(ConfigError::RocksDbUnavailable);
        }
        Ok(())
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

fn parse<T>(name: &str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e: T::Err| invalid(name, value, &e.to_string()))
}

fn parse_flag(name: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(invalid(name, value, "expected true or false")),
    }
}

fn invalid(name: &str, value: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        name: name.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}
