//! # Sieve Node Runtime Library
//!
//! Wires the processors into one running node. The `sieve-node` binary in
//! `main.rs` is a thin shell over [`NodeRuntime`]; everything else is
//! exposed for the scenario tests.
//!
//! ## Modules
//!
//! - `config` - Environment and CLI configuration
//! - `topology` - Topic creation
//! - `storage` - Table storage backends (memory, RocksDB)
//! - `commands` - Operator commands and the [`Emitter`]
//! - `console` - Stdin command console
//! - `load` - Synthetic message generator
//! - `sink` - Filtered output logger
//! - `runtime` - Startup and shutdown sequencing

pub mod commands;
pub mod config;
pub mod console;
pub mod load;
pub mod runtime;
pub mod sink;
pub mod storage;
pub mod topology;

pub use commands::{Command, CommandError, Emission, Emitter};
pub use config::{ConfigError, NodeConfig, StorageBackend};
pub use runtime::{NodeRuntime, StartupError, WorkerFailure};
