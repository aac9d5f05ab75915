//! # Shared Bus - Partitioned Log Substrate
//!
//! The messaging substrate every Sieve processor is built on.
//!
//! ## Architecture Rules
//!
//! - All inter-processor communication goes through keyed log topics ONLY
//! - **Direct calls between processors are FORBIDDEN**
//! - A table has exactly one writer (its owning group); readers see it
//!   through a locally materialized view of its changelog topic
//!
//! ## Table Pattern
//!
//! ```text
//! ┌──────────────┐  append   ┌──────────────────┐  replay   ┌──────────────┐
//! │ Owner group  │ ────────→ │ <group>-table    │ ────────→ │ TableView    │
//! │ TableWriter  │           │ (changelog topic)│           │ (reader side)│
//! └──────────────┘           └──────────────────┘           └──────────────┘
//!        │                                                          ↑
//!        └── local TableStorage (restored from changelog)     sync get()
//! ```
//!
//! ## Delivery
//!
//! At-least-once: a consumer group commits an offset only after the record
//! was fully handled, so anything unacknowledged is redelivered on restart.
//! Within a partition records are handled one at a time, in order.

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod consumer;
pub mod group;
pub mod log;
pub mod memory;
pub mod partitioner;
pub mod shutdown;
pub mod table;
pub mod view;

// Re-export main types
pub use consumer::{run_partition, PartitionConsumer};
pub use group::{
    GroupError, GroupMetrics, GroupMetricsSnapshot, Handled, StatefulHandler, TableGroup,
    Transition, KEY_MISMATCH,
};
pub use log::{EventLog, LogError, Record, RecordPosition};
pub use memory::InMemoryLog;
pub use partitioner::{Murmur3Partitioner, Partitioner};
pub use shutdown::{shutdown_channel, Shutdown, ShutdownTrigger};
pub use table::{
    changelog_topic, InMemoryTableStorage, Recovery, TableError, TableStorage, TableWriter,
};
pub use view::{TableReader, TableView};

/// Default partition count for every topic.
pub const DEFAULT_PARTITION_COUNT: u32 = 4;

/// Maximum records returned by one fetch.
pub const FETCH_BATCH_SIZE: usize = 256;

/// Suffix of a group's changelog topic.
pub const CHANGELOG_SUFFIX: &str = "-table";
