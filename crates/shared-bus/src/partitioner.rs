//! # Partitioner
//!
//! Maps a routing key to a partition. Every producer of a topic must use
//! the same partitioner, otherwise records for one key land in different
//! lanes and lose their ordering.

use std::io::Cursor;

/// Chooses the partition for a routing key.
pub trait Partitioner: Send + Sync {
    /// Partition index in `0..partitions`. `partitions` is never zero.
    fn partition(&self, key: &str, partitions: u32) -> u32;
}

/// 32-bit murmur3 hash of the key bytes, seed 0, modulo partition count.
#[derive(Debug, Clone, Copy, Default)]
pub struct Murmur3Partitioner;

impl Partitioner for Murmur3Partitioner {
    fn partition(&self, key: &str, partitions: u32) -> u32 {
        // Reading from an in-memory cursor cannot fail
        let hash = murmur3::murmur3_32(&mut Cursor::new(key.as_bytes()), 0).unwrap_or(0);
        hash % partitions.max(1)
    }
}
