//! End-to-end pipeline scenarios over the in-memory log.

pub mod filtering;
pub mod recovery;
pub mod wiring;
