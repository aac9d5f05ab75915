//! # Shared Types Crate
//!
//! This crate contains all domain entities, stream events and table values
//! exchanged between Sieve processors.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: All cross-processor types are defined here.
//! - **Closed Variants**: Each stream carries exactly one tagged enum that
//!   enumerates every event kind valid on that stream. Anything else fails
//!   to decode and is dropped by the consumer.
//! - **Routing Keys Are Strings**: Every entity that is published exposes the
//!   key the substrate partitions it by.

pub mod entities;
pub mod errors;
pub mod events;
pub mod processor;
pub mod tables;
pub mod topics;

pub use entities::*;
pub use errors::*;
pub use events::*;
pub use processor::ProcessorId;
pub use tables::*;
