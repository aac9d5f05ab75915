//! # SV-01 Event Codec
//!
//! Turns typed stream values into record bytes and back.
//!
//! ## Variants
//!
//! - [`JsonCodec`]: plain JSON, no framing. Used for table events and
//!   changelog values.
//! - [`SchemaTaggedCodec`]: JSON prefixed with a 5-byte header so a consumer
//!   can reject payloads produced under another schema without a registry
//!   round-trip per record.
//!
//! ## Wire Format (schema-tagged)
//!
//! ```text
//! ┌────────┬──────────────────────┬──────────────────┐
//! │ marker │ schema id (u32, BE)  │ JSON payload ... │
//! │  0x00  │      4 bytes         │                  │
//! └────────┴──────────────────────┴──────────────────┘
//! ```
//!
//! ## Registry
//!
//! The schema ID is resolved once at startup through the [`SchemaRegistry`]
//! port. [`InMemorySchemaRegistry`] is the in-process adapter.

pub mod codec;
pub mod json;
pub mod registry;
pub mod schema_tagged;

pub use codec::Codec;
pub use json::JsonCodec;
pub use registry::{InMemorySchemaRegistry, RegistryError, SchemaRegistry};
pub use schema_tagged::{SchemaTaggedCodec, HEADER_LEN, MARKER};

pub use shared_types::{CodecError, MismatchReason};
