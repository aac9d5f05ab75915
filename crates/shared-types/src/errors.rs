//! # Error Types
//!
//! Defines the per-record error taxonomy shared by every processor.
//! Each of these drops exactly one record; none of them stops a processor.

use thiserror::Error;

/// Why a schema-tagged header was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MismatchReason {
    /// The leading marker byte was not zero.
    Marker(u8),
    /// The embedded schema ID belongs to another schema.
    SchemaId(u32),
}

/// Errors produced while encoding or decoding a record value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// Payload is well-formed but does not have the expected shape.
    #[error("Type mismatch: {0}")]
    TypeMismatch(String),

    /// Payload could not be serialized or parsed at all.
    #[error("Serialization failure: {0}")]
    SerializationFailure(String),

    /// Payload is shorter than the fixed header.
    #[error("Truncated input: {len} bytes, header needs {required}")]
    TruncatedInput { len: usize, required: usize },

    /// Payload was produced under a different schema.
    #[error("Schema mismatch: expected schema {expected}, got {reason:?}")]
    SchemaMismatch { expected: u32, reason: MismatchReason },
}

impl CodecError {
    /// Short name used in structured log fields.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::TypeMismatch(_) => "type_mismatch",
            Self::SerializationFailure(_) => "serialization_failure",
            Self::TruncatedInput { .. } => "truncated_input",
            Self::SchemaMismatch { .. } => "schema_mismatch",
        }
    }
}
