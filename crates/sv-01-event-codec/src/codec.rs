//! Codec port.

use shared_types::CodecError;

/// Converts values of one stream type to and from record bytes.
///
/// Implementations are stateless apart from construction-time parameters,
/// so a single instance is shared by every partition worker.
pub trait Codec<T>: Send + Sync {
    /// Encode a value into record bytes.
    fn encode(&self, value: &T) -> Result<Vec<u8>, CodecError>;

    /// Decode record bytes into a value.
    fn decode(&self, data: &[u8]) -> Result<T, CodecError>;
}

/// Map a `serde_json` failure onto the codec taxonomy.
///
/// Well-formed JSON of the wrong shape is a type mismatch; everything else
/// (syntax errors, early EOF, I/O) is a serialization failure.
pub(crate) fn classify(err: serde_json::Error) -> CodecError {
    match err.classify() {
        serde_json::error::Category::Data => CodecError::TypeMismatch(err.to_string()),
        _ => CodecError::SerializationFailure(err.to_string()),
    }
}
