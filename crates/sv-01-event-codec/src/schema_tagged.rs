//! Schema-tagged JSON codec.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::marker::PhantomData;
use tracing::info;

use crate::codec::{classify, Codec};
use crate::registry::{RegistryError, SchemaRegistry};
use shared_types::{CodecError, MismatchReason};

/// Leading byte of every schema-tagged payload.
pub const MARKER: u8 = 0;

/// Marker byte plus big-endian schema ID.
pub const HEADER_LEN: usize = 5;

/// JSON codec that frames each payload with the schema ID it was built for.
///
/// Decoding rejects anything not produced under the same schema ID.
pub struct SchemaTaggedCodec<T> {
    schema_id: u32,
    _marker: PhantomData<fn() -> T>,
}

impl<T> SchemaTaggedCodec<T> {
    /// Create a codec bound to an already-resolved schema ID.
    #[must_use]
    pub fn new(schema_id: u32) -> Self {
        Self {
            schema_id,
            _marker: PhantomData,
        }
    }

    /// Register `schema` under `subject` and bind a codec to the resulting ID.
    pub async fn register(
        registry: &dyn SchemaRegistry,
        subject: &str,
        schema: &str,
    ) -> Result<Self, RegistryError> {
        let schema_id = registry.register(subject, schema).await?;
        info!(subject, schema_id, "Schema registered");
        Ok(Self::new(schema_id))
    }

    /// Schema ID embedded in every encoded payload.
    #[must_use]
    pub fn schema_id(&self) -> u32 {
        self.schema_id
    }

    /// Validate the header and return the JSON payload that follows it.
    fn strip_header<'a>(&self, data: &'a [u8]) -> Result<&'a [u8], CodecError> {
        if data.len() < HEADER_LEN {
            return Err(CodecError::TruncatedInput {
                len: data.len(),
                required: HEADER_LEN,
            });
        }
        if data[0] != MARKER {
            return Err(CodecError::SchemaMismatch {
                expected: self.schema_id,
                reason: MismatchReason::Marker(data[0]),
            });
        }

        let embedded = u32::from_be_bytes([data[1], data[2], data[3], data[4]]);
        if embedded != self.schema_id {
            return Err(CodecError::SchemaMismatch {
                expected: self.schema_id,
                reason: MismatchReason::SchemaId(embedded),
            });
        }

        Ok(&data[HEADER_LEN..])
    }
}

impl<T> Clone for SchemaTaggedCodec<T> {
    fn clone(&self) -> Self {
        Self::new(self.schema_id)
    }
}

impl<T> fmt::Debug for SchemaTaggedCodec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaTaggedCodec")
            .field("schema_id", &self.schema_id)
            .field("type", &std::any::type_name::<T>())
            .finish()
    }
}

impl<T> Codec<T> for SchemaTaggedCodec<T>
where
    T: Serialize + DeserializeOwned,
{
    fn encode(&self, value: &T) -> Result<Vec<u8>, CodecError> {
        let payload = serde_json::to_vec(value).map_err(classify)?;

        let mut buf = Vec::with_capacity(HEADER_LEN + payload.len());
        buf.push(MARKER);
        buf.extend_from_slice(&self.schema_id.to_be_bytes());
        buf.extend_from_slice(&payload);
        Ok(buf)
    }

    fn decode(&self, data: &[u8]) -> Result<T, CodecError> {
        let payload = self.strip_header(data)?;
        serde_json::from_slice(payload).map_err(classify)
    }
}
