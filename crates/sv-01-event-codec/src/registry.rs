//! # Schema Registry
//!
//! Port for resolving a schema document to a stable integer ID, plus the
//! in-process adapter used by the runtime and tests. A networked registry
//! client would implement the same trait.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use thiserror::Error;
use tracing::debug;

/// Errors from registry operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// The schema document is not valid JSON.
    #[error("Invalid schema for subject {subject}: {reason}")]
    InvalidSchema { subject: String, reason: String },

    /// The registry could not be reached.
    #[error("Schema registry unavailable: {0}")]
    Unavailable(String),
}

/// Resolves schema documents to IDs.
#[async_trait]
pub trait SchemaRegistry: Send + Sync {
    /// Register `schema` under `subject`, returning its ID.
    ///
    /// Registering a document identical to an existing one returns the
    /// existing ID.
    async fn register(&self, subject: &str, schema: &str) -> Result<u32, RegistryError>;

    /// ID of the most recent schema registered under `subject`.
    async fn latest(&self, subject: &str) -> Result<Option<u32>, RegistryError>;
}

#[derive(Default)]
struct RegistryState {
    /// Canonical document → ID. IDs are global across subjects.
    ids: HashMap<String, u32>,
    /// Subject → registered IDs in registration order.
    versions: HashMap<String, Vec<u32>>,
    next_id: u32,
}

/// In-process schema registry.
pub struct InMemorySchemaRegistry {
    state: Mutex<RegistryState>,
}

impl InMemorySchemaRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Mutex::new(RegistryState {
                next_id: 1,
                ..Default::default()
            }),
        }
    }
}

impl Default for InMemorySchemaRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SchemaRegistry for InMemorySchemaRegistry {
    async fn register(&self, subject: &str, schema: &str) -> Result<u32, RegistryError> {
        // Whitespace and key order must not produce a new ID
        let canonical = serde_json::from_str::<serde_json::Value>(schema)
            .map_err(|e| RegistryError::InvalidSchema {
                subject: subject.to_string(),
                reason: e.to_string(),
            })?
            .to_string();

        let mut state = self.state.lock();
        let id = match state.ids.get(&canonical) {
            Some(id) => *id,
            None => {
                let id = state.next_id;
                state.next_id += 1;
                state.ids.insert(canonical, id);
                id
            }
        };

        let versions = state.versions.entry(subject.to_string()).or_default();
        if versions.last() != Some(&id) {
            versions.push(id);
        }

        debug!(subject, schema_id = id, "Schema resolved");
        Ok(id)
    }

    async fn latest(&self, subject: &str) -> Result<Option<u32>, RegistryError> {
        let state = self.state.lock();
        Ok(state
            .versions
            .get(subject)
            .and_then(|versions| versions.last().copied()))
    }
}
