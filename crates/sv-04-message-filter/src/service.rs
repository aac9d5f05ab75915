//! # Message Filter Service
//!
//! Per message, in order:
//!
//! 1. Decode. Malformed input is dropped before either table is consulted.
//! 2. Check the record key is the sender. A mismatch is a wiring defect and
//!    the message is dropped without evaluating the join.
//! 3. Redact every token the deny-word table marks as denied.
//! 4. Join the relationship table at the sender. If the sender blocked the
//!    recipient, drop.
//! 5. Emit on the output topic under the message's inbound key, the
//!    recipient. Rekeying by sender is internal to the pipeline, so output
//!    consumers see the same key the producer used.
//!
//! Neither table is ever written from here.

use crate::domain::{is_blocked, redact};
use crate::error::FilterError;
use crate::metrics::{FilterMetrics, FilterMetricsSnapshot};
use crate::workers::run_partitions;
use shared_bus::{EventLog, Record, Shutdown, TableReader};
use shared_types::topics::{FILTERED_MESSAGES, FILTER_GROUP, MESSAGES_BY_SENDER};
use shared_types::{CensorState, Message, ProcessorId, RelationshipState};
use std::sync::Arc;
use sv_01_event_codec::{Codec, JsonCodec};
use tracing::{debug, info, warn};

const TAG: &str = "sv-04";

/// What the filter did with one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Emitted under `key` (the recipient), body already redacted.
    Forwarded { key: String, message: Message },
    /// The sender has blocked the recipient.
    Blocked,
    /// The payload did not decode.
    Malformed(&'static str),
    /// The record key was not the sender's ID.
    KeyMismatch,
}

/// The filtering processor.
pub struct MessageFilter {
    log: Arc<dyn EventLog>,
    relationships: Arc<dyn TableReader<RelationshipState>>,
    censor: Arc<dyn TableReader<CensorState>>,
    input: Arc<dyn Codec<Message>>,
    output: Arc<dyn Codec<Message>>,
    metrics: Arc<FilterMetrics>,
}

impl MessageFilter {
    /// Filter reading schema-tagged messages with `input` and emitting plain
    /// JSON.
    pub fn new(
        log: Arc<dyn EventLog>,
        relationships: Arc<dyn TableReader<RelationshipState>>,
        censor: Arc<dyn TableReader<CensorState>>,
        input: Arc<dyn Codec<Message>>,
    ) -> Self {
        Self {
            log,
            relationships,
            censor,
            input,
            output: Arc::new(JsonCodec::<Message>::new()),
            metrics: Arc::new(FilterMetrics::default()),
        }
    }

    #[must_use]
    pub fn metrics(&self) -> FilterMetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Decide what to do with a record. Reads the table views, writes nothing.
    pub fn evaluate(&self, record: &Record) -> Outcome {
        FilterMetrics::add(&self.metrics.received, 1);
        let key = record.key.as_str();

        let mut message = match self.input.decode(&record.value) {
            Ok(message) => message,
            Err(e) => {
                FilterMetrics::add(&self.metrics.malformed, 1);
                debug!(key, offset = record.offset, error = %e, "[{TAG}] Dropping malformed message");
                return Outcome::Malformed(e.kind());
            }
        };

        let join_key = message.join_key();
        if join_key != key {
            FilterMetrics::add(&self.metrics.key_mismatch, 1);
            warn!(
                key,
                sender = %join_key,
                offset = record.offset,
                "[{TAG}] Record key is not the sender, join skipped"
            );
            return Outcome::KeyMismatch;
        }

        let redaction = redact(&message.body, |word| {
            self.censor.get(word).map_or(false, |state| state.denied)
        });
        if redaction.redacted > 0 {
            FilterMetrics::add(&self.metrics.redacted_tokens, redaction.redacted as u64);
        }
        message.body = redaction.body;

        let sender_state = self.relationships.get(key);
        if is_blocked(sender_state.as_ref(), message.recipient_id) {
            FilterMetrics::add(&self.metrics.blocked, 1);
            debug!(
                key,
                recipient = %message.recipient_id,
                "[{TAG}] Dropping message to blocked recipient"
            );
            return Outcome::Blocked;
        }

        Outcome::Forwarded {
            key: message.inbound_key(),
            message,
        }
    }

    /// Evaluate a record and emit it if it survives.
    pub async fn handle(&self, record: &Record) -> Result<Outcome, FilterError> {
        let outcome = self.evaluate(record);
        if let Outcome::Forwarded { key, message } = &outcome {
            let bytes = self.output.encode(message)?;
            self.log.append(FILTERED_MESSAGES, key, bytes).await?;
            FilterMetrics::add(&self.metrics.forwarded, 1);
            debug!(key = %key, "[{TAG}] Message forwarded");
        }
        Ok(outcome)
    }

    /// Consume `messages-by-sender` until shutdown.
    pub async fn run(self: Arc<Self>, shutdown: Shutdown) -> Result<(), FilterError> {
        info!(processor = %ProcessorId::MessageFilter, "[{TAG}] Filter running");
        let log = self.log.clone();
        let result = run_partitions(
            TAG,
            log,
            FILTER_GROUP,
            MESSAGES_BY_SENDER,
            shutdown,
            move |record| {
                let this = self.clone();
                async move { this.handle(&record).await.map(|_| ()) }
            },
        )
        .await;
        info!("[{TAG}] Filter stopped");
        result
    }
}
