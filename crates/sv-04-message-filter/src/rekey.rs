//! # Sender Rekey Stage
//!
//! Emitters key messages by recipient, but the relationship join is keyed
//! by sender. This stage copies every message from `messages` onto
//! `messages-by-sender`, byte for byte, under the sender's routing key.

use crate::error::FilterError;
use crate::workers::run_partitions;
use shared_bus::{EventLog, LogError, Record, Shutdown};
use shared_types::topics::{MESSAGES, MESSAGES_BY_SENDER, REKEY_GROUP};
use shared_types::Message;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use sv_01_event_codec::Codec;
use tracing::{debug, info};

const TAG: &str = "sv-04/rekey";

pub struct Repartitioner {
    log: Arc<dyn EventLog>,
    codec: Arc<dyn Codec<Message>>,
    forwarded: AtomicU64,
    dropped: AtomicU64,
}

impl Repartitioner {
    pub fn new(log: Arc<dyn EventLog>, codec: Arc<dyn Codec<Message>>) -> Self {
        Self {
            log,
            codec,
            forwarded: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
        }
    }

    /// Records copied and records dropped so far.
    #[must_use]
    pub fn counts(&self) -> (u64, u64) {
        (
            self.forwarded.load(Ordering::Relaxed),
            self.dropped.load(Ordering::Relaxed),
        )
    }

    /// Copy one record under its sender key. Returns false if it was dropped.
    pub async fn handle(&self, record: &Record) -> Result<bool, LogError> {
        let message = match self.codec.decode(&record.value) {
            Ok(message) => message,
            Err(e) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                debug!(key = %record.key, error = %e, "[{TAG}] Dropping undecodable message");
                return Ok(false);
            }
        };

        self.log
            .append(MESSAGES_BY_SENDER, &message.join_key(), record.value.clone())
            .await?;
        self.forwarded.fetch_add(1, Ordering::Relaxed);
        Ok(true)
    }

    /// Consume `messages` until shutdown.
    pub async fn run(self: Arc<Self>, shutdown: Shutdown) -> Result<(), FilterError> {
        info!("[{TAG}] Rekey stage running");
        let log = self.log.clone();
        run_partitions(TAG, log, REKEY_GROUP, MESSAGES, shutdown, move |record| {
            let this = self.clone();
            async move {
                this.handle(&record).await?;
                Ok::<(), FilterError>(())
            }
        })
        .await
    }
}
