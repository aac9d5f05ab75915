//! # Filtered Output Sink
//!
//! Logs every message that made it through the filter.

use shared_bus::{run_partition, EventLog, LogError, PartitionConsumer, Record, Shutdown};
use shared_types::topics::FILTERED_MESSAGES;
use shared_types::Message;
use std::sync::Arc;
use sv_01_event_codec::{Codec, JsonCodec};
use tracing::{info, warn};

use crate::topology::SINK_GROUP;

fn log_record(record: &Record) {
    match JsonCodec::<Message>::new().decode(&record.value) {
        Ok(message) => info!(
            key = %record.key,
            sender = %message.sender_id,
            recipient = %message.recipient_id,
            "Filtered message: {}",
            message.body
        ),
        Err(e) => warn!(key = %record.key, error = %e, "Undecodable filtered message"),
    }
}

/// Consume `filtered-messages` until shutdown.
pub async fn run_sink(log: Arc<dyn EventLog>, shutdown: Shutdown) -> Result<(), LogError> {
    let partitions = log.partition_count(FILTERED_MESSAGES).await?;
    let mut workers = Vec::with_capacity(partitions as usize);
    for partition in 0..partitions {
        let consumer =
            PartitionConsumer::for_group(log.clone(), SINK_GROUP, FILTERED_MESSAGES, partition)
                .await?;
        workers.push(tokio::spawn(run_partition(
            consumer,
            shutdown.clone(),
            |record| async move {
                log_record(&record);
                Ok::<(), LogError>(())
            },
        )));
    }

    for worker in workers {
        match worker.await {
            Ok(result) => result?,
            Err(e) => warn!(error = %e, "Sink worker panicked"),
        }
    }
    Ok(())
}
