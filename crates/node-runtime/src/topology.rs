//! # Topology
//!
//! Every topic the pipeline touches, created up front with one partition
//! count so co-partitioned streams and changelogs line up key for key.

use shared_bus::{changelog_topic, EventLog, LogError};
use shared_types::topics::{DENY_WORD_GROUP, RELATIONSHIP_GROUP, STREAM_TOPICS};
use tracing::info;

/// Group that logs the filtered output.
pub const SINK_GROUP: &str = "filtered-sink";

/// All topic names: streams, then table changelogs.
#[must_use]
pub fn topic_names() -> Vec<String> {
    STREAM_TOPICS
        .iter()
        .map(|t| t.to_string())
        .chain([RELATIONSHIP_GROUP, DENY_WORD_GROUP].iter().map(|g| changelog_topic(g)))
        .collect()
}

/// Create every topic with `partitions` partitions. Idempotent.
pub async fn create_topics(log: &dyn EventLog, partitions: u32) -> Result<(), LogError> {
    let names = topic_names();
    for name in &names {
        log.create_topic(name, partitions).await?;
    }
    info!(topics = names.len(), partitions, "Topology ready");
    Ok(())
}
