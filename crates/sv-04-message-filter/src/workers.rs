//! Per-partition worker fan-out shared by the filter and the rekey stage.

use crate::error::FilterError;
use shared_bus::{run_partition, EventLog, PartitionConsumer, Record, Shutdown};
use std::future::Future;
use std::sync::Arc;
use tracing::error;

/// Run `handle` over every partition of `topic` as `group` until shutdown.
/// Returns the first worker error once all workers have exited.
pub(crate) async fn run_partitions<F, Fut>(
    tag: &'static str,
    log: Arc<dyn EventLog>,
    group: &str,
    topic: &str,
    shutdown: Shutdown,
    handle: F,
) -> Result<(), FilterError>
where
    F: Fn(Record) -> Fut + Clone + Send + 'static,
    Fut: Future<Output = Result<(), FilterError>> + Send + 'static,
{
    let partitions = log.partition_count(topic).await?;
    let mut workers = Vec::with_capacity(partitions as usize);
    for partition in 0..partitions {
        let consumer = PartitionConsumer::for_group(log.clone(), group, topic, partition).await?;
        workers.push((
            partition,
            tokio::spawn(run_partition(consumer, shutdown.clone(), handle.clone())),
        ));
    }

    let mut first_error = None;
    for (partition, worker) in workers {
        let outcome = match worker.await {
            Ok(result) => result,
            Err(e) => Err(FilterError::WorkerPanicked {
                partition,
                reason: e.to_string(),
            }),
        };
        if let Err(e) = outcome {
            error!(group, partition, error = %e, "[{tag}] Partition worker halted");
            first_error.get_or_insert(e);
        }
    }
    first_error.map_or(Ok(()), Err)
}
