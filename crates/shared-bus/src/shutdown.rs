//! # Shutdown Signal
//!
//! Cooperative stop for long-running workers. Workers check the signal
//! between records, so a record is either fully handled or not started.

use tokio::sync::watch;

/// Sending half. Dropping it also counts as a shutdown.
#[derive(Debug)]
pub struct ShutdownTrigger {
    tx: watch::Sender<bool>,
}

/// Receiving half, cloned into every worker.
#[derive(Debug, Clone)]
pub struct Shutdown {
    rx: watch::Receiver<bool>,
}

/// Create a connected trigger/signal pair.
#[must_use]
pub fn shutdown_channel() -> (ShutdownTrigger, Shutdown) {
    let (tx, rx) = watch::channel(false);
    (ShutdownTrigger { tx }, Shutdown { rx })
}

impl ShutdownTrigger {
    /// Ask every worker to stop after its current record.
    pub fn trigger(&self) {
        // Fails only when no receiver is left, which needs no signal
        let _ = self.tx.send(true);
    }
}

impl Shutdown {
    /// Resolve once shutdown is requested. Cancel safe.
    pub async fn wait(&mut self) {
        while !*self.rx.borrow_and_update() {
            if self.rx.changed().await.is_err() {
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_trigger_wakes_all() {
        let (trigger, shutdown) = shutdown_channel();
        let mut a = shutdown.clone();
        let mut b = shutdown.clone();
        assert!(
            tokio::time::timeout(Duration::from_millis(20), a.wait())
                .await
                .is_err()
        );

        trigger.trigger();
        tokio::time::timeout(Duration::from_secs(1), a.wait())
            .await
            .unwrap();
        tokio::time::timeout(Duration::from_secs(1), b.wait())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_dropped_trigger_counts_as_shutdown() {
        let (trigger, mut shutdown) = shutdown_channel();
        drop(trigger);
        tokio::time::timeout(Duration::from_secs(1), shutdown.wait())
            .await
            .unwrap();
    }
}
