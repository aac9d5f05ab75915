//! # Synthetic Load Generator
//!
//! Emits a random message between users 1..=3 on every tick, so a freshly
//! started node has traffic to filter.

use crate::commands::Emitter;
use rand::Rng;
use shared_bus::Shutdown;
use shared_types::{Message, UserId};
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

const BODIES: [&str; 2] = ["some text", "another test words"];

/// A random message with sender and recipient in 1..=3.
pub fn synthetic_message<R: Rng>(rng: &mut R) -> Message {
    let sender = rng.gen_range(1..=3);
    let recipient = rng.gen_range(1..=3);
    let body = BODIES[rng.gen_range(0..BODIES.len())];
    let n = rng.gen_range(0..10);
    Message::new(UserId(sender), UserId(recipient), format!("{body} {n}"))
}

pub struct LoadGenerator {
    emitter: Emitter,
    interval: Duration,
}

impl LoadGenerator {
    pub fn new(emitter: Emitter, interval: Duration) -> Self {
        Self { emitter, interval }
    }

    /// Emit until shutdown. Publish failures are logged and skipped.
    pub async fn run(self, mut shutdown: Shutdown) {
        info!(interval_ms = self.interval.as_millis() as u64, "Load generator running");
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                () = shutdown.wait() => break,
                _ = ticker.tick() => {}
            }

            let message = synthetic_message(&mut rand::thread_rng());
            match self.emitter.emit_message(&message).await {
                Ok(position) => debug!(
                    sender = %message.sender_id,
                    recipient = %message.recipient_id,
                    partition = position.partition,
                    offset = position.offset,
                    "Emitted synthetic message"
                ),
                Err(e) => warn!(error = %e, "Failed to emit synthetic message"),
            }
        }
        info!("Load generator stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_synthetic_message_shape() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let message = synthetic_message(&mut rng);
            assert!((1..=3).contains(&message.sender_id.0));
            assert!((1..=3).contains(&message.recipient_id.0));
            let (prefix, n) = message.body.rsplit_once(' ').unwrap();
            assert!(BODIES.contains(&prefix));
            assert!(n.parse::<u8>().unwrap() < 10);
        }
    }
}
