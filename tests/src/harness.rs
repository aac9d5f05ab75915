//! In-process node for scenario tests.

use node_runtime::config::NodeConfig;
use node_runtime::{Command, Emitter, NodeRuntime};
use shared_bus::{InMemoryLog, TableReader};
use shared_types::topics::FILTERED_MESSAGES;
use shared_types::{Message, UserId};
use std::sync::Arc;
use std::time::{Duration, Instant};
use sv_01_event_codec::{Codec, InMemorySchemaRegistry, JsonCodec};

/// How long [`eventually`] polls before giving up.
pub const SETTLE_TIMEOUT: Duration = Duration::from_secs(5);

/// Poll `check` until it holds or [`SETTLE_TIMEOUT`] passes.
pub async fn eventually<F: FnMut() -> bool>(mut check: F) -> bool {
    let deadline = Instant::now() + SETTLE_TIMEOUT;
    while Instant::now() < deadline {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    check()
}

/// A started node with no synthetic load.
pub struct TestNode {
    pub log: Arc<InMemoryLog>,
    pub registry: Arc<InMemorySchemaRegistry>,
    pub runtime: NodeRuntime,
    pub emitter: Emitter,
}

impl TestNode {
    pub async fn start() -> Self {
        Self::start_on(
            Arc::new(InMemoryLog::new()),
            Arc::new(InMemorySchemaRegistry::new()),
        )
        .await
    }

    /// Start over an existing log and registry, as a restarted process would.
    pub async fn start_on(log: Arc<InMemoryLog>, registry: Arc<InMemorySchemaRegistry>) -> Self {
        let mut config = NodeConfig::default();
        config.partitions = 2;
        config.load.enabled = false;

        let mut runtime = NodeRuntime::new(config, log.clone(), registry.clone());
        runtime.start().await.expect("node starts");
        let emitter = runtime.emitter().expect("emitter after start");
        Self {
            log,
            registry,
            runtime,
            emitter,
        }
    }

    pub async fn run(&self, line: &str) {
        let command = Command::parse_line(line).expect("valid command");
        self.emitter.emit(&command).await.expect("command published");
    }

    pub async fn send(&self, from: i64, to: i64, body: &str) -> Message {
        let message = Message::new(UserId(from), UserId(to), body);
        self.emitter
            .emit_message(&message)
            .await
            .expect("message published");
        message
    }

    /// Wait until the filter's view shows `actor` blocking `counterpart`
    /// (or not).
    pub async fn await_block(&self, actor: i64, counterpart: i64, blocked: bool) {
        let view = self.runtime.relationships().expect("started");
        let settled = eventually(|| {
            view.get(&actor.to_string())
                .map_or(false, |s| s.is_blocked(UserId(counterpart)))
                == blocked
        })
        .await;
        assert!(settled, "view never showed {actor}->{counterpart} blocked={blocked}");
    }

    /// Wait until the filter's view shows `word` with the given flag.
    pub async fn await_denied(&self, word: &str, denied: bool) {
        let view = self.runtime.deny_words().expect("started");
        let settled = eventually(|| view.get(word).map_or(false, |s| s.denied) == denied).await;
        assert!(settled, "view never showed {word} denied={denied}");
    }

    /// Wait until the filter has consumed `count` messages.
    pub async fn await_received(&self, count: u64) {
        let settled = eventually(|| {
            self.runtime
                .filter_metrics()
                .map_or(false, |m| m.received >= count)
        })
        .await;
        assert!(settled, "filter never received {count} messages");
    }

    /// Everything on `filtered-messages`, as (key, message).
    pub fn filtered(&self) -> Vec<(String, Message)> {
        let codec = JsonCodec::<Message>::new();
        self.log
            .snapshot(FILTERED_MESSAGES)
            .expect("topic exists")
            .into_iter()
            .map(|r| {
                let message = codec.decode(&r.value).expect("filter output decodes");
                (r.key, message)
            })
            .collect()
    }
}
