//! # Relationship Table Service
//!
//! Binds the pure transitions to the group runner.

use crate::domain;
use shared_bus::{EventLog, StatefulHandler, TableGroup, TableStorage, Transition, KEY_MISMATCH};
use shared_types::topics::{BLOCKED_USERS, RELATIONSHIP_GROUP};
use shared_types::{ProcessorId, RelationshipEvent, RelationshipState};
use std::sync::Arc;
use sv_01_event_codec::JsonCodec;

/// Reason for dropping an event whose actor targets themselves.
pub const SELF_REFERENTIAL: &str = "self_referential";

/// Stateful handler of the `blocked-users` stream.
#[derive(Debug, Clone, Copy, Default)]
pub struct RelationshipProcessor;

impl StatefulHandler for RelationshipProcessor {
    type Event = RelationshipEvent;
    type State = RelationshipState;

    fn processor(&self) -> ProcessorId {
        ProcessorId::RelationshipTable
    }

    fn admit(&self, key: &str, event: &RelationshipEvent) -> Result<(), &'static str> {
        if event.is_self_referential() {
            return Err(SELF_REFERENTIAL);
        }
        if event.routing_key() != key {
            return Err(KEY_MISMATCH);
        }
        Ok(())
    }

    fn apply(
        &self,
        current: Option<&RelationshipState>,
        event: &RelationshipEvent,
    ) -> Transition<RelationshipState> {
        domain::apply(current, event)
    }
}

/// The relationship table group, consuming `blocked-users`.
#[must_use]
pub fn relationship_group(
    log: Arc<dyn EventLog>,
    storage: Arc<dyn TableStorage>,
) -> TableGroup<RelationshipProcessor> {
    TableGroup::new(
        RelationshipProcessor,
        RELATIONSHIP_GROUP,
        BLOCKED_USERS,
        log,
        storage,
        Arc::new(JsonCodec::<RelationshipEvent>::new()),
        Arc::new(JsonCodec::<RelationshipState>::new()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_bus::{
        shutdown_channel, Handled, InMemoryLog, InMemoryTableStorage, Record, TableError,
        TableReader, TableView,
    };
    use shared_types::UserId;
    use std::time::Duration;
    use sv_01_event_codec::Codec;

    async fn setup() -> (Arc<InMemoryLog>, TableGroup<RelationshipProcessor>) {
        setup_with(Arc::new(InMemoryTableStorage::new())).await
    }

    async fn setup_with(
        storage: Arc<dyn TableStorage>,
    ) -> (Arc<InMemoryLog>, TableGroup<RelationshipProcessor>) {
        let log = Arc::new(InMemoryLog::new());
        log.create_topic(BLOCKED_USERS, 4).await.unwrap();
        log.create_topic("blocked-users-table", 4).await.unwrap();
        let group = relationship_group(log.clone(), storage);
        (log, group)
    }

    fn record(key: &str, event: &RelationshipEvent) -> Record {
        Record {
            topic: BLOCKED_USERS.into(),
            partition: 0,
            offset: 0,
            key: key.into(),
            value: JsonCodec::<RelationshipEvent>::new().encode(event).unwrap(),
        }
    }

    fn block(actor: i64, counterpart: i64) -> RelationshipEvent {
        RelationshipEvent::Block {
            actor: UserId(actor),
            counterpart: UserId(counterpart),
        }
    }

    #[tokio::test]
    async fn test_self_block_ignored_before_state_read() {
        let (log, group) = setup().await;
        let handled = group.handle(&record("1", &block(1, 1))).await.unwrap();
        assert_eq!(handled, Handled::Ignored(SELF_REFERENTIAL));
        assert_eq!(group.table().get("1").unwrap(), None);
        assert!(log.snapshot("blocked-users-table").unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_event_for_other_actor_ignored() {
        let (_log, group) = setup().await;
        let handled = group.handle(&record("3", &block(1, 2))).await.unwrap();
        assert_eq!(handled, Handled::Ignored(KEY_MISMATCH));
        assert_eq!(group.table().get("1").unwrap(), None);
        assert_eq!(group.table().get("3").unwrap(), None);
    }

    #[tokio::test]
    async fn test_unknown_action_dropped() {
        let (_log, group) = setup().await;
        let mut bad = record("1", &block(1, 2));
        bad.value = br#"{"action":"mute","actor":1,"counterpart":2}"#.to_vec();
        assert_eq!(
            group.handle(&bad).await.unwrap(),
            Handled::Dropped("type_mismatch")
        );
    }

    #[tokio::test]
    async fn test_block_then_unblock() {
        let (_log, group) = setup().await;
        group.handle(&record("1", &block(1, 2))).await.unwrap();
        group.handle(&record("1", &block(1, 3))).await.unwrap();
        let unblock = RelationshipEvent::Unblock {
            actor: UserId(1),
            counterpart: UserId(2),
        };
        group.handle(&record("1", &unblock)).await.unwrap();

        let state = group.table().get("1").unwrap().unwrap();
        assert!(!state.is_blocked(UserId(2)));
        assert!(state.is_blocked(UserId(3)));
    }

    #[tokio::test]
    async fn test_restart_replays_to_same_state() {
        let (log, group) = setup().await;
        for event in [block(1, 2), block(1, 2), block(1, 3)] {
            let value = JsonCodec::<RelationshipEvent>::new().encode(&event).unwrap();
            log.append(BLOCKED_USERS, &event.routing_key(), value)
                .await
                .unwrap();
        }

        let group = Arc::new(group);
        let (trigger, shutdown) = shutdown_channel();
        let task = tokio::spawn(group.clone().run(shutdown));
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.trigger();
        task.await.unwrap().unwrap();
        let before = group.table().get("1").unwrap();
        assert_eq!(group.metrics().snapshot().applied, 2);

        // Fresh storage, same log: recovery plus redelivery of nothing new
        let restarted = Arc::new(relationship_group(
            log.clone(),
            Arc::new(InMemoryTableStorage::new()),
        ));
        let (trigger, shutdown) = shutdown_channel();
        let task = tokio::spawn(restarted.clone().run(shutdown));
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.trigger();
        task.await.unwrap().unwrap();

        assert_eq!(restarted.table().get("1").unwrap(), before);
        assert_eq!(restarted.metrics().snapshot().applied, 0);
    }

    #[tokio::test]
    async fn test_durable_table_with_fresh_changelog_reaches_readers() {
        let storage = Arc::new(InMemoryTableStorage::new());
        let (_old_log, first) = setup_with(storage.clone()).await;
        first.handle(&record("1", &block(1, 2))).await.unwrap();

        // The table outlives the log it was written to
        let (log, restarted) = setup_with(storage).await;
        assert_eq!(restarted.restore().await.unwrap().republished, 1);

        let (_trigger, shutdown) = shutdown_channel();
        let view = TableView::open(
            RELATIONSHIP_GROUP,
            log.clone(),
            Arc::new(JsonCodec::<RelationshipState>::new()),
            shutdown,
        )
        .await
        .unwrap();
        tokio::time::timeout(Duration::from_secs(1), view.catch_up())
            .await
            .unwrap()
            .unwrap();
        assert!(view.get("1").unwrap().is_blocked(UserId(2)));

        // Re-issuing the block is a no-op and owner and reader still agree
        assert_eq!(
            restarted.handle(&record("1", &block(1, 2))).await.unwrap(),
            Handled::Unchanged
        );
        assert_eq!(view.get("1"), restarted.table().get("1").unwrap());
    }

    #[tokio::test]
    async fn test_storage_failure_surfaces() {
        struct ReadOnly;
        impl TableStorage for ReadOnly {
            fn get(&self, _: &str, _: &str) -> Result<Option<Vec<u8>>, TableError> {
                Ok(None)
            }
            fn put(&self, table: &str, key: &str, _: &[u8]) -> Result<(), TableError> {
                Err(TableError::Persistence {
                    table: table.into(),
                    key: key.into(),
                    reason: "read-only".into(),
                })
            }
            fn entries(&self, _: &str) -> Result<Vec<(String, Vec<u8>)>, TableError> {
                Ok(Vec::new())
            }
        }

        let log = Arc::new(InMemoryLog::new());
        log.create_topic(BLOCKED_USERS, 1).await.unwrap();
        log.create_topic("blocked-users-table", 1).await.unwrap();
        let group = relationship_group(log, Arc::new(ReadOnly));
        assert!(group.handle(&record("1", &block(1, 2))).await.is_err());
        assert_eq!(group.metrics().snapshot().persistence_failures, 1);
    }
}
