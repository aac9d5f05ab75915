//! # Wiring Scenarios
//!
//! Records that reach the filter with the wrong key or the wrong payload.

#[cfg(test)]
mod tests {
    use crate::harness::{eventually, TestNode};
    use shared_bus::EventLog;
    use shared_types::topics::{MESSAGES, MESSAGES_BY_SENDER};
    use shared_types::{Message, UserId, MESSAGE_SCHEMA_SUBJECT};
    use sv_01_event_codec::{Codec, JsonCodec, SchemaRegistry, SchemaTaggedCodec};

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_recipient_keyed_message_never_joined() {
        let node = TestNode::start().await;

        // Bypass the rekey stage: message keyed by recipient
        let message = Message::new(UserId(1), UserId(2), "hi");
        let schema_id = node
            .registry
            .latest(MESSAGE_SCHEMA_SUBJECT)
            .await
            .unwrap()
            .unwrap();
        let tagged = SchemaTaggedCodec::<Message>::new(schema_id)
            .encode(&message)
            .unwrap();
        node.log
            .append(MESSAGES_BY_SENDER, &message.inbound_key(), tagged)
            .await
            .unwrap();

        assert!(
            eventually(|| node
                .runtime
                .filter_metrics()
                .map_or(false, |m| m.key_mismatch == 1))
            .await
        );
        assert!(node.filtered().is_empty());
        node.runtime.shutdown().await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_untagged_message_dropped_by_rekey() {
        let node = TestNode::start().await;
        let message = Message::new(UserId(1), UserId(2), "plain json");
        let value = JsonCodec::<Message>::new().encode(&message).unwrap();
        node.log
            .append(MESSAGES, &message.inbound_key(), value)
            .await
            .unwrap();

        // A valid message behind it still gets through
        node.send(1, 2, "tagged").await;
        assert!(eventually(|| node.filtered().len() == 1).await);
        assert_eq!(node.filtered()[0].1.body, "tagged");
        assert_eq!(node.runtime.filter_metrics().unwrap().received, 1);
        assert_eq!(node.runtime.rekey_counts(), Some((1, 1)));
        node.runtime.shutdown().await;
    }
}
