//! # Filtering Scenarios
//!
//! Block and deny commands flow through their table owners into the
//! filter's views, and messages come out redacted or not at all.

#[cfg(test)]
mod tests {
    use crate::harness::{eventually, TestNode};
    use shared_types::UserId;

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_blocked_sender_with_denied_word_emits_nothing() {
        let node = TestNode::start().await;
        node.run("block --author 1 --recipient 2").await;
        node.run("deny --word bad").await;
        node.await_block(1, 2, true).await;
        node.await_denied("bad", true).await;

        node.send(1, 2, "bad word").await;
        node.await_received(1).await;

        let metrics = node.runtime.filter_metrics().unwrap();
        assert_eq!(metrics.blocked, 1);
        assert!(node.filtered().is_empty());
        node.runtime.shutdown().await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_denied_word_redacted_when_not_blocked() {
        let node = TestNode::start().await;
        node.run("deny --word bad").await;
        node.await_denied("bad", true).await;

        node.send(1, 2, "bad word").await;
        assert!(eventually(|| node.filtered().len() == 1).await);

        // Output keeps the producer's recipient key
        let (key, message) = node.filtered().remove(0);
        assert_eq!(key, "2");
        assert_eq!(message.body, "*** word");
        assert_eq!(message.sender_id, UserId(1));
        assert_eq!(message.recipient_id, UserId(2));
        node.runtime.shutdown().await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_block_applies_to_one_recipient_only() {
        let node = TestNode::start().await;
        node.run("block --author 1 --recipient 2").await;
        node.await_block(1, 2, true).await;

        node.send(1, 2, "hello two").await;
        node.send(1, 3, "hello three").await;
        node.await_received(2).await;

        assert!(eventually(|| node.filtered().len() == 1).await);
        let (_, message) = node.filtered().remove(0);
        assert_eq!(message.recipient_id, UserId(3));
        assert_eq!(message.body, "hello three");
        node.runtime.shutdown().await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_unblock_and_permit_restore_delivery() {
        let node = TestNode::start().await;
        node.run("block --author 1 --recipient 2").await;
        node.run("deny --word bad").await;
        node.await_block(1, 2, true).await;
        node.await_denied("bad", true).await;

        node.run("unblock --author 1 --recipient 2").await;
        node.run("permit --word bad").await;
        node.await_block(1, 2, false).await;
        node.await_denied("bad", false).await;

        node.send(1, 2, "bad word").await;
        assert!(eventually(|| node.filtered().len() == 1).await);
        assert_eq!(node.filtered()[0].1.body, "bad word");
        node.runtime.shutdown().await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_unknown_words_and_users_pass_through() {
        let node = TestNode::start().await;
        node.send(7, 8, "nothing   to\thide").await;
        assert!(eventually(|| node.filtered().len() == 1).await);
        assert_eq!(node.filtered()[0].1.body, "nothing to hide");
        node.runtime.shutdown().await;
    }
}
