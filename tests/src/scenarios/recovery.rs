//! # Recovery Scenarios
//!
//! A restarted node rebuilds every table from the changelogs and resumes
//! each group from its committed offsets.

#[cfg(test)]
mod tests {
    use crate::harness::{eventually, TestNode};
    use shared_bus::TableReader;
    use shared_types::UserId;

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_restart_keeps_tables() {
        let node = TestNode::start().await;
        node.run("block --author 1 --recipient 2").await;
        node.run("deny --word bad").await;
        node.await_block(1, 2, true).await;
        node.await_denied("bad", true).await;

        let (log, registry) = (node.log.clone(), node.registry.clone());
        assert!(node.runtime.shutdown().await.is_empty());

        let restarted = TestNode::start_on(log, registry).await;
        // Views are caught up before start returns
        let relationships = restarted.runtime.relationships().unwrap();
        assert!(relationships.get("1").unwrap().is_blocked(UserId(2)));
        assert!(restarted.runtime.deny_words().unwrap().get("bad").unwrap().denied);

        // Nothing was redelivered to the owners
        assert_eq!(restarted.runtime.applied_transitions(), Some((0, 0)));

        restarted.send(1, 3, "bad news").await;
        assert!(eventually(|| restarted.filtered().len() == 1).await);
        assert_eq!(restarted.filtered()[0].1.body, "*** news");
        restarted.runtime.shutdown().await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_duplicate_commands_apply_once() {
        let node = TestNode::start().await;
        for _ in 0..3 {
            node.run("block --author 4 --recipient 5").await;
            node.run("deny --word ugly").await;
        }
        node.await_block(4, 5, true).await;
        node.await_denied("ugly", true).await;

        // Repeats are no-ops: one transition per table
        assert!(
            eventually(|| node.runtime.applied_transitions() == Some((1, 1))).await,
            "applied: {:?}",
            node.runtime.applied_transitions()
        );
        node.runtime.shutdown().await;
    }
}
