//! # End-to-End Flows
//!
//! A real coordinator runtime (TCP listener, TCP delivery, wall clock) and
//! real participant sessions, all on loopback.
//!
//! ## Flows Tested
//!
//! 1. Live fan-out reaches every online participant, sender included
//! 2. Disconnect, miss messages, reconnect on a new port, receive them in order
//! 3. Messages older than the persistence time are not replayed
//! 4. Deregistered participants receive nothing; re-registering starts fresh

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;
    use std::path::Path;
    use std::time::Duration;

    use coordinator_runtime::{CoordinatorRuntime, NodeConfig};
    use mc_02_participant::{ParticipantConfig, ParticipantSession, ReceivedMessage};
    use shared_types::ParticipantId;
    use tokio::sync::mpsc;
    use tokio::time::timeout;

    // =========================================================================
    // TEST FIXTURES
    // =========================================================================

    async fn start_coordinator(persistence_secs: u64) -> (CoordinatorRuntime, SocketAddr) {
        let mut config = NodeConfig::default();
        config.listener.bind_addr = "127.0.0.1".parse().unwrap();
        config.listener.port = 0;
        config.retention.persistence_time_secs = persistence_secs;
        config.compaction.enabled = false;

        let mut runtime = CoordinatorRuntime::new(config);
        let addr = runtime.start().await.unwrap();
        (runtime, addr)
    }

    fn participant(
        id: &str,
        coordinator: SocketAddr,
        log_dir: &Path,
    ) -> (ParticipantSession, mpsc::UnboundedReceiver<ReceivedMessage>) {
        let mut config = ParticipantConfig::new(
            ParticipantId::new(id).unwrap(),
            log_dir.join(format!("{id}.log")),
            "127.0.0.1",
            coordinator.port(),
        );
        config.bind_addr = "127.0.0.1".parse().unwrap();
        ParticipantSession::new(config)
    }

    async fn receive(inbox: &mut mpsc::UnboundedReceiver<ReceivedMessage>) -> (String, String) {
        let message = timeout(Duration::from_secs(3), inbox.recv())
            .await
            .expect("delivery within timeout")
            .expect("inbox open");
        (message.line.sender.to_string(), message.line.body)
    }

    async fn assert_silent(inbox: &mut mpsc::UnboundedReceiver<ReceivedMessage>) {
        assert!(
            timeout(Duration::from_millis(300), inbox.recv()).await.is_err(),
            "unexpected delivery"
        );
    }

    // =========================================================================
    // FLOWS
    // =========================================================================

    #[tokio::test]
    async fn test_live_fanout_includes_sender() {
        let dir = tempfile::tempdir().unwrap();
        let (runtime, coordinator) = start_coordinator(60).await;
        let (mut alice, mut alice_inbox) = participant("alice", coordinator, dir.path());
        let (mut bob, mut bob_inbox) = participant("bob", coordinator, dir.path());

        alice.register(0).await.unwrap();
        bob.register(0).await.unwrap();
        alice.msend("hello everyone".into()).await.unwrap();

        assert_eq!(
            receive(&mut alice_inbox).await,
            ("alice".into(), "hello everyone".into())
        );
        assert_eq!(
            receive(&mut bob_inbox).await,
            ("alice".into(), "hello everyone".into())
        );

        let bob_log = std::fs::read_to_string(dir.path().join("bob.log")).unwrap();
        assert!(bob_log.contains("alice: hello everyone"));

        alice.exit().await.unwrap();
        bob.exit().await.unwrap();
        runtime.shutdown().await;
    }

    #[tokio::test]
    async fn test_reconnect_replays_missed_messages_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let (runtime, coordinator) = start_coordinator(60).await;
        let (mut alice, mut alice_inbox) = participant("alice", coordinator, dir.path());
        let (mut bob, mut bob_inbox) = participant("bob", coordinator, dir.path());

        alice.register(0).await.unwrap();
        bob.register(0).await.unwrap();
        bob.disconnect().await.unwrap();

        for body in ["one", "two", "three"] {
            alice.msend(body.into()).await.unwrap();
            receive(&mut alice_inbox).await;
        }
        assert_silent(&mut bob_inbox).await;

        bob.reconnect(0).await.unwrap();
        for expected in ["one", "two", "three"] {
            assert_eq!(receive(&mut bob_inbox).await, ("alice".into(), expected.into()));
        }
        assert_silent(&mut bob_inbox).await;
        assert_silent(&mut alice_inbox).await;

        // Live traffic after the replay still arrives once.
        alice.msend("four".into()).await.unwrap();
        assert_eq!(receive(&mut bob_inbox).await, ("alice".into(), "four".into()));
        assert_silent(&mut bob_inbox).await;

        runtime.shutdown().await;
    }

    #[tokio::test]
    async fn test_messages_outside_window_are_not_replayed() {
        let dir = tempfile::tempdir().unwrap();
        let (runtime, coordinator) = start_coordinator(1).await;
        let (mut alice, mut alice_inbox) = participant("alice", coordinator, dir.path());
        let (mut bob, mut bob_inbox) = participant("bob", coordinator, dir.path());

        alice.register(0).await.unwrap();
        bob.register(0).await.unwrap();
        bob.disconnect().await.unwrap();

        alice.msend("stale".into()).await.unwrap();
        receive(&mut alice_inbox).await;
        tokio::time::sleep(Duration::from_millis(1_300)).await;
        alice.msend("fresh".into()).await.unwrap();
        receive(&mut alice_inbox).await;

        bob.reconnect(0).await.unwrap();
        assert_eq!(receive(&mut bob_inbox).await, ("alice".into(), "fresh".into()));
        assert_silent(&mut bob_inbox).await;

        runtime.shutdown().await;
    }

    #[tokio::test]
    async fn test_deregistered_participant_starts_fresh() {
        let dir = tempfile::tempdir().unwrap();
        let (runtime, coordinator) = start_coordinator(60).await;
        let (mut alice, mut alice_inbox) = participant("alice", coordinator, dir.path());
        let (mut bob, mut bob_inbox) = participant("bob", coordinator, dir.path());

        alice.register(0).await.unwrap();
        bob.register(0).await.unwrap();
        bob.deregister().await.unwrap();

        alice.msend("while bob is gone".into()).await.unwrap();
        receive(&mut alice_inbox).await;
        assert_silent(&mut bob_inbox).await;

        // Registration never replays.
        bob.register(0).await.unwrap();
        assert_silent(&mut bob_inbox).await;

        alice.msend("welcome back".into()).await.unwrap();
        assert_eq!(
            receive(&mut bob_inbox).await,
            ("alice".into(), "welcome back".into())
        );

        runtime.shutdown().await;
    }
}
