//! End-to-end fan-out scenarios for the registry and router.

use std::sync::Arc;

use chirp_realtime::{BroadcastRouter, ConnectionRegistry, OutboundEvent};
use tokio::sync::mpsc;

const QUEUE: usize = 256;

fn setup() -> (Arc<ConnectionRegistry>, BroadcastRouter) {
    let registry = Arc::new(ConnectionRegistry::new(1024));
    let router = BroadcastRouter::new(Arc::clone(&registry));
    (registry, router)
}

#[tokio::test]
async fn broadcast_reaches_every_registered_connection() {
    let (registry, router) = setup();

    let mut receivers = Vec::new();
    let mut sender_id = None;
    for _ in 0..5 {
        let (tx, rx) = mpsc::channel::<OutboundEvent>(QUEUE);
        let id = registry.register(tx).unwrap();
        sender_id.get_or_insert(id);
        receivers.push(rx);
    }

    let report = router.broadcast(sender_id.unwrap(), "hello all");
    assert_eq!(report.delivered, 5);
    assert_eq!(report.skipped, 0);

    for rx in &mut receivers {
        assert_eq!(rx.recv().await.unwrap().payload, "hello all");
    }
}

#[tokio::test]
async fn disconnected_peer_never_receives_later_broadcasts() {
    let (registry, router) = setup();

    // connect A, connect B, A broadcasts "hi" -> both receive
    let (tx_a, mut rx_a) = mpsc::channel(QUEUE);
    let (tx_b, mut rx_b) = mpsc::channel(QUEUE);
    let a = registry.register(tx_a).unwrap();
    let b = registry.register(tx_b).unwrap();

    router.broadcast(a, "hi");
    assert_eq!(rx_a.recv().await.unwrap().payload, "hi");
    assert_eq!(rx_b.recv().await.unwrap().payload, "hi");

    // B disconnects; A broadcasts "bye" -> only A receives
    registry.unregister(&b);
    drop(rx_b);

    let report = router.broadcast(a, "bye");
    assert_eq!(report.delivered, 1);
    assert_eq!(rx_a.recv().await.unwrap().payload, "bye");
}

#[tokio::test]
async fn broadcast_with_empty_registry_is_a_no_op() {
    let (registry, router) = setup();

    // Register then unregister so the sender itself is gone too
    let (tx, rx) = mpsc::channel(QUEUE);
    let id = registry.register(tx).unwrap();
    registry.unregister(&id);
    drop(rx);

    let report = router.broadcast(id, "into the void");
    assert_eq!(report.delivered, 0);
    assert_eq!(report.skipped, 0);
    assert_eq!(registry.connection_count(), 0);
}

#[tokio::test]
async fn unregister_of_unknown_id_is_a_no_op() {
    let (registry, _router) = setup();

    let (tx, _rx) = mpsc::channel(QUEUE);
    let id = registry.register(tx).unwrap();
    assert!(registry.unregister(&id).is_some());

    // Second and third removals of the same id are not errors
    assert!(registry.unregister(&id).is_none());
    assert!(registry.unregister(&id).is_none());
}

#[tokio::test]
async fn sender_messages_arrive_in_issue_order() {
    let (registry, router) = setup();

    let (tx_a, _rx_a) = mpsc::channel(QUEUE);
    let (tx_b, mut rx_b) = mpsc::channel(QUEUE);
    let a = registry.register(tx_a).unwrap();
    let _b = registry.register(tx_b).unwrap();

    for n in 0..10 {
        router.broadcast(a, &format!("msg-{n}"));
    }

    for n in 0..10 {
        assert_eq!(rx_b.recv().await.unwrap().payload, format!("msg-{n}"));
    }
}
