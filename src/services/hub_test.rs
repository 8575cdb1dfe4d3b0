use super::*;
use crate::frame::Data;
use uuid::Uuid;

fn connect(hub: &Hub, capacity: usize) -> (ConnId, mpsc::Receiver<Frame>) {
    let conn = Uuid::new_v4();
    let (tx, rx) = mpsc::channel(capacity);
    hub.register(conn, tx);
    (conn, rx)
}

#[test]
fn broadcast_reaches_only_room_members() {
    let hub = Hub::new();
    let (a, mut rx_a) = connect(&hub, 8);
    let (b, mut rx_b) = connect(&hub, 8);
    let (_c, mut rx_c) = connect(&hub, 8);

    hub.join("AAAA", a);
    hub.join("AAAA", b);

    hub.broadcast("AAAA", &Frame::new("clearItems", Data::new()));

    assert_eq!(rx_a.try_recv().unwrap().event, "clearItems");
    assert_eq!(rx_b.try_recv().unwrap().event, "clearItems");
    assert!(rx_c.try_recv().is_err());
}

#[test]
fn join_is_idempotent() {
    let hub = Hub::new();
    let (a, mut rx) = connect(&hub, 8);
    hub.join("AAAA", a);
    hub.join("AAAA", a);
    assert_eq!(hub.subscriber_count("AAAA"), 1);

    hub.broadcast("AAAA", &Frame::new("question", Data::new()));
    assert!(rx.try_recv().is_ok());
    assert!(rx.try_recv().is_err(), "one subscription means one delivery");
}

#[test]
fn unicast_targets_one_connection() {
    let hub = Hub::new();
    let (a, mut rx_a) = connect(&hub, 8);
    let (_b, mut rx_b) = connect(&hub, 8);

    hub.unicast(a, &Frame::new("state", Data::new()));

    assert_eq!(rx_a.try_recv().unwrap().event, "state");
    assert!(rx_b.try_recv().is_err());
}

#[test]
fn broadcast_preserves_order_per_connection() {
    let hub = Hub::new();
    let (a, mut rx) = connect(&hub, 8);
    hub.join("AAAA", a);

    hub.broadcast("AAAA", &Frame::new("question", Data::new()));
    hub.broadcast("AAAA", &Frame::new("clearItems", Data::new()));

    assert_eq!(rx.try_recv().unwrap().event, "question");
    assert_eq!(rx.try_recv().unwrap().event, "clearItems");
}

#[test]
fn full_channel_drops_without_blocking_others() {
    let hub = Hub::new();
    let (slow, mut rx_slow) = connect(&hub, 1);
    let (fast, mut rx_fast) = connect(&hub, 8);
    hub.join("AAAA", slow);
    hub.join("AAAA", fast);

    hub.broadcast("AAAA", &Frame::new("newItem", Data::new()));
    hub.broadcast("AAAA", &Frame::new("moveItem", Data::new()));

    assert_eq!(rx_slow.try_recv().unwrap().event, "newItem");
    assert!(rx_slow.try_recv().is_err());
    assert_eq!(rx_fast.try_recv().unwrap().event, "newItem");
    assert_eq!(rx_fast.try_recv().unwrap().event, "moveItem");
}

#[test]
fn closed_receiver_is_skipped() {
    let hub = Hub::new();
    let (a, rx_a) = connect(&hub, 8);
    let (b, mut rx_b) = connect(&hub, 8);
    hub.join("AAAA", a);
    hub.join("AAAA", b);
    drop(rx_a);

    hub.broadcast("AAAA", &Frame::new("newItem", Data::new()));
    assert!(rx_b.try_recv().is_ok());
}

#[test]
fn disconnect_leaves_every_group() {
    let hub = Hub::new();
    let (a, _rx_a) = connect(&hub, 8);
    let (b, _rx_b) = connect(&hub, 8);
    hub.join("AAAA", a);
    hub.join("BBBB", a);
    hub.join("BBBB", b);

    let mut left = hub.disconnect(a);
    left.sort();

    assert_eq!(left, vec!["AAAA".to_string(), "BBBB".to_string()]);
    assert_eq!(hub.subscriber_count("AAAA"), 0);
    assert_eq!(hub.subscriber_count("BBBB"), 1);
    assert_eq!(hub.connection_count(), 1);
}

#[test]
fn join_from_unregistered_connection_is_ignored() {
    let hub = Hub::new();
    hub.join("AAAA", Uuid::new_v4());
    assert_eq!(hub.subscriber_count("AAAA"), 0);
}

#[test]
fn broadcast_to_unknown_room_is_noop() {
    let hub = Hub::new();
    hub.broadcast("ZZZZ", &Frame::new("newItem", Data::new()));
    hub.unicast(Uuid::new_v4(), &Frame::new("state", Data::new()));
}
