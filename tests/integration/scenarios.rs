use std::sync::Arc;

use trace_core::{hash_message, Message, TraceRequest, SPECIAL_OP_CHANNEL};
use trace_reactor::Dispatch;

use crate::*;

/// P1 sends a request, the router says broadcast: only P2 and P3 hear it.
#[test]
fn test_request_broadcast_skips_sender() {
    let mut node = Node::new(FnRouter::broadcast_all(), &[P1, P2, P3]);
    let frame = request(b"ping");

    node.reactor.receive(SPECIAL_OP_CHANNEL, &P1, &frame);

    let sent = node.sent();
    assert!(sent[&P1].is_empty());
    assert_eq!(sent[&P2], vec![Bytes::from(frame.clone())]);
    assert_eq!(sent[&P3], vec![Bytes::from(frame.clone())]);
    assert_eq!(
        decode(&sent[&P2][0]),
        Message::from(TraceRequest::new(b"ping".to_vec()))
    );
}

/// The router declines to broadcast: nobody hears anything.
#[test]
fn test_held_request_is_silent() {
    let router = Arc::new(FnRouter::new(|_, _, _, _| Ok(false), |_, _| Ok(None)));
    let mut node = Node::new(router.clone(), &[P1, P2, P3]);

    node.reactor.receive(SPECIAL_OP_CHANNEL, &P1, &request(b"ping"));

    assert_eq!(router.call_count(), 1);
    assert!(node.recipients().is_empty());
}

/// A response is relayed only to the peer the router names.
#[test]
fn test_response_reaches_only_destination() {
    let mut node = Node::new(FnRouter::reply_to(P2), &[P1, P2, P3]);
    let hash = hash_message(&Message::from(TraceRequest::new(b"ping".to_vec())));
    let frame = response(&hash, b"pong");

    node.reactor.receive(SPECIAL_OP_CHANNEL, &P1, &frame);

    let sent = node.sent();
    assert_eq!(sent[&P2], vec![Bytes::from(frame)]);
    assert!(sent[&P1].is_empty());
    assert!(sent[&P3].is_empty());
}

/// Same response, but the destination has gone away: nothing is sent
/// and the call still returns normally.
#[test]
fn test_response_to_disconnected_destination_is_dropped() {
    let mut node = Node::new(FnRouter::reply_to(P2), &[P1, P2, P3]);
    assert!(node.registry.disconnect(&P2));

    let outcome = node
        .reactor
        .dispatch(SPECIAL_OP_CHANNEL, &P1, &response(&[0xaa; 32], b"pong"))
        .unwrap();

    assert_eq!(outcome, Dispatch::Unicast { delivered: false });
    assert!(node.recipients().is_empty());
}

/// An unregistered tag never reaches the router and produces no traffic.
#[test]
fn test_unregistered_tag_has_no_effect() {
    let router = Arc::new(FnRouter::broadcast_all());
    let mut node = Node::new(router.clone(), &[P1, P2, P3]);

    node.reactor.receive(SPECIAL_OP_CHANNEL, &P1, &[0xff, 0x01, 0x04, b'p', b'i', b'n', b'g']);

    assert_eq!(router.call_count(), 0);
    assert!(node.recipients().is_empty());
}

/// The router gets the request hash, the sender's key, the raw payload,
/// and the channel's validator-only flag.
#[test]
fn test_router_receives_request_context() {
    let expected = hash_message(&Message::from(TraceRequest::new(b"ping".to_vec())));
    let router = FnRouter::new(
        move |hash, source, payload, validator_only| {
            assert_eq!(hash, expected.as_slice());
            assert_eq!(source, P1.as_slice());
            assert_eq!(payload, b"ping");
            assert!(validator_only);
            Ok(true)
        },
        |_, _| Ok(None),
    );
    let mut node = Node::new(router, &[P1, P2]);

    let outcome = node.reactor.dispatch(SPECIAL_OP_CHANNEL, &P1, &request(b"ping")).unwrap();
    assert_eq!(outcome, Dispatch::Broadcast { delivered: 1, skipped: 0 });
    assert_eq!(node.recipients(), vec![P2]);
}
