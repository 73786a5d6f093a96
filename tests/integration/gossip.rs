//! Multi-hop: three nodes in a line, X, Y, Z, each with its own reactor
//! and a router that leaves breadcrumbs. A request from X floods outward;
//! Z's response retraces the breadcrumbs back to X.

use std::sync::Arc;

use trace_core::{hash_message, Message, TraceRequest, SPECIAL_OP_CHANNEL};
use trace_reactor::{Dispatch, DispatchError};

use crate::*;

const KX: PublicKey = [0x0a; 32];
const KY: PublicKey = [0x0b; 32];
const KZ: PublicKey = [0x0c; 32];

struct Line {
    y: Node,
    z: Node,
}

fn line() -> Line {
    Line {
        y: Node::new(BreadcrumbRouter::default(), &[KX, KZ]),
        z: Node::new(BreadcrumbRouter::default(), &[KY]),
    }
}

#[test]
fn test_request_floods_and_response_retraces() {
    let mut net = line();
    let req = request(b"where is the leader?");

    // X → Y: Y remembers X and floods to Z only.
    let outcome = net.y.reactor.dispatch(SPECIAL_OP_CHANNEL, &KX, &req).unwrap();
    assert_eq!(outcome, Dispatch::Broadcast { delivered: 1, skipped: 0 });
    let mut to_z = net.y.sent().remove(&KZ).unwrap();
    assert_eq!(to_z.len(), 1);

    // Y → Z: Z remembers Y; Y is its only peer and is the source, so the
    // flood stops here.
    let forwarded = to_z.remove(0);
    let outcome = net.z.reactor.dispatch(SPECIAL_OP_CHANNEL, &KY, &forwarded).unwrap();
    assert_eq!(outcome, Dispatch::Broadcast { delivered: 0, skipped: 0 });

    // Z answers. The response quotes the hash every hop computed.
    let hash = hash_message(&Message::from(TraceRequest::new(b"where is the leader?".to_vec())));
    let resp = response(&hash, b"node 7");

    // Z → Y: Y relays to X, who it heard the request from.
    let outcome = net.y.reactor.dispatch(SPECIAL_OP_CHANNEL, &KZ, &resp).unwrap();
    assert_eq!(outcome, Dispatch::Unicast { delivered: true });
    let sent = net.y.sent();
    assert_eq!(sent[&KX], vec![Bytes::from(resp)]);
    assert!(sent[&KZ].is_empty());
}

#[test]
fn test_duplicate_request_is_not_reflooded() {
    let mut net = line();
    let req = request(b"once");

    net.y.reactor.receive(SPECIAL_OP_CHANNEL, &KX, &req);
    assert_eq!(net.y.recipients(), vec![KZ]);

    // Same request coming back around from Z.
    let outcome = net.y.reactor.dispatch(SPECIAL_OP_CHANNEL, &KZ, &req).unwrap();
    assert_eq!(outcome, Dispatch::Held);
    assert!(net.y.recipients().is_empty());
}

#[test]
fn test_response_for_unknown_request_is_rejected() {
    let mut net = line();
    let err = net
        .y
        .reactor
        .dispatch(SPECIAL_OP_CHANNEL, &KZ, &response(&[0x77; 32], b"stray"))
        .unwrap_err();
    assert!(matches!(err, DispatchError::Routing { kind: "trace_response", .. }));
    assert!(net.y.recipients().is_empty());
}

#[test]
fn test_response_after_origin_leaves_is_dropped() {
    let mut net = line();
    let req = request(b"short-lived");
    net.y.reactor.receive(SPECIAL_OP_CHANNEL, &KX, &req);
    net.y.sent();

    net.y.registry.disconnect(&KX);
    net.y.reactor.remove_peer(&KX, "connection reset");

    let hash = hash_message(&Message::from(TraceRequest::new(b"short-lived".to_vec())));
    let outcome = net
        .y
        .reactor
        .dispatch(SPECIAL_OP_CHANNEL, &KZ, &response(&hash, b"late"))
        .unwrap();
    assert_eq!(outcome, Dispatch::Unicast { delivered: false });

    // X reconnects: a later response for the same request finds it again.
    net.y.connect(KX);
    net.y.reactor.add_peer(&KX);
    net.y.reactor.receive(SPECIAL_OP_CHANNEL, &KZ, &response(&hash, b"later"));
    assert_eq!(net.y.recipients(), vec![KX]);
}

#[test]
fn test_shared_router_sees_every_hop() {
    let router = Arc::new(FnRouter::broadcast_all());
    let mut y = Node::new(router.clone(), &[KX, KZ]);
    let mut z = Node::new(router.clone(), &[KY]);

    y.reactor.receive(SPECIAL_OP_CHANNEL, &KX, &request(b"hop"));
    for frame in y.sent().remove(&KZ).unwrap() {
        z.reactor.receive(SPECIAL_OP_CHANNEL, &KY, &frame);
    }

    assert_eq!(router.call_count(), 2);
    assert!(z.recipients().is_empty());
}
