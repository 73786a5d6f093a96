//! trace-reactor: routes trace frames between peers.
//!
//! The reactor sits between a peer-to-peer transport and a router. The
//! transport hands it frames; the router decides what each one should do;
//! the reactor carries that decision out against the live peer set.

pub mod peer;
pub mod reactor;
pub mod router;

pub use peer::{short_key, Peer, PeerInbox, PeerRegistry, PeerSet, PublicKey};
pub use reactor::{Dispatch, DispatchError, Reactor};
pub use router::Router;
