//! Peer set: the transport capabilities the reactor relies on.
//!
//! The reactor never owns connections. It asks a [`PeerSet`] for a snapshot
//! of who is connected and hands frames to each [`Peer`]'s send queue.
//! [`PeerRegistry`] is an in-process implementation backed by bounded
//! per-channel queues, used by tests and tooling.

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use dashmap::DashMap;
use tokio::sync::mpsc::{self, error::TrySendError};

use trace_core::{ChannelDescriptor, ChannelId};

/// Ed25519 public key identifying a peer.
pub type PublicKey = [u8; 32];

/// First eight bytes of a key, hex-encoded, for log fields.
pub fn short_key(key: &[u8]) -> String {
    hex::encode(&key[..key.len().min(8)])
}

/// A connected peer, as seen by the reactor.
pub trait Peer: Send + Sync {
    fn public_key(&self) -> PublicKey;

    /// Queue a frame for delivery on `channel`. Never blocks.
    ///
    /// Returns false if the frame was not queued (queue full, channel not
    /// open, or peer gone). The caller does not retry.
    fn send(&self, channel: ChannelId, frame: Bytes) -> bool;
}

/// The live set of connected peers, owned by the transport.
pub trait PeerSet: Send + Sync {
    /// Snapshot of currently connected peers.
    fn list(&self) -> Vec<Arc<dyn Peer>>;

    fn get(&self, public_key: &PublicKey) -> Option<Arc<dyn Peer>>;
}

// ── In-process registry ───────────────────────────────────────────────────────

struct ConnectedPeer {
    public_key: PublicKey,
    queues: HashMap<ChannelId, mpsc::Sender<Bytes>>,
}

impl Peer for ConnectedPeer {
    fn public_key(&self) -> PublicKey {
        self.public_key
    }

    fn send(&self, channel: ChannelId, frame: Bytes) -> bool {
        let Some(queue) = self.queues.get(&channel) else {
            tracing::debug!(
                peer = short_key(&self.public_key),
                channel,
                "channel not open on peer"
            );
            return false;
        };
        let len = frame.len();
        match queue.try_send(frame) {
            Ok(()) => {
                tracing::trace!(peer = short_key(&self.public_key), channel, len, "frame queued");
                true
            }
            Err(TrySendError::Full(_)) => {
                tracing::warn!(
                    peer = short_key(&self.public_key),
                    channel,
                    "send queue full, dropping frame"
                );
                false
            }
            Err(TrySendError::Closed(_)) => {
                tracing::debug!(peer = short_key(&self.public_key), channel, "peer inbox closed");
                false
            }
        }
    }
}

/// Concurrent peer registry keyed on public key.
///
/// Cloning shares the same underlying map.
#[derive(Clone, Default)]
pub struct PeerRegistry {
    peers: Arc<DashMap<PublicKey, Arc<ConnectedPeer>>>,
}

impl PeerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a peer with one bounded queue per advertised channel.
    ///
    /// Reconnecting an existing key replaces it; the previous inbox stops
    /// receiving.
    pub fn connect(&self, public_key: PublicKey, channels: &[ChannelDescriptor]) -> PeerInbox {
        let mut senders = HashMap::new();
        let mut receivers = HashMap::new();
        for desc in channels {
            // tokio panics on a zero-capacity channel
            let (tx, rx) = mpsc::channel(desc.send_queue_capacity.max(1));
            senders.insert(desc.id, tx);
            receivers.insert(desc.id, rx);
        }

        self.peers.insert(
            public_key,
            Arc::new(ConnectedPeer {
                public_key,
                queues: senders,
            }),
        );
        tracing::debug!(peer = short_key(&public_key), "peer connected");

        PeerInbox {
            public_key,
            queues: receivers,
        }
    }

    /// Remove a peer. Returns false if it wasn't connected.
    pub fn disconnect(&self, public_key: &PublicKey) -> bool {
        let removed = self.peers.remove(public_key).is_some();
        if removed {
            tracing::debug!(peer = short_key(public_key), "peer disconnected");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }
}

impl PeerSet for PeerRegistry {
    fn list(&self) -> Vec<Arc<dyn Peer>> {
        self.peers
            .iter()
            .map(|entry| entry.value().clone() as Arc<dyn Peer>)
            .collect()
    }

    fn get(&self, public_key: &PublicKey) -> Option<Arc<dyn Peer>> {
        self.peers
            .get(public_key)
            .map(|entry| entry.value().clone() as Arc<dyn Peer>)
    }
}

/// Receiving side of a registered peer's queues.
pub struct PeerInbox {
    public_key: PublicKey,
    queues: HashMap<ChannelId, mpsc::Receiver<Bytes>>,
}

impl PeerInbox {
    pub fn public_key(&self) -> PublicKey {
        self.public_key
    }

    /// Next queued frame on `channel`, if any.
    pub fn try_recv(&mut self, channel: ChannelId) -> Option<Bytes> {
        self.queues.get_mut(&channel)?.try_recv().ok()
    }

    /// Wait for the next frame on `channel`. None once the peer is gone.
    pub async fn recv(&mut self, channel: ChannelId) -> Option<Bytes> {
        self.queues.get_mut(&channel)?.recv().await
    }

    /// Everything currently queued on `channel`.
    pub fn drain(&mut self, channel: ChannelId) -> Vec<Bytes> {
        std::iter::from_fn(|| self.try_recv(channel)).collect()
    }
}
