//! Trace reactor: decodes inbound frames, asks the router, and fans out.
//!
//! Stateless across frames. Everything the protocol remembers lives in the
//! [`Router`]; everything about connections lives in the [`PeerSet`]. Every
//! failure is contained to the frame that caused it.

use std::sync::Arc;

use bytes::Bytes;

use trace_core::{
    hash_frame, ChannelDescriptor, ChannelId, ChannelRegistry, Codec, Message, WireError,
    SPECIAL_OP_CHANNEL,
};

use crate::peer::{short_key, PeerSet, PublicKey};
use crate::router::Router;

/// What happened to a frame that was handled without error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// Arrived on a channel this reactor doesn't handle.
    Ignored,
    /// The router kept the message; nothing was sent.
    Held,
    /// Request relayed to every connected peer except its source.
    /// `skipped` counts peers whose queue refused the frame.
    Broadcast { delivered: usize, skipped: usize },
    /// Response relayed toward the router's chosen peer.
    Unicast { delivered: bool },
}

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("decode failed: {0}")]
    Decode(#[from] WireError),

    #[error("router rejected {kind}: {error:#}")]
    Routing {
        kind: &'static str,
        error: anyhow::Error,
    },
}

/// Handles the special-op channel for one node.
///
/// Safe to share across threads; `receive` may run concurrently for any
/// number of frames.
pub struct Reactor {
    codec: Codec,
    channels: ChannelRegistry,
    router: Arc<dyn Router>,
    peers: Arc<dyn PeerSet>,
}

impl Reactor {
    pub fn new(
        channels: ChannelRegistry,
        router: impl Router + 'static,
        peers: impl PeerSet + 'static,
    ) -> Self {
        Self {
            codec: Codec::new(),
            channels,
            router: Arc::new(router),
            peers: Arc::new(peers),
        }
    }

    /// Channel descriptors to register with the transport.
    pub fn channels(&self) -> Vec<ChannelDescriptor> {
        self.channels.descriptors()
    }

    /// Transport hook: a peer connected. Nothing is tracked per peer.
    pub fn add_peer(&self, public_key: &PublicKey) {
        tracing::debug!(peer = short_key(public_key), "peer added");
    }

    /// Transport hook: a peer went away.
    pub fn remove_peer(&self, public_key: &PublicKey, reason: &str) {
        tracing::debug!(peer = short_key(public_key), reason, "peer removed");
    }

    /// Entry point for every inbound frame. Never fails, never panics;
    /// errors are logged and the frame is dropped.
    pub fn receive(&self, channel: ChannelId, source: &PublicKey, frame: &[u8]) {
        match self.dispatch(channel, source, frame) {
            Ok(outcome) => {
                tracing::trace!(channel, peer = short_key(source), ?outcome, "frame dispatched");
            }
            Err(DispatchError::Decode(e)) => {
                tracing::warn!(
                    channel,
                    peer = short_key(source),
                    len = frame.len(),
                    error = %e,
                    "error decoding message"
                );
            }
            Err(e) => {
                tracing::warn!(channel, peer = short_key(source), error = %e, "trace message dropped");
            }
        }
    }

    /// Same as [`receive`](Self::receive), reporting what happened.
    pub fn dispatch(
        &self,
        channel: ChannelId,
        source: &PublicKey,
        frame: &[u8],
    ) -> Result<Dispatch, DispatchError> {
        let (_, msg) = self.codec.decode(frame)?;

        match (channel, &msg) {
            (SPECIAL_OP_CHANNEL, Message::Request(req)) => {
                // Decoding is strict, so the received bytes are the canonical encoding.
                let hash = hash_frame(frame);
                let validator_only = self.channels.attributes(channel).validator_only;
                let broadcast = self
                    .router
                    .trace_request(&hash, source, &req.data, validator_only)
                    .map_err(|error| DispatchError::Routing {
                        kind: msg.kind(),
                        error,
                    })?;

                if !broadcast {
                    tracing::debug!(hash = short_key(&hash), "router held trace request");
                    return Ok(Dispatch::Held);
                }
                Ok(self.broadcast(channel, source, frame))
            }
            (SPECIAL_OP_CHANNEL, Message::Response(resp)) => {
                let destination = self
                    .router
                    .trace_respond(&resp.request_hash, &resp.resp)
                    .map_err(|error| DispatchError::Routing {
                        kind: msg.kind(),
                        error,
                    })?;

                match destination {
                    Some(key) => Ok(Dispatch::Unicast {
                        delivered: self.unicast(channel, &key, frame),
                    }),
                    None => {
                        tracing::debug!(
                            request_hash = short_key(&resp.request_hash),
                            "router held trace response"
                        );
                        Ok(Dispatch::Held)
                    }
                }
            }
            _ => {
                tracing::debug!(channel, kind = msg.kind(), "frame on unhandled channel");
                Ok(Dispatch::Ignored)
            }
        }
    }

    /// Send to every connected peer except `exclude`. One buffer is shared
    /// by every send.
    fn broadcast(&self, channel: ChannelId, exclude: &PublicKey, frame: &[u8]) -> Dispatch {
        let frame = Bytes::copy_from_slice(frame);
        let mut delivered = 0;
        let mut skipped = 0;

        for peer in self.peers.list() {
            if peer.public_key() == *exclude {
                continue;
            }
            if peer.send(channel, frame.clone()) {
                delivered += 1;
            } else {
                skipped += 1;
            }
        }

        tracing::debug!(
            channel,
            source = short_key(exclude),
            delivered,
            skipped,
            "trace request broadcast"
        );
        Dispatch::Broadcast { delivered, skipped }
    }

    /// Send to the peer holding `destination`, if it is connected.
    fn unicast(&self, channel: ChannelId, destination: &[u8], frame: &[u8]) -> bool {
        let peer = PublicKey::try_from(destination)
            .ok()
            .and_then(|key| self.peers.get(&key));

        let Some(peer) = peer else {
            tracing::debug!(peer = short_key(destination), "response destination not connected");
            return false;
        };

        let sent = peer.send(channel, Bytes::copy_from_slice(frame));
        if sent {
            tracing::debug!(channel, peer = short_key(destination), "trace response relayed");
        }
        sent
    }
}
