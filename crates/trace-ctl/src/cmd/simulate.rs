//! Dry-run a frame through the reactor against an in-memory peer set.

use anyhow::{bail, Result};

use trace_core::{ChannelId, ChannelRegistry};
use trace_reactor::{Dispatch, PeerInbox, PeerRegistry, PublicKey, Reactor, Router};

use super::parse_hex;

/// Options for `simulate`.
#[derive(Debug, Clone)]
pub struct SimulateOpts {
    pub peers: usize,
    pub source: usize,
    pub channel: ChannelId,
    pub hold: bool,
    pub reply_to: Option<usize>,
}

/// Router that gives the same answer to everything.
struct StaticRouter {
    broadcast: bool,
    reply_to: Option<PublicKey>,
}

impl Router for StaticRouter {
    fn trace_request(
        &self,
        hash: &[u8],
        _source: &[u8],
        _payload: &[u8],
        validator_only: bool,
    ) -> Result<bool> {
        tracing::info!(
            hash = hex::encode(hash),
            validator_only,
            broadcast = self.broadcast,
            "router consulted for request"
        );
        Ok(self.broadcast)
    }

    fn trace_respond(&self, request_hash: &[u8], _payload: &[u8]) -> Result<Option<Vec<u8>>> {
        tracing::info!(
            request_hash = hex::encode(request_hash),
            reply_to = ?self.reply_to.map(hex::encode),
            "router consulted for response"
        );
        Ok(self.reply_to.map(|k| k.to_vec()))
    }
}

/// Simulated peers get keys 0x01.., 0x02.., so index i is `[i + 1; 32]`.
fn peer_key(index: usize) -> PublicKey {
    [(index + 1) as u8; 32]
}

pub fn cmd_simulate(registry: ChannelRegistry, opts: &SimulateOpts, frame_hex: &str) -> Result<()> {
    if opts.peers == 0 || opts.peers > 255 {
        bail!("--peers must be between 1 and 255");
    }
    if opts.source >= opts.peers {
        bail!("--source {} is out of range for {} peers", opts.source, opts.peers);
    }
    if let Some(r) = opts.reply_to {
        if r >= opts.peers {
            bail!("--reply-to {} is out of range for {} peers", r, opts.peers);
        }
    }

    let frame = parse_hex(frame_hex)?;
    let peers = PeerRegistry::new();
    let mut inboxes: Vec<PeerInbox> = (0..opts.peers)
        .map(|i| peers.connect(peer_key(i), &registry.descriptors()))
        .collect();

    let router = StaticRouter {
        broadcast: !opts.hold,
        reply_to: opts.reply_to.map(peer_key),
    };
    let reactor = Reactor::new(registry, router, peers);
    let source = peer_key(opts.source);

    let outcome = reactor.dispatch(opts.channel, &source, &frame);

    println!("═══════════════════════════════════════");
    println!("  Simulated dispatch");
    println!("═══════════════════════════════════════");
    println!("  channel : 0x{:02x}", opts.channel);
    println!("  source  : peer {}", opts.source);
    match &outcome {
        Ok(Dispatch::Ignored) => println!("  outcome : ignored (unhandled channel)"),
        Ok(Dispatch::Held) => println!("  outcome : held by router"),
        Ok(Dispatch::Broadcast { delivered, skipped }) => {
            println!("  outcome : broadcast ({delivered} delivered, {skipped} skipped)")
        }
        Ok(Dispatch::Unicast { delivered }) => {
            println!("  outcome : unicast (delivered: {delivered})")
        }
        Err(e) => println!("  outcome : dropped: {e}"),
    }

    println!();
    for (i, inbox) in inboxes.iter_mut().enumerate() {
        let frames = inbox.drain(opts.channel);
        let marker = if i == opts.source { " (source)" } else { "" };
        println!("  peer {i}{marker}: {} frame(s)", frames.len());
    }

    Ok(())
}
