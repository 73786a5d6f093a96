//! Router trait: the routing authority the reactor consults.
//!
//! The router owns all protocol state for in-flight traces: which request
//! hashes it has seen, who asked, and whether a request may travel further.
//! The reactor only asks and obeys.

use std::sync::Arc;

use anyhow::Result;

/// Decides the fate of every trace message the reactor decodes.
///
/// Called concurrently from any thread delivering frames. An `Err` means
/// the message is dropped with no broadcast and no reply.
pub trait Router: Send + Sync {
    /// A request arrived from `source`.
    ///
    /// `hash` is the request's content hash and is what a later response
    /// will quote back. Return `true` to have the request broadcast to
    /// every other connected peer.
    fn trace_request(
        &self,
        hash: &[u8],
        source: &[u8],
        payload: &[u8],
        validator_only: bool,
    ) -> Result<bool>;

    /// A response arrived for the request with `request_hash`.
    ///
    /// Return the public key of the peer the response should be relayed
    /// to, or `None` to keep it.
    fn trace_respond(&self, request_hash: &[u8], payload: &[u8]) -> Result<Option<Vec<u8>>>;
}

impl<R: Router + ?Sized> Router for Arc<R> {
    fn trace_request(
        &self,
        hash: &[u8],
        source: &[u8],
        payload: &[u8],
        validator_only: bool,
    ) -> Result<bool> {
        (**self).trace_request(hash, source, payload, validator_only)
    }

    fn trace_respond(&self, request_hash: &[u8], payload: &[u8]) -> Result<Option<Vec<u8>>> {
        (**self).trace_respond(request_hash, payload)
    }
}
