//! Trace wire format: framing, decoding, and request hashing.
//!
//! These bytes ARE the protocol. Every peer hashes requests over exactly this
//! encoding, so changing the layout changes every request hash in flight.
//!
//! ```text
//! frame      = tag:u8 || body
//! bytes      = uvarint(len) || raw bytes
//! uvarint(n) = width:u8 (0..=8) || n as `width` big-endian bytes
//! ```
//!
//! A uvarint never carries a leading zero byte; zero is the single byte 0x00.
//! Decoding is strict about this (and about trailing bytes) so that any frame
//! the codec accepts re-encodes to the identical bytes.

use std::collections::BTreeMap;

use sha2::{Digest, Sha256};

use crate::message::{Message, TraceRequest, TraceResponse, TAG_TRACE_REQUEST, TAG_TRACE_RESPONSE};

// ── Constants ─────────────────────────────────────────────────────────────────

/// Largest frame accepted from a peer, tag byte included.
pub const MAX_FRAME_SIZE: usize = 1_048_576;

/// Widest length prefix: a u64 in eight big-endian bytes.
const MAX_VARINT_WIDTH: u8 = 8;

/// SHA-256 digest of a message's full tagged encoding.
pub type RequestHash = [u8; 32];

// ── Codec ─────────────────────────────────────────────────────────────────────

type DecodeFn = fn(&mut FrameReader<'_>) -> Result<Message, WireError>;

/// Frame codec with an explicit tag → decoder table.
///
/// Built once and shared; decoding is read-only and safe from any thread.
#[derive(Clone)]
pub struct Codec {
    decoders: BTreeMap<u8, DecodeFn>,
}

impl Codec {
    /// Codec that understands trace requests (0x11) and trace responses (0x12).
    pub fn new() -> Self {
        let mut codec = Self {
            decoders: BTreeMap::new(),
        };
        codec.register(TAG_TRACE_REQUEST, decode_request);
        codec.register(TAG_TRACE_RESPONSE, decode_response);
        codec
    }

    fn register(&mut self, tag: u8, decoder: DecodeFn) {
        self.decoders.insert(tag, decoder);
    }

    /// Registered type tags, ascending.
    pub fn tags(&self) -> Vec<u8> {
        self.decoders.keys().copied().collect()
    }

    /// Decode one frame into its tag and message.
    pub fn decode(&self, bytes: &[u8]) -> Result<(u8, Message), WireError> {
        let Some(&tag) = bytes.first() else {
            return Err(WireError::EmptyFrame);
        };
        if bytes.len() > MAX_FRAME_SIZE {
            return Err(WireError::FrameTooLarge(bytes.len()));
        }

        let decoder = self.decoders.get(&tag).ok_or(WireError::UnknownTag(tag))?;
        let mut reader = FrameReader::new(&bytes[1..]);
        let msg = decoder(&mut reader)?;
        reader.finish()?;

        Ok((tag, msg))
    }

    pub fn encode(&self, msg: &Message) -> Vec<u8> {
        msg.encode()
    }

    pub fn hash(&self, msg: &Message) -> RequestHash {
        hash_message(msg)
    }
}

impl Default for Codec {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Codec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Codec").field("tags", &self.tags()).finish()
    }
}

/// Hash a message over its canonical tagged encoding.
///
/// The tag is part of the digest, so a request and a response with identical
/// field bytes never collide.
pub fn hash_message(msg: &Message) -> RequestHash {
    hash_frame(&msg.encode())
}

/// Hash frame bytes directly. For any frame [`Codec::decode`] accepts this
/// equals [`hash_message`] of the decoded message.
pub fn hash_frame(frame: &[u8]) -> RequestHash {
    Sha256::digest(frame).into()
}

// ── Encoding ──────────────────────────────────────────────────────────────────

impl Message {
    /// Canonical frame bytes: tag followed by the variant's fields.
    pub fn encode(&self) -> Vec<u8> {
        match self {
            Message::Request(req) => {
                let mut out = Vec::with_capacity(1 + 9 + req.data.len());
                out.push(TAG_TRACE_REQUEST);
                put_bytes(&mut out, &req.data);
                out
            }
            Message::Response(resp) => {
                let mut out =
                    Vec::with_capacity(1 + 18 + resp.request_hash.len() + resp.resp.len());
                out.push(TAG_TRACE_RESPONSE);
                put_bytes(&mut out, &resp.request_hash);
                put_bytes(&mut out, &resp.resp);
                out
            }
        }
    }
}

fn put_uvarint(out: &mut Vec<u8>, n: u64) {
    let digits = n.to_be_bytes();
    let skip = digits.iter().take_while(|b| **b == 0).count();
    out.push((digits.len() - skip) as u8);
    out.extend_from_slice(&digits[skip..]);
}

fn put_bytes(out: &mut Vec<u8>, bytes: &[u8]) {
    put_uvarint(out, bytes.len() as u64);
    out.extend_from_slice(bytes);
}

// ── Decoding ──────────────────────────────────────────────────────────────────

fn decode_request(r: &mut FrameReader<'_>) -> Result<Message, WireError> {
    let data = r.read_bytes()?;
    Ok(Message::Request(TraceRequest { data }))
}

fn decode_response(r: &mut FrameReader<'_>) -> Result<Message, WireError> {
    let request_hash = r.read_bytes()?;
    let resp = r.read_bytes()?;
    Ok(Message::Response(TraceResponse { request_hash, resp }))
}

/// Cursor over a frame body. Every read is bounds-checked.
struct FrameReader<'a> {
    buf: &'a [u8],
}

impl<'a> FrameReader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], WireError> {
        if n > self.buf.len() {
            return Err(WireError::Truncated {
                needed: n,
                remaining: self.buf.len(),
            });
        }
        let (head, tail) = self.buf.split_at(n);
        self.buf = tail;
        Ok(head)
    }

    fn read_uvarint(&mut self) -> Result<u64, WireError> {
        let width = self.take(1)?[0];
        if width > MAX_VARINT_WIDTH {
            return Err(WireError::VarintOverflow(width));
        }
        let digits = self.take(width as usize)?;
        if digits.first() == Some(&0) {
            return Err(WireError::NonCanonicalVarint);
        }
        Ok(digits.iter().fold(0u64, |n, b| (n << 8) | u64::from(*b)))
    }

    fn read_bytes(&mut self) -> Result<Vec<u8>, WireError> {
        let len = self.read_uvarint()?;
        // A length that doesn't fit in usize can't fit in the buffer either.
        let len = usize::try_from(len).unwrap_or(usize::MAX);
        Ok(self.take(len)?.to_vec())
    }

    fn finish(self) -> Result<(), WireError> {
        if self.buf.is_empty() {
            Ok(())
        } else {
            Err(WireError::TrailingBytes(self.buf.len()))
        }
    }
}

// ── Errors ────────────────────────────────────────────────────────────────────

/// Errors that can arise when decoding a frame.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WireError {
    #[error("frame of {0} bytes exceeds maximum {}", MAX_FRAME_SIZE)]
    FrameTooLarge(usize),

    #[error("empty frame")]
    EmptyFrame,

    #[error("unknown message tag: 0x{0:02x}")]
    UnknownTag(u8),

    #[error("truncated body: needed {needed} bytes, {remaining} remaining")]
    Truncated { needed: usize, remaining: usize },

    #[error("length prefix width {0} exceeds 8 bytes")]
    VarintOverflow(u8),

    #[error("length prefix has a leading zero byte")]
    NonCanonicalVarint,

    #[error("{0} trailing bytes after message body")]
    TrailingBytes(usize),
}

impl WireError {
    /// True for everything except an oversized frame: unknown tags and
    /// corrupt bodies alike.
    pub fn is_malformed(&self) -> bool {
        !matches!(self, WireError::FrameTooLarge(_))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
