//! trace-core: message types, wire codec, and channel registry.
//! The reactor and tooling crates depend on this one.

pub mod channel;
pub mod config;
pub mod message;
pub mod wire;

pub use channel::{ChannelAttribute, ChannelDescriptor, ChannelId, ChannelRegistry, SPECIAL_OP_CHANNEL};
pub use message::{Message, TraceRequest, TraceResponse};
pub use wire::{hash_frame, hash_message, Codec, RequestHash, WireError, MAX_FRAME_SIZE};
