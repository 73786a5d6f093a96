//! Channel registry: which logical channels the reactor speaks on,
//! and how each one is treated.
//!
//! Built once when the reactor starts and never mutated, so it can be
//! shared across threads without locking.

use crate::config::ChannelsConfig;

/// Logical sub-stream identifier on a peer connection.
pub type ChannelId = u8;

/// Channel carrying trace requests and responses.
pub const SPECIAL_OP_CHANNEL: ChannelId = 0x50;

/// Per-channel handling flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChannelAttribute {
    /// Passed through to the router, which decides what it means.
    pub validator_only: bool,
}

/// What the transport needs to know about a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelDescriptor {
    pub id: ChannelId,
    pub priority: u32,
    pub send_queue_capacity: usize,
}

#[derive(Debug, Clone)]
struct ChannelEntry {
    descriptor: ChannelDescriptor,
    attribute: ChannelAttribute,
}

/// Insertion-ordered set of known channels.
#[derive(Debug, Clone)]
pub struct ChannelRegistry {
    entries: Vec<ChannelEntry>,
}

impl ChannelRegistry {
    /// Registry with the special-op channel at its default settings.
    pub fn new() -> Self {
        Self::from_config(&ChannelsConfig::default())
    }

    /// Registry with the special-op channel using configured priority and
    /// queue depth. The channel is always validator-only.
    pub fn from_config(config: &ChannelsConfig) -> Self {
        let mut registry = Self {
            entries: Vec::new(),
        };
        registry.insert(
            ChannelDescriptor {
                id: SPECIAL_OP_CHANNEL,
                priority: config.special_op.priority,
                send_queue_capacity: config.special_op.send_queue_capacity,
            },
            ChannelAttribute {
                validator_only: true,
            },
        );
        registry
    }

    fn insert(&mut self, descriptor: ChannelDescriptor, attribute: ChannelAttribute) {
        self.entries.push(ChannelEntry {
            descriptor,
            attribute,
        });
    }

    fn entry(&self, id: ChannelId) -> Option<&ChannelEntry> {
        self.entries.iter().find(|e| e.descriptor.id == id)
    }

    /// Attributes for a channel. Unknown channels get the untrusted default.
    pub fn attributes(&self, id: ChannelId) -> ChannelAttribute {
        self.entry(id).map(|e| e.attribute).unwrap_or_default()
    }

    pub fn is_registered(&self, id: ChannelId) -> bool {
        self.entry(id).is_some()
    }

    /// Descriptors in registration order, for advertising to the transport.
    pub fn descriptors(&self) -> Vec<ChannelDescriptor> {
        self.entries.iter().map(|e| e.descriptor).collect()
    }
}

impl Default for ChannelRegistry {
    fn default() -> Self {
        Self::new()
    }
}
