//! Trace protocol messages.
//!
//! Two message kinds travel on the special-op channel: a request that is
//! gossiped outward through the network, and a response that is routed back
//! hop by hop toward whoever issued the request.

use serde::{Deserialize, Serialize};

/// Type tag for [`TraceRequest`] frames.
pub const TAG_TRACE_REQUEST: u8 = 0x11;

/// Type tag for [`TraceResponse`] frames.
pub const TAG_TRACE_RESPONSE: u8 = 0x12;

/// A request to be propagated through the network.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TraceRequest {
    /// Opaque application payload. The dispatcher never inspects it.
    #[serde(with = "hex_serde")]
    pub data: Vec<u8>,
}

/// A reply to an earlier [`TraceRequest`], correlated by its hash.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TraceResponse {
    /// Hash of the request being answered, as computed by the codec.
    /// Carried as a byte string so peers with a different digest width
    /// still decode cleanly; the router decides whether it matches.
    #[serde(with = "hex_serde")]
    pub request_hash: Vec<u8>,

    /// Opaque response payload.
    #[serde(with = "hex_serde")]
    pub resp: Vec<u8>,
}

/// Every message that can appear in a trace frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Message {
    Request(TraceRequest),
    Response(TraceResponse),
}

impl Message {
    /// The single-byte discriminant written at the front of the frame.
    pub fn type_tag(&self) -> u8 {
        match self {
            Message::Request(_) => TAG_TRACE_REQUEST,
            Message::Response(_) => TAG_TRACE_RESPONSE,
        }
    }

    /// Human-readable variant name for logs and tooling.
    pub fn kind(&self) -> &'static str {
        match self {
            Message::Request(_) => "trace_request",
            Message::Response(_) => "trace_response",
        }
    }
}

impl From<TraceRequest> for Message {
    fn from(req: TraceRequest) -> Self {
        Message::Request(req)
    }
}

impl From<TraceResponse> for Message {
    fn from(resp: TraceResponse) -> Self {
        Message::Response(resp)
    }
}

impl TraceRequest {
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        Self { data: data.into() }
    }
}

impl TraceResponse {
    pub fn new(request_hash: impl Into<Vec<u8>>, resp: impl Into<Vec<u8>>) -> Self {
        Self {
            request_hash: request_hash.into(),
            resp: resp.into(),
        }
    }
}

mod hex_serde {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        hex::decode(&s).map_err(serde::de::Error::custom)
    }
}
