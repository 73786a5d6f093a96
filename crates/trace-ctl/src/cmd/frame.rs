//! Frame inspection commands: decode, encode, hash.

use anyhow::{Context, Result};
use serde::Serialize;

use trace_core::{hash_message, ChannelRegistry, Codec, Message, TraceRequest, TraceResponse};

use super::parse_hex;

#[derive(Serialize)]
struct DecodedFrame {
    tag: String,
    len: usize,
    message: Message,
    hash: String,
}

fn decode_frame(frame_hex: &str) -> Result<(u8, Message, usize)> {
    let bytes = parse_hex(frame_hex)?;
    let (tag, message) = Codec::new().decode(&bytes).context("frame did not decode")?;
    Ok((tag, message, bytes.len()))
}

fn render_decode(frame_hex: &str) -> Result<String> {
    let (tag, message, len) = decode_frame(frame_hex)?;
    let out = DecodedFrame {
        tag: format!("0x{tag:02x}"),
        len,
        hash: hex::encode(hash_message(&message)),
        message,
    };
    Ok(serde_json::to_string_pretty(&out)?)
}

fn render_encode_request(data_hex: &str) -> Result<String> {
    let msg = Message::from(TraceRequest::new(parse_hex(data_hex)?));
    Ok(hex::encode(msg.encode()))
}

fn render_encode_response(hash_hex: &str, resp_hex: &str) -> Result<String> {
    let msg = Message::from(TraceResponse::new(parse_hex(hash_hex)?, parse_hex(resp_hex)?));
    Ok(hex::encode(msg.encode()))
}

fn render_hash(frame_hex: &str) -> Result<String> {
    let (_, message, _) = decode_frame(frame_hex)?;
    Ok(hex::encode(hash_message(&message)))
}

pub fn cmd_decode(frame_hex: &str) -> Result<()> {
    println!("{}", render_decode(frame_hex)?);
    Ok(())
}

pub fn cmd_encode_request(data_hex: &str) -> Result<()> {
    println!("{}", render_encode_request(data_hex)?);
    Ok(())
}

pub fn cmd_encode_response(hash_hex: &str, resp_hex: &str) -> Result<()> {
    println!("{}", render_encode_response(hash_hex, resp_hex)?);
    Ok(())
}

pub fn cmd_hash(frame_hex: &str) -> Result<()> {
    println!("{}", render_hash(frame_hex)?);
    Ok(())
}

pub fn cmd_channels(registry: &ChannelRegistry) -> Result<()> {
    println!("═══════════════════════════════════════");
    println!("  Channels");
    println!("═══════════════════════════════════════");
    for desc in registry.descriptors() {
        let attr = registry.attributes(desc.id);
        println!("  ┌─ 0x{:02x}", desc.id);
        println!("  │  priority       : {}", desc.priority);
        println!("  │  send queue     : {}", desc.send_queue_capacity);
        println!("  └─ validator only : {}", attr.validator_only);
    }
    Ok(())
}
