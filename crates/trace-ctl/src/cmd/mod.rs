//! CLI command modules.

pub mod config;
pub mod frame;
pub mod simulate;

use anyhow::{Context, Result};

/// Parse a hex argument, tolerating a `0x` prefix and surrounding whitespace.
pub fn parse_hex(arg: &str) -> Result<Vec<u8>> {
    let s = arg.trim();
    let s = s.strip_prefix("0x").unwrap_or(s);
    hex::decode(s).with_context(|| format!("not valid hex: {arg}"))
}
