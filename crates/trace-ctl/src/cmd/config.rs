//! Config file commands.

use anyhow::{Context, Result};

use trace_core::config::TraceConfig;

/// Write the default config file if there is none, and print where it is.
pub fn cmd_config_init() -> Result<()> {
    let path = TraceConfig::write_default_if_missing().context("could not write default config")?;
    println!("{}", path.display());
    Ok(())
}
