//! trace-ctl: inspect trace frames and dry-run them through the reactor.

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use trace_core::config::TraceConfig;
use trace_core::{ChannelRegistry, SPECIAL_OP_CHANNEL};

mod cmd;

use cmd::simulate::SimulateOpts;

fn print_usage() {
    println!("Usage: trace-ctl <command>");
    println!();
    println!("Commands:");
    println!("  decode <hex>                        Decode a frame and print it as JSON");
    println!("  encode-request <data-hex>           Encode a trace request frame");
    println!("  encode-response <hash-hex> <hex>    Encode a trace response frame");
    println!("  hash <hex>                          Print the request hash of a frame");
    println!("  channels                            Show configured channels");
    println!("  config init                         Write the default config file if missing");
    println!("  simulate [options] <hex>            Run a frame through an in-memory reactor");
    println!();
    println!("Simulate options:");
    println!("  --peers <n>       Connected peers (default: 3)");
    println!("  --source <i>      Index of the sending peer (default: 0)");
    println!("  --channel <id>    Channel id, decimal or 0x-hex (default: 0x50)");
    println!("  --hold            Router declines to broadcast requests");
    println!("  --reply-to <i>    Router relays responses to peer i");
}

fn init_logging(config: &TraceConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log.filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn parse_channel(arg: &str) -> Result<u8> {
    match arg.strip_prefix("0x") {
        Some(h) => u8::from_str_radix(h, 16),
        None => arg.parse(),
    }
    .with_context(|| format!("invalid channel id: {arg}"))
}

fn parse_simulate(args: &[&str]) -> Result<(SimulateOpts, String)> {
    let mut opts = SimulateOpts {
        peers: 3,
        source: 0,
        channel: SPECIAL_OP_CHANNEL,
        hold: false,
        reply_to: None,
    };
    let mut frame = None;
    let mut it = args.iter();
    while let Some(arg) = it.next() {
        match *arg {
            "--peers" => {
                opts.peers = it
                    .next()
                    .context("--peers requires a value")?
                    .parse()
                    .context("--peers must be a number")?;
            }
            "--source" => {
                opts.source = it
                    .next()
                    .context("--source requires a value")?
                    .parse()
                    .context("--source must be a number")?;
            }
            "--channel" => {
                opts.channel = parse_channel(it.next().context("--channel requires a value")?)?;
            }
            "--reply-to" => {
                opts.reply_to = Some(
                    it.next()
                        .context("--reply-to requires a value")?
                        .parse()
                        .context("--reply-to must be a number")?,
                );
            }
            "--hold" => opts.hold = true,
            other => frame = Some(other.to_string()),
        }
    }
    let frame = frame.context("simulate requires a frame")?;
    Ok((opts, frame))
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let loaded = TraceConfig::load();
    let config = loaded.as_ref().cloned().unwrap_or_default();
    init_logging(&config);
    if let Err(e) = &loaded {
        tracing::warn!(error = %e, "failed to load config, using defaults");
    }

    let args: Vec<String> = std::env::args().skip(1).collect();
    let args: Vec<&str> = args.iter().map(String::as_str).collect();

    match args.as_slice() {
        ["decode", frame] => cmd::frame::cmd_decode(frame),
        ["encode-request", data] => cmd::frame::cmd_encode_request(data),
        ["encode-response", hash, resp] => cmd::frame::cmd_encode_response(hash, resp),
        ["hash", frame] => cmd::frame::cmd_hash(frame),
        ["channels"] => cmd::frame::cmd_channels(&ChannelRegistry::from_config(&config.channels)),
        ["config", "init"] => cmd::config::cmd_config_init(),
        ["simulate", rest @ ..] => {
            let (opts, frame) = parse_simulate(rest)?;
            cmd::simulate::cmd_simulate(ChannelRegistry::from_config(&config.channels), &opts, &frame)
        }
        ["help"] | ["--help"] | ["-h"] | [] => {
            print_usage();
            Ok(())
        }
        other => {
            eprintln!("Unknown command: {}", other.join(" "));
            eprintln!();
            print_usage();
            std::process::exit(1);
        }
    }
}
