mod args;
mod commands;
mod global;
mod handlers;

use anyhow::{Context, Result};
use base64_tiers::{Capabilities, Codec, Config};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use args::{CapsArgs, DecodeArgs, EncodeArgs};
use global::GlobalArgs;

#[derive(Parser)]
#[command(name = "base64-tiers")]
#[command(version)]
#[command(about = "RFC 4648 base64 with runtime-selected SIMD kernels", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalArgs,
}

#[derive(Subcommand)]
enum Commands {
    /// Encode binary data to base64
    Encode(EncodeArgs),
    /// Decode base64 to binary data
    Decode(DecodeArgs),
    /// Show detected CPU capabilities and the tier plan
    Caps(CapsArgs),
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.global.verbose);

    let config = load_config(&cli.global)?;
    let codec = build_codec(&cli.global, &config)?;
    debug!(tiers = ?codec.tiers().collect::<Vec<_>>(), "dispatch plan");

    match cli.command {
        Commands::Encode(args) => handlers::encode::handle(args, &cli.global, &codec),
        Commands::Decode(args) => handlers::decode::handle(args, &cli.global, &config, &codec),
        Commands::Caps(args) => handlers::caps::handle(args, &codec),
    }
}

/// Logs go to stderr so they never mix with encoded output.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_config(global: &GlobalArgs) -> Result<Config> {
    let mut config = Config::load_with_overrides();
    if let Some(path) = &global.config {
        let path = PathBuf::from(shellexpand::tilde(path).into_owned());
        let layer = Config::load_from_file(&path)
            .with_context(|| format!("loading config {}", path.display()))?;
        config.merge(layer);
    }
    Ok(config)
}

fn build_codec(global: &GlobalArgs, config: &Config) -> Result<Codec> {
    let caps: Capabilities = config.capabilities();
    match global.tier {
        Some(tier) => Ok(Codec::with_tier(caps, tier)?),
        None => Ok(Codec::new(caps)),
    }
}
