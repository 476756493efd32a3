use clap::Args;
use std::path::PathBuf;

/// Arguments for encoding data
#[derive(Args, Debug)]
pub struct EncodeArgs {
    /// Input file (reads from stdin if not provided)
    pub file: Option<PathBuf>,

    /// Output file (writes to stdout if not provided)
    #[arg(short = 'o', long)]
    pub output: Option<PathBuf>,

    /// Wrap encoded lines after N characters (0 disables wrapping)
    #[arg(short = 'w', long, value_name = "N", default_value_t = 76)]
    pub wrap: usize,
}

/// Arguments for decoding data
#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Input file (reads from stdin if not provided)
    pub file: Option<PathBuf>,

    /// Output file (writes to stdout if not provided)
    #[arg(short = 'o', long)]
    pub output: Option<PathBuf>,

    /// Reject whitespace, non-alphabet bytes and misplaced padding
    #[arg(long)]
    pub strict: bool,
}

/// Arguments for printing CPU capabilities
#[derive(Args, Debug)]
pub struct CapsArgs {
    /// Show the raw probe, ignoring config restrictions
    #[arg(long)]
    pub raw: bool,
}
