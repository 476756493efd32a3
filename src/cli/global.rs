use base64_tiers::Tier;
use clap::{ArgAction, Args};

/// Global arguments that apply to all subcommands
#[derive(Args, Debug)]
pub struct GlobalArgs {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short = 'v', long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Extra config file layered over the standard locations
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<String>,

    /// Run only this tier (plus the scalar finisher)
    #[arg(long, global = true, value_name = "TIER")]
    pub tier: Option<Tier>,

    /// Maximum input size in bytes (0 = unlimited)
    #[arg(long, global = true, default_value = "104857600")]
    pub max_size: usize,

    /// Process files exceeding --max-size limit
    #[arg(long, global = true)]
    pub force: bool,
}
