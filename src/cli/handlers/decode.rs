use crate::cli::{
    args::DecodeArgs,
    commands::{read_input, write_output},
    global::GlobalArgs,
};
use anyhow::{Context, Result};
use base64_tiers::{Codec, Config, DecodeMode};
use tracing::debug;

pub fn handle(args: DecodeArgs, global: &GlobalArgs, config: &Config, codec: &Codec) -> Result<()> {
    let mut text = read_input(args.file.as_ref(), global)?;

    let mode = if args.strict {
        DecodeMode::Strict
    } else {
        config.decode.effective_mode()
    };

    // A trailing newline is part of how text files end, not of the data.
    if mode == DecodeMode::Strict {
        while matches!(text.last(), Some(b'\n' | b'\r')) {
            text.pop();
        }
    }

    let decoded = codec
        .decode(&text, mode)
        .with_context(|| format!("{} decode failed", mode.as_str()))?;
    debug!(
        input = text.len(),
        output = decoded.len(),
        mode = mode.as_str(),
        "decoded"
    );

    write_output(args.output.as_ref(), &decoded)
}
