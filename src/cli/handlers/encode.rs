use crate::cli::{
    args::EncodeArgs,
    commands::{read_input, wrap_lines, write_output},
    global::GlobalArgs,
};
use anyhow::Result;
use base64_tiers::Codec;
use tracing::debug;

pub fn handle(args: EncodeArgs, global: &GlobalArgs, codec: &Codec) -> Result<()> {
    let data = read_input(args.file.as_ref(), global)?;

    let encoded = codec.encode(&data);
    debug!(input = data.len(), output = encoded.len(), "encoded");

    let wrapped = wrap_lines(encoded.as_bytes(), args.wrap);
    write_output(args.output.as_ref(), &wrapped)
}
