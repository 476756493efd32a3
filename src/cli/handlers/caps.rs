use crate::cli::args::CapsArgs;
use anyhow::Result;
use base64_tiers::{Capabilities, Codec, Tier};

pub fn handle(args: CapsArgs, codec: &Codec) -> Result<()> {
    let caps = if args.raw {
        Capabilities::probe()
    } else {
        codec.capabilities()
    };

    println!("avx512vbmi:        {}", yes_no(caps.has_avx512vbmi()));
    println!("neon:              {}", yes_no(caps.has_neon()));
    match caps.sve_vector_length() {
        0 => println!("sve:               no"),
        vl => println!("sve:               yes ({} bytes, {} bits)", vl, vl * 8),
    }

    let plan: Vec<&str> = if args.raw {
        Tier::ALL
            .iter()
            .filter(|&&tier| caps.supports(tier))
            .map(Tier::as_str)
            .collect()
    } else {
        codec.tiers().map(|tier| tier.as_str()).collect()
    };
    println!("tiers:             {}", plan.join(" -> "));
    Ok(())
}

fn yes_no(flag: bool) -> &'static str {
    if flag { "yes" } else { "no" }
}
