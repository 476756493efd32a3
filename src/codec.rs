//! Tier dispatch
//!
//! A [`Codec`] walks the enabled tiers fastest first. Each fast tier consumes
//! as many whole blocks as it can from what is left, then hands the rest down.
//! The scalar kernel always runs last and owns padding, partial groups and
//! exact error positions.

use tracing::trace;

use crate::alphabet::{decoded_len_estimate, encoded_len};
use crate::errors::CodecError;
use crate::simd::{self, Capabilities, Tier, scalar};

/// Why a decode call stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeStatus {
    /// Every whole quartet was decoded. A trailing partial quartet, if any,
    /// is left unconsumed.
    Ok,
    /// Stopped at a quartet holding a byte outside the alphabet.
    InvalidChar,
    /// Stopped at a quartet holding padding that does not end the input.
    Padding,
}

/// Result of [`Codec::decode_to_slice`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decoded {
    /// Bytes written to the output buffer.
    pub written: usize,
    /// Input characters consumed, a multiple of 4.
    pub consumed: usize,
    pub status: DecodeStatus,
}

impl Decoded {
    /// True when the whole input was consumed without error.
    pub fn is_complete(&self, input_len: usize) -> bool {
        self.status == DecodeStatus::Ok && self.consumed == input_len
    }
}

/// Encoder/decoder bound to a capability set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Codec {
    caps: Capabilities,
    forced: Option<Tier>,
}

impl Default for Codec {
    fn default() -> Self {
        Self::detected()
    }
}

impl Codec {
    /// Uses every tier `caps` supports.
    pub fn new(caps: Capabilities) -> Self {
        Codec { caps, forced: None }
    }

    /// Uses the process-wide capability cache, filling it if needed.
    pub fn detected() -> Self {
        simd::detect_capabilities();
        Self::new(Capabilities::detected())
    }

    /// Scalar kernel only.
    pub fn scalar() -> Self {
        Self::new(Capabilities::scalar_only())
    }

    /// Runs `tier` alone, followed by the scalar finisher.
    pub fn with_tier(caps: Capabilities, tier: Tier) -> Result<Self, CodecError> {
        if !caps.supports(tier) {
            return Err(CodecError::UnsupportedTier { tier });
        }
        Ok(Codec {
            caps,
            forced: Some(tier),
        })
    }

    pub fn capabilities(&self) -> Capabilities {
        self.caps
    }

    /// The tiers a call walks, in order. Always ends with [`Tier::Scalar`].
    pub fn tiers(&self) -> impl Iterator<Item = Tier> {
        let caps = self.caps;
        let forced = self.forced;
        Tier::ALL.into_iter().filter(move |&tier| match forced {
            Some(only) => tier == only || tier == Tier::Scalar,
            None => caps.supports(tier),
        })
    }

    fn fast_tiers(&self) -> impl Iterator<Item = Tier> {
        self.tiers().filter(|&tier| tier != Tier::Scalar)
    }

    /// Encodes `input` into `out`, which must hold
    /// [`encoded_len`]`(input.len())` bytes. Returns bytes written.
    pub fn encode_to_slice(&self, input: &[u8], out: &mut [u8]) -> Result<usize, CodecError> {
        let needed = encoded_len(input.len());
        if out.len() < needed {
            return Err(CodecError::OutputTooSmall {
                needed,
                actual: out.len(),
            });
        }
        Ok(self.encode_sized(input, out))
    }

    /// Encodes `input` into a new string.
    pub fn encode(&self, input: &[u8]) -> String {
        let mut out = vec![0u8; encoded_len(input.len())];
        let written = self.encode_sized(input, &mut out);
        out.truncate(written);
        String::from_utf8(out).expect("kernels write only alphabet characters and '='")
    }

    fn encode_sized(&self, input: &[u8], out: &mut [u8]) -> usize {
        let mut consumed = 0;
        let mut written = 0;

        for tier in self.fast_tiers() {
            let block = simd::encode_block(tier, &self.caps);
            let remaining = input.len() - consumed;
            if remaining < block {
                trace!(%tier, remaining, block, "encode: input shorter than one block");
                continue;
            }
            let n = simd::encode_blocks(tier, &self.caps, &input[consumed..], &mut out[written..]);
            consumed += n;
            written += n / 3 * 4;
            trace!(%tier, consumed = n, remaining = input.len() - consumed, "encode: tier handoff");
        }

        written + scalar::encode(&input[consumed..], &mut out[written..])
    }

    /// Decodes `input` into `out`, which must hold
    /// [`decoded_len_estimate`]`(input.len())` bytes.
    ///
    /// Stops at the first quartet with invalid content and reports where.
    /// Callers resume from `consumed` with the reference decoder.
    pub fn decode_to_slice(&self, input: &[u8], out: &mut [u8]) -> Result<Decoded, CodecError> {
        let needed = decoded_len_estimate(input.len());
        if out.len() < needed {
            return Err(CodecError::OutputTooSmall {
                needed,
                actual: out.len(),
            });
        }
        Ok(self.decode_sized(input, out))
    }

    pub(crate) fn decode_sized(&self, input: &[u8], out: &mut [u8]) -> Decoded {
        let mut consumed = 0;
        let mut written = 0;

        for tier in self.fast_tiers() {
            let block = simd::decode_block(tier, &self.caps);
            let remaining = input.len() - consumed;
            if remaining < block {
                trace!(%tier, remaining, block, "decode: input shorter than one block");
                continue;
            }
            let n = simd::decode_blocks(tier, &self.caps, &input[consumed..], &mut out[written..]);
            consumed += n;
            written += n / 4 * 3;

            let left = input.len() - consumed;
            if left >= block {
                trace!(%tier, consumed = n, left, "decode: tier stopped on content");
            } else {
                trace!(%tier, consumed = n, left, "decode: tier handoff");
            }
        }

        let tail = scalar::decode(&input[consumed..], &mut out[written..]);
        Decoded {
            written: written + tail.written,
            consumed: consumed + tail.consumed,
            status: tail.status,
        }
    }
}
