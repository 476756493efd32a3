use thiserror::Error;

use crate::simd::Tier;

/// Errors raised by [`Codec`](crate::Codec) entry points.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// The caller-supplied output buffer cannot hold the result.
    #[error("output buffer too small: need {needed} bytes, got {actual}")]
    OutputTooSmall { needed: usize, actual: usize },

    /// A tier was forced but the host (or the build) cannot run it.
    #[error("{tier} kernel is not available on this host")]
    UnsupportedTier { tier: Tier },
}

/// Errors from the whole-buffer reference decoder.
///
/// Positions are byte offsets into the original input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// A byte outside the alphabet (strict mode only).
    #[error("invalid character {byte:#04x} at position {position}")]
    InvalidCharacter { byte: u8, position: usize },

    /// Padding where a quartet cannot end, or padding interrupted by data.
    #[error("invalid padding at position {position}")]
    InvalidPadding { position: usize },

    /// Data after the padded final quartet (strict mode only).
    #[error("excess data after padding at position {position}")]
    ExcessData { position: usize },

    /// The number of data characters is one more than a multiple of four.
    #[error(
        "invalid input: {data_chars} data characters cannot be 1 more than a multiple of 4"
    )]
    InvalidLength { data_chars: usize },

    /// A trailing partial quartet without the padding that completes it.
    #[error("incorrect padding")]
    IncompletePadding,
}

/// Errors from loading a [`Config`](crate::Config).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}
