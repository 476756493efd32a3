//! RFC 4648 base64 with runtime kernel selection.
//!
//! Encoding and decoding run through a ladder of kernels: AVX-512 VBMI on
//! x86_64, SVE and NEON on aarch64, and a portable scalar kernel that always
//! finishes the job. Which kernels run is decided once per process by
//! [`detect_capabilities`] and can be narrowed with a [`Config`].
//!
//! ```
//! use base64_tiers::{Codec, DecodeMode};
//!
//! let codec = Codec::detected();
//! let text = codec.encode(b"Hello");
//! assert_eq!(text, "SGVsbG8=");
//! assert_eq!(codec.decode(text.as_bytes(), DecodeMode::Strict).unwrap(), b"Hello");
//! ```

pub mod alphabet;
mod codec;
pub mod config;
pub mod convenience;
mod errors;
pub mod simd;

pub use alphabet::{DECODE_TABLE, ENCODE_TABLE, decoded_len_estimate, encoded_len};
pub use codec::{Codec, DecodeStatus, Decoded};
pub use config::{Config, DecodeConfig, DispatchConfig};
pub use convenience::{DecodeMode, decode, encode};
pub use errors::{CodecError, ConfigError, DecodeError};
pub use simd::{Capabilities, Tier, detect_capabilities, has_avx512vbmi, sve_vector_length};
