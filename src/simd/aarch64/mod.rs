//! aarch64 SIMD implementations
//!
//! NEON is part of the baseline architecture and always used. SVE is probed
//! at runtime and its vector length read once.

mod specialized;

pub(crate) use specialized::base64::{
    decode as decode_base64_neon, encode as encode_base64_neon,
};
pub(crate) use specialized::sve::{decode as decode_base64_sve, encode as encode_base64_sve};

/// Check if NEON is available
///
/// On aarch64, NEON is always available as part of the baseline architecture.
#[inline]
pub(crate) fn has_neon() -> bool {
    true
}

/// SVE vector length in bytes, or 0 when SVE is absent
pub(crate) fn sve_vector_bytes() -> usize {
    if !std::arch::is_aarch64_feature_detected!("sve") {
        return 0;
    }
    // SAFETY: SVE support was just confirmed.
    unsafe { specialized::sve::vector_bytes() }
}
