//! x86_64 SIMD implementations
//!
//! Only AVX-512 VBMI is accelerated. Older extensions fall through to the
//! scalar kernel.

mod specialized;

pub(crate) use specialized::base64::{
    decode as decode_base64_avx512, encode as encode_base64_avx512,
};

/// Check for AVX-512 VBMI and the F/BW baseline it builds on
///
/// The detection macro also confirms the OS saves the ZMM state.
#[inline]
pub(crate) fn has_avx512vbmi() -> bool {
    is_x86_feature_detected!("avx512f")
        && is_x86_feature_detected!("avx512bw")
        && is_x86_feature_detected!("avx512vbmi")
}
