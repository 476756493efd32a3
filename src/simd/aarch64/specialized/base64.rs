//! NEON base64 kernel
//!
//! 12 bytes -> 16 characters and back per iteration. The alphabet mapping is
//! arithmetic (compare and add offsets) rather than a table lookup, since a
//! 64-entry `tbl` needs four registers.
//!
//! Based on techniques from:
//! - https://github.com/aklomp/base64 (reference C implementation)
//! - ARM NEON optimization techniques

// Allow unused_unsafe because we explicitly wrap NEON intrinsics for Rust 2024
// edition compatibility (unsafe_op_in_unsafe_fn lint).
#![allow(unused_unsafe)]

use std::arch::aarch64::*;

const ENCODE_BLOCK: usize = 12;
const DECODE_BLOCK: usize = 16;

/// `[b1, b0, b2, b1]` per trio, so each 16-bit lane holds two input bytes
/// most significant first.
const ENCODE_SHUFFLE: [u8; 16] = [1, 0, 2, 1, 4, 3, 5, 4, 7, 6, 8, 7, 10, 9, 11, 10];

/// Three significant bytes of each packed 32-bit lane, most significant
/// first. Out-of-range indices produce zero.
const DECODE_PACK: [u8; 16] = [
    2, 1, 0, 6, 5, 4, 10, 9, 8, 14, 13, 12, 0xFF, 0xFF, 0xFF, 0xFF,
];

/// Encodes every whole 12-byte block of `input`. Returns bytes consumed.
pub(crate) fn encode(input: &[u8], out: &mut [u8]) -> usize {
    // SAFETY: NEON is always available on aarch64
    unsafe { encode_neon_impl(input, out) }
}

/// Decodes whole 16-character blocks until one holds padding or a character
/// outside the alphabet. Returns characters consumed.
pub(crate) fn decode(input: &[u8], out: &mut [u8]) -> usize {
    // SAFETY: NEON is always available on aarch64
    unsafe { decode_neon_impl(input, out) }
}

#[target_feature(enable = "neon")]
unsafe fn encode_neon_impl(input: &[u8], out: &mut [u8]) -> usize {
    let (blocks, _) = input.as_chunks::<ENCODE_BLOCK>();
    let (out_blocks, _) = out.as_chunks_mut::<DECODE_BLOCK>();
    debug_assert!(out_blocks.len() >= blocks.len());

    let mut consumed = 0;
    for (block, dst) in blocks.iter().zip(out_blocks.iter_mut()) {
        // Copy through a 16-byte buffer so the load never reads past the input.
        let mut input_buf = [0u8; 16];
        input_buf[..ENCODE_BLOCK].copy_from_slice(block);

        unsafe {
            let input_vec = vld1q_u8(input_buf.as_ptr());
            let indices = split_sextets(input_vec);
            let chars = to_ascii(indices);
            vst1q_u8(dst.as_mut_ptr(), chars);
        }
        consumed += ENCODE_BLOCK;
    }
    consumed
}

/// Turns 12 input bytes into 16 sextets, one per byte.
///
/// After the shuffle, even 16-bit lanes hold `b0:b1` and odd lanes `b1:b2`.
/// Sextets 0 and 1 come from the even lanes, 2 and 3 from the odd lanes.
#[target_feature(enable = "neon")]
unsafe fn split_sextets(input: uint8x16_t) -> uint8x16_t {
    unsafe {
        let shuffled = vqtbl1q_u8(input, vld1q_u8(ENCODE_SHUFFLE.as_ptr()));
        let lanes = vreinterpretq_u16_u8(shuffled);
        let low6 = vdupq_n_u16(0x3F);

        let s0 = vshrq_n_u16(lanes, 10);
        let s1 = vandq_u16(vshrq_n_u16(lanes, 4), low6);
        let s2 = vandq_u16(vshrq_n_u16(lanes, 6), low6);
        let s3 = vandq_u16(lanes, low6);

        let first_pair = vorrq_u16(s0, vshlq_n_u16(s1, 8));
        let second_pair = vorrq_u16(s2, vshlq_n_u16(s3, 8));

        let even_lanes = vreinterpretq_u16_u32(vdupq_n_u32(0x0000_FFFF));
        vreinterpretq_u8_u16(vbslq_u16(even_lanes, first_pair, second_pair))
    }
}

/// Maps sextets to ASCII by adding a range-dependent offset
///
/// - [0..25]  -> 'A'..'Z'  offset: +65
/// - [26..51] -> 'a'..'z'  offset: +71
/// - [52..61] -> '0'..'9'  offset: -4
/// - [62]     -> '+'       offset: -19
/// - [63]     -> '/'       offset: -16
#[target_feature(enable = "neon")]
unsafe fn to_ascii(indices: uint8x16_t) -> uint8x16_t {
    unsafe {
        let mut offset = vdupq_n_u8(65);

        let ge26 = vcgeq_u8(indices, vdupq_n_u8(26));
        offset = vaddq_u8(offset, vandq_u8(ge26, vdupq_n_u8(6)));

        let ge52 = vcgeq_u8(indices, vdupq_n_u8(52));
        offset = vsubq_u8(offset, vandq_u8(ge52, vdupq_n_u8(75)));

        let eq62 = vceqq_u8(indices, vdupq_n_u8(62));
        offset = vsubq_u8(offset, vandq_u8(eq62, vdupq_n_u8(15)));

        let eq63 = vceqq_u8(indices, vdupq_n_u8(63));
        offset = vsubq_u8(offset, vandq_u8(eq63, vdupq_n_u8(12)));

        vaddq_u8(indices, offset)
    }
}

#[target_feature(enable = "neon")]
unsafe fn decode_neon_impl(input: &[u8], out: &mut [u8]) -> usize {
    let (blocks, _) = input.as_chunks::<DECODE_BLOCK>();
    let (out_blocks, _) = out.as_chunks_mut::<ENCODE_BLOCK>();
    debug_assert!(out_blocks.len() >= blocks.len());

    let mut consumed = 0;
    for (block, dst) in blocks.iter().zip(out_blocks.iter_mut()) {
        let mut output_buf = [0u8; 16];
        unsafe {
            let chars = vld1q_u8(block.as_ptr());
            let values = to_sextets(chars);

            // Invalid characters, padding included, map to 0xFF.
            if vmaxvq_u8(values) >= 64 {
                break;
            }

            vst1q_u8(output_buf.as_mut_ptr(), pack_sextets(values));
        }
        dst.copy_from_slice(&output_buf[..ENCODE_BLOCK]);
        consumed += DECODE_BLOCK;
    }
    consumed
}

/// Classifies each character by range; anything outside the alphabet
/// becomes 0xFF.
#[target_feature(enable = "neon")]
unsafe fn to_sextets(chars: uint8x16_t) -> uint8x16_t {
    unsafe {
        let mut values = vdupq_n_u8(0xFF);

        let upper = vsubq_u8(chars, vdupq_n_u8(b'A'));
        values = vbslq_u8(vcltq_u8(upper, vdupq_n_u8(26)), upper, values);

        let lower = vsubq_u8(chars, vdupq_n_u8(b'a'));
        let in_lower = vcltq_u8(lower, vdupq_n_u8(26));
        values = vbslq_u8(in_lower, vaddq_u8(lower, vdupq_n_u8(26)), values);

        let digit = vsubq_u8(chars, vdupq_n_u8(b'0'));
        let in_digit = vcltq_u8(digit, vdupq_n_u8(10));
        values = vbslq_u8(in_digit, vaddq_u8(digit, vdupq_n_u8(52)), values);

        values = vbslq_u8(vceqq_u8(chars, vdupq_n_u8(b'+')), vdupq_n_u8(62), values);
        vbslq_u8(vceqq_u8(chars, vdupq_n_u8(b'/')), vdupq_n_u8(63), values)
    }
}

/// Packs 16 sextets into 12 bytes in the low lanes of the result.
#[target_feature(enable = "neon")]
unsafe fn pack_sextets(values: uint8x16_t) -> uint8x16_t {
    unsafe {
        // a*64 + b and c*64 + d, alternating in 16-bit lanes.
        let even = vget_low_u8(vuzp1q_u8(values, values));
        let odd = vget_low_u8(vuzp2q_u8(values, values));
        let pairs = vmlal_u8(vmovl_u8(odd), even, vdup_n_u8(64));

        // (ab << 12) | cd per 32-bit lane.
        let ab = vget_low_u16(vuzp1q_u16(pairs, pairs));
        let cd = vget_low_u16(vuzp2q_u16(pairs, pairs));
        let packed = vorrq_u32(vshll_n_u16(ab, 12), vmovl_u16(cd));

        vqtbl1q_u8(vreinterpretq_u8_u32(packed), vld1q_u8(DECODE_PACK.as_ptr()))
    }
}
