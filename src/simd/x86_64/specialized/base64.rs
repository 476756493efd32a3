//! AVX-512 VBMI base64 kernel
//!
//! 48 bytes -> 64 characters and back per iteration. VBMI's byte permutes
//! do both the trio reshuffle and the alphabet lookup in a single
//! instruction each, so no arithmetic range mapping is needed.
//!
//! Based on techniques from:
//! - Wojciech Muła and Daniel Lemire, "Base64 encoding and decoding at
//!   almost the speed of a memory copy"
//! - https://github.com/aklomp/base64

// Intrinsics are wrapped in explicit unsafe blocks for the 2024 edition's
// unsafe_op_in_unsafe_fn lint; some are already safe inside target_feature
// functions.
#![allow(unused_unsafe)]

use std::arch::x86_64::*;

use crate::alphabet::{DECODE_TABLE, ENCODE_TABLE};

const ENCODE_BLOCK: usize = 48;
const DECODE_BLOCK: usize = 64;

/// Low 48 lanes of a 64-lane byte mask.
const LOW_48: __mmask64 = (1 << 48) - 1;

/// Byte permute placing trio `j` as `[b1, b0, b2, b1]` in 32-bit lane `j`.
///
/// The multiply trick below expects each 16-bit half big-endian.
#[rustfmt::skip]
const ENCODE_SHUFFLE: [u8; 64] = [
    1, 0, 2, 1,      4, 3, 5, 4,      7, 6, 8, 7,      10, 9, 11, 10,
    13, 12, 14, 13,  16, 15, 17, 16,  19, 18, 20, 19,  22, 21, 23, 22,
    25, 24, 26, 25,  28, 27, 29, 28,  31, 30, 32, 31,  34, 33, 35, 34,
    37, 36, 38, 37,  40, 39, 41, 40,  43, 42, 44, 43,  46, 45, 47, 46,
];

/// Byte permute taking the three significant bytes of each packed 32-bit
/// lane, most significant first. The last 16 lanes are never stored.
#[rustfmt::skip]
const DECODE_PACK: [u8; 64] = [
    2, 1, 0,     6, 5, 4,     10, 9, 8,    14, 13, 12,
    18, 17, 16,  22, 21, 20,  26, 25, 24,  30, 29, 28,
    34, 33, 32,  38, 37, 36,  42, 41, 40,  46, 45, 44,
    50, 49, 48,  54, 53, 52,  58, 57, 56,  62, 61, 60,
    0, 0, 0, 0,  0, 0, 0, 0,  0, 0, 0, 0,  0, 0, 0, 0,
];

/// Encodes every whole 48-byte block of `input`. Returns bytes consumed.
///
/// # Safety
///
/// The CPU must support AVX-512 F, BW and VBMI. `out` must hold 64 bytes
/// per 48-byte input block.
#[target_feature(enable = "avx512f,avx512bw,avx512vbmi")]
pub(crate) unsafe fn encode(input: &[u8], out: &mut [u8]) -> usize {
    let (blocks, _) = input.as_chunks::<ENCODE_BLOCK>();
    let (out_blocks, _) = out.as_chunks_mut::<DECODE_BLOCK>();
    debug_assert!(out_blocks.len() >= blocks.len());

    unsafe {
        let shuffle = _mm512_loadu_epi8(ENCODE_SHUFFLE.as_ptr() as *const i8);
        let alphabet = _mm512_loadu_epi8(ENCODE_TABLE.as_ptr() as *const i8);

        let mut consumed = 0;
        for (block, dst) in blocks.iter().zip(out_blocks.iter_mut()) {
            // Masked load: lanes 48..64 are zeroed, never read from memory.
            let raw = _mm512_maskz_loadu_epi8(LOW_48, block.as_ptr() as *const i8);
            let shuffled = _mm512_permutexvar_epi8(shuffle, raw);
            let indices = split_sextets(shuffled);
            let chars = _mm512_permutexvar_epi8(indices, alphabet);
            _mm512_storeu_epi8(dst.as_mut_ptr() as *mut i8, chars);
            consumed += ENCODE_BLOCK;
        }
        consumed
    }
}

/// Spreads each `[b1, b0, b2, b1]` lane into four sextets, one per byte.
///
/// For 3 bytes ABC (24 bits) -> 4 groups of 6 bits:
/// [AAAAAA] [AABBBB] [BBBBCC] [CCCCCC]
#[target_feature(enable = "avx512f,avx512bw")]
unsafe fn split_sextets(shuffled: __m512i) -> __m512i {
    unsafe {
        // Sextets 0 and 2: shift right by 10 and 6 via the high half of a multiply.
        let t0 = _mm512_and_si512(shuffled, _mm512_set1_epi32(0x0FC0FC00_u32 as i32));
        let t1 = _mm512_mulhi_epu16(t0, _mm512_set1_epi32(0x04000040_u32 as i32));

        // Sextets 1 and 3: shift left by 8 and 4 via the low half.
        let t2 = _mm512_and_si512(shuffled, _mm512_set1_epi32(0x003F03F0_u32 as i32));
        let t3 = _mm512_mullo_epi16(t2, _mm512_set1_epi32(0x01000010_u32 as i32));

        _mm512_or_si512(t1, t3)
    }
}

/// Decodes whole 64-character blocks until one holds padding, a non-ASCII
/// byte or a character outside the alphabet. Returns characters consumed.
///
/// # Safety
///
/// The CPU must support AVX-512 F, BW and VBMI. `out` must hold 48 bytes
/// per 64-character input block.
#[target_feature(enable = "avx512f,avx512bw,avx512vbmi")]
pub(crate) unsafe fn decode(input: &[u8], out: &mut [u8]) -> usize {
    let (blocks, _) = input.as_chunks::<DECODE_BLOCK>();
    let (out_blocks, _) = out.as_chunks_mut::<ENCODE_BLOCK>();
    debug_assert!(out_blocks.len() >= blocks.len());

    unsafe {
        let table_lo = _mm512_loadu_epi8(DECODE_TABLE.as_ptr() as *const i8);
        let table_hi = _mm512_loadu_epi8(DECODE_TABLE[64..].as_ptr() as *const i8);
        let pack = _mm512_loadu_epi8(DECODE_PACK.as_ptr() as *const i8);

        let mut consumed = 0;
        for (block, dst) in blocks.iter().zip(out_blocks.iter_mut()) {
            let chars = _mm512_loadu_epi8(block.as_ptr() as *const i8);

            // The permute ignores bit 7, so non-ASCII must be rejected first.
            if _mm512_movepi8_mask(chars) != 0 {
                break;
            }

            // Bit 6 of each char picks the table half. `=` maps to INVALID.
            let values = _mm512_permutex2var_epi8(table_lo, chars, table_hi);
            if _mm512_movepi8_mask(values) != 0 {
                break;
            }

            let packed = pack_sextets(values);
            let bytes = _mm512_permutexvar_epi8(pack, packed);
            _mm512_mask_storeu_epi8(dst.as_mut_ptr() as *mut i8, LOW_48, bytes);
            consumed += DECODE_BLOCK;
        }
        consumed
    }
}

/// Merges four sextets per 32-bit lane into one 24-bit value.
#[target_feature(enable = "avx512f,avx512bw")]
unsafe fn pack_sextets(values: __m512i) -> __m512i {
    unsafe {
        // a*64 + b and c*64 + d per 16-bit lane.
        let pairs = _mm512_maddubs_epi16(values, _mm512_set1_epi32(0x01400140));
        // ab*4096 + cd per 32-bit lane.
        _mm512_madd_epi16(pairs, _mm512_set1_epi32(0x00011000))
    }
}
