//! RFC 4648 standard alphabet tables
//!
//! Both tables are plain constants shared by every kernel. The decode table
//! covers ASCII only; bytes >= 128 never reach it.

/// Padding character appended to the final quartet.
pub const PAD: u8 = b'=';

/// Sentinel stored in [`DECODE_TABLE`] for bytes outside the alphabet.
pub const INVALID: u8 = 0xFF;

/// Sextet index -> ASCII character.
pub const ENCODE_TABLE: [u8; 64] =
    *b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

/// ASCII character -> sextet, or [`INVALID`].
///
/// `=` maps to [`INVALID`]: padding is recognised before the table is consulted.
pub const DECODE_TABLE: [u8; 128] = build_decode_table();

const fn build_decode_table() -> [u8; 128] {
    let mut table = [INVALID; 128];
    let mut i = 0;
    while i < ENCODE_TABLE.len() {
        table[ENCODE_TABLE[i] as usize] = i as u8;
        i += 1;
    }
    table
}

/// Looks up a single character, treating non-ASCII as invalid.
#[inline(always)]
pub fn decode_char(c: u8) -> u8 {
    if c < 128 {
        DECODE_TABLE[c as usize]
    } else {
        INVALID
    }
}

/// Encoded length for `len` input bytes, padding included.
#[inline]
pub const fn encoded_len(len: usize) -> usize {
    len.div_ceil(3) * 4
}

/// Output capacity `decode_to_slice` requires for `len` input characters.
#[inline]
pub const fn decoded_len_estimate(len: usize) -> usize {
    (len / 4) * 3
}
