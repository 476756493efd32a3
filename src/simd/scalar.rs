//! Portable 3-byte <-> 4-character kernel
//!
//! This is the terminal tier: it finishes whatever the vector kernels leave
//! behind and is the only place padding and partial groups are handled.

use crate::alphabet::{ENCODE_TABLE, PAD, decode_char, decoded_len_estimate};
use crate::codec::{DecodeStatus, Decoded};

#[inline(always)]
fn encode_trio(trio: &[u8; 3]) -> [u8; 4] {
    let v = (trio[0] as u32) << 16 | (trio[1] as u32) << 8 | trio[2] as u32;
    [
        ENCODE_TABLE[(v >> 18) as usize & 0x3F],
        ENCODE_TABLE[(v >> 12) as usize & 0x3F],
        ENCODE_TABLE[(v >> 6) as usize & 0x3F],
        ENCODE_TABLE[v as usize & 0x3F],
    ]
}

/// Decodes one unpadded quartet, or `None` if any character is padding or
/// outside the alphabet.
#[inline(always)]
fn decode_quartet(quartet: &[u8; 4]) -> Option<[u8; 3]> {
    let a = decode_char(quartet[0]);
    let b = decode_char(quartet[1]);
    let c = decode_char(quartet[2]);
    let d = decode_char(quartet[3]);

    // Valid sextets never set the top two bits; INVALID sets both.
    if (a | b | c | d) & 0xC0 != 0 {
        return None;
    }

    let v = (a as u32) << 18 | (b as u32) << 12 | (c as u32) << 6 | d as u32;
    Some([(v >> 16) as u8, (v >> 8) as u8, v as u8])
}

/// Encodes every complete trio of `input`. Returns input bytes consumed.
pub fn encode_blocks(input: &[u8], out: &mut [u8]) -> usize {
    let (trios, _) = input.as_chunks::<3>();
    let (quartets, _) = out.as_chunks_mut::<4>();
    debug_assert!(quartets.len() >= trios.len());

    let mut consumed = 0;
    for (trio, quartet) in trios.iter().zip(quartets.iter_mut()) {
        *quartet = encode_trio(trio);
        consumed += 3;
    }
    consumed
}

/// Encodes the 0-2 bytes left after the last trio, adding padding.
///
/// Returns characters written: 0 or 4.
pub fn encode_tail(tail: &[u8], out: &mut [u8]) -> usize {
    match *tail {
        [] => 0,
        [b0] => {
            out[0] = ENCODE_TABLE[(b0 >> 2) as usize];
            out[1] = ENCODE_TABLE[((b0 & 0x03) << 4) as usize];
            out[2] = PAD;
            out[3] = PAD;
            4
        }
        [b0, b1] => {
            out[0] = ENCODE_TABLE[(b0 >> 2) as usize];
            out[1] = ENCODE_TABLE[((b0 & 0x03) << 4 | b1 >> 4) as usize];
            out[2] = ENCODE_TABLE[((b1 & 0x0F) << 2) as usize];
            out[3] = PAD;
            4
        }
        _ => {
            debug_assert!(false, "encode_tail called with {} bytes", tail.len());
            0
        }
    }
}

/// Encodes all of `input`, padding included. Returns characters written.
pub fn encode(input: &[u8], out: &mut [u8]) -> usize {
    let consumed = encode_blocks(input, out);
    let written = consumed / 3 * 4;
    written + encode_tail(&input[consumed..], &mut out[written..])
}

/// Decodes unpadded quartets until the input runs out of whole quartets or
/// one holds padding or an invalid character. Returns characters consumed.
pub fn decode_blocks(input: &[u8], out: &mut [u8]) -> usize {
    let (quartets, _) = input.as_chunks::<4>();
    let (trios, _) = out.as_chunks_mut::<3>();

    let mut consumed = 0;
    for (quartet, trio) in quartets.iter().zip(trios.iter_mut()) {
        match decode_quartet(quartet) {
            Some(bytes) => *trio = bytes,
            None => break,
        }
        consumed += 4;
    }
    consumed
}

/// Decodes a final `xx==` or `xxx=` quartet into `out`.
///
/// Returns the byte count (1 or 2), or `None` if the quartet has another
/// shape. Bits below the last full byte are discarded.
pub(crate) fn decode_padded_quartet(quartet: &[u8; 4], out: &mut [u8]) -> Option<usize> {
    let a = decode_char(quartet[0]);
    let b = decode_char(quartet[1]);
    if (a | b) & 0xC0 != 0 || quartet[3] != PAD {
        return None;
    }

    if quartet[2] == PAD {
        out[0] = a << 2 | b >> 4;
        return Some(1);
    }

    let c = decode_char(quartet[2]);
    if c & 0xC0 != 0 {
        return None;
    }
    out[0] = a << 2 | b >> 4;
    out[1] = b << 4 | c >> 2;
    Some(2)
}

/// Authoritative decode of `input`.
///
/// A padded quartet is accepted only when it is the last four characters.
/// Anything else stops decoding at the start of the offending quartet, with
/// [`DecodeStatus::Padding`] when the first bad character is `=` and
/// [`DecodeStatus::InvalidChar`] otherwise. A trailing partial quartet is
/// left unconsumed with [`DecodeStatus::Ok`].
pub fn decode(input: &[u8], out: &mut [u8]) -> Decoded {
    debug_assert!(out.len() >= decoded_len_estimate(input.len()));

    let consumed = decode_blocks(input, out);
    let written = consumed / 4 * 3;
    let rest = &input[consumed..];

    let Some((quartet, _)) = rest.split_first_chunk::<4>() else {
        return Decoded {
            written,
            consumed,
            status: DecodeStatus::Ok,
        };
    };

    if rest.len() == 4
        && let Some(n) = decode_padded_quartet(quartet, &mut out[written..])
    {
        return Decoded {
            written: written + n,
            consumed: consumed + 4,
            status: DecodeStatus::Ok,
        };
    }

    let is_bad = |&&c: &&u8| c == PAD || decode_char(c) & 0xC0 != 0;
    let status = match quartet.iter().find(is_bad) {
        Some(&PAD) => DecodeStatus::Padding,
        _ => DecodeStatus::InvalidChar,
    };
    Decoded {
        written,
        consumed,
        status,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alphabet::encoded_len;

    fn encode_vec(input: &[u8]) -> Vec<u8> {
        let mut out = vec![0u8; encoded_len(input.len())];
        let written = encode(input, &mut out);
        out.truncate(written);
        out
    }

    fn decode_vec(input: &[u8]) -> (Vec<u8>, Decoded) {
        let mut out = vec![0u8; decoded_len_estimate(input.len())];
        let result = decode(input, &mut out);
        out.truncate(result.written);
        (out, result)
    }

    #[test]
    fn test_encode_known_values() {
        let test_cases = [
            (b"".as_slice(), "".as_bytes()),
            (b"f", b"Zg=="),
            (b"fo", b"Zm8="),
            (b"foo", b"Zm9v"),
            (b"foob", b"Zm9vYg=="),
            (b"fooba", b"Zm9vYmE="),
            (b"foobar", b"Zm9vYmFy"),
            (b"Man", b"TWFu"),
            (b"Ma", b"TWE="),
        ];

        for (input, expected) in test_cases {
            assert_eq!(encode_vec(input), expected, "Failed for input: {:?}", input);
        }
    }

    #[test]
    fn test_padding_law() {
        for len in 0..20usize {
            let data = vec![0xA5u8; len];
            let encoded = encode_vec(&data);
            assert_eq!(encoded.len(), encoded_len(len));
            let pads = encoded.iter().filter(|&&c| c == PAD).count();
            assert_eq!(pads, [0, 2, 1][len % 3], "len {}", len);
        }
    }

    #[test]
    fn test_encode_blocks_leaves_tail() {
        let mut out = [0u8; 8];
        assert_eq!(encode_blocks(b"Man!", &mut out), 3);
        assert_eq!(&out[..4], b"TWFu");
    }

    #[test]
    fn test_decode_padded_final_quartet() {
        let (bytes, result) = decode_vec(b"SGVsbG8=");
        assert_eq!(bytes, b"Hello");
        assert_eq!(result.consumed, 8);
        assert_eq!(result.status, DecodeStatus::Ok);

        let (bytes, result) = decode_vec(b"Zg==");
        assert_eq!(bytes, b"f");
        assert_eq!(result.consumed, 4);
    }

    #[test]
    fn test_decode_invalid_character() {
        let (bytes, result) = decode_vec(b"AAAA#AAA");
        assert_eq!(bytes, [0, 0, 0]);
        assert_eq!(result.consumed, 4);
        assert_eq!(result.status, DecodeStatus::InvalidChar);

        let (_, result) = decode_vec(b"AA\xC3\xA9");
        assert_eq!(result.consumed, 0);
        assert_eq!(result.status, DecodeStatus::InvalidChar);
    }

    #[test]
    fn test_decode_padding_not_at_end() {
        let (bytes, result) = decode_vec(b"Zg==Zm8=");
        assert_eq!(bytes, b"");
        assert_eq!(result.consumed, 0);
        assert_eq!(result.status, DecodeStatus::Padding);

        let (_, result) = decode_vec(b"TWFu=AAA");
        assert_eq!(result.consumed, 4);
        assert_eq!(result.status, DecodeStatus::Padding);
    }

    #[test]
    fn test_decode_bad_padded_shapes() {
        // Padding with a single data character cannot end a quartet.
        let (_, result) = decode_vec(b"A===");
        assert_eq!(result.consumed, 0);
        assert_eq!(result.status, DecodeStatus::Padding);

        let (_, result) = decode_vec(b"AA=A");
        assert_eq!(result.consumed, 0);
        assert_eq!(result.status, DecodeStatus::Padding);

        let (_, result) = decode_vec(b"A#==");
        assert_eq!(result.status, DecodeStatus::InvalidChar);
    }

    #[test]
    fn test_decode_partial_tail_is_left() {
        let (bytes, result) = decode_vec(b"TWFuTW");
        assert_eq!(bytes, b"Man");
        assert_eq!(result.consumed, 4);
        assert_eq!(result.status, DecodeStatus::Ok);
    }

    #[test]
    fn test_round_trip() {
        for len in 0..100 {
            let original: Vec<u8> = (0..len).map(|i| (i * 7) as u8).collect();
            let encoded = encode_vec(&original);
            let (decoded, result) = decode_vec(&encoded);
            assert_eq!(decoded, original, "Round-trip failed at length {}", len);
            assert_eq!(result.consumed, encoded.len());
        }
    }
}
