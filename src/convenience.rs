//! Whole-buffer encode and decode.
//!
//! [`decode`] runs the tiered fast path first and only falls back to the
//! character-at-a-time state machine below once the fast path stops. Clean
//! input never reaches the slow path.

use serde::Deserialize;

use crate::alphabet::{PAD, decode_char, decoded_len_estimate};
use crate::codec::Codec;
use crate::errors::DecodeError;

/// How the reference decoder treats input that is not canonical base64.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecodeMode {
    /// Reject anything outside the alphabet and any misplaced padding.
    Strict,
    /// Skip bytes outside the alphabet (whitespace, line breaks) and stop at
    /// the first padding that completes a quartet.
    #[default]
    Lenient,
}

impl DecodeMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DecodeMode::Strict => "strict",
            DecodeMode::Lenient => "lenient",
        }
    }
}

/// Encodes `input` using the detected capabilities.
///
/// # Example
/// ```
/// assert_eq!(base64_tiers::encode(b"Man"), "TWFu");
/// ```
pub fn encode(input: &[u8]) -> String {
    Codec::detected().encode(input)
}

/// Decodes `input` using the detected capabilities.
///
/// # Example
/// ```
/// use base64_tiers::{DecodeMode, decode};
///
/// assert_eq!(decode(b"SGVs\nbG8=", DecodeMode::Lenient).unwrap(), b"Hello");
/// assert!(decode(b"SGVs\nbG8=", DecodeMode::Strict).is_err());
/// ```
pub fn decode(input: &[u8], mode: DecodeMode) -> Result<Vec<u8>, DecodeError> {
    Codec::detected().decode(input, mode)
}

impl Codec {
    /// Decodes all of `input`, resuming with the reference rules wherever
    /// the fast path stops.
    pub fn decode(&self, input: &[u8], mode: DecodeMode) -> Result<Vec<u8>, DecodeError> {
        let mut out = vec![0u8; decoded_len_estimate(input.len())];
        let fast = self.decode_sized(input, &mut out);
        out.truncate(fast.written);

        if fast.is_complete(input.len()) {
            return Ok(out);
        }

        let mut state = Resume::new(out, fast.consumed);
        state.run(input, mode)?;
        Ok(state.out)
    }
}

/// Character-at-a-time decoder picking up at a quartet boundary.
struct Resume {
    out: Vec<u8>,
    start: usize,
    quad_pos: u8,
    left: u8,
    data_chars: usize,
    pads: usize,
    padding_started: bool,
}

impl Resume {
    fn new(out: Vec<u8>, start: usize) -> Self {
        Resume {
            out,
            start,
            quad_pos: 0,
            left: 0,
            data_chars: start,
            pads: 0,
            padding_started: false,
        }
    }

    fn run(&mut self, input: &[u8], mode: DecodeMode) -> Result<(), DecodeError> {
        let strict = mode == DecodeMode::Strict;

        for (position, &c) in input.iter().enumerate().skip(self.start) {
            if c == PAD {
                self.padding_started = true;
                if strict && self.quad_pos < 2 {
                    return Err(DecodeError::InvalidPadding { position });
                }
                self.pads += 1;
                if self.quad_pos >= 2 && self.quad_pos as usize + self.pads >= 4 {
                    if strict && position + 1 < input.len() {
                        return Err(DecodeError::ExcessData {
                            position: position + 1,
                        });
                    }
                    // Bits left over in a padded quartet are dropped.
                    return Ok(());
                }
                continue;
            }

            let value = decode_char(c);
            if value >= 64 {
                if strict {
                    return Err(DecodeError::InvalidCharacter { byte: c, position });
                }
                continue;
            }

            if strict && self.padding_started {
                return Err(DecodeError::InvalidPadding { position });
            }
            self.pads = 0;
            self.push_sextet(value);
        }

        match self.quad_pos {
            0 => Ok(()),
            1 => Err(DecodeError::InvalidLength {
                data_chars: self.data_chars,
            }),
            _ => Err(DecodeError::IncompletePadding),
        }
    }

    #[inline]
    fn push_sextet(&mut self, value: u8) {
        self.data_chars += 1;
        match self.quad_pos {
            0 => {
                self.left = value;
                self.quad_pos = 1;
            }
            1 => {
                self.out.push(self.left << 2 | value >> 4);
                self.left = value & 0x0F;
                self.quad_pos = 2;
            }
            2 => {
                self.out.push(self.left << 4 | value >> 2);
                self.left = value & 0x03;
                self.quad_pos = 3;
            }
            _ => {
                self.out.push(self.left << 6 | value);
                self.left = 0;
                self.quad_pos = 0;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simd::{Capabilities, Tier};

    fn codecs() -> Vec<Codec> {
        let caps = Capabilities::probe();
        let mut codecs = vec![Codec::scalar()];
        for tier in Tier::ALL {
            if let Ok(codec) = Codec::with_tier(caps, tier) {
                codecs.push(codec);
            }
        }
        codecs
    }

    fn lenient(input: &[u8]) -> Result<Vec<u8>, DecodeError> {
        decode(input, DecodeMode::Lenient)
    }

    fn strict(input: &[u8]) -> Result<Vec<u8>, DecodeError> {
        decode(input, DecodeMode::Strict)
    }

    #[test]
    fn test_encode_known_values() {
        assert_eq!(encode(b""), "");
        assert_eq!(encode(b"Hello"), "SGVsbG8=");
        assert_eq!(encode(b"Hello, World!"), "SGVsbG8sIFdvcmxkIQ==");
    }

    #[test]
    fn test_clean_input_both_modes() {
        for mode in [DecodeMode::Strict, DecodeMode::Lenient] {
            assert_eq!(decode(b"", mode).unwrap(), b"");
            assert_eq!(decode(b"SGVsbG8=", mode).unwrap(), b"Hello");
            assert_eq!(
                decode(b"SGVsbG8sIFdvcmxkIQ==", mode).unwrap(),
                b"Hello, World!"
            );
        }
    }

    #[test]
    fn test_lenient_skips_non_alphabet() {
        assert_eq!(lenient(b"SGVs\nbG8=").unwrap(), b"Hello");
        assert_eq!(lenient(b" S G V s b G 8 = ").unwrap(), b"Hello");
        assert_eq!(lenient(b"TWFu\r\nTWFu\r\n").unwrap(), b"ManMan");
        assert_eq!(lenient(b"TW!Fu").unwrap(), b"Man");
    }

    #[test]
    fn test_lenient_stops_at_completing_padding() {
        assert_eq!(lenient(b"Zg==Zm9v").unwrap(), b"f");
        assert_eq!(lenient(b"Zm8=trailing").unwrap(), b"fo");
        // Padding that cannot complete a quartet is ignored.
        assert_eq!(lenient(b"=TWFu").unwrap(), b"Man");
        assert_eq!(lenient(b"TW=Fu").unwrap(), b"Man");
    }

    #[test]
    fn test_strict_rejects_non_alphabet() {
        assert_eq!(
            strict(b"SGVs\nbG8="),
            Err(DecodeError::InvalidCharacter {
                byte: b'\n',
                position: 4
            })
        );
        assert_eq!(
            strict(b"TWFu\xFF"),
            Err(DecodeError::InvalidCharacter {
                byte: 0xFF,
                position: 4
            })
        );
    }

    #[test]
    fn test_strict_padding_errors() {
        assert_eq!(
            strict(b"=TWF"),
            Err(DecodeError::InvalidPadding { position: 0 })
        );
        assert_eq!(
            strict(b"TWFuT==="),
            Err(DecodeError::InvalidPadding { position: 5 })
        );
        assert_eq!(
            strict(b"TW=u"),
            Err(DecodeError::InvalidPadding { position: 3 })
        );
        assert_eq!(
            strict(b"Zg==Zm9v"),
            Err(DecodeError::ExcessData { position: 4 })
        );
        assert_eq!(
            strict(b"Zm8=\n"),
            Err(DecodeError::ExcessData { position: 4 })
        );
    }

    #[test]
    fn test_length_errors_both_modes() {
        for mode in [DecodeMode::Strict, DecodeMode::Lenient] {
            assert_eq!(
                decode(b"TWFuT", mode),
                Err(DecodeError::InvalidLength { data_chars: 5 })
            );
            assert_eq!(decode(b"TWFuTW", mode), Err(DecodeError::IncompletePadding));
            assert_eq!(
                decode(b"TWFuTWE", mode),
                Err(DecodeError::IncompletePadding)
            );
        }
    }

    #[test]
    fn test_resume_positions_are_absolute() {
        let mut text = encode(&[7u8; 150]).into_bytes();
        text[130] = b'#';
        for codec in codecs() {
            assert_eq!(
                codec.decode(&text, DecodeMode::Strict),
                Err(DecodeError::InvalidCharacter {
                    byte: b'#',
                    position: 130
                })
            );
        }
    }

    #[test]
    fn test_every_tier_agrees_on_dirty_input() {
        let clean = encode(&(0..=255u8).collect::<Vec<_>>());
        let dirty: Vec<u8> = clean
            .as_bytes()
            .chunks(19)
            .flat_map(|chunk| chunk.iter().copied().chain(*b"\r\n"))
            .collect();

        let expected: Vec<u8> = (0..=255u8).collect();
        for codec in codecs() {
            assert_eq!(codec.decode(&dirty, DecodeMode::Lenient).unwrap(), expected);
            assert!(codec.decode(&dirty, DecodeMode::Strict).is_err());
        }
    }
}
