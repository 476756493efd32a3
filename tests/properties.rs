//! Property-based tests for the tiered codec
//!
//! Every tier the host supports is checked against the scalar kernel, which
//! is the reference for all output.

use base64_tiers::{
    Capabilities, Codec, DecodeMode, DecodeStatus, Tier, decoded_len_estimate, encoded_len,
};
use proptest::prelude::*;

fn codecs() -> Vec<Codec> {
    let caps = Capabilities::probe();
    let mut codecs = vec![Codec::new(caps), Codec::scalar()];
    for tier in Tier::ALL {
        if let Ok(codec) = Codec::with_tier(caps, tier) {
            codecs.push(codec);
        }
    }
    codecs
}

/// Bytes that are neither alphabet characters nor padding.
fn invalid_byte() -> impl Strategy<Value = u8> {
    any::<u8>().prop_filter("must be outside the alphabet", |&b| {
        !b.is_ascii_alphanumeric() && !matches!(b, b'+' | b'/' | b'=')
    })
}

proptest! {
    #[test]
    fn prop_round_trip_every_tier(data in prop::collection::vec(any::<u8>(), 0..2000)) {
        for codec in codecs() {
            let encoded = codec.encode(&data);
            prop_assert_eq!(encoded.len(), encoded_len(data.len()));

            let mut out = vec![0u8; decoded_len_estimate(encoded.len())];
            let result = codec.decode_to_slice(encoded.as_bytes(), &mut out).unwrap();
            prop_assert_eq!(result.status, DecodeStatus::Ok);
            prop_assert_eq!(result.consumed, encoded.len());
            prop_assert_eq!(&out[..result.written], &data[..]);
        }
    }

    #[test]
    fn prop_tiers_agree_with_scalar(data in prop::collection::vec(any::<u8>(), 0..4000)) {
        let expected = Codec::scalar().encode(&data);
        for codec in codecs() {
            prop_assert_eq!(&codec.encode(&data), &expected, "{:?}", codec);
        }
    }

    #[test]
    fn prop_padding_law(data in prop::collection::vec(any::<u8>(), 0..300)) {
        let encoded = base64_tiers::encode(&data);
        let pads = encoded.bytes().rev().take_while(|&c| c == b'=').count();
        prop_assert_eq!(pads, [0, 2, 1][data.len() % 3]);
        prop_assert_eq!(encoded.bytes().filter(|&c| c == b'=').count(), pads);
    }

    #[test]
    fn prop_invalid_char_boundary(
        data in prop::collection::vec(any::<u8>(), 1..1500),
        seed in any::<usize>(),
        bad in invalid_byte(),
    ) {
        let mut text = Codec::scalar().encode(&data).into_bytes();
        let pos = seed % text.len();
        text[pos] = bad;

        for codec in codecs() {
            let mut out = vec![0u8; decoded_len_estimate(text.len())];
            let result = codec.decode_to_slice(&text, &mut out).unwrap();
            prop_assert_eq!(result.status, DecodeStatus::InvalidChar);
            prop_assert_eq!(result.consumed % 4, 0);
            prop_assert_eq!(result.consumed, pos / 4 * 4);
            prop_assert_eq!(&out[..result.written], &data[..result.written]);
        }
    }

    #[test]
    fn prop_lenient_ignores_line_breaks(
        data in prop::collection::vec(any::<u8>(), 0..1000),
        width in 1usize..100,
    ) {
        let encoded = base64_tiers::encode(&data);
        let wrapped: Vec<u8> = encoded
            .as_bytes()
            .chunks(width)
            .flat_map(|line| line.iter().copied().chain(std::iter::once(b'\n')))
            .collect();

        for codec in codecs() {
            let decoded = codec.decode(&wrapped, DecodeMode::Lenient).unwrap();
            prop_assert_eq!(&decoded, &data);
        }
    }
}
