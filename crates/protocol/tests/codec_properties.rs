//! Property-based tests for the number codec, frames and scrambling

#![allow(clippy::expect_used, clippy::unwrap_used)]

use eoclient_core::EoError;
use eoclient_protocol::codecs::{decode_number, encode_number, NUMBER_MAX};
use eoclient_protocol::sequence::SequenceState;
use eoclient_protocol::{PacketAction, PacketEncoder, PacketFamily, PacketFrame};
use proptest::prelude::*;

fn width_and_value() -> impl Strategy<Value = (usize, u32)> {
    (1usize..=4).prop_flat_map(|width| {
        let max = (NUMBER_MAX[width - 1] - 1).min(u32::MAX as u64) as u32;
        (Just(width), 0..=max)
    })
}

// Property: every representable value survives encode/decode at its width
proptest! {
    #[test]
    fn prop_number_roundtrip((width, value) in width_and_value()) {
        let encoded = encode_number(value, width).expect("in range");
        prop_assert_eq!(encoded.len(), width);
        prop_assert_eq!(decode_number(&encoded).unwrap(), value);
    }
}

// Property: encoded bytes never use 0 or 255
proptest! {
    #[test]
    fn prop_encoded_bytes_in_range((width, value) in width_and_value()) {
        for byte in encode_number(value, width).unwrap() {
            prop_assert!((1..=254).contains(&byte));
        }
    }
}

// Property: values above a width's range are rejected
proptest! {
    #[test]
    fn prop_overflow_rejected(width in 1usize..=3, extra in 0u32..1_000_000) {
        let value = NUMBER_MAX[width - 1] as u32 + extra;
        let is_overflow = matches!(
            encode_number(value, width),
            Err(EoError::EncodingOverflow { .. })
        );
        prop_assert!(is_overflow);
    }
}

// Property: frame fields read back in write order
proptest! {
    #[test]
    fn prop_frame_fields_roundtrip(
        a in 0u32..253,
        b in 0u32..64_009,
        c in 0u32..16_194_277,
        name in "[a-zA-Z0-9 ]{0,40}",
    ) {
        let mut frame = PacketFrame::new(PacketFamily::Locker, PacketAction::Add);
        frame.add_byte(a).unwrap();
        frame.add_short(b).unwrap();
        frame.add_three(c).unwrap();
        frame.add_prefixed_string(&name).unwrap();

        let wire = frame.to_wire().unwrap();
        let mut decoded = PacketFrame::from_body(&wire[2..]).unwrap().unwrap();
        prop_assert_eq!(decoded.get_byte().unwrap(), a);
        prop_assert_eq!(decoded.get_short().unwrap(), b);
        prop_assert_eq!(decoded.get_three().unwrap(), c);
        prop_assert_eq!(decoded.get_prefixed_string().unwrap(), name);
        prop_assert!(!decoded.has_more_data());
    }
}

// Property: the peer can always undo our scrambling
proptest! {
    #[test]
    fn prop_scramble_roundtrip(
        decode in 0u8..=20,
        encode in 0u8..=20,
        family in 1u8..=51,
        rest in prop::collection::vec(any::<u8>(), 1..300),
    ) {
        let client = PacketEncoder::new(decode, encode);
        let server = client.mirrored();

        let mut original = vec![family];
        original.extend(rest);

        let mut wire = original.clone();
        client.encode(&mut wire);
        prop_assume!(!(wire[0] == 255 && wire[1] == 255));
        server.decode(&mut wire);
        prop_assert_eq!(wire, original);
    }
}

// Property: identically seeded states agree at every counter position
proptest! {
    #[test]
    fn prop_sequence_agreement(s1 in 2u32..253, s2 in 0u32..253, steps in 1usize..50) {
        let mut ours = SequenceState::from_init(s1, s2).unwrap();
        let mut theirs = SequenceState::from_init(s1, s2).unwrap();
        for _ in 0..steps {
            prop_assert_eq!(ours.next_value(), theirs.next_value());
        }
    }
}
