//! Property-based tests for the frame and status codecs.
//!
//! These use proptest to check the codec invariants over arbitrary input:
//! - Encoded frames decode back to the same frame
//! - Any corruption of checksum or tail is rejected, as is trailing input
//! - Status payloads re-encode byte for byte (bar the hot-water quirk)
//! - No input makes a decoder panic

use proptest::prelude::*;

use rinnai_bridge::codec::{ClockStamp, HotWaterSetpoint, StatusPayload, STATUS_PAYLOAD_LEN};
use rinnai_bridge::protocol::{checksum, Frame, FRAME_TAIL};
use rinnai_bridge::BridgeError;

fn frame_strategy() -> impl Strategy<Value = Frame> {
    ("[a-z0-9]{6}", any::<u8>(), "[ -~]{0,255}")
        .prop_map(|(prefix, command, payload)| Frame::new(prefix, command, payload))
}

fn status_text_strategy() -> impl Strategy<Value = String> {
    proptest::string::string_regex(&format!("[0-9a-f]{{{}}}", STATUS_PAYLOAD_LEN))
        .expect("valid regex")
}

#[test]
fn prop_frame_roundtrip() {
    proptest!(|(frame in frame_strategy())| {
        let raw = frame.encode().unwrap();
        prop_assert_eq!(raw.len(), 14 + frame.payload.len());
        prop_assert!(raw.ends_with("7d"));
        prop_assert_eq!(Frame::decode(&raw).unwrap(), frame);
    });
}

#[test]
fn prop_wrong_checksum_rejected() {
    proptest!(|(frame in frame_strategy(), wrong in any::<u8>())| {
        let good = checksum(&frame.payload);
        prop_assume!(wrong != good);

        let mut raw = frame.encode().unwrap();
        let at = raw.len() - 4;
        raw.replace_range(at..at + 2, &format!("{:02x}", wrong));

        match Frame::decode(&raw) {
            Err(BridgeError::ChecksumMismatch { expected, actual }) => {
                prop_assert_eq!(expected, good);
                prop_assert_eq!(actual, wrong);
            }
            other => prop_assert!(false, "unexpected {:?}", other),
        }
    });
}

#[test]
fn prop_wrong_tail_rejected() {
    proptest!(|(frame in frame_strategy(), tail in any::<u8>())| {
        prop_assume!(tail != FRAME_TAIL);

        let mut raw = frame.encode().unwrap();
        let at = raw.len() - 2;
        raw.replace_range(at.., &format!("{:02x}", tail));

        prop_assert!(matches!(Frame::decode(&raw), Err(BridgeError::BadTail(t)) if t == tail));
    });
}

#[test]
fn prop_trailing_input_rejected() {
    proptest!(|(frame in frame_strategy(), extra in "[ -~]{1,32}")| {
        let raw = format!("{}{}", frame.encode().unwrap(), extra);
        prop_assert!(
            matches!(Frame::decode(&raw), Err(BridgeError::TrailingData(n)) if n == extra.len())
        );
    });
}

#[test]
fn prop_frame_decode_never_panics() {
    proptest!(|(raw in "\\PC{0,300}")| {
        let _ = Frame::decode(&raw);
    });
}

#[test]
fn prop_status_reencodes_identically() {
    proptest!(|(text in status_text_strategy())| {
        let status = StatusPayload::decode(&text).unwrap();
        let encoded = status.encode().unwrap();

        let hot_water = u8::from_str_radix(&text[6..8], 16).unwrap();
        if hot_water & 0x80 == 0 {
            prop_assert_eq!(encoded, text);
        } else {
            // Only the quirk byte may differ, and it collapses to a bare high bit.
            prop_assert_eq!(status.desired_hot_water_temp, HotWaterSetpoint::Half);
            prop_assert_eq!(&encoded[6..8], "80");
            prop_assert_eq!(&encoded[..6], &text[..6]);
            prop_assert_eq!(&encoded[8..], &text[8..]);
        }
    });
}

#[test]
fn prop_status_wrong_length_rejected() {
    proptest!(|(text in status_text_strategy(), cut in 0usize..STATUS_PAYLOAD_LEN, extra in "[0-9a-f]{1,8}")| {
        prop_assert!(matches!(
            StatusPayload::decode(&text[..cut]),
            Err(BridgeError::TruncatedStatus { actual, .. }) if actual == cut
        ), "truncated input not rejected");
        let long = format!("{}{}", text, extra);
        prop_assert!(
            matches!(StatusPayload::decode(&long), Err(BridgeError::TrailingStatus { .. })),
            "trailing input accepted"
        );
    });
}

#[test]
fn prop_status_decode_never_panics() {
    proptest!(|(text in "\\PC{0,200}")| {
        let _ = StatusPayload::decode(&text);
    });
}

#[test]
fn prop_clock_fields_render_as_hex_of_value() {
    proptest!(|(
        minute in 0u8..60,
        hour in 0u8..24,
        weekday in 0u8..7,
        day in 1u8..32,
        month in 1u8..13,
        year in 0u8..100,
        second in 0u8..60
    )| {
        let stamp = ClockStamp { minute, hour, weekday, day, month, year, second };
        let text = stamp.encode().unwrap();
        prop_assert_eq!(text.len(), ClockStamp::WIDTH);

        let values: Vec<u8> = text
            .as_bytes()
            .chunks(2)
            .map(|pair| u8::from_str_radix(std::str::from_utf8(pair).unwrap(), 16).unwrap())
            .collect();
        prop_assert_eq!(values, vec![minute, hour, weekday, day, month, year, second]);
    });
}
