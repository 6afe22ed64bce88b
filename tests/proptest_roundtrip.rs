//! Property-based tests for the §8 round-trip invariants.
//!
//! Uses proptest to generate random message bodies and mode-flag batches
//! and verify that:
//! 1. CTCP ACTION encode/decode round-trips for bodies without embedded `\n`
//!    that fit within the send budget.
//! 2. Applying a mode-flag addition then removing the exact same bits
//!    restores the original flag word.
//! 3. The UTF-8-safe send splitter never slices a code point and never
//!    exceeds the configured budget, for arbitrary text.

use proptest::prelude::*;

use muc_channel::ctcp::decode_ctcp_action;
use muc_channel::mode::ModeFlag;
use muc_channel::pending::MessageKind;
use muc_channel::send::split_for_send;

/// Message text with no CR/LF/NUL, short enough to round-trip within a
/// generous send budget.
fn body_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-zA-Z0-9 .,!?'-]{0,120}").expect("valid regex")
}

/// Arbitrary text, including multi-byte UTF-8, for exercising the splitter.
fn free_text_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec(
        prop_oneof![
            Just('\n'),
            any::<char>().prop_filter("no NUL", |c| *c != '\0'),
        ],
        0..200,
    )
    .prop_map(|chars| chars.into_iter().collect())
}

fn mode_flag_strategy() -> impl Strategy<Value = ModeFlag> {
    (0u16..(1 << 15)).prop_map(ModeFlag::from_bits_truncate)
}

proptest! {
    #[test]
    fn normal_message_round_trips_through_send_and_decode(body in body_strategy()) {
        let chunks = split_for_send(MessageKind::Normal, "#room", &body, 400);
        prop_assert_eq!(chunks.len(), 1);
        let (is_action, decoded) = decode_ctcp_action(&chunks[0].body);
        prop_assert!(!is_action);
        prop_assert_eq!(decoded, body.as_str());
    }

    #[test]
    fn action_message_round_trips_through_send_and_decode(body in body_strategy()) {
        let chunks = split_for_send(MessageKind::Action, "#room", &body, 400);
        prop_assert_eq!(chunks.len(), 1);
        // The framed line carries the CTCP wrapper; decoding the framed
        // payload (after the PRIVMSG header) recovers the original body.
        let framed_payload = chunks[0].line.splitn(2, " :").nth(1).unwrap();
        let (is_action, decoded) = decode_ctcp_action(framed_payload);
        prop_assert!(is_action);
        prop_assert_eq!(decoded, body.as_str());
    }

    #[test]
    fn mode_add_then_remove_restores_flags(before in mode_flag_strategy(), add in mode_flag_strategy()) {
        // Only meaningful when `add` names bits not already set in `before`
        // — per §8, adding then removing the same freshly-added mask must
        // restore the original word, not a mask that overlaps pre-existing
        // flags (removing those would also clear state `add` never set).
        prop_assume!((before & add).is_empty());
        let after_add = (before) | add;
        let restored = after_add - add;
        prop_assert_eq!(restored, before);
    }

    #[test]
    fn send_split_never_exceeds_budget_or_splits_codepoints(text in free_text_strategy()) {
        let chunks = split_for_send(MessageKind::Normal, "#r", &text, 40);
        for chunk in &chunks {
            prop_assert!(chunk.line.len() <= 40);
            prop_assert!(chunk.line.is_char_boundary(chunk.line.len()));
            prop_assert!(!chunk.body.contains('\n'));
        }
    }
}
