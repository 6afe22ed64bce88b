//! CTCP ACTION detection and body stripping (C9, §4.8).
//!
//! Inbound text bodies and outbound ACTION bodies share the `\001ACTION
//! ...\001` convention. This module only concerns itself with the ACTION
//! wrapper and with stripping residual CTCP noise from a body that isn't
//! itself an ACTION — CTCP query/reply handling (VERSION, PING, etc.) is
//! out of scope, same as the rest of non-text channel operations.

const CTCP_DELIM: char = '\u{1}';
const ACTION_PREFIX: &str = "ACTION ";

/// Decodes an inbound PRIVMSG/NOTICE body, detecting the CTCP ACTION
/// wrapper. Returns `(true, inner_text)` if `body` begins with
/// `\001ACTION ` (case-insensitive) and ends with `\001`, with the inner
/// text in between; otherwise `(false, body)` unchanged.
pub fn decode_ctcp_action(body: &str) -> (bool, &str) {
    let Some(rest) = body.strip_prefix(CTCP_DELIM) else {
        return (false, body);
    };
    let prefix_matches = rest
        .as_bytes()
        .get(..ACTION_PREFIX.len())
        .is_some_and(|b| b.eq_ignore_ascii_case(ACTION_PREFIX.as_bytes()));
    if !prefix_matches {
        return (false, body);
    }
    // `prefix_matches` only confirms a byte-level match, not that byte
    // index `ACTION_PREFIX.len()` lands on a char boundary (ASCII bytes
    // can appear as a UTF-8 continuation byte). Re-slice safely.
    let Some(after_prefix) = rest.get(ACTION_PREFIX.len()..) else {
        return (false, body);
    };
    match after_prefix.strip_suffix(CTCP_DELIM) {
        Some(inner) => (true, inner),
        None => (false, body),
    }
}

/// Strips every `\001...\001` CTCP extended-data run from `body`. An
/// unterminated run (an opening `\001` with no matching close) is
/// truncated at the first `\001`, matching the original implementation's
/// "blingbling" stripper: other CTCP is noise to a text channel, only the
/// ACTION wrapper (handled separately, before this is called) is
/// semantically significant.
pub fn strip_ctcp(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    let mut in_ctcp = false;
    for ch in body.chars() {
        if ch == CTCP_DELIM {
            in_ctcp = !in_ctcp;
            continue;
        }
        if !in_ctcp {
            out.push(ch);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_action_wrapper() {
        let (is_action, text) = decode_ctcp_action("\u{1}ACTION waves\u{1}");
        assert!(is_action);
        assert_eq!(text, "waves");
    }

    #[test]
    fn decode_is_case_insensitive_on_action_keyword() {
        let (is_action, text) = decode_ctcp_action("\u{1}action waves\u{1}");
        assert!(is_action);
        assert_eq!(text, "waves");
    }

    #[test]
    fn non_action_text_passes_through() {
        let (is_action, text) = decode_ctcp_action("hello world");
        assert!(!is_action);
        assert_eq!(text, "hello world");
    }

    #[test]
    fn unterminated_action_is_not_decoded() {
        let (is_action, text) = decode_ctcp_action("\u{1}ACTION waves");
        assert!(!is_action);
        assert_eq!(text, "\u{1}ACTION waves");
    }

    #[test]
    fn strip_ctcp_removes_embedded_runs() {
        let stripped = strip_ctcp("hello \u{1}VERSION\u{1} world");
        assert_eq!(stripped, "hello  world");
    }

    #[test]
    fn strip_ctcp_truncates_unterminated_run() {
        let stripped = strip_ctcp("hello \u{1}VERSION world");
        assert_eq!(stripped, "hello ");
    }

    #[test]
    fn strip_ctcp_leaves_plain_text_alone() {
        assert_eq!(strip_ctcp("plain text"), "plain text");
    }

    #[test]
    fn round_trips_through_encode_and_decode() {
        let body = "waves hello";
        let encoded = format!("\u{1}ACTION {body}\u{1}");
        let (is_action, decoded) = decode_ctcp_action(&encoded);
        assert!(is_action);
        assert_eq!(decoded, body);
    }
}
