//! Small string helpers shared by the send pipeline and mode ingest.

/// Truncates a string to at most `max_bytes` bytes without breaking a
/// multi-byte UTF-8 codepoint at the end.
///
/// Used by [`crate::send::split_for_send`] as the byte-budget fallback
/// when a chunk has no earlier newline to break on.
///
/// # Examples
///
/// ```
/// use muc_channel::util::truncate_utf8_safe;
///
/// assert_eq!(truncate_utf8_safe("hello world", 5), "hello");
///
/// let emoji = "Hello 👋 World";
/// assert_eq!(truncate_utf8_safe(emoji, 8), "Hello "); // stops before the 4-byte emoji
///
/// assert_eq!(truncate_utf8_safe("hi", 10), "hi");
/// ```
#[inline]
pub fn truncate_utf8_safe(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }

    let mut end = max_bytes;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }

    &s[..end]
}

/// ASCII case-insensitive nick comparison.
///
/// IRC nicks are case-insensitive per RFC 2812 under a casemapping the
/// server advertises; with no ISUPPORT/CAP negotiation in scope (§1), this
/// crate uses plain ASCII casefolding. Used by mode ingest's self-privilege
/// check (§4.3) and the NAMES self-sigil check (§4.6).
#[inline]
pub fn nick_eq_ascii(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
}
