//! Outbound text send pipeline (C7, §4.8).
//!
//! Given a message kind, recipient, and body, builds the IRC command
//! header/footer for that kind and splits the body into wire-safe lines:
//! each produced line honors `max_msg_len`, never contains a literal `\n`,
//! and never slices a UTF-8 code point in half. [`crate::channel::Channel`]
//! hands each framed line to the connection and pairs it with the
//! unframed body for the corresponding `sent`/`send-error` event.

use crate::pending::MessageKind;
use crate::util::truncate_utf8_safe;

const CTCP_DELIM: char = '\u{1}';

fn header(kind: MessageKind, recipient: &str) -> String {
    match kind {
        MessageKind::Normal => format!("PRIVMSG {recipient} :"),
        MessageKind::Action => format!("PRIVMSG {recipient} :{CTCP_DELIM}ACTION "),
        MessageKind::Notice => format!("NOTICE {recipient} :"),
    }
}

fn footer(kind: MessageKind) -> &'static str {
    match kind {
        MessageKind::Action => "\u{1}",
        MessageKind::Normal | MessageKind::Notice => "",
    }
}

/// One outbound line: the complete framed command text, and the
/// human-readable body (no header/footer) to pair with the `sent` event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendChunk {
    /// The complete IRC command line (no trailing CRLF).
    pub line: String,
    /// The body of this chunk, unframed.
    pub body: String,
}

/// Splits `text` into wire-safe [`SendChunk`]s for `kind` addressed to
/// `recipient`, honoring `max_msg_len` as the maximum total line length.
///
/// Per §4.8: whenever a `\n` occurs within the first
/// `max_msg_len - len(header) - len(footer)` bytes of the remaining text,
/// the chunk ends there and the newline is skipped; otherwise, if the
/// remaining text exceeds that budget, the chunk takes exactly that many
/// bytes but first retreats to the previous UTF-8 code-point boundary.
pub fn split_for_send(kind: MessageKind, recipient: &str, text: &str, max_msg_len: usize) -> Vec<SendChunk> {
    let head = header(kind, recipient);
    let tail = footer(kind);
    let budget = max_msg_len.saturating_sub(head.len() + tail.len());

    let mut chunks = Vec::new();
    let mut remaining = text;

    while !remaining.is_empty() {
        let search_len = budget.min(remaining.len());
        let newline_pos = remaining.as_bytes()[..search_len].iter().position(|&b| b == b'\n');

        let (body, rest) = match newline_pos {
            Some(idx) => (&remaining[..idx], &remaining[idx + 1..]),
            None if remaining.len() > budget => {
                let chunk = truncate_utf8_safe(remaining, budget);
                if chunk.is_empty() {
                    // `budget` is too small to fit even the first code point
                    // (e.g. `max_msg_len` barely covers the header/footer).
                    // Emitting an empty chunk here would make no progress
                    // and spin forever, so force through exactly one code
                    // point, oversized line and all, rather than hang.
                    let first_len = remaining.chars().next().map_or(0, char::len_utf8);
                    remaining.split_at(first_len)
                } else {
                    (chunk, &remaining[chunk.len()..])
                }
            }
            None => (remaining, ""),
        };

        chunks.push(SendChunk {
            line: format!("{head}{body}{tail}"),
            body: body.to_string(),
        });
        remaining = rest;
    }

    if chunks.is_empty() {
        // An empty body still produces one empty line, matching plain
        // PRIVMSG/NOTICE semantics for an intentionally blank message.
        chunks.push(SendChunk { line: format!("{head}{tail}"), body: String::new() });
    }

    chunks
}
