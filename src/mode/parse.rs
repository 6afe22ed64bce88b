//! Inbound `MODE` argument tokenizer (§4.3).
//!
//! The source's per-letter `switch` becomes a table from letter to
//! `{takes-arg?, meaning}`; the tokenizer walks the sign-prefixed letter
//! run once, consuming positional arguments in order for letters that take
//! one, and yields a flat list of [`ModeToken`] for the caller
//! ([`crate::channel::Channel::mode`]) to fold into `mode_state` and
//! project onto the property bag and group flags.

use super::types::ModeFlag;
use crate::error::ModeParseError;

/// What kind of mode a single letter names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LetterKind {
    /// `o`, `h`, `v` — takes a nick argument, affects privilege sigils.
    Privilege(char),
    /// `l` — takes a decimal argument, sets/clears `USER_LIMIT`.
    Limit,
    /// `k` — takes a key argument, sets/clears `KEY`.
    Key,
    /// A no-argument flag toggle.
    Flag(ModeFlag),
}

fn letter_info(c: char) -> Option<LetterKind> {
    Some(match c {
        'o' | 'h' | 'v' => LetterKind::Privilege(c),
        'l' => LetterKind::Limit,
        'k' => LetterKind::Key,
        'a' => LetterKind::Flag(ModeFlag::ANONYMOUS),
        'i' => LetterKind::Flag(ModeFlag::INVITE_ONLY),
        'm' => LetterKind::Flag(ModeFlag::MODERATED),
        'n' => LetterKind::Flag(ModeFlag::NO_OUTSIDE),
        'q' => LetterKind::Flag(ModeFlag::QUIET),
        'p' => LetterKind::Flag(ModeFlag::PRIVATE),
        's' => LetterKind::Flag(ModeFlag::SECRET),
        'r' => LetterKind::Flag(ModeFlag::SERVER_REOP),
        't' => LetterKind::Flag(ModeFlag::TOPIC_OPS_ONLY),
        _ => return None,
    })
}

/// A single parsed token from a `MODE` argument string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModeToken {
    /// An `o`/`h`/`v` change targeting `nick`.
    Privilege {
        /// Which privilege letter (`o`, `h`, or `v`).
        letter: char,
        /// Adding (`true`) or removing (`false`) the privilege.
        add: bool,
        /// The nick the change applies to.
        nick: String,
    },
    /// An `l` change.
    Limit {
        /// Adding or removing `USER_LIMIT`.
        add: bool,
        /// The decimal value, present only when adding.
        value: Option<u32>,
    },
    /// A `k` change.
    Key {
        /// Adding or removing `KEY`.
        add: bool,
        /// The key string, present only when adding.
        value: Option<String>,
    },
    /// A no-argument flag toggle.
    Flag {
        /// Adding or removing the bit.
        add: bool,
        /// Which bit.
        bit: ModeFlag,
    },
}

/// Tokenizes the mode-argument string exactly as received after the
/// channel name (i.e. without the leading `MODE #chan ` prefix).
///
/// The first whitespace-separated token must be the sign-prefixed letter
/// run (one or more groups of `+`/`-` followed by letters); subsequent
/// tokens are positional arguments, consumed in order by letters that take
/// one. Unknown letters are silently ignored. Fails with
/// [`ModeParseError::MissingSign`] if the first token doesn't begin with
/// `+` or `-`, and with [`ModeParseError::MissingArgument`] /
/// [`ModeParseError::InvalidLimit`] if an argument-taking letter runs out
/// of positional arguments or gets a non-numeric limit.
pub fn parse_mode_string(arg_str: &str) -> Result<Vec<ModeToken>, ModeParseError> {
    let mut parts = arg_str.split_whitespace();
    let letters = parts.next().ok_or_else(|| ModeParseError::MissingSign {
        token: String::new(),
    })?;

    if !letters.starts_with('+') && !letters.starts_with('-') {
        return Err(ModeParseError::MissingSign {
            token: letters.to_string(),
        });
    }

    let mut args = parts;
    let mut tokens = Vec::new();
    let mut add = true;

    for c in letters.chars() {
        match c {
            '+' => add = true,
            '-' => add = false,
            _ => {
                let Some(kind) = letter_info(c) else {
                    continue;
                };

                match kind {
                    LetterKind::Privilege(letter) => {
                        let nick = args.next().ok_or(ModeParseError::MissingArgument { letter })?;
                        tokens.push(ModeToken::Privilege {
                            letter,
                            add,
                            nick: nick.to_string(),
                        });
                    }
                    LetterKind::Limit => {
                        if add {
                            let raw = args.next().ok_or(ModeParseError::MissingArgument { letter: 'l' })?;
                            let value: u32 = raw
                                .parse()
                                .map_err(|_| ModeParseError::InvalidLimit(raw.to_string()))?;
                            tokens.push(ModeToken::Limit { add: true, value: Some(value) });
                        } else {
                            tokens.push(ModeToken::Limit { add: false, value: None });
                        }
                    }
                    LetterKind::Key => {
                        if add {
                            let raw = args.next().ok_or(ModeParseError::MissingArgument { letter: 'k' })?;
                            tokens.push(ModeToken::Key { add: true, value: Some(raw.to_string()) });
                        } else {
                            tokens.push(ModeToken::Key { add: false, value: None });
                        }
                    }
                    LetterKind::Flag(bit) => {
                        tokens.push(ModeToken::Flag { add, bit });
                    }
                }
            }
        }
    }

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_missing_sign() {
        let err = parse_mode_string("im-t").unwrap_err();
        assert!(matches!(err, ModeParseError::MissingSign { .. }));
    }

    #[test]
    fn flags_toggle_without_args() {
        let tokens = parse_mode_string("+im-t").unwrap();
        assert_eq!(
            tokens,
            vec![
                ModeToken::Flag { add: true, bit: ModeFlag::INVITE_ONLY },
                ModeToken::Flag { add: true, bit: ModeFlag::MODERATED },
                ModeToken::Flag { add: false, bit: ModeFlag::TOPIC_OPS_ONLY },
            ]
        );
    }

    #[test]
    fn privilege_consumes_positional_nick() {
        let tokens = parse_mode_string("+o alice").unwrap();
        assert_eq!(
            tokens,
            vec![ModeToken::Privilege { letter: 'o', add: true, nick: "alice".to_string() }]
        );
    }

    #[test]
    fn multiple_privileges_consume_args_in_order() {
        let tokens = parse_mode_string("+ov alice bob").unwrap();
        assert_eq!(
            tokens,
            vec![
                ModeToken::Privilege { letter: 'o', add: true, nick: "alice".to_string() },
                ModeToken::Privilege { letter: 'v', add: true, nick: "bob".to_string() },
            ]
        );
    }

    #[test]
    fn limit_add_consumes_decimal_arg() {
        let tokens = parse_mode_string("+l 42").unwrap();
        assert_eq!(tokens, vec![ModeToken::Limit { add: true, value: Some(42) }]);
    }

    #[test]
    fn limit_remove_takes_no_arg() {
        let tokens = parse_mode_string("-l").unwrap();
        assert_eq!(tokens, vec![ModeToken::Limit { add: false, value: None }]);
    }

    #[test]
    fn key_add_and_remove() {
        let tokens = parse_mode_string("+k hunter2").unwrap();
        assert_eq!(
            tokens,
            vec![ModeToken::Key { add: true, value: Some("hunter2".to_string()) }]
        );
        let tokens = parse_mode_string("-k").unwrap();
        assert_eq!(tokens, vec![ModeToken::Key { add: false, value: None }]);
    }

    #[test]
    fn unknown_letters_are_ignored() {
        let tokens = parse_mode_string("+iZm").unwrap();
        assert_eq!(
            tokens,
            vec![
                ModeToken::Flag { add: true, bit: ModeFlag::INVITE_ONLY },
                ModeToken::Flag { add: true, bit: ModeFlag::MODERATED },
            ]
        );
    }

    #[test]
    fn missing_argument_fails() {
        let err = parse_mode_string("+o").unwrap_err();
        assert!(matches!(err, ModeParseError::MissingArgument { letter: 'o' }));
    }

    #[test]
    fn invalid_limit_fails() {
        let err = parse_mode_string("+l notanumber").unwrap_err();
        assert!(matches!(err, ModeParseError::InvalidLimit(_)));
    }
}
