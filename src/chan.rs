//! Channel name classification.
//!
//! IRC channel names are tagged by their leading character (RFC 2811 §2).
//! Names beginning with `+` are "modeless" channels: no channel modes are
//! tracked by the server, and clients are expected to behave as though
//! mode `t` (topic settable by ops only) is permanently set.

/// The four channel namespaces distinguished by leading character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ChannelKind {
    /// `#` — network-wide channel, visible to all servers.
    Network,
    /// `&` — server-local channel.
    Local,
    /// `+` — modeless channel; no mode support, topic is op-only by convention.
    Modeless,
    /// `!` — "safe" channel with a server-generated unique suffix.
    Safe,
}

/// Classifies a channel name by its leading character.
///
/// Returns [`ChannelKind::Network`] for any name that doesn't start with one
/// of the four recognized sigils, since an unrecognized prefix is still
/// most usefully treated as an ordinary network channel rather than an
/// error at this layer.
pub fn classify(name: &str) -> ChannelKind {
    match name.as_bytes().first() {
        Some(b'&') => ChannelKind::Local,
        Some(b'+') => ChannelKind::Modeless,
        Some(b'!') => ChannelKind::Safe,
        _ => ChannelKind::Network,
    }
}

/// True if `name` names a modeless (`+`-prefixed) channel.
pub fn is_modeless(name: &str) -> bool {
    classify(name) == ChannelKind::Modeless
}
