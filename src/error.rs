//! Error types returned to clients of a [`crate::channel::Channel`].
//!
//! Internal failures (a malformed `MODE` line, an unmapped mode letter) are
//! intentionally not part of this surface: they are logged and dropped at
//! the point they occur rather than propagated, matching the channel's
//! error handling policy.

use thiserror::Error;

/// Convenience alias for Results returned from [`crate::channel::Channel`] methods.
pub type Result<T, E = ChannelError> = std::result::Result<T, E>;

/// Errors a [`crate::channel::Channel`] method call can fail with.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ChannelError {
    /// Unknown property id, unknown acknowledgement id, unsupported message
    /// type, or a nick/handle that failed to resolve.
    #[error("invalid argument: {detail}")]
    InvalidArgument {
        /// Description of the offending argument.
        detail: String,
    },

    /// The READ or WRITE flag required for this operation is not set on the
    /// named property.
    #[error("permission denied on property {property}")]
    PermissionDenied {
        /// Name of the property missing the required flag.
        property: &'static str,
    },

    /// The operation cannot be performed in the channel's current state:
    /// add/remove self in an impossible state, no outstanding password
    /// challenge, a second concurrent `provide_password`, a member not
    /// present, an invalid recipient.
    #[error("not available: {detail}")]
    NotAvailable {
        /// Description of why the operation is currently unavailable.
        detail: String,
    },

    /// A handle failed to resolve to a nick or channel name via the
    /// external handle registry.
    #[error("handle did not resolve")]
    InvalidHandle,
}

/// Internal failure while tokenizing an inbound `MODE` argument string.
///
/// Never returned from a [`crate::channel::Channel`] method. The façade
/// catches this, logs it, and drops the offending line; callers never see
/// it.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ModeParseError {
    /// The first token did not begin with `+` or `-`.
    #[error("mode string does not start with a sign: {token:?}")]
    MissingSign {
        /// The offending first token.
        token: String,
    },

    /// A mode letter that takes an argument (`o`, `h`, `v`, `l`, `k`) had no
    /// corresponding positional argument left to consume.
    #[error("mode letter {letter} expected an argument")]
    MissingArgument {
        /// The letter that needed an argument.
        letter: char,
    },

    /// The argument to `l` was not a valid decimal integer.
    #[error("invalid limit argument: {0}")]
    InvalidLimit(String),
}
