//! Client-facing events and the sink trait that replaces signal emission.
//!
//! §6 specifies the channel as an object with signals; this crate models
//! that as a plain trait with one method per event, invoked directly by
//! the owner-supplied [`EventSink`] implementation rather than marshalled
//! over a session bus. The event names below are the external contract and
//! are preserved verbatim.

use crate::handle::Handle;
use crate::membership::ChangeReason;
use crate::pending::MessageKind;
use crate::properties::{PropertyChange, PropertyFlagsEntry};
use bitflags::bitflags;

bitflags! {
    /// Session-bus group capability flags describing what membership
    /// operations the client may currently perform.
    ///
    /// `CAN_RESCIND` and `MESSAGE_DEPENDS` are carried for parity with the
    /// original Telepathy `ChannelGroupFlags` bit layout but are never set
    /// by this crate: `CAN_RESCIND` would govern retracting a sent invite,
    /// `MESSAGE_DEPENDS` accompanying membership-change reason codes,
    /// neither of which this channel type's scenarios exercise.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct GroupFlags: u8 {
        /// Local user may add members.
        const CAN_ADD = 1 << 0;
        /// Local user may remove members.
        const CAN_REMOVE = 1 << 1;
        /// Retracting a sent invite is supported (never set here).
        const CAN_RESCIND = 1 << 2;
        /// Membership changes carry a reason/message (never set here).
        const MESSAGE_DEPENDS = 1 << 3;
        /// Removing a member may carry a message.
        const MESSAGE_REMOVE = 1 << 4;
    }
}

bitflags! {
    /// Session-bus password capability flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct PasswordFlags: u8 {
        /// The server is demanding a key via `provide_password`.
        const PROVIDE = 1 << 0;
        /// The channel is itself password-protected and visible as such
        /// (belongs to 1:1 channels only; never set by a MUC channel).
        const VISIBLE = 1 << 1;
    }
}

/// Join-attempt outcome codes for the one-shot `join-ready` event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum JoinErrorCode {
    /// Join succeeded.
    None,
    /// We are banned from the channel.
    Banned,
    /// The channel is invite-only and we weren't invited.
    InviteOnly,
    /// The channel is full (`l` limit reached).
    Full,
}

/// Reason a `send` was rejected post-hoc via `send-error` rather than as a
/// method failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub enum SendErrorKind {
    /// Channel is MODERATED and self lacks OP/HALFOP/VOICE.
    PermissionDenied,
}

/// One `members-changed` emission's payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MembersChanged {
    /// Optional human-readable message (e.g. a part/kick reason).
    pub message: Option<String>,
    /// Handles added to `current`.
    pub added: Vec<Handle>,
    /// Handles that left all three sets.
    pub removed: Vec<Handle>,
    /// Handles added to `local_pending`.
    pub local_pending: Vec<Handle>,
    /// Handles added to `remote_pending`.
    pub remote_pending: Vec<Handle>,
    /// Who caused the change.
    pub actor: Option<Handle>,
    /// Why it happened.
    pub reason: ChangeReason,
}

/// The sink an owner provides to receive channel events, replacing
/// session-bus signal emission with direct callback invocation. Every
/// method corresponds 1:1 to an event named in §6.
pub trait EventSink {
    /// The channel has closed; fires at most once per instance.
    fn closed(&self) {}

    /// Group capability flags changed.
    fn group_flags_changed(&self, _add: GroupFlags, _remove: GroupFlags) {}

    /// An inbound message could not be queued and was dropped. Not
    /// currently raised by this implementation (the pending queue is
    /// unbounded), kept for contract parity with the external event list.
    fn lost_message(&self) {}

    /// Membership sets changed; always exactly one per batch.
    fn members_changed(&self, _change: MembersChanged) {}

    /// Password capability flags changed.
    fn password_flags_changed(&self, _add: PasswordFlags, _remove: PasswordFlags) {}

    /// One or more properties changed value.
    fn properties_changed(&self, _changes: Vec<PropertyChange>) {}

    /// One or more properties changed access flags.
    fn property_flags_changed(&self, _changes: Vec<PropertyFlagsEntry>) {}

    /// A new inbound message was queued.
    fn received(&self, _id: u64, _timestamp: i64, _sender: Handle, _kind: MessageKind, _text: String) {}

    /// A `send` was accepted but then rejected for a reason other than
    /// transport failure.
    fn send_error(&self, _err: SendErrorKind, _timestamp: i64, _kind: MessageKind, _text: String) {}

    /// A `send` was framed and handed to the connection.
    fn sent(&self, _timestamp: i64, _kind: MessageKind, _text: String) {}

    /// The channel reached a terminal join outcome; fires at most once.
    fn join_ready(&self, _err: JoinErrorCode) {}

    /// Resolves the one-shot `provide_password` reply continuation. Not
    /// itself a named event in the external event list — it is this
    /// crate's concrete rendition of the "reply continuation" design note:
    /// `provide_password` cannot synchronously know whether the server
    /// will accept the key, so its outcome is delivered here instead of in
    /// the method's return value.
    fn password_provide_result(&self, _result: Result<(), crate::error::ChannelError>) {}
}
