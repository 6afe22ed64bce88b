//! Channel façade (C8, §4.6–§4.8, §6).
//!
//! [`Channel`] composes every other component behind the external
//! interfaces of §6: client-facing methods on the left, inbound IRC events
//! on the right, outbound command lines and [`EventSink`] callbacks in the
//! middle. It never performs I/O itself — outbound lines are handed to a
//! caller-supplied [`Connection`], events to a caller-supplied
//! [`EventSink`] — matching the teacher crate's sans-IO
//! `state::HandshakeMachine` shape: feed an event, get back state mutation
//! plus recorded actions.

use std::collections::HashMap;

use crate::ctcp::{decode_ctcp_action, strip_ctcp};
use crate::error::ChannelError;
use crate::events::{
    EventSink, GroupFlags, JoinErrorCode, MembersChanged, PasswordFlags, SendErrorKind,
};
use crate::handle::{Handle, HandleRef, HandleRegistry};
use crate::lifecycle::{JoinState, Lifecycle};
use crate::membership::{ChangeReason, MemberSets};
use crate::mode::{parse_mode_string, translate_properties, ModeCommand, ModeFlag, ModeState, ModeToken};
use crate::pending::{MessageKind, PendingMessage, PendingQueue};
use crate::properties::{PropertyBag, PropertyChange, PropertyFlags, PropertyFlagsEntry, PropertyId, PropertyListing, PropertyValue};
use crate::registry::Connection;
use crate::send::split_for_send;
use crate::util::nick_eq_ascii;

/// Telepathy's `Channel.Type.Text` URI, returned by [`Channel::get_channel_type`].
pub const CHANNEL_TYPE_TEXT: &str = "org.freedesktop.Telepathy.Channel.Type.Text";
/// Telepathy's `HANDLE_TYPE_ROOM`, returned as the first element of [`Channel::get_handle`].
pub const HANDLE_TYPE_ROOM: u32 = 2;

const MIRRORED_BOOLEANS: [PropertyId; 5] = [
    PropertyId::InviteOnly,
    PropertyId::Limited,
    PropertyId::Moderated,
    PropertyId::PasswordRequired,
    PropertyId::Private,
];

/// A single IRC multi-user-chat channel's state machine.
///
/// Owns the channel's membership bookkeeping, mode/topic/password state,
/// pending message queue, and send pipeline, and mediates between the
/// inbound calls of §6 and the client-facing methods of §6. One instance
/// exists per joined-or-joining channel.
pub struct Channel<'a, R, C, S>
where
    R: HandleRegistry + ?Sized,
    C: Connection + ?Sized,
    S: EventSink + ?Sized,
{
    registry: &'a R,
    connection: &'a C,
    sink: &'a S,

    room: HandleRef<'a, R>,
    self_ref: HandleRef<'a, R>,
    channel_name: String,
    modeless: bool,
    max_msg_len: usize,

    members: MemberSets,
    pending: PendingQueue,
    group_flags: GroupFlags,
    password_flags: PasswordFlags,
    mode_state: ModeState,
    properties: PropertyBag,
    lifecycle: Lifecycle,
}

impl<'a, R, C, S> Channel<'a, R, C, S>
where
    R: HandleRegistry + ?Sized,
    C: Connection + ?Sized,
    S: EventSink + ?Sized,
{
    /// Constructs a new channel for `channel_name`, not yet joined.
    /// Acquires one reference each on `room` and `self_handle`.
    pub fn new(
        registry: &'a R,
        connection: &'a C,
        sink: &'a S,
        room: Handle,
        self_handle: Handle,
        channel_name: impl Into<String>,
        max_msg_len: usize,
    ) -> Self {
        let channel_name = channel_name.into();
        let modeless = crate::chan::is_modeless(&channel_name);
        Channel {
            room: HandleRef::new(room, registry),
            self_ref: HandleRef::new(self_handle, registry),
            registry,
            connection,
            sink,
            channel_name,
            modeless,
            max_msg_len,
            members: MemberSets::new(),
            pending: PendingQueue::new(),
            group_flags: GroupFlags::empty(),
            password_flags: PasswordFlags::empty(),
            mode_state: ModeState::new(),
            properties: PropertyBag::new(),
            lifecycle: Lifecycle::new(),
        }
    }

    /// The channel's own room handle.
    pub fn room_handle(&self) -> Handle {
        self.room.handle()
    }

    /// The local user's current handle within this channel.
    pub fn self_handle(&self) -> Handle {
        self.self_ref.handle()
    }

    /// Current join/part lifecycle state.
    pub fn join_state(&self) -> JoinState {
        self.lifecycle.state()
    }

    fn resolve(&self, handle: Handle) -> Result<String, ChannelError> {
        self.registry.resolve(handle).ok_or(ChannelError::InvalidHandle)
    }

    // ---- §6 client-facing methods --------------------------------------

    /// Returns this channel's fixed Telepathy-style channel type URI.
    pub fn get_channel_type(&self) -> &'static str {
        CHANNEL_TYPE_TEXT
    }

    /// `(handle type, handle)` identifying this channel's room.
    pub fn get_handle(&self) -> (u32, u32) {
        (HANDLE_TYPE_ROOM, self.room_handle().raw())
    }

    /// Resolves each of `handles` to its owning identity (nick/contact
    /// name). Fails [`ChannelError::InvalidHandle`] on the first handle
    /// that doesn't resolve.
    pub fn get_handle_owners(&self, handles: &[Handle]) -> Result<Vec<String>, ChannelError> {
        handles.iter().map(|&h| self.resolve(h)).collect()
    }

    /// The optional interfaces this channel implements.
    pub fn get_interfaces(&self) -> &'static [&'static str] {
        &[
            "org.freedesktop.Telepathy.Channel.Interface.Group",
            "org.freedesktop.Telepathy.Channel.Interface.Password",
            "org.freedesktop.Telepathy.Properties",
        ]
    }

    /// The message types this channel can receive/send.
    pub fn get_message_types(&self) -> &'static [MessageKind] {
        &[MessageKind::Normal, MessageKind::Action, MessageKind::Notice]
    }

    /// The local user's own handle.
    pub fn get_self_handle(&self) -> Handle {
        self.self_handle()
    }

    /// Current group capability flags.
    pub fn get_group_flags(&self) -> GroupFlags {
        self.group_flags
    }

    /// Current password capability flags.
    pub fn get_password_flags(&self) -> PasswordFlags {
        self.password_flags
    }

    /// Full members.
    pub fn get_members(&self) -> Vec<Handle> {
        self.members.current().collect()
    }

    /// Locally-pending members (we were invited/added, awaiting our decision).
    pub fn get_local_pending_members(&self) -> Vec<Handle> {
        self.members.local_pending().collect()
    }

    /// Remotely-pending members (we invited/joined, awaiting server confirmation).
    pub fn get_remote_pending_members(&self) -> Vec<Handle> {
        self.members.remote_pending().collect()
    }

    /// All three membership sets at once: `(current, local_pending, remote_pending)`.
    pub fn get_all_members(&self) -> (Vec<Handle>, Vec<Handle>, Vec<Handle>) {
        (self.get_members(), self.get_local_pending_members(), self.get_remote_pending_members())
    }

    /// Every property's id, name, type code, and current access flags.
    pub fn list_properties(&self) -> Vec<PropertyListing> {
        self.properties.list_properties()
    }

    /// Current values of the named property ids.
    pub fn get_properties(&self, ids: &[u8]) -> Result<Vec<PropertyChange>, ChannelError> {
        let resolved = ids.iter().map(|&id| PropertyBag::resolve_id(id)).collect::<Result<Vec<_>, _>>()?;
        self.properties.get_properties(&resolved)
    }

    /// Requests a batch of property writes. Validates WRITE/type, then
    /// forwards the subset with an actually-changed value to the outbound
    /// mode/topic translator (§4.4); local property values are not updated
    /// here — they update when the server echoes the resulting MODE/TOPIC.
    #[tracing::instrument(skip(self, values))]
    pub fn set_properties(&mut self, values: &[(u8, PropertyValue)]) -> Result<(), ChannelError> {
        let resolved = values
            .iter()
            .map(|(id, value)| Ok(PropertyChange { id: PropertyBag::resolve_id(*id)?, value: value.clone() }))
            .collect::<Result<Vec<_>, ChannelError>>()?;

        let changed = self.properties.validate_set_properties(&resolved)?;
        if changed.is_empty() {
            return Ok(());
        }

        let limited_already_set = matches!(self.properties.value(PropertyId::Limited), PropertyValue::Bool(true));
        let password_required_already_set =
            matches!(self.properties.value(PropertyId::PasswordRequired), PropertyValue::Bool(true));

        for command in translate_properties(&changed, limited_already_set, password_required_already_set) {
            match command {
                ModeCommand::Mode { add, letter, arg: Some(arg) } => {
                    self.connection.send_line(&format!("MODE {} {}{} {}", self.channel_name, sign(add), letter, arg));
                }
                ModeCommand::Mode { add, letter, arg: None } => {
                    self.connection.send_line(&format!("MODE {} {}{}", self.channel_name, sign(add), letter));
                }
                ModeCommand::Topic(text) => {
                    self.connection.send_line(&format!("TOPIC {} :{}", self.channel_name, text));
                }
            }
        }
        Ok(())
    }

    /// Acknowledges (removes) pending messages by id. Per §9 Open Question
    /// (a), removal happens in order and stops at the first unknown id,
    /// which is not rolled back.
    pub fn acknowledge_pending_messages(&mut self, ids: &[u64]) -> Result<(), ChannelError> {
        self.pending.acknowledge(ids)
    }

    /// Returns the current pending-message queue, clearing it if `clear`.
    pub fn list_pending_messages(&mut self, clear: bool) -> Vec<PendingMessage> {
        self.pending.list(clear)
    }

    /// Begins adding `handles` to the channel. A singleton `[self_handle]`
    /// triggers the join state machine (§4.5); any other (non-empty,
    /// self-free) batch sends one `INVITE` per handle and places them in
    /// remote-pending.
    pub fn add_members(&mut self, handles: &[Handle], _message: Option<&str>) -> Result<(), ChannelError> {
        if handles.is_empty() {
            return Ok(());
        }
        let me = self.self_handle();
        if handles.len() == 1 && handles[0] == me {
            return self.join_self();
        }
        for &h in handles {
            if h == me {
                return Err(ChannelError::NotAvailable { detail: "cannot add self alongside other members".to_string() });
            }
            if self.members.contains_any(h) {
                return Err(ChannelError::NotAvailable { detail: format!("{h} is already a member or pending") });
            }
        }
        for &h in handles {
            let nick = self.resolve(h)?;
            self.connection.send_line(&format!("INVITE {} {}", nick, self.channel_name));
        }
        let actor = Some(me);
        self.change_members(handles, &[], &[], &[], handles, &[], actor, ChangeReason::Invited, None);
        Ok(())
    }

    fn join_self(&mut self) -> Result<(), ChannelError> {
        let me = self.self_handle();
        if self.members.is_current(me) || self.members.is_remote_pending(me) {
            return Err(ChannelError::NotAvailable { detail: "already a member or join in progress".to_string() });
        }
        self.lifecycle.start_join()?;
        self.connection.send_line(&format!("JOIN {}", self.channel_name));
        self.change_members(&[], &[], &[], &[], &[me], &[], Some(me), ChangeReason::None, None);
        Ok(())
    }

    /// Begins removing `handles` from the channel. Self alone parts
    /// (returns immediately; the transition happens on the server's PART
    /// echo). Any other batch sends one `KICK` per handle.
    pub fn remove_members(&mut self, handles: &[Handle], message: Option<&str>) -> Result<(), ChannelError> {
        let me = self.self_handle();
        if handles.len() == 1 && handles[0] == me {
            self.connection.send_line(&with_optional_message(format!("PART {}", self.channel_name), message));
            return Ok(());
        }
        for &h in handles {
            if h == me {
                return Err(ChannelError::NotAvailable { detail: "cannot remove self alongside other members".to_string() });
            }
            if !self.members.is_current(h) {
                return Err(ChannelError::NotAvailable { detail: format!("{h} is not a member") });
            }
        }
        for &h in handles {
            let nick = self.resolve(h)?;
            self.connection
                .send_line(&with_optional_message(format!("KICK {} {}", self.channel_name, nick), message));
        }
        Ok(())
    }

    /// Closes the channel. In `Joined`, sends `PART` and lets the server's
    /// echo drive the `Parted` transition and `closed` event. In any
    /// earlier state, latches `closed` immediately.
    pub fn close(&mut self, message: Option<&str>) {
        if self.lifecycle.state() == JoinState::Joined {
            self.connection.send_line(&with_optional_message(format!("PART {}", self.channel_name), message));
        } else {
            self.emit_closed();
        }
    }

    /// Begins the one-shot `provide_password` reply continuation. Fails
    /// [`ChannelError::NotAvailable`] unless the channel is awaiting a key
    /// and no reply is already outstanding.
    pub fn provide_password(&mut self, key: &str) -> Result<(), ChannelError> {
        self.lifecycle.begin_provide_password()?;
        self.connection.send_line(&format!("JOIN {} {}", self.channel_name, key));
        Ok(())
    }

    /// Sends `text` as `kind` to this channel, splitting it per §4.8.
    /// Always returns `Ok`; a MODERATED channel with no voice/op instead
    /// raises `send-error` rather than failing the call (§4.8).
    #[tracing::instrument(skip(self, text))]
    pub fn send(&mut self, kind: MessageKind, text: &str) -> Result<(), ChannelError> {
        let ts = now();
        if self.mode_state.flags.contains(ModeFlag::MODERATED)
            && !self.mode_state.has_op_or_halfop()
            && !self.mode_state.has_voice()
        {
            self.sink.send_error(SendErrorKind::PermissionDenied, ts, kind, text.to_string());
            return Ok(());
        }
        for chunk in split_for_send(kind, &self.channel_name, text, self.max_msg_len) {
            self.connection.send_line(&chunk.line);
            self.sink.sent(ts, kind, chunk.body);
        }
        Ok(())
    }

    /// Releases this channel: emits `closed` if it hasn't fired, fails any
    /// outstanding password continuation, releases every handle still held
    /// by the membership sets (room/self release when `self` drops at the
    /// end of this call), and drops all pending messages.
    pub fn dispose(mut self) {
        self.emit_closed();
        if self.lifecycle.resolve_password() {
            self.sink
                .password_provide_result(Err(ChannelError::NotAvailable { detail: "channel disposed".to_string() }));
        }
        let held: Vec<Handle> = self
            .members
            .current()
            .chain(self.members.local_pending())
            .chain(self.members.remote_pending())
            .collect();
        for h in held {
            self.registry.release(h);
        }
        self.pending.list(true);
    }

    // ---- §6 inbound calls ------------------------------------------------

    /// Someone joined (possibly us).
    pub fn join(&mut self, nick: &str) {
        let Some(handle) = self.registry.lookup(nick) else {
            tracing::debug!(nick, "join: nick did not resolve to a handle");
            return;
        };
        if handle == self.self_handle() {
            self.complete_join();
        } else {
            self.change_members(&[handle], &[], &[], &[], &[], &[], Some(handle), ChangeReason::None, None);
        }
    }

    /// Someone parted (possibly us).
    pub fn part(&mut self, nick: &str) {
        let Some(handle) = self.registry.lookup(nick) else {
            tracing::debug!(nick, "part: nick did not resolve to a handle");
            return;
        };
        if handle == self.self_handle() {
            self.transition_parted(Some(handle), ChangeReason::Parted, false);
        } else {
            self.change_members(&[], &[handle], &[], &[], &[], &[], Some(handle), ChangeReason::Parted, None);
        }
    }

    /// `target` was kicked by `kicker` with `reason`.
    pub fn kick(&mut self, target_nick: &str, kicker_nick: &str, reason: &str) {
        let Some(target) = self.registry.lookup(target_nick) else {
            tracing::debug!(target_nick, "kick: target nick did not resolve");
            return;
        };
        let kicker = self.registry.lookup(kicker_nick);
        if target == self.self_handle() {
            // Suppressed: §4.6, the outer session decides how to react to
            // being kicked, so `closed` is not auto-emitted here.
            self.transition_parted(kicker, ChangeReason::Kicked, true);
        } else {
            self.change_members(&[], &[target], &[], &[], &[], &[], kicker, ChangeReason::Kicked, Some(reason));
        }
    }

    /// `handle` disconnected. `suppress` controls whether `closed` is
    /// auto-emitted if `handle` is us.
    pub fn quit(&mut self, handle: Handle, suppress: bool, actor: Option<Handle>, reason: &str) {
        if handle == self.self_handle() {
            self.transition_parted(actor, ChangeReason::Quit, suppress);
        } else {
            self.change_members(&[], &[handle], &[], &[], &[], &[], actor, ChangeReason::Quit, Some(reason));
        }
    }

    /// We were invited by `inviter`.
    pub fn invited(&mut self, inviter: Handle) {
        let me = self.self_handle();
        self.change_members(&[], &[], &[me], &[], &[], &[], Some(inviter), ChangeReason::Invited, None);
    }

    /// A `NAMES` reply batch. Strips one leading sigil per entry (`@`
    /// operator, `&`/`%` halfop per §9(b), `+` voice), resolves the self
    /// nick's privilege into `mode_state`, and batches every resolved
    /// handle into `current` in one `members-changed` emission.
    pub fn names(&mut self, list: &[String]) {
        let mut handles = Vec::with_capacity(list.len());
        for entry in list {
            let (sigil, nick) = split_sigil(entry);
            let Some(handle) = self.registry.lookup(nick) else {
                tracing::debug!(nick, "names: nick did not resolve");
                continue;
            };
            if handle == self.self_handle() {
                self.apply_self_sigil(sigil);
            }
            handles.push(handle);
        }
        if handles.is_empty() {
            return;
        }
        self.change_members(&handles, &[], &[], &[], &[], &[], None, ChangeReason::None, None);
    }

    fn apply_self_sigil(&mut self, sigil: Option<char>) {
        let bit = match sigil {
            Some('@') => Some(ModeFlag::OPERATOR),
            Some('&') | Some('%') => Some(ModeFlag::HALFOP),
            Some('+') => Some(ModeFlag::VOICE),
            _ => None,
        };
        if let Some(bit) = bit {
            let before = self.mode_state.flags;
            self.mode_state.flags |= bit;
            self.refresh_group_and_write_flags(before, self.mode_state.flags);
        }
    }

    /// The raw `MODE` argument string (everything after the channel name).
    #[tracing::instrument(skip(self))]
    pub fn mode(&mut self, arg_str: &str) {
        let tokens = match parse_mode_string(arg_str) {
            Ok(tokens) => tokens,
            Err(err) => {
                tracing::debug!(%err, arg_str, "failed to parse MODE string, dropping line");
                return;
            }
        };

        let self_nick = self.registry.resolve(self.self_handle());

        let mut add_mask = ModeFlag::empty();
        let mut remove_mask = ModeFlag::empty();
        let mut new_limit = None;
        let mut new_key = None;

        for token in tokens {
            match token {
                ModeToken::Privilege { letter, add, nick } => {
                    let is_self = self_nick.as_deref().map(|n| nick_eq_ascii(n, &nick)).unwrap_or(false);
                    if !is_self {
                        continue;
                    }
                    let bit = match letter {
                        'o' => ModeFlag::OPERATOR,
                        'h' => ModeFlag::HALFOP,
                        'v' => ModeFlag::VOICE,
                        _ => continue,
                    };
                    if add {
                        add_mask |= bit;
                    } else {
                        remove_mask |= bit;
                    }
                }
                ModeToken::Limit { add, value } => {
                    if add {
                        add_mask |= ModeFlag::USER_LIMIT;
                        new_limit = value;
                    } else {
                        remove_mask |= ModeFlag::USER_LIMIT;
                    }
                }
                ModeToken::Key { add, value } => {
                    if add {
                        add_mask |= ModeFlag::KEY;
                        new_key = value;
                    } else {
                        remove_mask |= ModeFlag::KEY;
                    }
                }
                ModeToken::Flag { add, bit } => {
                    if add {
                        add_mask |= bit;
                    } else {
                        remove_mask |= bit;
                    }
                }
            }
        }

        if let Some(limit) = new_limit {
            self.mode_state.limit = limit;
        }
        if add_mask.contains(ModeFlag::KEY) {
            self.mode_state.key = new_key;
        }
        if remove_mask.contains(ModeFlag::KEY) {
            self.mode_state.key = None;
        }

        // Observing a MODE statement at all makes the channel's current
        // mode knowable, regardless of which (if any) letters appeared —
        // flip READ on the five mirrored booleans unconditionally (§4.3).
        self.change_mode_state(add_mask, remove_mask);
    }

    fn change_mode_state(&mut self, add: ModeFlag, remove: ModeFlag) {
        let before = self.mode_state.flags;
        let after = (before - remove) | add;
        self.mode_state.flags = after;

        let mut prop_changes = Vec::new();
        if before.contains(ModeFlag::INVITE_ONLY) != after.contains(ModeFlag::INVITE_ONLY) {
            prop_changes.push(PropertyChange {
                id: PropertyId::InviteOnly,
                value: PropertyValue::Bool(after.contains(ModeFlag::INVITE_ONLY)),
            });
        }
        if before.contains(ModeFlag::MODERATED) != after.contains(ModeFlag::MODERATED) {
            prop_changes.push(PropertyChange {
                id: PropertyId::Moderated,
                value: PropertyValue::Bool(after.contains(ModeFlag::MODERATED)),
            });
        }
        let before_private = before.intersects(ModeFlag::PRIVATE | ModeFlag::SECRET);
        let after_private = after.intersects(ModeFlag::PRIVATE | ModeFlag::SECRET);
        if before_private != after_private {
            prop_changes.push(PropertyChange { id: PropertyId::Private, value: PropertyValue::Bool(after_private) });
        }
        if !before.contains(ModeFlag::USER_LIMIT) && after.contains(ModeFlag::USER_LIMIT) {
            prop_changes.push(PropertyChange { id: PropertyId::Limited, value: PropertyValue::Bool(true) });
            prop_changes.push(PropertyChange { id: PropertyId::Limit, value: PropertyValue::Uint(self.mode_state.limit) });
        } else if before.contains(ModeFlag::USER_LIMIT) && !after.contains(ModeFlag::USER_LIMIT) {
            prop_changes.push(PropertyChange { id: PropertyId::Limited, value: PropertyValue::Bool(false) });
        }
        if !before.contains(ModeFlag::KEY) && after.contains(ModeFlag::KEY) {
            prop_changes.push(PropertyChange { id: PropertyId::PasswordRequired, value: PropertyValue::Bool(true) });
            prop_changes.push(PropertyChange { id: PropertyId::Password, value: PropertyValue::Str(self.mode_state.key.clone()) });
        } else if before.contains(ModeFlag::KEY) && !after.contains(ModeFlag::KEY) {
            prop_changes.push(PropertyChange { id: PropertyId::PasswordRequired, value: PropertyValue::Bool(false) });
        }

        let (applied, mut flag_entries) = self.properties.change_properties(&prop_changes);

        let extra = self.properties.set_property_flags(&MIRRORED_BOOLEANS, PropertyFlags::READ, PropertyFlags::empty());
        flag_entries.extend(extra);

        let (group_add, group_remove) = self.refresh_group_and_write_flags_collecting(before, after, &mut flag_entries);

        dedup_flag_entries(&mut flag_entries);

        if !applied.is_empty() {
            self.sink.properties_changed(applied);
        }
        if !flag_entries.is_empty() {
            self.sink.property_flags_changed(flag_entries);
        }
        if !group_add.is_empty() || !group_remove.is_empty() {
            self.group_flags = (self.group_flags | group_add) - group_remove;
            self.sink.group_flags_changed(group_add, group_remove);
        }
    }

    /// Projects an OPERATOR/HALFOP/INVITE_ONLY transition onto
    /// `group_flags` and property WRITE flags, per §4.3, emitting directly
    /// (used outside `change_mode_state`'s batched path, e.g. from NAMES).
    fn refresh_group_and_write_flags(&mut self, before: ModeFlag, after: ModeFlag) {
        let mut entries = Vec::new();
        let (add, remove) = self.refresh_group_and_write_flags_collecting(before, after, &mut entries);
        if !entries.is_empty() {
            self.sink.property_flags_changed(entries);
        }
        if !add.is_empty() || !remove.is_empty() {
            self.group_flags = (self.group_flags | add) - remove;
            self.sink.group_flags_changed(add, remove);
        }
    }

    /// Same projection, but collects the WRITE-flag entries into `out`
    /// instead of emitting them, and returns the group-flag delta, so
    /// `change_mode_state` can fold everything into one emission each.
    fn refresh_group_and_write_flags_collecting(
        &mut self,
        before: ModeFlag,
        after: ModeFlag,
        out: &mut Vec<PropertyFlagsEntry>,
    ) -> (GroupFlags, GroupFlags) {
        let had_op = before.intersects(ModeFlag::OPERATOR | ModeFlag::HALFOP);
        let has_op = after.intersects(ModeFlag::OPERATOR | ModeFlag::HALFOP);
        let invite_only_after = after.contains(ModeFlag::INVITE_ONLY);

        let mut add = GroupFlags::empty();
        let mut remove = GroupFlags::empty();

        if has_op && !had_op {
            add |= GroupFlags::CAN_ADD | GroupFlags::CAN_REMOVE | GroupFlags::MESSAGE_REMOVE;
            out.extend(self.properties.set_property_flags(&[], PropertyFlags::WRITE, PropertyFlags::empty()));
        } else if !has_op && had_op {
            remove |= GroupFlags::CAN_REMOVE | GroupFlags::MESSAGE_REMOVE;
            out.extend(self.properties.set_property_flags(&[], PropertyFlags::empty(), PropertyFlags::WRITE));
            if invite_only_after {
                remove |= GroupFlags::CAN_ADD;
            }
        }

        if invite_only_after && !has_op && !remove.contains(GroupFlags::CAN_ADD) && self.group_flags.contains(GroupFlags::CAN_ADD) {
            remove |= GroupFlags::CAN_ADD;
        }

        (add, remove)
    }

    /// Raw inbound topic text (no setter/timestamp known).
    pub fn topic(&mut self, text: &str) {
        self.mode_state.topic = Some(text.to_string());
        self.apply_property_changes(vec![PropertyChange {
            id: PropertyId::Subject,
            value: PropertyValue::Str(Some(text.to_string())),
        }]);
    }

    /// Topic setter/timestamp without text (a `RPL_TOPICWHOTIME`-style update).
    pub fn topic_touch(&mut self, setter: Handle, timestamp: i64) {
        self.mode_state.topic_setter = Some(setter);
        self.mode_state.topic_timestamp = timestamp;
        self.apply_property_changes(vec![
            PropertyChange { id: PropertyId::SubjectTimestamp, value: PropertyValue::Uint(timestamp.max(0) as u32) },
            PropertyChange { id: PropertyId::SubjectContact, value: PropertyValue::Uint(setter.raw()) },
        ]);
    }

    /// Topic text, setter, and timestamp together (a full `RPL_TOPIC` + who/time).
    pub fn topic_full(&mut self, setter: Handle, timestamp: i64, text: &str) {
        self.mode_state.topic = Some(text.to_string());
        self.mode_state.topic_setter = Some(setter);
        self.mode_state.topic_timestamp = timestamp;
        self.apply_property_changes(vec![
            PropertyChange { id: PropertyId::Subject, value: PropertyValue::Str(Some(text.to_string())) },
            PropertyChange { id: PropertyId::SubjectTimestamp, value: PropertyValue::Uint(timestamp.max(0) as u32) },
            PropertyChange { id: PropertyId::SubjectContact, value: PropertyValue::Uint(setter.raw()) },
        ]);
    }

    /// No topic is known. Clears the cached value and retracts READ on the
    /// three topic-related properties, distinct from an explicit empty
    /// topic (supplement #4).
    pub fn topic_unset(&mut self) {
        self.mode_state.topic = None;
        self.mode_state.topic_setter = None;
        self.mode_state.topic_timestamp = 0;
        let (applied, _) = self.properties.change_properties(&[PropertyChange { id: PropertyId::Subject, value: PropertyValue::Str(None) }]);
        let flags_changed = self.properties.set_property_flags(
            &[PropertyId::Subject, PropertyId::SubjectTimestamp, PropertyId::SubjectContact],
            PropertyFlags::empty(),
            PropertyFlags::READ,
        );
        if !applied.is_empty() {
            self.sink.properties_changed(applied);
        }
        if !flags_changed.is_empty() {
            self.sink.property_flags_changed(flags_changed);
        }
    }

    fn apply_property_changes(&mut self, changes: Vec<PropertyChange>) {
        let (applied, flags_changed) = self.properties.change_properties(&changes);
        if !applied.is_empty() {
            self.sink.properties_changed(applied);
        }
        if !flags_changed.is_empty() {
            self.sink.property_flags_changed(flags_changed);
        }
    }

    /// A nick change: `old_handle` is now known as `new_handle`. If `old`
    /// was us, the channel's self handle is updated (and re-acquired).
    pub fn rename(&mut self, old: Handle, new: Handle) {
        if old == self.self_handle() {
            self.self_ref = HandleRef::new(new, self.registry);
        }
        if self.members.contains_any(old) {
            self.registry.acquire(new);
            self.members.rename(old, new);
            self.registry.release(old);
        }
    }

    /// The server rejected our channel key.
    pub fn bad_channel_key(&mut self) {
        self.lifecycle.bad_channel_key();
        if !self.password_flags.contains(PasswordFlags::PROVIDE) {
            self.password_flags |= PasswordFlags::PROVIDE;
            self.sink.password_flags_changed(PasswordFlags::PROVIDE, PasswordFlags::empty());
        }
        if self.lifecycle.resolve_password() {
            self.sink.password_provide_result(Err(ChannelError::NotAvailable {
                detail: "server rejected channel key".to_string(),
            }));
        }
    }

    /// The join attempt failed with `code`.
    pub fn join_error(&mut self, code: JoinErrorCode) {
        if let Some(code) = self.lifecycle.mark_join_ready(code) {
            self.lifecycle.self_parted();
            self.sink.join_ready(code);
        } else {
            tracing::debug!(?code, "dropping join error after join-ready already fired");
        }
    }

    /// Queues an inbound text message. `notice` distinguishes NOTICE from
    /// PRIVMSG at the wire level; CTCP ACTION detection (§4.8) happens
    /// here since it's indistinguishable at the command level.
    #[tracing::instrument(skip(self, raw_text))]
    pub fn receive(&mut self, notice: bool, sender: Handle, raw_text: &str) {
        let (is_action, inner) = decode_ctcp_action(raw_text);
        let kind = if is_action {
            MessageKind::Action
        } else if notice {
            MessageKind::Notice
        } else {
            MessageKind::Normal
        };
        let body = if is_action { inner.to_string() } else { strip_ctcp(inner) };
        let ts = now();
        let msg = self.pending.push(ts, sender, kind, body.clone());
        self.sink.received(msg.id, msg.timestamp, msg.sender, msg.kind, body);
    }

    // ---- internal helpers ------------------------------------------------

    fn complete_join(&mut self) {
        self.lifecycle.self_joined();
        let me = self.self_handle();
        self.change_members(&[me], &[], &[], &[me], &[], &[me], Some(me), ChangeReason::None, None);

        if !self.group_flags.contains(GroupFlags::CAN_ADD) {
            self.group_flags |= GroupFlags::CAN_ADD;
            self.sink.group_flags_changed(GroupFlags::CAN_ADD, GroupFlags::empty());
        }
        self.connection.send_line(&format!("MODE {}", self.channel_name));
        if self.modeless {
            self.mode_state.flags |= ModeFlag::TOPIC_OPS_ONLY;
        }

        if self.password_flags.contains(PasswordFlags::PROVIDE) {
            self.password_flags.remove(PasswordFlags::PROVIDE);
            self.sink.password_flags_changed(PasswordFlags::empty(), PasswordFlags::PROVIDE);
        }
        if self.lifecycle.resolve_password() {
            self.sink.password_provide_result(Ok(()));
        }
        if let Some(err) = self.lifecycle.mark_join_ready(JoinErrorCode::None) {
            self.sink.join_ready(err);
        }
    }

    fn transition_parted(&mut self, actor: Option<Handle>, reason: ChangeReason, suppress: bool) {
        self.lifecycle.self_parted();
        let me = self.self_handle();
        self.change_members(&[], &[me], &[], &[me], &[], &[me], actor, reason, None);
        if !suppress {
            self.emit_closed();
        }
    }

    fn emit_closed(&mut self) {
        if self.lifecycle.mark_closed() {
            self.sink.closed();
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn change_members(
        &mut self,
        add_current: &[Handle],
        remove_current: &[Handle],
        add_local: &[Handle],
        remove_local: &[Handle],
        add_remote: &[Handle],
        remove_remote: &[Handle],
        actor: Option<Handle>,
        reason: ChangeReason,
        message: Option<&str>,
    ) {
        for &h in add_current.iter().chain(add_local).chain(add_remote) {
            if !self.members.contains_any(h) {
                self.registry.acquire(h);
            }
        }
        let diff = self.members.change_sets(
            add_current,
            remove_current,
            add_local,
            remove_local,
            add_remote,
            remove_remote,
            actor,
            reason,
        );
        for &h in &diff.removed {
            self.registry.release(h);
        }
        self.sink.members_changed(MembersChanged {
            message: message.map(str::to_string),
            added: diff.added,
            removed: diff.removed,
            local_pending: diff.local_pending,
            remote_pending: diff.remote_pending,
            actor: diff.actor,
            reason: diff.reason,
        });
    }
}

fn sign(add: bool) -> char {
    if add {
        '+'
    } else {
        '-'
    }
}

fn with_optional_message(command: String, message: Option<&str>) -> String {
    match message {
        Some(m) if !m.is_empty() => format!("{command} :{m}"),
        _ => command,
    }
}

fn split_sigil(entry: &str) -> (Option<char>, &str) {
    let mut chars = entry.chars();
    match chars.next() {
        Some(c @ ('@' | '&' | '+' | '%')) => (Some(c), &entry[c.len_utf8()..]),
        _ => (None, entry),
    }
}

fn dedup_flag_entries(entries: &mut Vec<PropertyFlagsEntry>) {
    let mut last_index: HashMap<PropertyId, usize> = HashMap::new();
    for (i, entry) in entries.iter().enumerate() {
        last_index.insert(entry.id, i);
    }
    let mut i = 0;
    entries.retain(|entry| {
        let keep = last_index.get(&entry.id) == Some(&i);
        i += 1;
        keep
    });
}

fn now() -> i64 {
    chrono::Utc::now().timestamp()
}
