//! End-to-end scenarios driving [`Channel`] through fake collaborators.

use std::cell::RefCell;
use std::collections::HashMap;

use muc_channel::channel::Channel;
use muc_channel::error::ChannelError;
use muc_channel::events::{EventSink, GroupFlags, JoinErrorCode, MembersChanged, PasswordFlags, SendErrorKind};
use muc_channel::handle::{Handle, HandleRegistry};
use muc_channel::lifecycle::JoinState;
use muc_channel::pending::MessageKind;
use muc_channel::properties::{PropertyChange, PropertyFlagsEntry, PropertyId, PropertyValue};
use muc_channel::registry::Connection;

#[derive(Default)]
struct FakeRegistry {
    names: RefCell<HashMap<u32, String>>,
}

impl FakeRegistry {
    fn register(&self, handle: Handle, nick: &str) {
        self.names.borrow_mut().insert(handle.raw(), nick.to_string());
    }
}

impl HandleRegistry for FakeRegistry {
    fn acquire(&self, _handle: Handle) {}
    fn release(&self, _handle: Handle) {}
    fn resolve(&self, handle: Handle) -> Option<String> {
        self.names.borrow().get(&handle.raw()).cloned()
    }
    fn lookup(&self, name: &str) -> Option<Handle> {
        self.names.borrow().iter().find(|(_, n)| n.as_str() == name).map(|(&raw, _)| Handle::new(raw))
    }
}

#[derive(Default)]
struct FakeConnection {
    lines: RefCell<Vec<String>>,
}

impl Connection for FakeConnection {
    fn send_line(&self, line: &str) {
        self.lines.borrow_mut().push(line.to_string());
    }
}

#[derive(Default)]
struct FakeSink {
    members_changed: RefCell<Vec<MembersChanged>>,
    join_ready: RefCell<Vec<JoinErrorCode>>,
    closed: RefCell<u32>,
    sent: RefCell<Vec<(MessageKind, String)>>,
    received: RefCell<Vec<(Handle, MessageKind, String)>>,
    send_errors: RefCell<Vec<(SendErrorKind, MessageKind, String)>>,
    password_result: RefCell<Vec<Result<(), ChannelError>>>,
    property_flags_changed: RefCell<Vec<Vec<PropertyFlagsEntry>>>,
    properties_changed: RefCell<Vec<Vec<PropertyChange>>>,
}

impl EventSink for FakeSink {
    fn closed(&self) {
        *self.closed.borrow_mut() += 1;
    }
    fn members_changed(&self, change: MembersChanged) {
        self.members_changed.borrow_mut().push(change);
    }
    fn join_ready(&self, err: JoinErrorCode) {
        self.join_ready.borrow_mut().push(err);
    }
    fn sent(&self, _timestamp: i64, kind: MessageKind, text: String) {
        self.sent.borrow_mut().push((kind, text));
    }
    fn received(&self, _id: u64, _timestamp: i64, sender: Handle, kind: MessageKind, text: String) {
        self.received.borrow_mut().push((sender, kind, text));
    }
    fn send_error(&self, err: SendErrorKind, _timestamp: i64, kind: MessageKind, text: String) {
        self.send_errors.borrow_mut().push((err, kind, text));
    }
    fn password_provide_result(&self, result: Result<(), ChannelError>) {
        self.password_result.borrow_mut().push(result);
    }
    fn property_flags_changed(&self, changes: Vec<PropertyFlagsEntry>) {
        self.property_flags_changed.borrow_mut().push(changes);
    }
    fn properties_changed(&self, changes: Vec<PropertyChange>) {
        self.properties_changed.borrow_mut().push(changes);
    }
}

#[test]
fn join_part_and_text_exchange() {
    let registry = FakeRegistry::default();
    registry.register(Handle::new(1), "me");
    registry.register(Handle::new(2), "alice");
    let connection = FakeConnection::default();
    let sink = FakeSink::default();

    let mut chan = Channel::new(&registry, &connection, &sink, Handle::new(100), Handle::new(1), "#rust", 400);

    chan.add_members(&[Handle::new(1)], None).unwrap();
    assert_eq!(chan.join_state(), JoinState::Joining);
    chan.join("me");
    assert_eq!(chan.join_state(), JoinState::Joined);
    assert_eq!(sink.join_ready.borrow().as_slice(), [JoinErrorCode::None]);

    chan.names(&["@me".to_string(), "alice".to_string()]);
    assert!(chan.get_members().contains(&Handle::new(2)));

    chan.receive(false, Handle::new(2), "hello there");
    assert_eq!(sink.received.borrow()[0], (Handle::new(2), MessageKind::Normal, "hello there".to_string()));

    chan.send(MessageKind::Normal, "hi back").unwrap();
    assert!(connection.lines.borrow().iter().any(|l| l == "PRIVMSG #rust :hi back"));
    assert_eq!(sink.sent.borrow().last().unwrap(), &(MessageKind::Normal, "hi back".to_string()));

    chan.part("me");
    assert_eq!(chan.join_state(), JoinState::Parted);
    assert_eq!(*sink.closed.borrow(), 1);
}

#[test]
fn passworded_join_then_bad_key_then_retry() {
    let registry = FakeRegistry::default();
    registry.register(Handle::new(1), "me");
    let connection = FakeConnection::default();
    let sink = FakeSink::default();
    let mut chan = Channel::new(&registry, &connection, &sink, Handle::new(100), Handle::new(1), "#secret", 400);

    chan.add_members(&[Handle::new(1)], None).unwrap();
    chan.bad_channel_key();
    assert_eq!(chan.join_state(), JoinState::NeedPassword);

    chan.provide_password("hunter2").unwrap();
    assert!(connection.lines.borrow().iter().any(|l| l == "JOIN #secret hunter2"));

    chan.join("me");
    assert_eq!(chan.join_state(), JoinState::Joined);
    assert_eq!(sink.password_result.borrow().as_slice(), [Ok(())]);
}

#[test]
fn moderated_channel_blocks_send_without_voice() {
    let registry = FakeRegistry::default();
    registry.register(Handle::new(1), "me");
    let connection = FakeConnection::default();
    let sink = FakeSink::default();
    let mut chan = Channel::new(&registry, &connection, &sink, Handle::new(100), Handle::new(1), "#mod", 400);
    chan.add_members(&[Handle::new(1)], None).unwrap();
    chan.join("me");
    chan.mode("+m");

    chan.send(MessageKind::Normal, "can't talk").unwrap();
    assert!(sink.sent.borrow().is_empty());
    assert_eq!(sink.send_errors.borrow().len(), 1);
    assert_eq!(sink.send_errors.borrow()[0].0, SendErrorKind::PermissionDenied);

    chan.mode("+v me");
    chan.send(MessageKind::Normal, "now I can").unwrap();
    assert_eq!(sink.sent.borrow().len(), 1);
}

#[test]
fn invite_then_accept_places_in_local_pending_then_current() {
    let registry = FakeRegistry::default();
    registry.register(Handle::new(1), "me");
    let connection = FakeConnection::default();
    let sink = FakeSink::default();
    let mut chan = Channel::new(&registry, &connection, &sink, Handle::new(100), Handle::new(1), "#invite", 400);

    chan.invited(Handle::new(9));
    assert!(chan.get_local_pending_members().contains(&Handle::new(1)));

    chan.add_members(&[Handle::new(1)], None).unwrap();
    chan.join("me");
    assert!(chan.get_members().contains(&Handle::new(1)));
    assert!(!chan.get_local_pending_members().contains(&Handle::new(1)));
}

#[test]
fn kick_of_other_member_is_reported_with_reason() {
    let registry = FakeRegistry::default();
    registry.register(Handle::new(1), "me");
    registry.register(Handle::new(2), "spammer");
    registry.register(Handle::new(3), "op");
    let connection = FakeConnection::default();
    let sink = FakeSink::default();
    let mut chan = Channel::new(&registry, &connection, &sink, Handle::new(100), Handle::new(1), "#room", 400);
    chan.add_members(&[Handle::new(1)], None).unwrap();
    chan.join("me");
    chan.names(&["spammer".to_string()]);

    chan.kick("spammer", "op", "stop spamming");

    let change = sink.members_changed.borrow().last().unwrap().clone();
    assert_eq!(change.removed, vec![Handle::new(2)]);
    assert_eq!(change.message.as_deref(), Some("stop spamming"));
}

#[test]
fn topic_set_and_unset_are_distinguishable() {
    let registry = FakeRegistry::default();
    let connection = FakeConnection::default();
    let sink = FakeSink::default();
    let mut chan = Channel::new(&registry, &connection, &sink, Handle::new(100), Handle::new(1), "#room", 400);

    chan.topic("welcome!");
    let changed = sink.properties_changed.borrow().last().unwrap().clone();
    assert!(changed.contains(&PropertyChange { id: PropertyId::Subject, value: PropertyValue::Str(Some("welcome!".to_string())) }));

    chan.topic_unset();
    let flags_changed = sink.property_flags_changed.borrow().last().unwrap().clone();
    assert!(flags_changed.iter().any(|e| e.id == PropertyId::Subject));
}

#[test]
fn set_properties_without_write_access_is_rejected() {
    let registry = FakeRegistry::default();
    let connection = FakeConnection::default();
    let sink = FakeSink::default();
    let mut chan = Channel::new(&registry, &connection, &sink, Handle::new(100), Handle::new(1), "#room", 400);

    let result = chan.set_properties(&[(PropertyId::InviteOnly as u8, PropertyValue::Bool(true))]);
    assert!(result.is_err());
    assert!(connection.lines.borrow().is_empty());
}

#[test]
fn group_flags_track_operator_privilege() {
    let registry = FakeRegistry::default();
    registry.register(Handle::new(1), "me");
    let connection = FakeConnection::default();
    let sink = FakeSink::default();
    let mut chan = Channel::new(&registry, &connection, &sink, Handle::new(100), Handle::new(1), "#room", 400);
    chan.add_members(&[Handle::new(1)], None).unwrap();
    chan.join("me");

    assert!(chan.get_group_flags().contains(GroupFlags::CAN_ADD));
    assert!(!chan.get_group_flags().contains(GroupFlags::CAN_REMOVE));

    chan.mode("+o me");
    assert!(chan.get_group_flags().contains(GroupFlags::CAN_REMOVE));

    chan.mode("-o me");
    assert!(!chan.get_group_flags().contains(GroupFlags::CAN_REMOVE));
}

#[test]
fn password_flags_reflect_key_requirement() {
    let registry = FakeRegistry::default();
    let connection = FakeConnection::default();
    let sink = FakeSink::default();
    let mut chan = Channel::new(&registry, &connection, &sink, Handle::new(100), Handle::new(1), "#room", 400);
    assert!(!chan.get_password_flags().contains(PasswordFlags::PROVIDE));
    chan.bad_channel_key();
    assert!(chan.get_password_flags().contains(PasswordFlags::PROVIDE));
}

#[test]
fn dispose_emits_closed_and_fails_outstanding_password_reply() {
    let registry = FakeRegistry::default();
    let connection = FakeConnection::default();
    let sink = FakeSink::default();
    let mut chan = Channel::new(&registry, &connection, &sink, Handle::new(100), Handle::new(1), "#room", 400);
    chan.bad_channel_key();
    chan.provide_password("x").unwrap();

    chan.dispose();
    assert_eq!(*sink.closed.borrow(), 1);
    assert!(sink.password_result.borrow().last().unwrap().is_err());
}

#[test]
fn modeless_channel_join_sets_topic_ops_only() {
    let registry = FakeRegistry::default();
    registry.register(Handle::new(1), "me");
    let connection = FakeConnection::default();
    let sink = FakeSink::default();
    let mut chan = Channel::new(&registry, &connection, &sink, Handle::new(100), Handle::new(1), "+modeless", 400);
    chan.add_members(&[Handle::new(1)], None).unwrap();
    chan.join("me");
    chan.send(MessageKind::Normal, "hi").unwrap();
    assert_eq!(sink.send_errors.borrow().len(), 0);
}
