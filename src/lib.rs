//! # muc-channel
//!
//! A channel-level state machine for IRC multi-user chat, modeled on the
//! Telepathy `Channel.Type.Text` / `Channel.Interface.Group` contract: one
//! [`Channel`](channel::Channel) instance per joined-or-joining channel,
//! fed inbound IRC events and client calls, producing outbound command
//! lines and structured events through two small collaborator traits
//! rather than performing any I/O of its own.
//!
//! ## Shape
//!
//! - [`handle`] — opaque, externally-refcounted room/contact handles and
//!   the RAII guard that ties a handle's lifetime to how long this crate
//!   holds it.
//! - [`membership`] — the three member sets (`current`, `local_pending`,
//!   `remote_pending`) and the batched diff that backs a single
//!   `members-changed` emission.
//! - [`pending`] — the FIFO queue of received-but-unacknowledged messages.
//! - [`properties`] — the ten-entry property bag mirroring mode state onto
//!   a typed, per-property READ/WRITE access contract.
//! - [`mode`] — inbound `MODE` tokenizing, the channel's mode-derived
//!   state, and outbound property-to-mode translation.
//! - [`lifecycle`] — the join/part state machine plus the two
//!   fires-at-most-once latches and the password-provide reply
//!   continuation.
//! - [`send`] — outbound PRIVMSG/NOTICE/ACTION framing and UTF-8-safe line
//!   splitting.
//! - [`ctcp`] — CTCP ACTION detection and incidental CTCP stripping.
//! - [`events`] — the event sink trait and the flag/code types carried in
//!   its events.
//! - [`registry`] — the external collaborator traits ([`registry::Connection`]
//!   and the re-exported [`handle::HandleRegistry`]).
//! - [`channel`] — [`channel::Channel`], composing all of the above behind
//!   the client-facing and inbound-call surface.
//!
//! ## Example
//!
//! ```no_run
//! use muc_channel::channel::Channel;
//! use muc_channel::handle::{Handle, HandleRegistry};
//! use muc_channel::registry::Connection;
//! use muc_channel::events::EventSink;
//!
//! struct MyRegistry;
//! impl HandleRegistry for MyRegistry {
//!     fn acquire(&self, _handle: Handle) {}
//!     fn release(&self, _handle: Handle) {}
//!     fn resolve(&self, handle: Handle) -> Option<String> {
//!         Some(format!("nick-{}", handle.raw()))
//!     }
//!     fn lookup(&self, _name: &str) -> Option<Handle> {
//!         Some(Handle::new(1))
//!     }
//! }
//!
//! struct MyConnection;
//! impl Connection for MyConnection {
//!     fn send_line(&self, line: &str) {
//!         println!("-> {line}");
//!     }
//! }
//!
//! struct MySink;
//! impl EventSink for MySink {}
//!
//! let registry = MyRegistry;
//! let connection = MyConnection;
//! let sink = MySink;
//! let mut channel = Channel::new(
//!     &registry,
//!     &connection,
//!     &sink,
//!     Handle::new(100),
//!     Handle::new(1),
//!     "#rust",
//!     400,
//! );
//! channel.add_members(&[Handle::new(1)], None).unwrap();
//! ```

#![deny(clippy::all)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod chan;
pub mod channel;
pub mod ctcp;
pub mod error;
pub mod events;
pub mod handle;
pub mod lifecycle;
pub mod membership;
pub mod mode;
pub mod pending;
pub mod properties;
pub mod registry;
pub mod send;
pub mod util;

pub use self::channel::Channel;
pub use self::error::{ChannelError, ModeParseError};
pub use self::events::EventSink;
pub use self::handle::{Handle, HandleRegistry};
pub use self::pending::{MessageKind, PendingMessage};
pub use self::registry::Connection;
