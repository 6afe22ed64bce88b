//! Refcounted room/contact handles (C1).
//!
//! A [`Handle`] is an opaque small integer, interned and refcounted by an
//! external registry the channel does not own. This module wraps the raw
//! integer in a value type and provides an RAII guard that acquires on
//! construction and releases on drop, so membership sets and the channel's
//! own room/self handles never need to remember to release by hand.

use std::fmt;

/// Opaque handle to a room or a contact, as produced by the external handle
/// registry. Comparisons are by value; resolving a handle to a nick or
/// channel name is the registry's job, not this type's.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Handle(pub u32);

impl Handle {
    /// Wraps a raw registry-assigned integer.
    pub fn new(raw: u32) -> Self {
        Handle(raw)
    }

    /// The raw integer value.
    pub fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// External, process-wide interning/refcounting authority for handles.
///
/// This crate never creates or destroys handles itself; it only acquires
/// and releases references to handles minted elsewhere, and resolves them
/// to display names when formatting outbound commands or events.
pub trait HandleRegistry {
    /// Increment the refcount on `handle`. Called once whenever a handle is
    /// retained (channel construction, entry into a membership set).
    fn acquire(&self, handle: Handle);

    /// Decrement the refcount on `handle`. Called once whenever a retained
    /// handle is dropped (channel disposal, removal from a membership set).
    fn release(&self, handle: Handle);

    /// Resolve a handle to its current textual name (nick for a contact
    /// handle, channel name for a room handle).
    fn resolve(&self, handle: Handle) -> Option<String>;

    /// Intern (or look up) the handle naming `name`, the inverse of
    /// [`resolve`](HandleRegistry::resolve).
    ///
    /// The external interfaces this crate ingests (§6's `join(nick)`,
    /// `part(nick)`, `kick(nick, kicker, reason)`) name members by nick,
    /// not by handle, so the façade needs this to turn wire text back into
    /// the handles its membership sets are keyed on. The "process-wide
    /// interning" this method performs is exactly the registry's stated
    /// job (§1); this channel never mints a handle itself.
    fn lookup(&self, name: &str) -> Option<Handle>;
}

/// RAII guard owning one reference on a [`Handle`].
///
/// Acquires on construction via [`HandleRegistry::acquire`] and releases on
/// drop via [`HandleRegistry::release`]. Membership sets store `HandleRef`
/// values, not bare handles, so a handle's reference lifetime is tied
/// exactly to how long it sits in channel state.
pub struct HandleRef<'r, R: HandleRegistry + ?Sized> {
    handle: Handle,
    registry: &'r R,
}

impl<'r, R: HandleRegistry + ?Sized> HandleRef<'r, R> {
    /// Acquires a new reference on `handle` via `registry`.
    pub fn new(handle: Handle, registry: &'r R) -> Self {
        registry.acquire(handle);
        HandleRef { handle, registry }
    }

    /// The underlying handle.
    pub fn handle(&self) -> Handle {
        self.handle
    }
}

impl<'r, R: HandleRegistry + ?Sized> Drop for HandleRef<'r, R> {
    fn drop(&mut self) {
        self.registry.release(self.handle);
    }
}

impl<'r, R: HandleRegistry + ?Sized> fmt::Debug for HandleRef<'r, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandleRef").field("handle", &self.handle).finish()
    }
}
