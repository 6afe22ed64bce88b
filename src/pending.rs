//! Pending inbound message queue with acknowledgement (C3).
//!
//! Every received text message is appended to a FIFO queue with a
//! monotonic id, strictly increasing and unique within one channel
//! instance. Clients acknowledge messages by id to free them; the spec's
//! observed behavior for a batch acknowledge containing an unknown id is
//! to remove everything up to and including the last known-good id, then
//! fail — the removals already performed are not rolled back.

use crate::error::ChannelError;
use std::collections::VecDeque;

/// The three wire-level message kinds a pending message may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MessageKind {
    /// An ordinary PRIVMSG body.
    Normal,
    /// A CTCP ACTION ("emote").
    Action,
    /// A NOTICE body.
    Notice,
}

/// A single queued inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PendingMessage {
    /// Monotonic id, unique within this channel instance.
    pub id: u64,
    /// Epoch-seconds timestamp at receipt.
    pub timestamp: i64,
    /// Handle of the sender.
    pub sender: crate::handle::Handle,
    /// Wire-level kind.
    pub kind: MessageKind,
    /// Decoded body text (CTCP ACTION wrapper already stripped).
    pub text: String,
}

/// FIFO queue of [`PendingMessage`] with monotonic id assignment.
#[derive(Debug, Clone, Default)]
pub struct PendingQueue {
    next_id: u64,
    messages: VecDeque<PendingMessage>,
}

impl PendingQueue {
    /// An empty queue whose first assigned id will be 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a new message, assigning it the next monotonic id.
    ///
    /// Returns the constructed [`PendingMessage`] so the caller can build
    /// the corresponding `received` event from it.
    pub fn push(
        &mut self,
        timestamp: i64,
        sender: crate::handle::Handle,
        kind: MessageKind,
        text: String,
    ) -> PendingMessage {
        let msg = PendingMessage {
            id: self.next_id,
            timestamp,
            sender,
            kind,
            text,
        };
        self.next_id += 1;
        self.messages.push_back(msg.clone());
        msg
    }

    /// Removes each id in `ids`, in order. Stops and fails with
    /// [`ChannelError::InvalidArgument`] at the first id not present in the
    /// queue; ids removed before the failing id stay removed.
    pub fn acknowledge(&mut self, ids: &[u64]) -> Result<(), ChannelError> {
        for &id in ids {
            let pos = self.messages.iter().position(|m| m.id == id);
            match pos {
                Some(idx) => {
                    self.messages.remove(idx);
                }
                None => {
                    return Err(ChannelError::InvalidArgument {
                        detail: format!("no pending message with id {id}"),
                    });
                }
            }
        }
        Ok(())
    }

    /// Returns the current queue contents (oldest first). If `clear` is
    /// true, empties the queue as a side effect.
    pub fn list(&mut self, clear: bool) -> Vec<PendingMessage> {
        let snapshot: Vec<PendingMessage> = self.messages.iter().cloned().collect();
        if clear {
            self.messages.clear();
        }
        snapshot
    }

    /// Number of messages currently queued.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// True if the queue holds no messages.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
