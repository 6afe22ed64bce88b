//! Membership sets and change batching (C2).
//!
//! Three disjoint-by-convention sets of contact handles track a channel's
//! membership from the local client's perspective: who is actually on the
//! channel (`current`), who we've been invited/added and are waiting on the
//! local user to accept or decline (`local_pending`), and who we've invited
//! or whose join we're waiting on the server to confirm (`remote_pending`).
//!
//! All mutation goes through [`MemberSets::change_sets`], which applies a
//! batch of six set deltas atomically and returns one diff suitable for a
//! single `members-changed` emission. Callers never mutate the sets
//! directly — this keeps the "net-removed excludes anything that moved
//! elsewhere in the same batch" invariant in one place.

use crate::handle::Handle;
use std::collections::HashSet;

/// Reason code accompanying a membership change, carried through to the
/// `members-changed` event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ChangeReason {
    /// No particular reason; ordinary join/part.
    None,
    /// The handle was offered membership via an invite.
    Invited,
    /// The handle left via KICK.
    Kicked,
    /// The handle disconnected (QUIT).
    Quit,
    /// The handle parted voluntarily.
    Parted,
    /// Banned from the channel.
    Banned,
}

/// Diff produced by a single [`MemberSets::change_sets`] call, suitable for
/// exactly one `members-changed` emission.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MembershipDiff {
    /// Handles that ended up in `current` as a net effect of this batch.
    pub added: Vec<Handle>,
    /// Handles that left all three sets as a net effect of this batch.
    pub removed: Vec<Handle>,
    /// Handles that ended up in `local_pending` as a net effect of this batch.
    pub local_pending: Vec<Handle>,
    /// Handles that ended up in `remote_pending` as a net effect of this batch.
    pub remote_pending: Vec<Handle>,
    /// Who caused the change (often the self handle, or the kicker/inviter).
    pub actor: Option<Handle>,
    /// Why the change happened.
    pub reason: ChangeReason,
}

/// The three membership sets belonging to one channel.
#[derive(Debug, Clone, Default)]
pub struct MemberSets {
    current: HashSet<Handle>,
    local_pending: HashSet<Handle>,
    remote_pending: HashSet<Handle>,
}

impl MemberSets {
    /// An empty set of members.
    pub fn new() -> Self {
        Self::default()
    }

    /// Handles currently visible as full members.
    pub fn current(&self) -> impl Iterator<Item = Handle> + '_ {
        self.current.iter().copied()
    }

    /// Handles locally pending (we were invited/added, awaiting our decision).
    pub fn local_pending(&self) -> impl Iterator<Item = Handle> + '_ {
        self.local_pending.iter().copied()
    }

    /// Handles remotely pending (we invited/joined, awaiting server confirmation).
    pub fn remote_pending(&self) -> impl Iterator<Item = Handle> + '_ {
        self.remote_pending.iter().copied()
    }

    /// True if `handle` is in any of the three sets.
    pub fn contains_any(&self, handle: Handle) -> bool {
        self.current.contains(&handle)
            || self.local_pending.contains(&handle)
            || self.remote_pending.contains(&handle)
    }

    /// True if `handle` is a full member.
    pub fn is_current(&self, handle: Handle) -> bool {
        self.current.contains(&handle)
    }

    /// True if `handle` is in remote-pending.
    pub fn is_remote_pending(&self, handle: Handle) -> bool {
        self.remote_pending.contains(&handle)
    }

    /// Substitutes `old` for `new` in whichever set currently holds it, a
    /// no-op if `old` is in none. Used for inbound `rename` (a `NICK`
    /// change re-interns the same member under a new handle) — this is an
    /// identity substitution, not a membership change, so it never
    /// produces a `members-changed` diff.
    pub fn rename(&mut self, old: Handle, new: Handle) {
        if self.current.remove(&old) {
            self.current.insert(new);
        } else if self.local_pending.remove(&old) {
            self.local_pending.insert(new);
        } else if self.remote_pending.remove(&old) {
            self.remote_pending.insert(new);
        }
    }

    /// Applies six set deltas atomically and returns a diff describing the
    /// net effect, suitable for a single `members-changed` emission.
    ///
    /// Every handle in an `add_*` list is first removed from the other two
    /// sets (a handle can occupy at most one set) and then inserted into its
    /// target set. `remove_*` lists are applied by removing from the named
    /// set only. After all deltas are applied, the `removed` diff is
    /// computed as handles requested for removal that did **not** end up in
    /// `current`, `local_pending`, or `remote_pending` — this suppresses
    /// the case where a handle is removed from one set and re-added to
    /// another within the same batch.
    #[allow(clippy::too_many_arguments)]
    pub fn change_sets(
        &mut self,
        add_current: &[Handle],
        remove_current: &[Handle],
        add_local: &[Handle],
        remove_local: &[Handle],
        add_remote: &[Handle],
        remove_remote: &[Handle],
        actor: Option<Handle>,
        reason: ChangeReason,
    ) -> MembershipDiff {
        let mut requested_removed: Vec<Handle> = Vec::new();
        requested_removed.extend_from_slice(remove_current);
        requested_removed.extend_from_slice(remove_local);
        requested_removed.extend_from_slice(remove_remote);

        for &h in remove_current {
            self.current.remove(&h);
        }
        for &h in remove_local {
            self.local_pending.remove(&h);
        }
        for &h in remove_remote {
            self.remote_pending.remove(&h);
        }

        for &h in add_current {
            self.local_pending.remove(&h);
            self.remote_pending.remove(&h);
            self.current.insert(h);
        }
        for &h in add_local {
            self.current.remove(&h);
            self.remote_pending.remove(&h);
            self.local_pending.insert(h);
        }
        for &h in add_remote {
            self.current.remove(&h);
            self.local_pending.remove(&h);
            self.remote_pending.insert(h);
        }

        let mut removed: Vec<Handle> = requested_removed
            .into_iter()
            .filter(|h| !self.contains_any(*h))
            .collect();
        removed.sort_unstable();
        removed.dedup();

        let mut added: Vec<Handle> = add_current.to_vec();
        added.sort_unstable();
        added.dedup();

        let mut local_pending: Vec<Handle> = add_local.to_vec();
        local_pending.sort_unstable();
        local_pending.dedup();

        let mut remote_pending: Vec<Handle> = add_remote.to_vec();
        remote_pending.sort_unstable();
        remote_pending.dedup();

        MembershipDiff {
            added,
            removed,
            local_pending,
            remote_pending,
            actor,
            reason,
        }
    }
}
