//! Join/part state machine (C6, §4.5).
//!
//! Mirrors the sans-IO shape of the teacher crate's handshake state
//! machine: a plain state enum plus transition methods that validate
//! preconditions and return whether the caller should perform a
//! side-effecting action (send a line, emit an event), rather than
//! performing I/O themselves.

use crate::error::ChannelError;
use crate::events::JoinErrorCode;

/// The five lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum JoinState {
    /// Not yet joined, no join attempt in flight.
    Created,
    /// `JOIN` sent, awaiting the server's echo or an error.
    Joining,
    /// The server rejected our key; awaiting `provide_password`.
    NeedPassword,
    /// Fully joined; self is in `current`.
    Joined,
    /// Parted, kicked, or otherwise exited.
    Parted,
}

/// Join/part state plus the two "fires at most once" latches and the
/// one-shot password-provide continuation.
#[derive(Debug, Clone)]
pub struct Lifecycle {
    state: JoinState,
    join_ready_fired: bool,
    closed_fired: bool,
    password_outstanding: bool,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Lifecycle {
            state: JoinState::Created,
            join_ready_fired: false,
            closed_fired: false,
            password_outstanding: false,
        }
    }
}

impl Lifecycle {
    /// A freshly created channel, not yet joined.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state.
    pub fn state(&self) -> JoinState {
        self.state
    }

    /// Begins a join attempt. Valid from `Created` or `Parted` (rejoining
    /// after a part); fails `NotAvailable` otherwise (already joining,
    /// already joined, or mid password challenge).
    pub fn start_join(&mut self) -> Result<(), ChannelError> {
        match self.state {
            JoinState::Created | JoinState::Parted => {
                self.state = JoinState::Joining;
                Ok(())
            }
            _ => Err(ChannelError::NotAvailable {
                detail: "already joined or joining".to_string(),
            }),
        }
    }

    /// The server rejected our channel key. Valid from `Joining` or
    /// `NeedPassword` (a second bad key while still challenged).
    pub fn bad_channel_key(&mut self) {
        self.state = JoinState::NeedPassword;
    }

    /// Begins the one-shot `provide_password` continuation. Fails
    /// `NotAvailable` unless we're in `NeedPassword` with no continuation
    /// already outstanding.
    pub fn begin_provide_password(&mut self) -> Result<(), ChannelError> {
        if self.state != JoinState::NeedPassword {
            return Err(ChannelError::NotAvailable {
                detail: "no outstanding password challenge".to_string(),
            });
        }
        if self.password_outstanding {
            return Err(ChannelError::NotAvailable {
                detail: "password authentication already in progress".to_string(),
            });
        }
        self.password_outstanding = true;
        Ok(())
    }

    /// True if a `provide_password` reply is outstanding.
    pub fn password_outstanding(&self) -> bool {
        self.password_outstanding
    }

    /// Resolves the outstanding password continuation, if any, and returns
    /// whether one was in fact outstanding (so the caller knows whether to
    /// invoke the sink's `password_provide_result`).
    pub fn resolve_password(&mut self) -> bool {
        std::mem::replace(&mut self.password_outstanding, false)
    }

    /// Self observed joining (own nick in a JOIN echo or NAMES listing).
    /// Valid from `Joining` or `NeedPassword`; transitions to `Joined`.
    pub fn self_joined(&mut self) {
        self.state = JoinState::Joined;
    }

    /// Self observed parting, being kicked, or quitting. Valid from any
    /// state; transitions to `Parted`.
    pub fn self_parted(&mut self) {
        self.state = JoinState::Parted;
    }

    /// Marks `join-ready` as fired if this is the first time a terminal
    /// join outcome (success or error) has been reached. Returns `Some(err)`
    /// the first time, `None` on every subsequent call.
    pub fn mark_join_ready(&mut self, err: JoinErrorCode) -> Option<JoinErrorCode> {
        if self.join_ready_fired {
            return None;
        }
        self.join_ready_fired = true;
        Some(err)
    }

    /// True once `join-ready` has fired.
    pub fn join_ready_fired(&self) -> bool {
        self.join_ready_fired
    }

    /// Marks `closed` as fired if it hasn't already. Returns `true` the
    /// first time, `false` on every subsequent call.
    pub fn mark_closed(&mut self) -> bool {
        if self.closed_fired {
            return false;
        }
        self.closed_fired = true;
        true
    }

    /// True once `closed` has fired.
    pub fn closed_fired(&self) -> bool {
        self.closed_fired
    }
}
