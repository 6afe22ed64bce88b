//! Mode flag bits and the channel's mode state record.

use bitflags::bitflags;

bitflags! {
    /// The fifteen channel mode flags tracked by this crate, bit positions
    /// fixed by IRC convention. Not every server sets every bit (CREATOR,
    /// SERVER_REOP are rare), but all fifteen are carried for contract
    /// completeness the way the original tracked the full
    /// `TpChannelGroupFlags`-adjacent mode bitmask.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct ModeFlag: u16 {
        /// Channel creator (mode unused by most modern servers, kept for parity).
        const CREATOR = 1 << 0;
        /// Channel operator (`o`).
        const OPERATOR = 1 << 1;
        /// Voice (`v`).
        const VOICE = 1 << 2;
        /// Half-operator (`h`).
        const HALFOP = 1 << 3;
        /// Anonymous channel (`a`).
        const ANONYMOUS = 1 << 4;
        /// Invite-only (`i`).
        const INVITE_ONLY = 1 << 5;
        /// Moderated (`m`).
        const MODERATED = 1 << 6;
        /// No outside messages (`n`).
        const NO_OUTSIDE = 1 << 7;
        /// Quiet (`q`).
        const QUIET = 1 << 8;
        /// Private (`p`).
        const PRIVATE = 1 << 9;
        /// Secret (`s`).
        const SECRET = 1 << 10;
        /// Server re-op (`r`).
        const SERVER_REOP = 1 << 11;
        /// Topic settable by ops only (`t`).
        const TOPIC_OPS_ONLY = 1 << 12;
        /// Channel key set (`k`).
        const KEY = 1 << 13;
        /// User limit set (`l`).
        const USER_LIMIT = 1 << 14;
    }
}

/// The channel's mode-derived state: flag bitmask plus the two mode
/// arguments (`l`'s numeric limit, `k`'s key string) and the cached topic.
#[derive(Debug, Clone, Default)]
pub struct ModeState {
    /// Current mode flags.
    pub flags: ModeFlag,
    /// Current user limit, meaningful only while `USER_LIMIT` is set.
    pub limit: u32,
    /// Current channel key, meaningful only while `KEY` is set.
    pub key: Option<String>,
    /// Current topic text. `None` means "no topic known"; `Some(String::new())`
    /// is an explicit empty topic — the two are distinct (see
    /// `Channel::topic_unset`/`Channel::topic`).
    pub topic: Option<String>,
    /// Handle of whoever last set the topic.
    pub topic_setter: Option<crate::handle::Handle>,
    /// Epoch-seconds timestamp of the last topic change.
    pub topic_timestamp: i64,
}

impl ModeState {
    /// A fresh mode state: no flags, no limit, no key, no topic.
    pub fn new() -> Self {
        Self::default()
    }

    /// True if self holds channel-operator privilege.
    pub fn is_operator(&self) -> bool {
        self.flags.contains(ModeFlag::OPERATOR)
    }

    /// True if self holds half-operator privilege.
    pub fn is_halfop(&self) -> bool {
        self.flags.contains(ModeFlag::HALFOP)
    }

    /// True if self holds operator or half-operator privilege — the
    /// combined gate for property WRITE and for the `MODERATED` send check.
    pub fn has_op_or_halfop(&self) -> bool {
        self.is_operator() || self.is_halfop()
    }

    /// True if self additionally holds voice.
    pub fn has_voice(&self) -> bool {
        self.flags.contains(ModeFlag::VOICE)
    }
}
