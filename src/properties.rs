//! Typed property bag with per-property read/write flags (C4).
//!
//! Ten fixed, numerically-ordered properties mirror the channel's IRC mode
//! state to the session-bus client contract. Each carries an independent
//! READ (value currently knowable) and WRITE (local user currently
//! entitled to set it) flag; `bitflags` stores the two bits compactly, the
//! way the rest of this crate's protocol flag words are stored.

use crate::error::ChannelError;
use bitflags::bitflags;

bitflags! {
    /// Per-property access flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct PropertyFlags: u8 {
        /// The value is currently knowable via `get_properties`.
        const READ = 0b01;
        /// The local user is currently entitled to set this property.
        const WRITE = 0b10;
    }
}

/// The ten fixed property ids, ordered exactly as the external contract
/// numbers them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum PropertyId {
    /// Mirrors mode `i`.
    InviteOnly = 0,
    /// Mirrors mode `l`'s argument.
    Limit = 1,
    /// Mirrors mode `l`'s presence.
    Limited = 2,
    /// Mirrors mode `m`.
    Moderated = 3,
    /// Mirrors mode `k`'s argument.
    Password = 4,
    /// Mirrors mode `k`'s presence.
    PasswordRequired = 5,
    /// Mirrors mode `p` or `s`.
    Private = 6,
    /// Topic text.
    Subject = 7,
    /// Topic set time.
    SubjectTimestamp = 8,
    /// Topic setter handle.
    SubjectContact = 9,
}

impl PropertyId {
    /// All ten ids, in ascending numeric order.
    pub const ALL: [PropertyId; 10] = [
        PropertyId::InviteOnly,
        PropertyId::Limit,
        PropertyId::Limited,
        PropertyId::Moderated,
        PropertyId::Password,
        PropertyId::PasswordRequired,
        PropertyId::Private,
        PropertyId::Subject,
        PropertyId::SubjectTimestamp,
        PropertyId::SubjectContact,
    ];

    /// The external contract name, stable across versions.
    pub fn name(self) -> &'static str {
        match self {
            PropertyId::InviteOnly => "invite-only",
            PropertyId::Limit => "limit",
            PropertyId::Limited => "limited",
            PropertyId::Moderated => "moderated",
            PropertyId::Password => "password",
            PropertyId::PasswordRequired => "password-required",
            PropertyId::Private => "private",
            PropertyId::Subject => "subject",
            PropertyId::SubjectTimestamp => "subject-timestamp",
            PropertyId::SubjectContact => "subject-contact",
        }
    }

    /// D-Bus-style type code: `b` (bool), `u` (uint), `s` (string).
    pub fn type_code(self) -> char {
        match self {
            PropertyId::InviteOnly
            | PropertyId::Limited
            | PropertyId::Moderated
            | PropertyId::PasswordRequired
            | PropertyId::Private => 'b',
            PropertyId::Limit | PropertyId::SubjectTimestamp | PropertyId::SubjectContact => 'u',
            PropertyId::Password | PropertyId::Subject => 's',
        }
    }

    fn index(self) -> usize {
        self as u8 as usize
    }

    fn from_u8(raw: u8) -> Option<PropertyId> {
        PropertyId::ALL.into_iter().find(|p| *p as u8 == raw)
    }
}

/// A tagged property value. Unknown scalar types cannot be constructed and
/// so can never compare equal to anything — type mismatches are caught at
/// the `set_properties` boundary instead, per the spec's design notes.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PropertyValue {
    /// A boolean property value.
    Bool(bool),
    /// An unsigned integer property value.
    Uint(u32),
    /// A string property value. `None` models "no value known" (NULL);
    /// `Some(String::new())` is an explicit empty string, and the two are
    /// not equal to each other.
    Str(Option<String>),
}

impl PropertyValue {
    fn type_code(&self) -> char {
        match self {
            PropertyValue::Bool(_) => 'b',
            PropertyValue::Uint(_) => 'u',
            PropertyValue::Str(_) => 's',
        }
    }
}

/// One `{id, value}` change, as supplied to [`PropertyBag::change_properties`]
/// or returned in a `properties-changed` emission.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PropertyChange {
    /// Which property changed.
    pub id: PropertyId,
    /// Its new value.
    pub value: PropertyValue,
}

/// One `{id, flags}` entry, as returned in a `property-flags-changed`
/// emission or from [`PropertyBag::list_properties`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PropertyFlagsEntry {
    /// Which property.
    pub id: PropertyId,
    /// Its current access flags.
    pub flags: PropertyFlags,
}

/// A full listing entry, as returned from [`PropertyBag::list_properties`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropertyListing {
    /// Which property.
    pub id: PropertyId,
    /// Its external contract name.
    pub name: &'static str,
    /// Its D-Bus-style type code.
    pub type_code: char,
    /// Its current access flags.
    pub flags: PropertyFlags,
}

/// The ten fixed properties, their current values, and per-property flags.
#[derive(Debug, Clone)]
pub struct PropertyBag {
    values: [PropertyValue; 10],
    flags: [PropertyFlags; 10],
}

impl Default for PropertyBag {
    fn default() -> Self {
        PropertyBag {
            values: [
                PropertyValue::Bool(false),
                PropertyValue::Uint(0),
                PropertyValue::Bool(false),
                PropertyValue::Bool(false),
                PropertyValue::Str(None),
                PropertyValue::Bool(false),
                PropertyValue::Bool(false),
                PropertyValue::Str(None),
                PropertyValue::Uint(0),
                PropertyValue::Uint(0),
            ],
            flags: [PropertyFlags::empty(); 10],
        }
    }
}

impl PropertyBag {
    /// A bag with all values at their defaults and no flags set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value of a property, ignoring its flags.
    pub fn value(&self, id: PropertyId) -> &PropertyValue {
        &self.values[id.index()]
    }

    /// Current flags of a property.
    pub fn flags(&self, id: PropertyId) -> PropertyFlags {
        self.flags[id.index()]
    }

    /// Applies a batch of value changes. For each entry, compares against
    /// the current value (per the spec's value-equality rules: bools/uints
    /// by value, strings by content with `NULL == NULL`); unchanged entries
    /// are dropped. Every property that was actually updated has its READ
    /// flag set. Returns the applied changes (for a `properties-changed`
    /// emission) and the properties whose flags changed as a result (for a
    /// `property-flags-changed` emission) — both empty if nothing changed.
    pub fn change_properties(
        &mut self,
        changes: &[PropertyChange],
    ) -> (Vec<PropertyChange>, Vec<PropertyFlagsEntry>) {
        let mut applied = Vec::new();
        let mut flags_changed = Vec::new();

        for change in changes {
            let idx = change.id.index();
            if self.values[idx] == change.value {
                continue;
            }
            self.values[idx] = change.value.clone();
            applied.push(change.clone());

            let before = self.flags[idx];
            let after = before | PropertyFlags::READ;
            if after != before {
                self.flags[idx] = after;
                flags_changed.push(PropertyFlagsEntry { id: change.id, flags: after });
            }
        }

        (applied, flags_changed)
    }

    /// Computes `(old | add) & !remove` for each named property (or all
    /// ten, if `ids` is empty) and applies it. Returns only the entries
    /// whose flag word actually changed, for a single
    /// `property-flags-changed` emission.
    pub fn set_property_flags(
        &mut self,
        ids: &[PropertyId],
        add: PropertyFlags,
        remove: PropertyFlags,
    ) -> Vec<PropertyFlagsEntry> {
        let targets: Vec<PropertyId> = if ids.is_empty() {
            PropertyId::ALL.to_vec()
        } else {
            ids.to_vec()
        };

        let mut changed = Vec::new();
        for id in targets {
            let idx = id.index();
            let before = self.flags[idx];
            let after = (before | add) & !remove;
            if after != before {
                self.flags[idx] = after;
                changed.push(PropertyFlagsEntry { id, flags: after });
            }
        }
        changed
    }

    /// Every property's id, name, type code, and current flags.
    pub fn list_properties(&self) -> Vec<PropertyListing> {
        PropertyId::ALL
            .iter()
            .map(|&id| PropertyListing {
                id,
                name: id.name(),
                type_code: id.type_code(),
                flags: self.flags(id),
            })
            .collect()
    }

    /// Returns the current values of `ids`. Fails with
    /// [`ChannelError::PermissionDenied`] if any requested id lacks READ.
    pub fn get_properties(
        &self,
        ids: &[PropertyId],
    ) -> Result<Vec<PropertyChange>, ChannelError> {
        for &id in ids {
            if !self.flags(id).contains(PropertyFlags::READ) {
                return Err(ChannelError::PermissionDenied { property: id.name() });
            }
        }
        Ok(ids
            .iter()
            .map(|&id| PropertyChange { id, value: self.value(id).clone() })
            .collect())
    }

    /// Validates a batch of requested value writes: fails with
    /// [`ChannelError::PermissionDenied`] if any id lacks WRITE, with
    /// [`ChannelError::InvalidArgument`] on an unknown id or a value whose
    /// type doesn't match the property's declared type. On success,
    /// returns the subset of `values` whose value would actually change —
    /// this is what the caller forwards to the outbound mode/topic
    /// translator.
    pub fn validate_set_properties(
        &self,
        values: &[PropertyChange],
    ) -> Result<Vec<PropertyChange>, ChannelError> {
        let mut accepted = Vec::new();
        for change in values {
            if change.id.type_code() != change.value.type_code() {
                return Err(ChannelError::InvalidArgument {
                    detail: format!(
                        "type mismatch for property {}: expected {}, got {}",
                        change.id.name(),
                        change.id.type_code(),
                        change.value.type_code()
                    ),
                });
            }
            if !self.flags(change.id).contains(PropertyFlags::WRITE) {
                return Err(ChannelError::PermissionDenied { property: change.id.name() });
            }
            if self.value(change.id) != &change.value {
                accepted.push(change.clone());
            }
        }
        Ok(accepted)
    }

    /// Resolves a raw numeric id, failing with
    /// [`ChannelError::InvalidArgument`] if it doesn't name one of the ten
    /// properties — the "unknown id becomes a parse error at the boundary
    /// only" rule.
    pub fn resolve_id(raw: u8) -> Result<PropertyId, ChannelError> {
        PropertyId::from_u8(raw).ok_or_else(|| ChannelError::InvalidArgument {
            detail: format!("unknown property id {raw}"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn change_properties_sets_read_on_actually_changed() {
        let mut bag = PropertyBag::new();
        let (applied, flags_changed) = bag.change_properties(&[PropertyChange {
            id: PropertyId::InviteOnly,
            value: PropertyValue::Bool(true),
        }]);
        assert_eq!(applied.len(), 1);
        assert_eq!(flags_changed.len(), 1);
        assert!(bag.flags(PropertyId::InviteOnly).contains(PropertyFlags::READ));
    }

    #[test]
    fn change_properties_ignores_unchanged_value() {
        let mut bag = PropertyBag::new();
        bag.change_properties(&[PropertyChange {
            id: PropertyId::Moderated,
            value: PropertyValue::Bool(false),
        }]);
        // value is already false by default - no-op.
        let (applied, flags_changed) = bag.change_properties(&[PropertyChange {
            id: PropertyId::Moderated,
            value: PropertyValue::Bool(false),
        }]);
        assert!(applied.is_empty());
        assert!(flags_changed.is_empty());
    }

    #[test]
    fn null_string_equals_null_not_empty() {
        let mut bag = PropertyBag::new();
        // Subject starts as Str(None); setting to Str(None) again is a no-op.
        let (applied, _) = bag.change_properties(&[PropertyChange {
            id: PropertyId::Subject,
            value: PropertyValue::Str(None),
        }]);
        assert!(applied.is_empty());

        let (applied, _) = bag.change_properties(&[PropertyChange {
            id: PropertyId::Subject,
            value: PropertyValue::Str(Some(String::new())),
        }]);
        assert_eq!(applied.len(), 1);
    }

    #[test]
    fn write_flag_gates_set_properties() {
        let mut bag = PropertyBag::new();
        let result = bag.validate_set_properties(&[PropertyChange {
            id: PropertyId::Moderated,
            value: PropertyValue::Bool(true),
        }]);
        assert!(matches!(result, Err(ChannelError::PermissionDenied { .. })));

        bag.set_property_flags(&[], PropertyFlags::WRITE, PropertyFlags::empty());
        let result = bag.validate_set_properties(&[PropertyChange {
            id: PropertyId::Moderated,
            value: PropertyValue::Bool(true),
        }]);
        assert_eq!(result.unwrap().len(), 1);
    }

    #[test]
    fn read_flag_gates_get_properties() {
        let bag = PropertyBag::new();
        let result = bag.get_properties(&[PropertyId::Subject]);
        assert!(matches!(result, Err(ChannelError::PermissionDenied { .. })));
    }

    #[test]
    fn type_mismatch_is_invalid_argument() {
        let bag = PropertyBag::new();
        let result = bag.validate_set_properties(&[PropertyChange {
            id: PropertyId::Moderated,
            value: PropertyValue::Uint(1),
        }]);
        assert!(matches!(result, Err(ChannelError::InvalidArgument { .. })));
    }

    #[test]
    fn resolve_id_rejects_out_of_range() {
        assert!(PropertyBag::resolve_id(0).is_ok());
        assert!(PropertyBag::resolve_id(9).is_ok());
        assert!(PropertyBag::resolve_id(10).is_err());
    }

    #[test]
    fn set_property_flags_reports_only_actual_changes() {
        let mut bag = PropertyBag::new();
        let changed = bag.set_property_flags(
            &[PropertyId::InviteOnly, PropertyId::Moderated],
            PropertyFlags::WRITE,
            PropertyFlags::empty(),
        );
        assert_eq!(changed.len(), 2);

        // Applying the identical flags again changes nothing.
        let changed_again = bag.set_property_flags(
            &[PropertyId::InviteOnly, PropertyId::Moderated],
            PropertyFlags::WRITE,
            PropertyFlags::empty(),
        );
        assert!(changed_again.is_empty());
    }
}
