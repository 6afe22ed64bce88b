//! Outbound property-to-mode translation (§4.4).
//!
//! Clients set properties through the session bus; this module turns a
//! batch of changed properties into the `MODE`/`TOPIC` lines to push to the
//! connection. The `(limit, limited)` and `(password, password-required)`
//! pairs are a correctness hazard noted directly in the spec's design
//! notes: the data-carrying property must be buffered and paired with its
//! boolean, with the data property ordered first in the outgoing batch, or
//! the combination can't be materialised into a single `+l N` / `+k K`.

use crate::properties::{PropertyChange, PropertyId, PropertyValue};

/// One outbound command produced by [`translate_properties`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModeCommand {
    /// `MODE chan +X` / `MODE chan -X` for a boolean-only flag.
    Mode {
        /// Adding (`true`) or removing (`false`) the mode letter.
        add: bool,
        /// The mode letter.
        letter: char,
        /// The argument, for `+l`/`+k`.
        arg: Option<String>,
    },
    /// `TOPIC chan :text`.
    Topic(String),
}

/// Translates a batch of already-validated property changes (i.e. the
/// output of [`crate::properties::PropertyBag::validate_set_properties`])
/// into the `MODE`/`TOPIC` commands that realize them.
///
/// The `limit`/`limited` and `password`/`password-required` pairs are
/// buffered separately and reordered so the data property's command (if
/// any) is emitted before the paired boolean's, per §4.4: "If only the data
/// changed and the boolean is already set, emit `+l N`"; this function
/// handles that merge directly rather than emitting two separate lines
/// when both members of a pair changed together.
pub fn translate_properties(
    changes: &[PropertyChange],
    limited_already_set: bool,
    password_required_already_set: bool,
) -> Vec<ModeCommand> {
    let mut commands = Vec::new();

    let mut limit_value: Option<u32> = None;
    let mut limited_value: Option<bool> = None;
    let mut password_value: Option<String> = None;
    let mut password_required_value: Option<bool> = None;

    for change in changes {
        match (change.id, &change.value) {
            (PropertyId::InviteOnly, PropertyValue::Bool(v)) => {
                commands.push(ModeCommand::Mode { add: *v, letter: 'i', arg: None });
            }
            (PropertyId::Moderated, PropertyValue::Bool(v)) => {
                commands.push(ModeCommand::Mode { add: *v, letter: 'm', arg: None });
            }
            (PropertyId::Private, PropertyValue::Bool(v)) => {
                commands.push(ModeCommand::Mode { add: *v, letter: 's', arg: None });
            }
            (PropertyId::Subject, PropertyValue::Str(text)) => {
                commands.push(ModeCommand::Topic(text.clone().unwrap_or_default()));
            }
            (PropertyId::Limit, PropertyValue::Uint(v)) => limit_value = Some(*v),
            (PropertyId::Limited, PropertyValue::Bool(v)) => limited_value = Some(*v),
            (PropertyId::Password, PropertyValue::Str(v)) => password_value = v.clone(),
            (PropertyId::PasswordRequired, PropertyValue::Bool(v)) => {
                password_required_value = Some(*v)
            }
            _ => {}
        }
    }

    if let Some(cmd) = pair_command('l', limit_value.map(|v| v.to_string()), limited_value, limited_already_set) {
        commands.insert(0, cmd);
    }
    if let Some(cmd) = pair_command(
        'k',
        password_value,
        password_required_value,
        password_required_already_set,
    ) {
        // Two data/boolean pairs can both be pending; keep each data
        // command ahead of any boolean-only commands that followed it,
        // without disturbing relative order between the two pairs.
        commands.insert(0, cmd);
    }

    commands
}

/// Builds the single `MODE` command realizing one data/boolean pair, given
/// whichever subset of `{data, boolean}` actually changed this batch and
/// whether the boolean was already set before this batch.
fn pair_command(
    letter: char,
    data: Option<String>,
    boolean: Option<bool>,
    boolean_already_set: bool,
) -> Option<ModeCommand> {
    match (data, boolean) {
        (Some(value), _) => Some(ModeCommand::Mode { add: true, letter, arg: Some(value) }),
        (None, Some(true)) => None, // boolean alone turning on with no data has nothing to carry
        (None, Some(false)) if boolean_already_set => {
            Some(ModeCommand::Mode { add: false, letter, arg: None })
        }
        (None, Some(false)) => None,
        (None, None) => None,
    }
}
