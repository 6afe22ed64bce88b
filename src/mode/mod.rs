//! Mode/flag engine (C5): inbound `MODE` tokenizing, channel mode state,
//! and outbound property-to-mode translation.

pub mod parse;
pub mod translate;
pub mod types;

pub use parse::{parse_mode_string, ModeToken};
pub use translate::{translate_properties, ModeCommand};
pub use types::{ModeFlag, ModeState};
