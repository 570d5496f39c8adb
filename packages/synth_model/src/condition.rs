//! Step conditions rolled by the game between actions.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Modifier applied to the current step, rolled by the game after each action.
///
/// The numeric values match the raw encoding used by the synthesis window.
/// Push messages carry the condition offset by one (0 meaning "none").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    #[default]
    Normal,
    Good,
    Excellent,
    Poor,
    Centered,
    Sturdy,
    Pliant,
    Malleable,
    Primed,
    GoodOmen,
    /// Any raw value this model does not know about.
    Unknown,
}

impl Condition {
    /// Decode the raw value shown by the synthesis window.
    pub fn from_raw(raw: i32) -> Self {
        match raw {
            0 => Self::Normal,
            1 => Self::Good,
            2 => Self::Excellent,
            3 => Self::Poor,
            4 => Self::Centered,
            5 => Self::Sturdy,
            6 => Self::Pliant,
            7 => Self::Malleable,
            8 => Self::Primed,
            9 => Self::GoodOmen,
            _ => Self::Unknown,
        }
    }

    /// Decode the "plus one" encoding carried by action-result messages.
    pub fn from_message(condition_plus_one: i32) -> Self {
        condition_plus_one
            .checked_sub(1)
            .map_or(Self::Unknown, Self::from_raw)
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Normal => "normal",
            Self::Good => "good",
            Self::Excellent => "excellent",
            Self::Poor => "poor",
            Self::Centered => "centered",
            Self::Sturdy => "sturdy",
            Self::Pliant => "pliant",
            Self::Malleable => "malleable",
            Self::Primed => "primed",
            Self::GoodOmen => "good omen",
            Self::Unknown => "unknown",
        };
        f.write_str(name)
    }
}
