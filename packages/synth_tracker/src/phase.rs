//! Session phases tracked by the engine.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Where the tracked session currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    /// Startup, or we lost track (e.g. the tracker was reloaded mid-craft).
    /// Left once the phase signal settles.
    #[default]
    Unknown,
    /// Not crafting at all.
    Idle,
    /// Sitting in the crafting menu between sessions.
    IdleBetween,
    /// A (quick) synthesis was started but its details are not known yet.
    AwaitingStart,
    /// Waiting for the next action.
    Active,
    /// An action was executed, waiting for its result.
    AwaitingActionResult,
    /// The session concluded, waiting for the finish transition to clear.
    AwaitingSessionEnd,
    /// Inside the quick synthesis loop.
    QuickMode,
}

impl SessionPhase {
    /// Phases in which a session (definition + step) must be held.
    pub fn holds_session(&self) -> bool {
        matches!(self, SessionPhase::Active | SessionPhase::AwaitingActionResult)
    }
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown => write!(f, "unknown"),
            Self::Idle => write!(f, "idle"),
            Self::IdleBetween => write!(f, "idle-between"),
            Self::AwaitingStart => write!(f, "awaiting-start"),
            Self::Active => write!(f, "active"),
            Self::AwaitingActionResult => write!(f, "awaiting-action-result"),
            Self::AwaitingSessionEnd => write!(f, "awaiting-session-end"),
            Self::QuickMode => write!(f, "quick-mode"),
        }
    }
}
