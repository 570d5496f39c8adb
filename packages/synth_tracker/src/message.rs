//! Push messages from the game's crafting event handler.
//!
//! How the host captures these is its own business; the engine only sees the
//! decoded variants below. Typical ordering for a normal synthesis:
//!
//! ```text
//! StartPrepare -> StartInfo -> StartReady -> (AdvanceAction)* -> Finish
//! ```
//!
//! Quick synthesis sends `StartPrepare -> QuickSynthStart -> (QuickSynthProgress)*`,
//! and an aborted craft sends `Abort` at some point around the window closing.

use serde::{Deserialize, Serialize};
use synth_model::Condition;

/// Which handler produced an action result. Both carry the same payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdvanceKind {
    #[default]
    Craft,
    Normal,
}

/// Flags attached to an action result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StepFlags {
    pub last_action_succeeded: bool,
    pub complete_success: bool,
    pub complete_fail: bool,
}

/// Authoritative result of an executed action.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AdvanceStep {
    pub kind: AdvanceKind,
    pub action_id: u32,
    pub flags: StepFlags,
    pub step_index: i32,
    pub progress: i32,
    pub quality: i32,
    pub durability: i32,
    pub delta_progress: i32,
    pub delta_quality: i32,
    pub delta_durability: i32,
    /// Condition of the next step, offset by one.
    pub condition_plus_one: i32,
}

impl AdvanceStep {
    /// The action ended the craft, successfully or not.
    pub fn is_complete(&self) -> bool {
        self.flags.complete_success || self.flags.complete_fail
    }

    pub fn action_failed(&self) -> bool {
        !self.flags.last_action_succeeded
    }

    pub fn condition(&self) -> Condition {
        Condition::from_message(self.condition_plus_one)
    }
}

/// A decoded crafting event handler message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CraftMessage {
    /// Sent as soon as a (quick) synthesis is requested.
    StartPrepare,
    /// Recipe details of a normal synthesis, a few hundred ms after `StartPrepare`.
    StartInfo { recipe_id: u32, starting_quality: i32 },
    /// Tells the client to set up the synthesis window.
    StartReady,
    /// Ends the finish animation of a craft or quick synthesis.
    Finish,
    /// Sent immediately when a craft is aborted.
    Abort,
    /// Result of an executed action.
    AdvanceAction(AdvanceStep),
    /// Recipe details of a quick synthesis.
    QuickSynthStart { recipe_id: u32, max_count: i32 },
    /// Sent about a second after the quick synthesis counts change.
    QuickSynthProgress,
}

impl CraftMessage {
    /// Stable name used in logs and diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            Self::StartPrepare => "start_prepare",
            Self::StartInfo { .. } => "start_info",
            Self::StartReady => "start_ready",
            Self::Finish => "finish",
            Self::Abort => "abort",
            Self::AdvanceAction(step) => match step.kind {
                AdvanceKind::Craft => "advance_craft_action",
                AdvanceKind::Normal => "advance_normal_action",
            },
            Self::QuickSynthStart { .. } => "quick_synth_start",
            Self::QuickSynthProgress => "quick_synth_progress",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completion_from_either_flag() {
        let mut step = AdvanceStep::default();
        assert!(!step.is_complete());
        step.flags.complete_fail = true;
        assert!(step.is_complete());
        step.flags = StepFlags {
            complete_success: true,
            ..Default::default()
        };
        assert!(step.is_complete());
    }

    #[test]
    fn failure_is_absence_of_success_flag() {
        let mut step = AdvanceStep::default();
        assert!(step.action_failed());
        step.flags.last_action_succeeded = true;
        assert!(!step.action_failed());
    }

    #[test]
    fn condition_is_decoded_from_plus_one() {
        let step = AdvanceStep {
            condition_plus_one: 3,
            ..Default::default()
        };
        assert_eq!(step.condition(), Condition::Excellent);
    }

    #[test]
    fn serde_tagged_roundtrip() {
        let msg = CraftMessage::StartInfo {
            recipe_id: 35000,
            starting_quality: 0,
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"type\":\"start_info\""));
        let back: CraftMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(back, msg);
    }

    #[test]
    fn advance_action_parses_partial_payload() {
        let msg: CraftMessage = serde_json::from_str(
            r#"{"type":"advance_action","action_id":100001,"step_index":2,"progress":300,
                "flags":{"last_action_succeeded":true}}"#,
        )
        .unwrap();
        match msg {
            CraftMessage::AdvanceAction(step) => {
                assert_eq!(step.action_id, 100001);
                assert_eq!(step.progress, 300);
                assert!(!step.action_failed());
                assert_eq!(step.kind, AdvanceKind::Craft);
            }
            other => panic!("unexpected message {other:?}"),
        }
    }

    #[test]
    fn names_distinguish_advance_kinds() {
        let craft = CraftMessage::AdvanceAction(AdvanceStep::default());
        let normal = CraftMessage::AdvanceAction(AdvanceStep {
            kind: AdvanceKind::Normal,
            ..Default::default()
        });
        assert_eq!(craft.name(), "advance_craft_action");
        assert_eq!(normal.name(), "advance_normal_action");
        assert_eq!(CraftMessage::Abort.name(), "abort");
    }
}
