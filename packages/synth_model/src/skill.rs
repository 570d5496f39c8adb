//! Crafting actions, independent of the job that executes them.

use serde::{Deserialize, Serialize};

/// Durability restored by Master's Mend, regardless of buffs.
pub const MASTERS_MEND_RESTORE: i32 = 30;

/// A crafting action.
///
/// Every crafting job has its own numeric action ids for the same logical
/// action; the host is responsible for mapping raw ids onto this enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Skill {
    /// No action (the initial step of a session) or an id the host could not map.
    #[default]
    None,

    // Progress
    BasicSynthesis,
    CarefulSynthesis,
    RapidSynthesis,
    Groundwork,
    IntensiveSynthesis,
    PrudentSynthesis,
    MuscleMemory,
    DelicateSynthesis,

    // Quality
    BasicTouch,
    StandardTouch,
    AdvancedTouch,
    HastyTouch,
    PreciseTouch,
    PrudentTouch,
    PreparatoryTouch,
    TrainedFinesse,
    Reflect,
    ByregotsBlessing,
    TrainedEye,

    // Buffs and utility
    MastersMend,
    WasteNot,
    WasteNot2,
    Manipulation,
    Veneration,
    Innovation,
    GreatStrides,
    FinalAppraisal,
    Observe,
    TricksOfTheTrade,

    // Specialist
    CarefulObservation,
    HeartAndSoul,
}

impl Skill {
    /// Whether executing this action moves the session to the next step index.
    ///
    /// The terminal action of a session never advances either, but that is a
    /// property of the result, not of the action.
    pub fn advances_step(self) -> bool {
        !matches!(
            self,
            Self::FinalAppraisal | Self::CarefulObservation | Self::HeartAndSoul
        )
    }

    /// Fixed durability delta applied by the game, overriding any buff math.
    pub fn restored_durability(self) -> Option<i32> {
        match self {
            Self::MastersMend => Some(MASTERS_MEND_RESTORE),
            _ => None,
        }
    }
}
