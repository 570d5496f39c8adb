//! Per-step dynamic values.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::condition::Condition;
use crate::craft::CraftDefinition;
use crate::skill::Skill;

/// Remaining turns of each timed buff. Zero means inactive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BuffCounters {
    /// Inner Quiet is a stack count, not a duration.
    pub inner_quiet: i32,
    pub waste_not: i32,
    pub manipulation: i32,
    pub great_strides: i32,
    pub innovation: i32,
    pub veneration: i32,
    pub muscle_memory: i32,
    pub final_appraisal: i32,
    pub heart_and_soul_active: bool,
}

/// The state of a session after one resolved action.
///
/// Snapshots are produced either by decoding the polled synthesis window or
/// by the outcome oracle, and are compared structurally.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct StepSnapshot {
    /// 1-based step index.
    pub index: i32,
    pub progress: i32,
    pub quality: i32,
    pub durability: i32,
    pub remaining_cp: i32,
    pub condition: Condition,
    #[serde(default)]
    pub buffs: BuffCounters,
    #[serde(default)]
    pub careful_observation_available: bool,
    #[serde(default)]
    pub heart_and_soul_available: bool,
    /// Action that produced this step; [`Skill::None`] for the first step.
    #[serde(default)]
    pub prev_action: Skill,
    #[serde(default)]
    pub prev_action_failed: bool,
}

impl StepSnapshot {
    /// Progress reached the target or durability ran out.
    pub fn is_terminal(&self, craft: &CraftDefinition) -> bool {
        self.progress >= craft.progress || self.durability <= 0
    }

    /// Clamp progress and quality to the craft's targets and floor durability at zero.
    pub fn clamp_to(&mut self, craft: &CraftDefinition) {
        self.progress = self.progress.min(craft.progress);
        self.quality = self.quality.min(craft.quality_max);
        self.durability = self.durability.max(0);
    }

    /// Same as [`clamp_to`](Self::clamp_to) but by value.
    pub fn clamped(mut self, craft: &CraftDefinition) -> Self {
        self.clamp_to(craft);
        self
    }
}

impl fmt::Display for StepSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{} {:?}{} P={} Q={} D={} CP={} ({})",
            self.index,
            self.prev_action,
            if self.prev_action_failed { " (failed)" } else { "" },
            self.progress,
            self.quality,
            self.durability,
            self.remaining_cp,
            self.condition
        )
    }
}

/// Changes caused by a single action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct StepDeltas {
    pub progress: i32,
    pub quality: i32,
    pub durability: i32,
}
