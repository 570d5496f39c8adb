//! Polled signal sources.
//!
//! The host exposes the game through a [`CraftHost`] implementation. Every
//! method is a cheap, non-blocking read of whatever the host currently sees;
//! the engine calls them on each tick and while handling push messages.

use serde::{Deserialize, Serialize};
use synth_model::{
    BreakpointTables, BuffCounters, CharacterStats, Condition, CraftDefinition, RecipeDescriptor,
    Skill, StepSnapshot,
};

/// Session-boundary condition flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PhaseSignal {
    /// Crafting menu is open ("preparing to craft").
    pub preparing: bool,
    /// A crafting session is running.
    pub active: bool,
    /// Short-lived flag set while an action or a start/finish animation is processing.
    pub transitioning: bool,
}

impl PhaseSignal {
    /// No transition in flight and the active/preparing flags agree.
    ///
    /// This is the only reading from which a lost session can be wrapped up.
    pub fn is_settled(&self) -> bool {
        !self.transitioning && self.active == self.preparing
    }
}

/// Values read from the synthesis window plus the character's status list.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UiSnapshot {
    pub step_index: i32,
    pub progress: i32,
    pub quality: i32,
    pub durability: i32,
    /// Raw condition value as shown by the window.
    pub condition: i32,
    pub is_trial: bool,
    pub remaining_cp: i32,
    pub buffs: BuffCounters,
    pub careful_observation_available: bool,
    pub heart_and_soul_available: bool,
}

impl UiSnapshot {
    /// Turn the raw window values into a step, attributing it to `prev_action`.
    pub fn decode(
        &self,
        craft: &CraftDefinition,
        prev_action: Skill,
        prev_action_failed: bool,
    ) -> StepSnapshot {
        StepSnapshot {
            index: self.step_index,
            progress: self.progress,
            quality: self.quality,
            durability: self.durability,
            remaining_cp: self.remaining_cp,
            condition: Condition::from_raw(self.condition),
            buffs: self.buffs,
            careful_observation_available: self.careful_observation_available,
            heart_and_soul_available: self.heart_and_soul_available,
            prev_action,
            prev_action_failed,
        }
        .clamped(craft)
    }
}

/// Aggregate counts shown by the quick synthesis window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct QuickSynthProgress {
    pub current: i32,
    pub max: i32,
}

impl QuickSynthProgress {
    pub fn new(current: i32, max: i32) -> Self {
        Self { current, max }
    }

    pub fn is_completed(&self) -> bool {
        self.max > 0 && self.current == self.max
    }
}

/// Everything the engine needs to read from the game.
pub trait CraftHost {
    fn phase_signal(&self) -> PhaseSignal;

    /// `None` if the synthesis window is absent or malformed.
    fn poll_ui_snapshot(&self) -> Option<UiSnapshot>;

    /// `None` if the quick synthesis window is absent or malformed.
    fn poll_quick_synth(&self) -> Option<QuickSynthProgress>;

    fn resolve_recipe(&self, recipe_id: u32) -> Option<RecipeDescriptor>;

    /// Current stats including gear; read once when a session starts.
    fn character_stats(&self) -> CharacterStats;

    /// Map a raw action id to a skill; unknown ids map to [`Skill::None`].
    fn resolve_action(&self, action_id: u32) -> Skill;

    fn breakpoints(&self) -> &dyn BreakpointTables;
}
