//! Host and oracle backed by a capture.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use synth_model::{
    BreakpointTables, CharacterStats, CraftDefinition, OutcomeOracle, RecipeDescriptor,
    Simulation, Skill, StaticBreakpoints, StepSnapshot,
};
use synth_tracker::{CraftHost, PhaseSignal, QuickSynthProgress, UiSnapshot};
use tracing::debug;

use crate::capture::{CaptureHeader, Frame};

/// Serves the header's game data and whatever the last applied frame showed.
#[derive(Debug, Default)]
pub struct CaptureHost {
    stats: CharacterStats,
    recipes: HashMap<u32, RecipeDescriptor>,
    actions: HashMap<u32, Skill>,
    breakpoints: StaticBreakpoints,
    frame: Frame,
}

impl CaptureHost {
    pub fn new(header: &CaptureHeader) -> Self {
        Self {
            stats: header.stats.clone(),
            recipes: header
                .recipes
                .iter()
                .map(|recipe| (recipe.id, recipe.clone()))
                .collect(),
            actions: header
                .actions
                .iter()
                .map(|mapping| (mapping.id, mapping.skill))
                .collect(),
            breakpoints: header.breakpoints.clone(),
            frame: Frame::default(),
        }
    }

    /// Frames are absolute: every polled value comes from the latest one.
    pub fn apply(&mut self, frame: &Frame) {
        self.frame = frame.clone();
    }
}

impl CraftHost for CaptureHost {
    fn phase_signal(&self) -> PhaseSignal {
        self.frame.signal
    }

    fn poll_ui_snapshot(&self) -> Option<UiSnapshot> {
        self.frame.ui.clone()
    }

    fn poll_quick_synth(&self) -> Option<QuickSynthProgress> {
        self.frame.quick
    }

    fn resolve_recipe(&self, recipe_id: u32) -> Option<RecipeDescriptor> {
        self.recipes.get(&recipe_id).cloned()
    }

    fn character_stats(&self) -> CharacterStats {
        self.stats.clone()
    }

    fn resolve_action(&self, action_id: u32) -> Skill {
        self.actions.get(&action_id).copied().unwrap_or_default()
    }

    fn breakpoints(&self) -> &dyn BreakpointTables {
        &self.breakpoints
    }
}

/// Plays back the predictions stored next to action results, in order.
///
/// When nothing was recorded the oracle predicts that nothing changes, so
/// every reported difference shows up as a divergence.
#[derive(Debug, Default)]
pub struct RecordedOracle {
    queue: Mutex<VecDeque<Simulation>>,
}

impl RecordedOracle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, simulation: Simulation) {
        self.lock().push_back(simulation);
    }

    /// Number of predictions not consumed yet.
    pub fn pending(&self) -> usize {
        self.lock().len()
    }

    /// Drop anything left over from an action result that never asked.
    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<Simulation>> {
        self.queue.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl OutcomeOracle for RecordedOracle {
    fn simulate(
        &self,
        _craft: &CraftDefinition,
        step: &StepSnapshot,
        action: Skill,
        _failed: bool,
        _chain_position: u32,
    ) -> Simulation {
        match self.lock().pop_front() {
            Some(simulation) => simulation,
            None => {
                debug!("No recorded prediction for {:?}", action);
                Simulation {
                    deltas: Default::default(),
                    next: step.clone(),
                }
            }
        }
    }
}
