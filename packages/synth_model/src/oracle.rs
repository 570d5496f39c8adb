//! Seam to the external step simulator.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::craft::CraftDefinition;
use crate::skill::Skill;
use crate::step::{StepDeltas, StepSnapshot};

/// Result of simulating one action.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Simulation {
    pub deltas: StepDeltas,
    pub next: StepSnapshot,
}

/// Deterministic step simulator.
///
/// Given the same inputs an oracle must always return the same result. It
/// does not roll conditions; callers overwrite the condition of `next` with
/// whatever the game reported.
pub trait OutcomeOracle {
    fn simulate(
        &self,
        craft: &CraftDefinition,
        step: &StepSnapshot,
        action: Skill,
        failed: bool,
        chain_position: u32,
    ) -> Simulation;
}

impl<T: OutcomeOracle + ?Sized> OutcomeOracle for Arc<T> {
    fn simulate(
        &self,
        craft: &CraftDefinition,
        step: &StepSnapshot,
        action: Skill,
        failed: bool,
        chain_position: u32,
    ) -> Simulation {
        (**self).simulate(craft, step, action, failed, chain_position)
    }
}

impl<T: OutcomeOracle + ?Sized> OutcomeOracle for Box<T> {
    fn simulate(
        &self,
        craft: &CraftDefinition,
        step: &StepSnapshot,
        action: Skill,
        failed: bool,
        chain_position: u32,
    ) -> Simulation {
        (**self).simulate(craft, step, action, failed, chain_position)
    }
}
