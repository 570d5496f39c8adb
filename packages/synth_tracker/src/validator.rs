//! Cross-checks action results against the outcome oracle.
//!
//! When the game reports an action result we ask the oracle what it expected,
//! patch in the rules the oracle does not model, and compare field by field.
//! Disagreements are only reported: the reported values always win, and the
//! patched prediction is kept as a placeholder until the polled window
//! catches up.

use synth_model::{CraftDefinition, OutcomeOracle, Skill, StepDeltas, StepSnapshot};

use crate::diagnostic::{Diagnostic, PredictedField};
use crate::message::AdvanceStep;

/// Every action result is simulated as the first action of a chain.
const ACTION_CHAIN_POSITION: u32 = 1;

/// Outcome of validating one action result.
#[derive(Debug, Clone, PartialEq)]
pub struct Validation {
    /// Oracle prediction after post-processing, before reconciliation.
    pub predicted: StepSnapshot,
    pub predicted_deltas: StepDeltas,
    /// Prediction with the reported numbers written over it.
    pub reconciled: StepSnapshot,
    pub divergences: Vec<Diagnostic>,
}

/// Simulate `action` from `step` and compare with what the game reported.
pub fn validate_advance<O>(
    oracle: &O,
    craft: &CraftDefinition,
    step: &StepSnapshot,
    action: Skill,
    reported: &AdvanceStep,
) -> Validation
where
    O: OutcomeOracle + ?Sized,
{
    let failed = reported.action_failed();
    let complete = reported.is_complete();

    let simulation = oracle.simulate(craft, step, action, failed, ACTION_CHAIN_POSITION);
    let predicted = post_process(simulation.next, craft, step, action, failed, complete, reported);
    let predicted_deltas = StepDeltas {
        progress: if failed { 0 } else { simulation.deltas.progress },
        quality: if failed { 0 } else { simulation.deltas.quality },
        durability: action
            .restored_durability()
            .unwrap_or(simulation.deltas.durability),
    };

    let mut divergences = Vec::new();
    let checks = [
        (PredictedField::StepIndex, predicted.index, reported.step_index),
        (PredictedField::Progress, predicted.progress, reported.progress),
        (PredictedField::Quality, predicted.quality, reported.quality),
        (PredictedField::Durability, predicted.durability, reported.durability),
        (
            PredictedField::ProgressDelta,
            predicted_deltas.progress,
            reported.delta_progress,
        ),
        (
            PredictedField::QualityDelta,
            predicted_deltas.quality,
            reported.delta_quality,
        ),
        (
            PredictedField::DurabilityDelta,
            predicted_deltas.durability,
            reported.delta_durability,
        ),
    ];
    for (field, predicted, reported) in checks {
        if predicted != reported {
            divergences.push(Diagnostic::OracleDivergence {
                field,
                predicted,
                reported,
            });
        }
    }

    let predicted_complete = predicted.is_terminal(craft);
    if predicted_complete != complete {
        divergences.push(Diagnostic::CompletionMismatch {
            predicted: predicted_complete,
            reported: complete,
        });
    }

    let reconciled = StepSnapshot {
        index: reported.step_index,
        progress: reported.progress,
        quality: reported.quality,
        durability: reported.durability,
        ..predicted.clone()
    }
    .clamped(craft);

    Validation {
        predicted,
        predicted_deltas,
        reconciled,
        divergences,
    }
}

/// Apply what the game does that the oracle does not know about.
fn post_process(
    mut next: StepSnapshot,
    craft: &CraftDefinition,
    step: &StepSnapshot,
    action: Skill,
    failed: bool,
    complete: bool,
    reported: &AdvanceStep,
) -> StepSnapshot {
    next.prev_action = action;
    next.prev_action_failed = failed;
    if complete || !action.advances_step() {
        next.index = step.index;
    }
    next.clamp_to(craft);
    next.condition = reported.condition();
    next
}
