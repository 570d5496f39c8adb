//! Notifications emitted by the engine.
//!
//! Within one session observers see `Started`, then any number of
//! `Advanced`, then exactly one `Finished`. `PhaseChanged` fires on every
//! committed phase transition and `QuickSynthProgress` whenever the quick
//! synthesis counts change.

use std::sync::Arc;

use serde::Serialize;
use synth_model::{CraftDefinition, StepSnapshot};

use crate::phase::SessionPhase;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    PhaseChanged {
        from: SessionPhase,
        to: SessionPhase,
    },
    Started {
        recipe_id: u32,
        craft: Arc<CraftDefinition>,
        step: StepSnapshot,
        trial: bool,
    },
    /// Step index increases for most actions, see [`synth_model::Skill::advances_step`].
    Advanced {
        recipe_id: u32,
        craft: Arc<CraftDefinition>,
        step: StepSnapshot,
    },
    /// The final action does not advance the step index.
    Finished {
        recipe_id: u32,
        craft: Arc<CraftDefinition>,
        step: StepSnapshot,
        cancelled: bool,
    },
    /// The tracker recovered from a lost session without knowing how it ended.
    Interrupted {
        recipe_id: Option<u32>,
        step: Option<StepSnapshot>,
    },
    QuickSynthProgress {
        current: i32,
        max: i32,
    },
}

impl SessionEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::PhaseChanged { .. } => "phase_changed",
            Self::Started { .. } => "started",
            Self::Advanced { .. } => "advanced",
            Self::Finished { .. } => "finished",
            Self::Interrupted { .. } => "interrupted",
            Self::QuickSynthProgress { .. } => "quick_synth_progress",
        }
    }
}

/// Typed callbacks for session events. Every method defaults to a no-op.
#[allow(unused_variables)]
pub trait SessionObserver {
    fn phase_changed(&mut self, from: SessionPhase, to: SessionPhase) {}

    fn session_started(
        &mut self,
        recipe_id: u32,
        craft: &Arc<CraftDefinition>,
        step: &StepSnapshot,
        trial: bool,
    ) {
    }

    fn session_advanced(&mut self, recipe_id: u32, craft: &Arc<CraftDefinition>, step: &StepSnapshot) {}

    fn session_finished(
        &mut self,
        recipe_id: u32,
        craft: &Arc<CraftDefinition>,
        step: &StepSnapshot,
        cancelled: bool,
    ) {
    }

    fn session_interrupted(&mut self, recipe_id: Option<u32>, step: Option<&StepSnapshot>) {}

    fn quick_synth_progress(&mut self, current: i32, max: i32) {}
}

/// Fans events out to registered observers, in registration order.
#[derive(Default)]
pub struct Notifier {
    observers: Vec<Box<dyn SessionObserver + Send>>,
}

impl Notifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, observer: Box<dyn SessionObserver + Send>) {
        self.observers.push(observer);
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    pub fn dispatch(&mut self, event: &SessionEvent) {
        for observer in &mut self.observers {
            match event {
                SessionEvent::PhaseChanged { from, to } => observer.phase_changed(*from, *to),
                SessionEvent::Started {
                    recipe_id,
                    craft,
                    step,
                    trial,
                } => observer.session_started(*recipe_id, craft, step, *trial),
                SessionEvent::Advanced {
                    recipe_id,
                    craft,
                    step,
                } => observer.session_advanced(*recipe_id, craft, step),
                SessionEvent::Finished {
                    recipe_id,
                    craft,
                    step,
                    cancelled,
                } => observer.session_finished(*recipe_id, craft, step, *cancelled),
                SessionEvent::Interrupted { recipe_id, step } => {
                    observer.session_interrupted(*recipe_id, step.as_ref())
                }
                SessionEvent::QuickSynthProgress { current, max } => {
                    observer.quick_synth_progress(*current, *max)
                }
            }
        }
    }
}

impl std::fmt::Debug for Notifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Notifier")
            .field("observers", &self.observers.len())
            .finish()
    }
}
