//! Session engine
//!
//! Fuses the two feeds the game gives us into one session event stream:
//!
//! 1. **Polled signals** (every tick): the phase flags, the synthesis window
//!    and the quick synthesis window. Cheap, always available, but lag
//!    behind: status effects in particular update a few frames after the
//!    action result.
//!
//! 2. **Push messages** (as they arrive): authoritative action results, but
//!    only for the fields the game sends.
//!
//! When an action result arrives we ask the oracle for the full next step,
//! overwrite it with the reported numbers and park it as a pending
//! prediction. The next ticks wait for the polled window to agree with it;
//! if it never does before the deadline, the polled values win and a
//! diagnostic is recorded. Nothing here ever blocks or fails.

use std::sync::Arc;
use std::time::Instant;

use synth_model::{
    Condition, CraftDefinition, OutcomeOracle, RecipeDescriptor, Skill, StepSnapshot,
    build_craft_definition,
};
use tracing::{debug, info};

use crate::config::{TrackerConfig, UnknownRecovery};
use crate::diagnostic::{Diagnostic, DiagnosticLog, DiagnosticRecord};
use crate::message::{AdvanceStep, CraftMessage};
use crate::notify::{Notifier, SessionEvent, SessionObserver};
use crate::phase::SessionPhase;
use crate::signal::{CraftHost, PhaseSignal, QuickSynthProgress};
use crate::validator::validate_advance;

/// Recipe announced by the last start message.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum RecipeSlot {
    /// No start message seen since the last reset.
    #[default]
    Empty,
    Resolved(RecipeDescriptor),
    /// The host did not know the announced recipe.
    Missing { recipe_id: u32 },
}

impl RecipeSlot {
    pub fn recipe_id(&self) -> Option<u32> {
        match self {
            Self::Empty => None,
            Self::Resolved(recipe) => Some(recipe.id),
            Self::Missing { recipe_id } => Some(*recipe_id),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }
}

/// The session currently being tracked.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveSession {
    pub recipe_id: u32,
    pub craft: Arc<CraftDefinition>,
    /// Last committed step.
    pub step: StepSnapshot,
    pub trial: bool,
}

/// Reconciled step waiting for the polled window to catch up.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingPrediction {
    pub step: StepSnapshot,
    pub deadline: Instant,
}

pub struct SessionEngine<O> {
    config: TrackerConfig,
    oracle: O,
    phase: SessionPhase,
    recipe: RecipeSlot,
    session: Option<ActiveSession>,
    pending: Option<PendingPrediction>,
    quick_synth: QuickSynthProgress,
    diagnostics: DiagnosticLog,
    notifier: Notifier,
    /// Events produced during the current tick, flushed at its end.
    outbox: Vec<SessionEvent>,
}

impl<O: OutcomeOracle> SessionEngine<O> {
    pub fn new(oracle: O, config: TrackerConfig) -> Self {
        Self {
            diagnostics: DiagnosticLog::new(config.diagnostic_capacity),
            config,
            oracle,
            phase: SessionPhase::Unknown,
            recipe: RecipeSlot::Empty,
            session: None,
            pending: None,
            quick_synth: QuickSynthProgress::default(),
            notifier: Notifier::new(),
            outbox: Vec::new(),
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn recipe(&self) -> &RecipeSlot {
        &self.recipe
    }

    pub fn session(&self) -> Option<&ActiveSession> {
        self.session.as_ref()
    }

    pub fn pending_prediction(&self) -> Option<&PendingPrediction> {
        self.pending.as_ref()
    }

    pub fn quick_synth(&self) -> QuickSynthProgress {
        self.quick_synth
    }

    /// Every craft of the current quick synthesis is done.
    pub fn quick_synth_completed(&self) -> bool {
        self.quick_synth.is_completed()
    }

    /// Register an observer. Observers are called at the end of every tick,
    /// in registration order, before the events are returned.
    pub fn subscribe(&mut self, observer: Box<dyn SessionObserver + Send>) {
        self.notifier.subscribe(observer);
    }

    pub fn diagnostics(&self) -> &DiagnosticLog {
        &self.diagnostics
    }

    pub fn drain_diagnostics(&mut self) -> Vec<DiagnosticRecord> {
        self.diagnostics.drain()
    }

    /// Drop back to `Unknown`, e.g. after the host missed part of either
    /// feed. A held session is wrapped up per [`UnknownRecovery`] once the
    /// phase signal settles.
    pub fn resync(&mut self, reason: &str) -> Vec<SessionEvent> {
        self.report(Diagnostic::desync(reason));
        self.pending = None;
        self.commit_phase(SessionPhase::Unknown);
        self.flush()
    }

    pub fn tick<H: CraftHost + ?Sized>(&mut self, host: &H) -> Vec<SessionEvent> {
        self.tick_at(host, Instant::now())
    }

    /// Run the transition function once and return the events it produced.
    pub fn tick_at<H: CraftHost + ?Sized>(&mut self, host: &H, now: Instant) -> Vec<SessionEvent> {
        let signal = host.phase_signal();
        let next = match self.phase {
            SessionPhase::Unknown => self.on_unknown(signal),
            SessionPhase::Idle => self.on_idle(signal),
            SessionPhase::IdleBetween => self.on_idle_between(signal),
            SessionPhase::AwaitingStart => self.on_awaiting_start(host, signal),
            SessionPhase::Active => self.on_active(signal),
            SessionPhase::AwaitingActionResult => self.on_awaiting_action_result(host, now),
            SessionPhase::AwaitingSessionEnd => self.on_awaiting_session_end(signal),
            SessionPhase::QuickMode => self.on_quick_mode(host, signal),
        };
        self.commit_phase(next);
        self.flush()
    }

    pub fn handle_message<H: CraftHost + ?Sized>(&mut self, message: &CraftMessage, host: &H) {
        self.handle_message_at(message, host, Instant::now())
    }

    /// Apply a push message. Messages never change the phase directly; the
    /// next tick picks up whatever they stored.
    pub fn handle_message_at<H: CraftHost + ?Sized>(
        &mut self,
        message: &CraftMessage,
        host: &H,
        now: Instant,
    ) {
        use SessionPhase::*;

        let expected: &[SessionPhase] = match message {
            CraftMessage::StartPrepare => &[AwaitingStart, IdleBetween],
            CraftMessage::StartInfo { .. }
            | CraftMessage::StartReady
            | CraftMessage::QuickSynthStart { .. } => &[AwaitingStart],
            CraftMessage::Finish => &[AwaitingSessionEnd, IdleBetween],
            CraftMessage::Abort => &[AwaitingActionResult, AwaitingSessionEnd, IdleBetween],
            CraftMessage::AdvanceAction(_) => &[AwaitingActionResult],
            CraftMessage::QuickSynthProgress => &[QuickMode],
        };
        if !expected.contains(&self.phase) {
            self.report(Diagnostic::UnexpectedMessage {
                message: message.name(),
                phase: self.phase,
            });
        }

        match message {
            CraftMessage::StartInfo {
                recipe_id,
                starting_quality,
            } => {
                debug!(
                    "Starting craft: recipe #{}, initial quality {}",
                    recipe_id, starting_quality
                );
                self.announce_recipe(*recipe_id, message.name(), host);
            }
            CraftMessage::QuickSynthStart {
                recipe_id,
                max_count,
            } => {
                debug!(
                    "Starting quick synthesis: recipe #{}, count {}",
                    recipe_id, max_count
                );
                self.announce_recipe(*recipe_id, message.name(), host);
            }
            CraftMessage::Abort => {
                if self.pending.is_some() {
                    self.report(Diagnostic::anomaly(format!(
                        "prediction still pending when receiving {} message",
                        message.name()
                    )));
                }
            }
            CraftMessage::AdvanceAction(reported) => {
                self.apply_action_result(reported, message.name(), host, now);
            }
            CraftMessage::StartPrepare
            | CraftMessage::StartReady
            | CraftMessage::Finish
            | CraftMessage::QuickSynthProgress => {}
        }
    }

    // ── message handling ──

    fn announce_recipe<H: CraftHost + ?Sized>(&mut self, recipe_id: u32, name: &str, host: &H) {
        if !self.recipe.is_empty() {
            self.report(Diagnostic::anomaly(format!(
                "recipe already set when receiving {name} message"
            )));
        }
        self.recipe = match host.resolve_recipe(recipe_id) {
            Some(recipe) => RecipeSlot::Resolved(recipe),
            None => {
                self.report(Diagnostic::anomaly(format!(
                    "failed to find recipe #{recipe_id}"
                )));
                RecipeSlot::Missing { recipe_id }
            }
        };
    }

    fn apply_action_result<H: CraftHost + ?Sized>(
        &mut self,
        reported: &AdvanceStep,
        name: &str,
        host: &H,
        now: Instant,
    ) {
        if self.pending.take().is_some() {
            self.report(Diagnostic::anomaly(format!(
                "prediction still pending when receiving {name} message"
            )));
        }

        let Some(session) = &self.session else {
            self.report(Diagnostic::desync(format!(
                "{name} message without a tracked session"
            )));
            return;
        };

        let action = host.resolve_action(reported.action_id);
        let validation = validate_advance(
            &self.oracle,
            &session.craft,
            &session.step,
            action,
            reported,
        );
        debug!(
            "Action result: {:?}, predicted {}",
            action, validation.reconciled
        );

        for divergence in validation.divergences {
            self.report(divergence);
        }
        self.pending = Some(PendingPrediction {
            step: validation.reconciled,
            deadline: now + self.config.prediction_deadline,
        });
    }

    // ── transitions ──

    fn on_unknown(&mut self, signal: PhaseSignal) -> SessionPhase {
        if !signal.is_settled() {
            return SessionPhase::Unknown;
        }

        match self.config.unknown_recovery {
            UnknownRecovery::Cancel => {
                if let Some(session) = &self.session {
                    self.outbox.push(SessionEvent::Finished {
                        recipe_id: session.recipe_id,
                        craft: session.craft.clone(),
                        step: session.step.clone(),
                        cancelled: true,
                    });
                }
            }
            UnknownRecovery::Interrupt => {
                self.outbox.push(SessionEvent::Interrupted {
                    recipe_id: self
                        .session
                        .as_ref()
                        .map(|s| s.recipe_id)
                        .or_else(|| self.recipe.recipe_id()),
                    step: self.session.as_ref().map(|s| s.step.clone()),
                });
            }
        }
        self.session = None;
        SessionPhase::AwaitingSessionEnd
    }

    fn on_idle(&mut self, signal: PhaseSignal) -> SessionPhase {
        if signal.transitioning {
            return SessionPhase::AwaitingStart;
        }
        if signal.preparing {
            self.report(Diagnostic::anomaly(
                "crafting menu opened without a transition",
            ));
            return SessionPhase::IdleBetween;
        }
        SessionPhase::Idle
    }

    fn on_idle_between(&mut self, signal: PhaseSignal) -> SessionPhase {
        // the transition flag stays set after leaving quick synthesis
        if signal.preparing {
            SessionPhase::IdleBetween
        } else if signal.transitioning {
            SessionPhase::AwaitingStart
        } else {
            SessionPhase::Idle
        }
    }

    fn on_awaiting_start<H: CraftHost + ?Sized>(
        &mut self,
        host: &H,
        signal: PhaseSignal,
    ) -> SessionPhase {
        if host.poll_quick_synth().is_some() {
            return SessionPhase::QuickMode;
        }
        if signal.transitioning {
            return SessionPhase::AwaitingStart;
        }

        let recipe = match &self.recipe {
            RecipeSlot::Resolved(recipe) => recipe.clone(),
            RecipeSlot::Empty if signal.active => {
                debug!("Waiting for recipe details...");
                return SessionPhase::AwaitingStart;
            }
            RecipeSlot::Empty => {
                self.report(Diagnostic::desync(
                    "craft start ended before any recipe was announced",
                ));
                return SessionPhase::Unknown;
            }
            RecipeSlot::Missing { recipe_id } => {
                let reason = format!("cannot start a session for unknown recipe #{recipe_id}");
                self.report(Diagnostic::desync(reason));
                return SessionPhase::Unknown;
            }
        };

        let Some(ui) = host.poll_ui_snapshot() else {
            self.report(Diagnostic::anomaly(
                "synthesis window missing when the craft should have started",
            ));
            return SessionPhase::AwaitingStart;
        };

        let craft = Arc::new(build_craft_definition(
            &host.character_stats(),
            &recipe,
            host.breakpoints(),
        ));
        let step = ui.decode(&craft, Skill::None, false);
        if step.index != 1
            || step.condition != Condition::Normal
            || step.prev_action != Skill::None
        {
            self.report(Diagnostic::anomaly(format!(
                "unexpected initial state: {step}"
            )));
        }

        info!(recipe_id = recipe.id, trial = ui.is_trial, "Session started");
        self.outbox.push(SessionEvent::Started {
            recipe_id: recipe.id,
            craft: craft.clone(),
            step: step.clone(),
            trial: ui.is_trial,
        });
        self.session = Some(ActiveSession {
            recipe_id: recipe.id,
            craft,
            step,
            trial: ui.is_trial,
        });
        SessionPhase::Active
    }

    fn on_active(&mut self, signal: PhaseSignal) -> SessionPhase {
        // set when an action is executed or the craft is cancelled
        if !signal.transitioning {
            return SessionPhase::Active;
        }
        self.pending = None;
        SessionPhase::AwaitingActionResult
    }

    fn on_awaiting_action_result<H: CraftHost + ?Sized>(
        &mut self,
        host: &H,
        now: Instant,
    ) -> SessionPhase {
        let Some(session) = self.session.as_mut() else {
            self.report(Diagnostic::desync("waiting for an action result without a session"));
            return SessionPhase::Unknown;
        };

        let Some(ui) = host.poll_ui_snapshot() else {
            info!(recipe_id = session.recipe_id, "Session aborted");
            self.outbox.push(SessionEvent::Finished {
                recipe_id: session.recipe_id,
                craft: session.craft.clone(),
                step: session.step.clone(),
                cancelled: true,
            });
            self.session = None;
            return SessionPhase::AwaitingSessionEnd;
        };

        let Some(pending) = self.pending.take() else {
            return SessionPhase::AwaitingActionResult;
        };

        if pending.step.is_terminal(&session.craft) {
            // no further window updates are coming for a final action
            session.step = pending.step;
            info!(recipe_id = session.recipe_id, step = %session.step, "Session finished");
            self.outbox.push(SessionEvent::Finished {
                recipe_id: session.recipe_id,
                craft: session.craft.clone(),
                step: session.step.clone(),
                cancelled: false,
            });
            self.session = None;
            return SessionPhase::AwaitingSessionEnd;
        }

        let observed = ui.decode(
            &session.craft,
            pending.step.prev_action,
            pending.step.prev_action_failed,
        );
        let mut timeout = None;
        if observed != pending.step {
            if now <= pending.deadline {
                debug!("Waiting for status update...");
                self.pending = Some(pending);
                return SessionPhase::AwaitingActionResult;
            }
            timeout = Some(Diagnostic::ReconciliationTimeout {
                previous: session.step.clone(),
                expected: pending.step,
                observed: observed.clone(),
            });
        }

        session.step = observed;
        self.outbox.push(SessionEvent::Advanced {
            recipe_id: session.recipe_id,
            craft: session.craft.clone(),
            step: session.step.clone(),
        });
        if let Some(diagnostic) = timeout {
            self.report(diagnostic);
        }
        SessionPhase::Active
    }

    fn on_awaiting_session_end(&mut self, signal: PhaseSignal) -> SessionPhase {
        if signal.transitioning {
            return SessionPhase::AwaitingSessionEnd;
        }

        debug!("Resetting");
        self.pending = None;
        self.recipe = RecipeSlot::Empty;
        self.session = None;
        if signal.preparing {
            SessionPhase::IdleBetween
        } else {
            SessionPhase::Idle
        }
    }

    fn on_quick_mode<H: CraftHost + ?Sized>(
        &mut self,
        host: &H,
        signal: PhaseSignal,
    ) -> SessionPhase {
        if signal.preparing {
            self.update_quick_synth(QuickSynthProgress::default());
            self.recipe = RecipeSlot::Empty;
            return SessionPhase::IdleBetween;
        }

        let progress = host.poll_quick_synth().unwrap_or_default();
        self.update_quick_synth(progress);
        SessionPhase::QuickMode
    }

    // ── helpers ──

    fn update_quick_synth(&mut self, progress: QuickSynthProgress) {
        if self.quick_synth == progress {
            return;
        }
        self.quick_synth = progress;
        debug!(
            "Quick-synth progress update: {}/{}",
            progress.current, progress.max
        );
        self.outbox.push(SessionEvent::QuickSynthProgress {
            current: progress.current,
            max: progress.max,
        });
    }

    fn commit_phase(&mut self, next: SessionPhase) {
        if next == self.phase {
            return;
        }
        debug!("Transition: {} -> {}", self.phase, next);
        self.outbox.push(SessionEvent::PhaseChanged {
            from: self.phase,
            to: next,
        });
        self.phase = next;
    }

    fn report(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.record(self.phase, diagnostic);
    }

    fn flush(&mut self) -> Vec<SessionEvent> {
        let events = std::mem::take(&mut self.outbox);
        for event in &events {
            self.notifier.dispatch(event);
        }
        events
    }
}

impl<O> std::fmt::Debug for SessionEngine<O> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionEngine")
            .field("phase", &self.phase)
            .field("recipe", &self.recipe)
            .field("session", &self.session)
            .field("pending", &self.pending)
            .field("quick_synth", &self.quick_synth)
            .finish_non_exhaustive()
    }
}
