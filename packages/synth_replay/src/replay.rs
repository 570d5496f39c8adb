//! Drives a [`SessionEngine`] through a capture.
//!
//! Frames tick the engine, messages are handed to it at their recorded
//! time. The clock is synthetic: entry `at_ms` is added to a fixed base
//! instant, so prediction deadlines behave exactly as they did live.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use serde::Serialize;
use synth_model::{CraftDefinition, StepSnapshot};
use synth_tracker::{
    CraftMessage, DiagnosticRecord, SessionEngine, SessionEvent, SessionObserver, SessionPhase,
    TrackerConfig,
};
use tracing::{debug, info};

use crate::capture::{Capture, CaptureEntry};
use crate::host::{CaptureHost, RecordedOracle};

/// An engine event and the capture time of the frame that produced it.
#[derive(Debug, Clone, Serialize)]
pub struct TimedEvent {
    pub at_ms: u64,
    pub event: SessionEvent,
}

/// How one normal synthesis ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionOutcome {
    pub recipe_id: Option<u32>,
    pub steps: i32,
    pub progress: i32,
    pub quality: i32,
    pub completed: bool,
    pub cancelled: bool,
    pub interrupted: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReplaySummary {
    pub started: usize,
    pub advanced: usize,
    pub finished: usize,
    pub cancelled: usize,
    pub interrupted: usize,
    pub quick_synth_updates: usize,
    pub sessions: Vec<SessionOutcome>,
}

/// Builds a [`ReplaySummary`] from observer callbacks.
#[derive(Clone, Default)]
pub struct SummaryObserver {
    summary: Arc<Mutex<ReplaySummary>>,
}

impl SummaryObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> ReplaySummary {
        self.lock().clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ReplaySummary> {
        self.summary.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl SessionObserver for SummaryObserver {
    fn session_started(
        &mut self,
        _recipe_id: u32,
        _craft: &Arc<CraftDefinition>,
        _step: &StepSnapshot,
        _trial: bool,
    ) {
        self.lock().started += 1;
    }

    fn session_advanced(
        &mut self,
        _recipe_id: u32,
        _craft: &Arc<CraftDefinition>,
        _step: &StepSnapshot,
    ) {
        self.lock().advanced += 1;
    }

    fn session_finished(
        &mut self,
        recipe_id: u32,
        craft: &Arc<CraftDefinition>,
        step: &StepSnapshot,
        cancelled: bool,
    ) {
        let mut summary = self.lock();
        summary.finished += 1;
        if cancelled {
            summary.cancelled += 1;
        }
        summary.sessions.push(SessionOutcome {
            recipe_id: Some(recipe_id),
            steps: step.index,
            progress: step.progress,
            quality: step.quality,
            completed: step.progress >= craft.progress,
            cancelled,
            interrupted: false,
        });
    }

    fn session_interrupted(&mut self, recipe_id: Option<u32>, step: Option<&StepSnapshot>) {
        let mut summary = self.lock();
        summary.interrupted += 1;
        if let Some(step) = step {
            summary.sessions.push(SessionOutcome {
                recipe_id,
                steps: step.index,
                progress: step.progress,
                quality: step.quality,
                completed: false,
                cancelled: false,
                interrupted: true,
            });
        }
    }

    fn quick_synth_progress(&mut self, _current: i32, _max: i32) {
        self.lock().quick_synth_updates += 1;
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReplayReport {
    pub final_phase: SessionPhase,
    pub summary: ReplaySummary,
    pub events: Vec<TimedEvent>,
    pub diagnostics: Vec<DiagnosticRecord>,
    /// Diagnostics ever recorded, including ones evicted from the log.
    pub diagnostics_total: u64,
}

impl ReplayReport {
    pub fn phase_changes(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e.event, SessionEvent::PhaseChanged { .. }))
            .count()
    }
}

pub fn replay(capture: &Capture, config: TrackerConfig) -> ReplayReport {
    let oracle = Arc::new(RecordedOracle::new());
    let observer = SummaryObserver::new();
    let mut engine = SessionEngine::new(oracle.clone(), config);
    engine.subscribe(Box::new(observer.clone()));

    let mut host = CaptureHost::new(&capture.header);
    let base = Instant::now();
    let mut events = Vec::new();

    info!(
        "Replaying {} entries ({}ms)",
        capture.entries.len(),
        capture.duration_ms()
    );
    for entry in &capture.entries {
        let now = base + Duration::from_millis(entry.at_ms());
        match entry {
            CaptureEntry::Frame(frame) => {
                host.apply(frame);
                let produced = engine.tick_at(&host, now);
                events.extend(produced.into_iter().map(|event| TimedEvent {
                    at_ms: frame.at_ms,
                    event,
                }));
            }
            CaptureEntry::Message(record) => {
                debug!("[{}ms] {}", record.at_ms, record.message.name());
                if matches!(record.message, CraftMessage::AdvanceAction(_)) {
                    oracle.clear();
                    if let Some(prediction) = &record.prediction {
                        oracle.push(prediction.clone());
                    }
                }
                engine.handle_message_at(&record.message, &host, now);
            }
        }
    }

    let diagnostics_total = engine.diagnostics().total();
    let report = ReplayReport {
        final_phase: engine.phase(),
        summary: observer.snapshot(),
        events,
        diagnostics: engine.drain_diagnostics(),
        diagnostics_total,
    };
    info!(
        phase = %report.final_phase,
        sessions = report.summary.sessions.len(),
        diagnostics = report.diagnostics_total,
        "Replay finished"
    );
    report
}
