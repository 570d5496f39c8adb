//! Non-fatal findings reported by the engine.
//!
//! Nothing the engine observes is allowed to stop it. Every inconsistency is
//! logged through `tracing` and kept in a bounded [`DiagnosticLog`] so hosts
//! and tests can inspect what went wrong after the fact.

use std::collections::VecDeque;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use synth_model::StepSnapshot;
use tracing::{error, warn};

use crate::phase::SessionPhase;

/// Field of a predicted step that can disagree with the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PredictedField {
    StepIndex,
    Progress,
    Quality,
    Durability,
    ProgressDelta,
    QualityDelta,
    DurabilityDelta,
}

impl fmt::Display for PredictedField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StepIndex => write!(f, "step index"),
            Self::Progress => write!(f, "progress"),
            Self::Quality => write!(f, "quality"),
            Self::Durability => write!(f, "durability"),
            Self::ProgressDelta => write!(f, "progress delta"),
            Self::QualityDelta => write!(f, "quality delta"),
            Self::DurabilityDelta => write!(f, "durability delta"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// Polled values never matched the prediction before its deadline; the
    /// polled values were accepted.
    #[error("unexpected status update, probably a simulator bug: had {previous}, expected {expected}, got {observed}")]
    ReconciliationTimeout {
        previous: StepSnapshot,
        expected: StepSnapshot,
        observed: StepSnapshot,
    },

    #[error("prediction error: game reported {field} {reported}, simulator predicted {predicted}")]
    OracleDivergence {
        field: PredictedField,
        predicted: i32,
        reported: i32,
    },

    #[error("prediction error: game reported completion={reported}, simulator predicted {predicted}")]
    CompletionMismatch { predicted: bool, reported: bool },

    #[error("unexpected {message} message in state {phase}")]
    UnexpectedMessage {
        message: &'static str,
        phase: SessionPhase,
    },

    #[error("structural anomaly: {detail}")]
    StructuralAnomaly { detail: String },

    #[error("lost track of the session: {reason}")]
    UnrecoverableDesync { reason: String },
}

impl Diagnostic {
    pub fn anomaly(detail: impl Into<String>) -> Self {
        Self::StructuralAnomaly {
            detail: detail.into(),
        }
    }

    pub fn desync(reason: impl Into<String>) -> Self {
        Self::UnrecoverableDesync {
            reason: reason.into(),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::ReconciliationTimeout { .. } => "reconciliation_timeout",
            Self::OracleDivergence { .. } => "oracle_divergence",
            Self::CompletionMismatch { .. } => "completion_mismatch",
            Self::UnexpectedMessage { .. } => "unexpected_message",
            Self::StructuralAnomaly { .. } => "structural_anomaly",
            Self::UnrecoverableDesync { .. } => "unrecoverable_desync",
        }
    }
}

/// A diagnostic with the moment and phase it was raised in.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiagnosticRecord {
    pub at: DateTime<Utc>,
    pub phase: SessionPhase,
    pub diagnostic: Diagnostic,
}

/// Ring buffer of recent diagnostics. Oldest entries are dropped first.
#[derive(Debug)]
pub struct DiagnosticLog {
    capacity: usize,
    entries: VecDeque<DiagnosticRecord>,
    total: u64,
}

impl DiagnosticLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: VecDeque::new(),
            total: 0,
        }
    }

    /// Log the diagnostic and keep it.
    pub fn record(&mut self, phase: SessionPhase, diagnostic: Diagnostic) {
        match &diagnostic {
            Diagnostic::UnrecoverableDesync { .. } => {
                warn!(code = diagnostic.code(), %phase, "{}", diagnostic)
            }
            _ => error!(code = diagnostic.code(), %phase, "{}", diagnostic),
        }

        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(DiagnosticRecord {
            at: Utc::now(),
            phase,
            diagnostic,
        });
        self.total += 1;
    }

    pub fn entries(&self) -> impl Iterator<Item = &DiagnosticRecord> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of diagnostics ever recorded, including evicted ones.
    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn drain(&mut self) -> Vec<DiagnosticRecord> {
        self.entries.drain(..).collect()
    }
}
