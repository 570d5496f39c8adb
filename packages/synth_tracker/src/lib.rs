//! # Synthesis session tracker
//!
//! Turns the game's two unreliable views of a craft into one clean stream of
//! session events:
//!
//! - a polled view ([`CraftHost`]): phase flags plus whatever the synthesis
//!   and quick synthesis windows show right now;
//! - a pushed view ([`CraftMessage`]): the crafting event handler's
//!   messages, including authoritative action results.
//!
//! [`SessionEngine`] owns all session state. Call [`SessionEngine::tick`]
//! once per frame and [`SessionEngine::handle_message`] whenever a message
//! arrives, from the same thread; or hand both feeds to
//! [`spawn_session_driver`] and read events off a channel.
//!
//! Within one session observers see exactly one `Started`, any number of
//! `Advanced` and exactly one `Finished`, in that order. Inconsistencies
//! never stop the engine; they end up in its [`DiagnosticLog`].

pub mod config;
pub mod diagnostic;
pub mod driver;
pub mod engine;
pub mod message;
pub mod notify;
pub mod phase;
pub mod signal;
pub mod validator;

pub use config::{
    ConfigError, FileConfig, TrackerConfig, TrackerFileConfig, UnknownRecovery, load_config,
    load_tracker_config,
};
pub use diagnostic::{Diagnostic, DiagnosticLog, DiagnosticRecord, PredictedField};
pub use driver::spawn_session_driver;
pub use engine::{ActiveSession, PendingPrediction, RecipeSlot, SessionEngine};
pub use message::{AdvanceKind, AdvanceStep, CraftMessage, StepFlags};
pub use notify::{Notifier, SessionEvent, SessionObserver};
pub use phase::SessionPhase;
pub use signal::{CraftHost, PhaseSignal, QuickSynthProgress, UiSnapshot};
pub use validator::{Validation, validate_advance};
