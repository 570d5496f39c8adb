//! # Capture replay
//!
//! Feeds a recorded crafting capture (see [`capture`]) through the session
//! engine offline and reports the events and diagnostics it produced. Useful
//! for reproducing desyncs reported from live sessions and for regression
//! tests of the engine against real game traffic.

pub mod capture;
pub mod host;
pub mod replay;

pub use capture::{
    ActionMapping, Capture, CaptureEntry, CaptureError, CaptureHeader, Frame, MessageRecord,
};
pub use host::{CaptureHost, RecordedOracle};
pub use replay::{
    ReplayReport, ReplaySummary, SessionOutcome, SummaryObserver, TimedEvent, replay,
};
