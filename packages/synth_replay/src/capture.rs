//! Capture file format.
//!
//! A capture is a JSONL file. The first record is a `header` describing the
//! character and the game data the session needs; every following record is
//! either a `frame` (what the polled signals showed at that moment) or a
//! `message` (a crafting event handler message, optionally with the oracle
//! prediction recorded alongside it).
//!
//! ```text
//! {"record":"header","stats":{...},"recipes":[...],"actions":[...]}
//! {"record":"frame","at_ms":0,"signal":{"preparing":true,"active":true}}
//! {"record":"message","at_ms":400,"message":{"type":"start_info","recipe_id":35000,"starting_quality":0}}
//! ```

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde::{Deserialize, Serialize};
use synth_model::{CharacterStats, RecipeDescriptor, Simulation, Skill, StaticBreakpoints};
use synth_tracker::{CraftMessage, PhaseSignal, QuickSynthProgress, UiSnapshot};

#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("failed to read capture: {0}")]
    Io(#[from] std::io::Error),

    #[error("line {line}: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("capture has no header record")]
    MissingHeader,

    #[error("line {line}: header must be the first record")]
    MisplacedHeader { line: usize },

    #[error("line {line}: timestamp {at_ms}ms goes back from {previous_ms}ms")]
    OutOfOrder {
        line: usize,
        at_ms: u64,
        previous_ms: u64,
    },
}

pub type Result<T> = std::result::Result<T, CaptureError>;

/// Raw action id and the skill it maps to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionMapping {
    pub id: u32,
    pub skill: Skill,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CaptureHeader {
    #[serde(default)]
    pub stats: CharacterStats,
    #[serde(default)]
    pub recipes: Vec<RecipeDescriptor>,
    #[serde(default)]
    pub actions: Vec<ActionMapping>,
    #[serde(default)]
    pub breakpoints: StaticBreakpoints,
}

/// Polled signals at one instant; the replay ticks the engine once per frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub at_ms: u64,
    #[serde(default)]
    pub signal: PhaseSignal,
    #[serde(default)]
    pub ui: Option<UiSnapshot>,
    #[serde(default)]
    pub quick: Option<QuickSynthProgress>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageRecord {
    pub at_ms: u64,
    pub message: CraftMessage,
    /// What the simulator predicted for this action result, if recorded.
    #[serde(default)]
    pub prediction: Option<Simulation>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "record", rename_all = "snake_case")]
enum Record {
    Header(CaptureHeader),
    Frame(Frame),
    Message(MessageRecord),
}

#[derive(Debug, Clone, PartialEq)]
pub enum CaptureEntry {
    Frame(Frame),
    Message(MessageRecord),
}

impl CaptureEntry {
    pub fn at_ms(&self) -> u64 {
        match self {
            Self::Frame(frame) => frame.at_ms,
            Self::Message(record) => record.at_ms,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Capture {
    pub header: CaptureHeader,
    pub entries: Vec<CaptureEntry>,
}

impl Capture {
    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        Self::parse(BufReader::new(file))
    }

    /// Parse a capture. Blank lines are skipped; everything else must be a
    /// valid record in non-decreasing time order.
    pub fn parse<R: BufRead>(reader: R) -> Result<Self> {
        let mut header = None;
        let mut entries: Vec<CaptureEntry> = Vec::new();

        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            let line_num = index + 1;
            if line.trim().is_empty() {
                continue;
            }

            let record: Record = serde_json::from_str(&line).map_err(|source| {
                CaptureError::Parse {
                    line: line_num,
                    source,
                }
            })?;

            let entry = match record {
                Record::Header(h) => {
                    if header.is_some() || !entries.is_empty() {
                        return Err(CaptureError::MisplacedHeader { line: line_num });
                    }
                    header = Some(h);
                    continue;
                }
                Record::Frame(frame) => CaptureEntry::Frame(frame),
                Record::Message(message) => CaptureEntry::Message(message),
            };

            if header.is_none() {
                return Err(CaptureError::MissingHeader);
            }
            let previous_ms = entries.last().map_or(0, CaptureEntry::at_ms);
            if entry.at_ms() < previous_ms {
                return Err(CaptureError::OutOfOrder {
                    line: line_num,
                    at_ms: entry.at_ms(),
                    previous_ms,
                });
            }
            entries.push(entry);
        }

        let header = header.ok_or(CaptureError::MissingHeader)?;
        Ok(Self { header, entries })
    }

    /// Time of the last entry.
    pub fn duration_ms(&self) -> u64 {
        self.entries.last().map_or(0, CaptureEntry::at_ms)
    }
}
