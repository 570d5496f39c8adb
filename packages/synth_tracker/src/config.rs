use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

// =============================================================================
// Tracker config (figment-deserialized from defaults / synth.toml / env vars)
// =============================================================================
//
//   synth.toml:      [tracker]
//                    prediction_deadline_ms = 750
//
//   env var:         SYNTH_TRACKER__PREDICTION_DEADLINE_MS=750   (double underscore = nesting)

/// What to do when the tracker starts mid-session or otherwise loses track.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UnknownRecovery {
    /// Report a held session as finished and cancelled; stay silent otherwise.
    #[default]
    Cancel,
    /// Always report a single `Interrupted` event instead of a fabricated finish.
    Interrupt,
}

/// Top-level tunable configuration, deserialized by figment.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub tracker: TrackerFileConfig,
}

/// Engine tunables (lives under `[tracker]` in synth.toml).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TrackerFileConfig {
    #[serde(default = "default_prediction_deadline_ms")]
    pub prediction_deadline_ms: u64,
    #[serde(default)]
    pub unknown_recovery: UnknownRecovery,
    #[serde(default = "default_diagnostic_capacity")]
    pub diagnostic_capacity: usize,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl Default for TrackerFileConfig {
    fn default() -> Self {
        Self {
            prediction_deadline_ms: default_prediction_deadline_ms(),
            unknown_recovery: UnknownRecovery::default(),
            diagnostic_capacity: default_diagnostic_capacity(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

fn default_prediction_deadline_ms() -> u64 {
    500
}
fn default_diagnostic_capacity() -> usize {
    256
}
fn default_poll_interval_ms() -> u64 {
    50
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Figment(#[from] Box<figment::Error>),

    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },
}

/// Build a figment that layers: defaults → synth.toml → SYNTH_* env vars.
///
/// A missing file is not an error; figment simply skips the layer.
pub fn load_config(path: Option<&Path>) -> figment::Figment {
    use figment::{
        Figment,
        providers::{Env, Format, Serialized, Toml},
    };

    let file = path.unwrap_or_else(|| Path::new("synth.toml"));
    Figment::from(Serialized::defaults(FileConfig::default()))
        .merge(Toml::file(file))
        .merge(Env::prefixed("SYNTH_").split("__"))
}

/// Extract and validate the tracker section.
pub fn load_tracker_config(path: Option<&Path>) -> Result<TrackerConfig, ConfigError> {
    let file: FileConfig = load_config(path).extract().map_err(Box::new)?;
    TrackerConfig::from_file(&file.tracker)
}

// =============================================================================
// Runtime view
// =============================================================================

/// Engine configuration (runtime view).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrackerConfig {
    /// How long a prediction may disagree with the polled window before the
    /// polled values are accepted.
    pub prediction_deadline: Duration,
    pub unknown_recovery: UnknownRecovery,
    /// Ring size of the diagnostic log.
    pub diagnostic_capacity: usize,
    /// Tick period of the async driver.
    pub poll_interval: Duration,
}

impl TrackerConfig {
    pub fn from_file(fc: &TrackerFileConfig) -> Result<Self, ConfigError> {
        if fc.prediction_deadline_ms == 0 {
            return Err(ConfigError::Zero {
                field: "prediction_deadline_ms",
            });
        }
        if fc.poll_interval_ms == 0 {
            return Err(ConfigError::Zero {
                field: "poll_interval_ms",
            });
        }
        Ok(Self {
            prediction_deadline: Duration::from_millis(fc.prediction_deadline_ms),
            unknown_recovery: fc.unknown_recovery,
            diagnostic_capacity: fc.diagnostic_capacity.max(1),
            poll_interval: Duration::from_millis(fc.poll_interval_ms),
        })
    }
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            prediction_deadline: Duration::from_millis(default_prediction_deadline_ms()),
            unknown_recovery: UnknownRecovery::default(),
            diagnostic_capacity: default_diagnostic_capacity(),
            poll_interval: Duration::from_millis(default_poll_interval_ms()),
        }
    }
}
