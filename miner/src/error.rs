use crate::simulation::scenario::Phase;
use retarget_core::{CompactError, ParamsError};
use thiserror::Error;

/// Main error type for the simulator
#[derive(Debug, Error)]
pub enum SimError {
    #[error("Scenario error: {0}")]
    Scenario(#[from] ScenarioError),

    #[error("Consensus parameter error: {0}")]
    Params(#[from] ParamsError),
}

/// Result type alias for simulator operations
pub type SimResult<T> = Result<T, SimError>;

/// A scenario that cannot be played
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScenarioError {
    #[error("{phase} hash rate must be positive and finite, got {value} MH/s")]
    InvalidHashRate { phase: Phase, value: f64 },

    #[error("total scenario duration must be positive")]
    ZeroDuration,

    #[error("scenario ends at {0}s, beyond the 32-bit timestamp range")]
    DurationOverflow(u64),

    #[error("genesis bits are not a usable target: {0}")]
    InvalidGenesisBits(#[from] CompactError),

    #[error("genesis bits 0x{0:08x} decode to a zero target")]
    ZeroGenesisTarget(u32),

    #[error("unknown scenario preset: {0}")]
    UnknownPreset(String),
}

/// Configuration file errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid consensus parameters: {0}")]
    Params(#[from] ParamsError),

    #[error("Invalid scenario: {0}")]
    Scenario(#[from] ScenarioError),
}
