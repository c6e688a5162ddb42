//! Error types for the retarget core.
//!
//! The model never ingests untrusted input, so the taxonomy is narrow:
//! compact-encoding failures, degenerate consensus parameters, and
//! malformed textual input (hex targets, algorithm names).

use thiserror::Error;

/// Main error type for the retarget core
#[derive(Debug, Error)]
pub enum RetargetError {
    /// Compact ("nBits") decoding errors
    #[error("Compact encoding error: {0}")]
    Compact(#[from] CompactError),

    /// Consensus parameter errors
    #[error("Consensus parameter error: {0}")]
    Params(#[from] ParamsError),

    /// Hex parsing errors for 256-bit values
    #[error("Invalid 256-bit hex value: {0}")]
    Hex(#[from] HexError),

    /// Unknown algorithm name
    #[error("Unknown retarget algorithm: {0}")]
    UnknownAlgorithm(String),
}

/// Failures of the compact target encoding.
///
/// A self-produced value failing to decode means an internal invariant was
/// broken; callers treat it as fatal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CompactError {
    #[error("compact bits 0x{0:08x} encode a negative target")]
    Negative(u32),

    #[error("compact bits 0x{0:08x} overflow 256 bits")]
    Overflow(u32),
}

/// Degenerate consensus configuration, rejected before any block is produced.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParamsError {
    #[error("proof-of-work limit must be nonzero")]
    ZeroPowLimit,

    #[error("target block spacing must be positive, got {0}")]
    NonPositiveSpacing(i64),

    #[error("{name} must be positive, got {value}")]
    NonPositiveWindow { name: &'static str, value: i64 },

    #[error("{name} must be within 0..{max}, got {value}")]
    AdjustmentOutOfRange {
        name: &'static str,
        value: i64,
        max: i64,
    },

    #[error("averaging window {window} with spacing {spacing} overflows 64-bit arithmetic")]
    WeightOverflow { window: i64, spacing: i64 },
}

/// Malformed textual 256-bit values
#[derive(Debug, Clone, PartialEq, Error)]
pub enum HexError {
    #[error("expected at most 64 hex digits, got {0}")]
    TooLong(usize),

    #[error("{0}")]
    Decode(#[from] hex::FromHexError),
}
