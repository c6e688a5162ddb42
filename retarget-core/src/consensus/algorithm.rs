//! Retarget algorithm selection.
//!
//! Every algorithm is a pure function of the chain history and the consensus
//! parameters; [`DifficultyAlgorithm`] is the seam the simulator drives, and
//! [`RetargetAlgorithm`] is the configuration-facing choice between them.

use crate::consensus::params::ConsensusParams;
use crate::consensus::{lwma, zcash};
use crate::error::RetargetError;
use crate::types::block::{BlockHeader, BlockRef};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A difficulty retargeting rule
pub trait DifficultyAlgorithm {
    /// Short lowercase identifier used in configuration and reports
    fn name(&self) -> &'static str;

    /// Compact bits the block following `tip` must satisfy
    fn next_work_required(
        &self,
        tip: Option<BlockRef<'_>>,
        candidate: &BlockHeader,
        params: &ConsensusParams,
    ) -> u32;
}

/// Linearly weighted moving average over `lwma_averaging_window` blocks
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Lwma;

impl DifficultyAlgorithm for Lwma {
    fn name(&self) -> &'static str {
        "lwma"
    }

    fn next_work_required(
        &self,
        tip: Option<BlockRef<'_>>,
        candidate: &BlockHeader,
        params: &ConsensusParams,
    ) -> u32 {
        lwma::next_work_required(tip, candidate, params)
    }
}

/// ZCash-style averaging window with median-time-past timespans
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ZcashAveragingWindow;

impl DifficultyAlgorithm for ZcashAveragingWindow {
    fn name(&self) -> &'static str {
        "zcash"
    }

    fn next_work_required(
        &self,
        tip: Option<BlockRef<'_>>,
        candidate: &BlockHeader,
        params: &ConsensusParams,
    ) -> u32 {
        zcash::next_work_required(tip, candidate, params)
    }
}

/// Algorithm chosen by configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RetargetAlgorithm {
    #[default]
    Lwma,
    Zcash,
}

impl RetargetAlgorithm {
    /// Every available algorithm, in report order
    pub fn all() -> [RetargetAlgorithm; 2] {
        [RetargetAlgorithm::Lwma, RetargetAlgorithm::Zcash]
    }
}

impl DifficultyAlgorithm for RetargetAlgorithm {
    fn name(&self) -> &'static str {
        match self {
            RetargetAlgorithm::Lwma => Lwma.name(),
            RetargetAlgorithm::Zcash => ZcashAveragingWindow.name(),
        }
    }

    fn next_work_required(
        &self,
        tip: Option<BlockRef<'_>>,
        candidate: &BlockHeader,
        params: &ConsensusParams,
    ) -> u32 {
        match self {
            RetargetAlgorithm::Lwma => Lwma.next_work_required(tip, candidate, params),
            RetargetAlgorithm::Zcash => {
                ZcashAveragingWindow.next_work_required(tip, candidate, params)
            }
        }
    }
}

impl fmt::Display for RetargetAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for RetargetAlgorithm {
    type Err = RetargetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "lwma" => Ok(RetargetAlgorithm::Lwma),
            "zcash" | "zcash-daa" => Ok(RetargetAlgorithm::Zcash),
            _ => Err(RetargetError::UnknownAlgorithm(s.to_string())),
        }
    }
}
