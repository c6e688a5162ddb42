// Retarget Core Library
// Chain model and difficulty retargeting algorithms

// Enforce panic-free code in production
#![cfg_attr(not(test), warn(clippy::unwrap_used))]
#![cfg_attr(not(test), warn(clippy::expect_used))]
#![cfg_attr(not(test), warn(clippy::panic))]
// Allow certain warnings for pragmatic reasons
#![allow(clippy::indexing_slicing)]
// Test-specific allows
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod consensus;
pub mod error;
pub mod types;

// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// Re-export commonly used types
pub use crate::consensus::{
    block_proof, get_difficulty, ConsensusParams, DifficultyAlgorithm, RetargetAlgorithm,
};
pub use crate::error::{CompactError, HexError, ParamsError, RetargetError};
pub use crate::types::{BlockHeader, BlockIndex, BlockRef, Chain, U256};
