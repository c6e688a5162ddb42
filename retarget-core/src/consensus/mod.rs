/// Difficulty retargeting for the simulated chain
///
/// Provides the consensus parameters, proof-of-work helpers and the
/// competing retarget algorithms.
pub mod algorithm;
pub mod lwma;
pub mod params;
pub mod pow;
pub mod zcash;

// Re-export key types
pub use algorithm::{DifficultyAlgorithm, Lwma, RetargetAlgorithm, ZcashAveragingWindow};
pub use params::{ConsensusParams, DEFAULT_POW_LIMIT_HEX, DEFAULT_TARGET_SPACING};
pub use pow::{block_proof, get_difficulty};
