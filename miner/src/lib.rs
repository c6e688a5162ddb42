// Retarget Miner Library
// Simulated mining against the retarget algorithms of retarget-core

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

pub mod config;
pub mod error;
pub mod simulation;

pub use config::SimConfig;
pub use error::{ConfigError, ScenarioError, SimError, SimResult};
pub use simulation::{AttackSimulator, Scenario, ScenarioPreset, SimEvent, SimulationOutcome};
