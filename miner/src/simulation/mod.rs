/// Attack simulation
///
/// Drives a retarget algorithm through phases of simulated hash power and
/// reports how many blocks an attacker gains.
pub mod driver;
pub mod report;
pub mod scenario;

pub use driver::{compare, AttackSimulator};
pub use report::{
    format_time, format_time_delta, AttackSummary, BlockReport, SimEvent, SimulationOutcome,
};
pub use scenario::{Phase, PhaseConfig, Scenario, ScenarioPreset};
