//! Attack scenarios
//!
//! A scenario is three consecutive phases of constant hash power. Phase
//! boundaries are measured in simulated seconds from the genesis timestamp.

use crate::error::ScenarioError;
use retarget_core::U256;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const MINUTE: u32 = 60;
const HOUR: u32 = 60 * MINUTE;
const DAY: u32 = 24 * HOUR;

/// Honest network hash rate used by every preset, in MH/s
pub const HONEST_HASH_RATE: f64 = 7_000.0;

/// Attacker multiplier used by the spike presets
pub const SPIKE_MULTIPLIER: f64 = 1_000.0;

/// Genesis target, the easiest allowed by the default pow limit
pub const DEFAULT_GENESIS_BITS: u32 = 0x1d00ffff;

/// Stage of an attack scenario
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    PreAttack,
    Attack,
    PostAttack,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::PreAttack => "pre-attack",
            Phase::Attack => "attack",
            Phase::PostAttack => "post-attack",
        };
        f.write_str(name)
    }
}

/// Hash power and length of one phase
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhaseConfig {
    /// Simulated hash rate in mega-hashes per second
    pub mega_hashes_per_sec: f64,

    /// Phase length in seconds
    pub duration_secs: u32,
}

impl PhaseConfig {
    pub fn new(mega_hashes_per_sec: f64, duration_secs: u32) -> Self {
        Self {
            mega_hashes_per_sec,
            duration_secs,
        }
    }
}

/// Complete description of one simulated run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Scenario {
    /// Compact target of the genesis block
    pub genesis_bits: u32,

    /// Timestamp of the genesis block
    pub genesis_time: u32,

    pub pre_attack: PhaseConfig,
    pub attack: PhaseConfig,
    pub post_attack: PhaseConfig,
}

impl Default for Scenario {
    fn default() -> Self {
        ScenarioPreset::default().scenario()
    }
}

impl Scenario {
    /// Scenario starting from the default genesis block at time 0
    pub fn new(pre_attack: PhaseConfig, attack: PhaseConfig, post_attack: PhaseConfig) -> Self {
        Self {
            genesis_bits: DEFAULT_GENESIS_BITS,
            genesis_time: 0,
            pre_attack,
            attack,
            post_attack,
        }
    }

    pub fn phase(&self, phase: Phase) -> &PhaseConfig {
        match phase {
            Phase::PreAttack => &self.pre_attack,
            Phase::Attack => &self.attack,
            Phase::PostAttack => &self.post_attack,
        }
    }

    /// Timestamp at which the attacker starts mining
    pub fn attack_start(&self) -> u64 {
        self.genesis_time as u64 + self.pre_attack.duration_secs as u64
    }

    /// Timestamp at which the attacker leaves
    pub fn attack_end(&self) -> u64 {
        self.attack_start() + self.attack.duration_secs as u64
    }

    /// Timestamp at which the run stops producing blocks
    pub fn end_time(&self) -> u64 {
        self.attack_end() + self.post_attack.duration_secs as u64
    }

    pub fn total_duration(&self) -> u64 {
        self.end_time() - self.genesis_time as u64
    }

    pub fn validate(&self) -> Result<(), ScenarioError> {
        for phase in [Phase::PreAttack, Phase::Attack, Phase::PostAttack] {
            let value = self.phase(phase).mega_hashes_per_sec;
            if !value.is_finite() || value <= 0.0 {
                return Err(ScenarioError::InvalidHashRate { phase, value });
            }
        }

        if self.total_duration() == 0 {
            return Err(ScenarioError::ZeroDuration);
        }
        // Block times are u32 and must be able to pass the end of the run
        if self.end_time() >= u32::MAX as u64 {
            return Err(ScenarioError::DurationOverflow(self.end_time()));
        }

        let target = U256::try_from_compact(self.genesis_bits)?;
        if target.is_zero() {
            return Err(ScenarioError::ZeroGenesisTarget(self.genesis_bits));
        }

        Ok(())
    }
}

/// Named scenarios
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScenarioPreset {
    /// Constant honest hash rate; a sanity check
    NoAttack,
    /// 1000x spike for 5 minutes, then a week of honest mining
    #[serde(rename = "spike-5m")]
    Spike5m,
    /// 1000x spike for an hour, then two weeks of honest mining
    #[default]
    #[serde(rename = "spike-1h")]
    Spike1h,
    /// 1000x spike for a day, then two weeks of honest mining
    #[serde(rename = "spike-24h")]
    Spike24h,
}

impl ScenarioPreset {
    pub fn all() -> [ScenarioPreset; 4] {
        [
            ScenarioPreset::NoAttack,
            ScenarioPreset::Spike5m,
            ScenarioPreset::Spike1h,
            ScenarioPreset::Spike24h,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            ScenarioPreset::NoAttack => "no-attack",
            ScenarioPreset::Spike5m => "spike-5m",
            ScenarioPreset::Spike1h => "spike-1h",
            ScenarioPreset::Spike24h => "spike-24h",
        }
    }

    pub fn scenario(&self) -> Scenario {
        let honest = HONEST_HASH_RATE;
        let attacker = HONEST_HASH_RATE * SPIKE_MULTIPLIER;
        let warmup = PhaseConfig::new(honest, DAY);

        match self {
            ScenarioPreset::NoAttack => Scenario::new(
                warmup,
                PhaseConfig::new(honest, 12 * HOUR),
                PhaseConfig::new(honest, HOUR),
            ),
            ScenarioPreset::Spike5m => Scenario::new(
                warmup,
                PhaseConfig::new(attacker, 5 * MINUTE),
                PhaseConfig::new(honest, 7 * DAY),
            ),
            ScenarioPreset::Spike1h => Scenario::new(
                warmup,
                PhaseConfig::new(attacker, HOUR),
                PhaseConfig::new(honest, 14 * DAY),
            ),
            ScenarioPreset::Spike24h => Scenario::new(
                warmup,
                PhaseConfig::new(attacker, DAY),
                PhaseConfig::new(honest, 14 * DAY),
            ),
        }
    }
}

impl fmt::Display for ScenarioPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ScenarioPreset {
    type Err = ScenarioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .into_iter()
            .find(|preset| preset.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| ScenarioError::UnknownPreset(s.to_string()))
    }
}
