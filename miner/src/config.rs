use crate::error::ConfigError;
use crate::simulation::scenario::Scenario;
use retarget_core::{ConsensusParams, RetargetAlgorithm};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Simulator configuration file
///
/// Every section is optional; missing fields take the values of the
/// reference simulation (LWMA, 10 minute spacing, one hour 1000x spike).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Retarget algorithm to play the scenario against
    pub algorithm: RetargetAlgorithm,

    /// Consensus parameters shared by all algorithms
    pub consensus: ConsensusParams,

    /// Hash-power phases
    pub scenario: Scenario,
}

impl SimConfig {
    /// Load and validate configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config = Self::from_toml(&contents)?;
        Ok(config)
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let config: SimConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a TOML file, creating parent directories
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.consensus.validate()?;
        self.scenario.validate()?;
        Ok(())
    }
}
