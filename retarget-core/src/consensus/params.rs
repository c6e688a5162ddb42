use crate::error::ParamsError;
use crate::types::uint256::U256;
use serde::{Deserialize, Serialize};

/// Default proof-of-work limit, compact form `0x1d00ffff`
pub const DEFAULT_POW_LIMIT_HEX: &str =
    "00000000ffffffffffffffffffffffffffffffffffffffffffffffffffffffff";

/// Default target time between blocks in seconds (10 minutes)
pub const DEFAULT_TARGET_SPACING: i64 = 10 * 60;

/// Consensus parameters shared by every retarget algorithm.
///
/// Constructed once, validated, and read-only afterwards. Derived timespans
/// are methods so they always reflect the current field values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsensusParams {
    /// Maximum allowed target (minimum difficulty)
    pub pow_limit: U256,

    /// Testnet rule: a block arriving more than two spacings after its
    /// parent may be mined at minimum difficulty
    pub allow_min_difficulty_blocks: bool,

    /// Keep the parent's target forever (LWMA only)
    pub no_retargeting: bool,

    /// Target time between blocks in seconds
    pub pow_target_spacing: i64,

    /// LWMA window length N
    pub lwma_averaging_window: i64,

    /// Number of blocks averaged by the ZCash-style algorithm
    pub zcash_averaging_window: i64,

    /// Maximum percentage the ZCash timespan may stretch (difficulty drop)
    pub zcash_max_adjust_down: i64,

    /// Maximum percentage the ZCash timespan may shrink (difficulty rise)
    pub zcash_max_adjust_up: i64,

    /// Window of the DAA variant. Carried for configuration compatibility;
    /// no algorithm reads it.
    pub daa_averaging_window: i64,
}

impl Default for ConsensusParams {
    fn default() -> Self {
        Self {
            pow_limit: U256::MAX >> 32,
            allow_min_difficulty_blocks: false,
            no_retargeting: false,
            pow_target_spacing: DEFAULT_TARGET_SPACING,
            lwma_averaging_window: 20,
            zcash_averaging_window: 11,
            zcash_max_adjust_down: 32, // 32% adjustment down
            zcash_max_adjust_up: 16,   // 16% adjustment up
            daa_averaging_window: 30,
        }
    }
}

impl ConsensusParams {
    /// Ideal duration of the ZCash averaging window
    pub fn averaging_window_timespan(&self) -> i64 {
        self.zcash_averaging_window * self.pow_target_spacing
    }

    /// Lower clamp on the dampened ZCash timespan
    pub fn min_actual_timespan(&self) -> i64 {
        (self.averaging_window_timespan() * (100 - self.zcash_max_adjust_up)) / 100
    }

    /// Upper clamp on the dampened ZCash timespan
    pub fn max_actual_timespan(&self) -> i64 {
        (self.averaging_window_timespan() * (100 + self.zcash_max_adjust_down)) / 100
    }

    /// LWMA normalizing constant `k = N * (N + 1) * T / 2`, or `None` on overflow
    pub fn lwma_weight_constant(&self) -> Option<i64> {
        let n = self.lwma_averaging_window;
        n.checked_mul(n.checked_add(1)?)?
            .checked_mul(self.pow_target_spacing)
            .map(|v| v / 2)
    }

    /// Reject configurations that would make a retarget divide by zero or
    /// produce nonsense. Called once, before any block is produced.
    pub fn validate(&self) -> Result<(), ParamsError> {
        if self.pow_limit.is_zero() {
            return Err(ParamsError::ZeroPowLimit);
        }
        if self.pow_target_spacing <= 0 {
            return Err(ParamsError::NonPositiveSpacing(self.pow_target_spacing));
        }
        for (name, value) in [
            ("lwma_averaging_window", self.lwma_averaging_window),
            ("zcash_averaging_window", self.zcash_averaging_window),
        ] {
            if value <= 0 {
                return Err(ParamsError::NonPositiveWindow { name, value });
            }
        }
        if !(0..100).contains(&self.zcash_max_adjust_up) {
            return Err(ParamsError::AdjustmentOutOfRange {
                name: "zcash_max_adjust_up",
                value: self.zcash_max_adjust_up,
                max: 100,
            });
        }
        if !(0..1000).contains(&self.zcash_max_adjust_down) {
            return Err(ParamsError::AdjustmentOutOfRange {
                name: "zcash_max_adjust_down",
                value: self.zcash_max_adjust_down,
                max: 1000,
            });
        }
        let window_timespan = self
            .zcash_averaging_window
            .checked_mul(self.pow_target_spacing);
        if self.lwma_weight_constant().is_none()
            || window_timespan.map_or(true, |t| t > i64::MAX / 1100)
        {
            return Err(ParamsError::WeightOverflow {
                window: self.lwma_averaging_window.max(self.zcash_averaging_window),
                spacing: self.pow_target_spacing,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_pow_limit_matches_reference() {
        let params = ConsensusParams::default();
        assert_eq!(params.pow_limit, U256::from_hex(DEFAULT_POW_LIMIT_HEX).unwrap());
        assert_eq!(params.pow_limit.to_compact(), 0x1d00ffff);
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_derived_timespans() {
        let params = ConsensusParams::default();
        assert_eq!(params.averaging_window_timespan(), 6600);
        assert_eq!(params.min_actual_timespan(), 5544);
        assert_eq!(params.max_actual_timespan(), 8712);
        assert_eq!(params.lwma_weight_constant(), Some(126_000));
    }

    #[test]
    fn test_derived_values_follow_field_changes() {
        let mut params = ConsensusParams::default();
        params.pow_target_spacing = 150;
        assert_eq!(params.averaging_window_timespan(), 1650);
        params.zcash_averaging_window = 17;
        assert_eq!(params.averaging_window_timespan(), 2550);
    }

    #[test]
    fn test_validate_rejects_degenerate_params() {
        let base = ConsensusParams::default();

        let params = ConsensusParams {
            pow_limit: U256::zero(),
            ..base.clone()
        };
        assert_eq!(params.validate(), Err(ParamsError::ZeroPowLimit));

        let params = ConsensusParams {
            pow_target_spacing: 0,
            ..base.clone()
        };
        assert_eq!(params.validate(), Err(ParamsError::NonPositiveSpacing(0)));

        let params = ConsensusParams {
            lwma_averaging_window: 0,
            ..base.clone()
        };
        assert!(matches!(
            params.validate(),
            Err(ParamsError::NonPositiveWindow { name: "lwma_averaging_window", .. })
        ));

        let params = ConsensusParams {
            zcash_max_adjust_up: 100,
            ..base.clone()
        };
        assert!(matches!(
            params.validate(),
            Err(ParamsError::AdjustmentOutOfRange { .. })
        ));

        let params = ConsensusParams {
            lwma_averaging_window: i64::MAX / 2,
            ..base
        };
        assert!(matches!(params.validate(), Err(ParamsError::WeightOverflow { .. })));
    }

    #[test]
    fn test_toml_like_partial_deserialization_uses_defaults() {
        let params: ConsensusParams =
            serde_json::from_str(r#"{"lwma_averaging_window": 60}"#).unwrap();
        assert_eq!(params.lwma_averaging_window, 60);
        assert_eq!(params.pow_target_spacing, DEFAULT_TARGET_SPACING);
    }
}
