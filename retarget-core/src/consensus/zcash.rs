//! ZCash-style averaging-window retargeting.
//!
//! Averages the targets of the last `zcash_averaging_window` blocks and scales
//! the average by a dampened timespan measured between median times past,
//! which makes single forged timestamps useless for time-warp attacks.

use crate::consensus::params::ConsensusParams;
use crate::types::block::{BlockHeader, BlockRef};
use crate::types::uint256::U256;
use tracing::trace;

/// Compact bits required for the block after `tip`.
pub fn next_work_required(
    tip: Option<BlockRef<'_>>,
    candidate: &BlockHeader,
    params: &ConsensusParams,
) -> u32 {
    let pow_limit = params.pow_limit.to_compact();

    // Genesis block
    let Some(tip) = tip else {
        return pow_limit;
    };

    if params.allow_min_difficulty_blocks
        && candidate.block_time() > tip.block_time() + params.pow_target_spacing * 2
    {
        trace!(height = tip.height, "min-difficulty block allowed");
        return pow_limit;
    }

    let window = params.zcash_averaging_window;

    // The window's first block sits `window` steps below the tip
    let first = match (tip.height as i64).checked_sub(window) {
        Some(height) if height >= 0 => tip.ancestor(height as u32),
        _ => None,
    };
    let Some(first) = first else {
        trace!(height = tip.height, window, "not enough history, using pow limit");
        return pow_limit;
    };

    let mut total = U256::zero();
    let mut block = Some(tip);
    for _ in 0..window {
        let Some(current) = block else {
            break;
        };
        let (target, negative, overflow) = U256::from_compact(current.bits);
        debug_assert!(
            !negative && !overflow,
            "block {} carries invalid bits 0x{:08x}",
            current.height,
            current.bits
        );
        total += target;
        block = current.prev();
    }

    let average = total / window as u64;

    calculate_next_work_required(
        average,
        tip.median_time_past(),
        first.median_time_past(),
        params,
    )
}

/// Scale `average` by the dampened, clamped timespan between two median times.
///
/// Expects parameters that passed [`ConsensusParams::validate`].
pub fn calculate_next_work_required(
    average: U256,
    last_block_time: i64,
    first_block_time: i64,
    params: &ConsensusParams,
) -> u32 {
    let ideal = params.averaging_window_timespan();
    let min_timespan = params.min_actual_timespan();
    let max_timespan = params.max_actual_timespan();

    // Only a quarter of the deviation from the ideal counts; `/` truncates
    // toward zero for negative deviations
    let mut actual = last_block_time - first_block_time;
    actual = ideal + (actual - ideal) / 4;

    if actual < min_timespan {
        actual = min_timespan;
    }
    if actual > max_timespan {
        actual = max_timespan;
    }

    let mut next_target = average / ideal as u64 * actual as u64;
    if next_target > params.pow_limit {
        trace!("next target clamped to pow limit");
        next_target = params.pow_limit;
    }

    next_target.to_compact()
}
