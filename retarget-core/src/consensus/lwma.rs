//! Linearly weighted moving average (LWMA) retargeting.
//!
//! Solve times of the last N blocks are weighted 1..=N, oldest first, so the
//! most recent blocks dominate. The weighted solve-time sum is multiplied by
//! the average target, normalized by `k = N * (N + 1) * T / 2`.
//!
//! Unlike the common LWMA variants there is no `6 * T` ceiling on a single
//! solve time. A long gap after an attacker's hash power leaves is allowed to
//! pull the target up immediately, so the honest miners recover in a few
//! blocks instead of a full window.

use crate::consensus::params::ConsensusParams;
use crate::types::block::{BlockHeader, BlockRef};
use crate::types::uint256::U256;
use tracing::trace;

/// Compact bits required for the block after `tip`.
///
/// Returns the proof-of-work limit when there is no tip, or when the testnet
/// minimum-difficulty rule lets `candidate` through.
pub fn next_work_required(
    tip: Option<BlockRef<'_>>,
    candidate: &BlockHeader,
    params: &ConsensusParams,
) -> u32 {
    let pow_limit = params.pow_limit.to_compact();

    let Some(tip) = tip else {
        return pow_limit;
    };

    if params.allow_min_difficulty_blocks
        && candidate.block_time() > tip.block_time() + params.pow_target_spacing * 2
    {
        trace!(height = tip.height, "min-difficulty block allowed");
        return pow_limit;
    }

    if params.no_retargeting {
        return tip.bits;
    }

    calculate_next_work_required(tip, params)
}

/// The LWMA computation proper, over the N blocks ending at `tip`.
///
/// Expects parameters that passed [`ConsensusParams::validate`].
pub fn calculate_next_work_required(tip: BlockRef<'_>, params: &ConsensusParams) -> u32 {
    let spacing = params.pow_target_spacing;
    let n = params.lwma_averaging_window;
    let k = n * (n + 1) * spacing / 2;
    let height = tip.height as i64;

    if height < n {
        trace!(height, window = n, "not enough history, using pow limit");
        return params.pow_limit.to_compact();
    }

    let mut previous_timestamp = match tip.ancestor((height - n) as u32) {
        Some(block) => block.block_time(),
        None => return params.pow_limit.to_compact(),
    };

    let mut avg_target = U256::zero();
    let mut sum_weighted_solvetimes: i64 = 0;

    for (j, h) in (height - n + 1..=height).enumerate() {
        let Some(block) = tip.ancestor(h as u32) else {
            return params.pow_limit.to_compact();
        };

        // Out-of-order timestamps count as one second, never as negative time
        let this_timestamp = if block.block_time() > previous_timestamp {
            block.block_time()
        } else {
            previous_timestamp + 1
        };
        let solvetime = this_timestamp - previous_timestamp;
        previous_timestamp = this_timestamp;

        sum_weighted_solvetimes += solvetime * (j as i64 + 1);

        let (target, negative, overflow) = U256::from_compact(block.bits);
        debug_assert!(
            !negative && !overflow,
            "block {} carries invalid bits 0x{:08x}",
            block.height,
            block.bits
        );
        avg_target += target / n as u64 / k as u64;
    }

    let mut next_target = avg_target * sum_weighted_solvetimes as u64;
    if next_target > params.pow_limit {
        trace!(height, "next target clamped to pow limit");
        next_target = params.pow_limit;
    }

    next_target.to_compact()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::block::{BlockIndex, Chain};

    const START_BITS: u32 = 0x1c0ffff0;

    fn chain_with_solvetimes(bits: u32, solvetimes: &[u32]) -> Chain {
        let mut chain = Chain::new(BlockIndex {
            height: 0,
            time: 0,
            bits,
            chain_work: U256::zero(),
        });
        let mut time = 0u32;
        for &solvetime in solvetimes {
            time += solvetime;
            chain.push(time, bits, U256::zero());
        }
        chain
    }

    fn target(bits: u32) -> U256 {
        U256::try_from_compact(bits).unwrap()
    }

    fn next_for(chain: &Chain, params: &ConsensusParams) -> u32 {
        let tip = chain.tip();
        let candidate = BlockHeader::new(tip.time + 1, 0);
        next_work_required(Some(tip), &candidate, params)
    }

    #[test]
    fn test_no_tip_returns_pow_limit() {
        let params = ConsensusParams::default();
        let candidate = BlockHeader::new(0, 0);
        assert_eq!(next_work_required(None, &candidate, &params), 0x1d00ffff);
    }

    #[test]
    fn test_bootstrap_returns_pow_limit() {
        let params = ConsensusParams::default();
        // Tip height 19 < N = 20
        let chain = chain_with_solvetimes(START_BITS, &[600; 19]);
        assert_eq!(chain.height(), 19);
        assert_eq!(next_for(&chain, &params), params.pow_limit.to_compact());

        // Tip height 20 starts retargeting
        let chain = chain_with_solvetimes(START_BITS, &[600; 20]);
        assert_ne!(next_for(&chain, &params), params.pow_limit.to_compact());
    }

    #[test]
    fn test_ideal_solvetimes_keep_target() {
        let params = ConsensusParams::default();
        let chain = chain_with_solvetimes(START_BITS, &[600; 40]);
        let next = target(next_for(&chain, &params));
        let current = target(START_BITS);
        // Truncation in avg_target costs at most one unit of the mantissa
        assert!(next <= current);
        assert!(current - next <= U256::one() << 200);
    }

    #[test]
    fn test_faster_blocks_lower_target() {
        let params = ConsensusParams::default();
        let uniform = target(next_for(&chain_with_solvetimes(START_BITS, &[600; 40]), &params));
        let fast = target(next_for(&chain_with_solvetimes(START_BITS, &[60; 40]), &params));
        let slow = target(next_for(&chain_with_solvetimes(START_BITS, &[1800; 40]), &params));
        assert!(fast < uniform);
        assert!(slow > uniform);
    }

    #[test]
    fn test_recent_blocks_weigh_more() {
        let params = ConsensusParams::default();
        let mut fast_recent = vec![600u32; 30];
        fast_recent.extend([60u32; 5]);
        let mut fast_old = vec![600u32; 15];
        fast_old.extend([60u32; 5]);
        fast_old.extend([600u32; 15]);

        let recent = target(next_for(&chain_with_solvetimes(START_BITS, &fast_recent), &params));
        let old = target(next_for(&chain_with_solvetimes(START_BITS, &fast_old), &params));
        assert!(recent < old);
    }

    #[test]
    fn test_long_solvetime_is_not_capped() {
        let params = ConsensusParams::default();
        let mut solvetimes = vec![600u32; 39];
        solvetimes.push(600 * 50);
        let chain = chain_with_solvetimes(START_BITS, &solvetimes);

        // Expected value computed by hand: 19 ideal blocks weighted 1..=19,
        // then one 30000s block with weight 20
        let n = 20u64;
        let k = 126_000u64;
        let per_block = target(START_BITS) / n / k;
        let avg = per_block * n;
        let sum_weighted: u64 = 600 * (19 * 20 / 2) + 30_000 * 20;
        let expected = (avg * sum_weighted).to_compact();

        assert_eq!(next_for(&chain, &params), expected);

        // A 6T ceiling would have produced a much smaller target
        let capped = (avg * (600u64 * (19 * 20 / 2) + 3_600 * 20)).to_compact();
        assert!(target(expected) > target(capped));
    }

    #[test]
    fn test_result_clamped_to_pow_limit() {
        let params = ConsensusParams::default();
        let chain = chain_with_solvetimes(0x1d00ffff, &[6000; 30]);
        assert_eq!(next_for(&chain, &params), 0x1d00ffff);
    }

    #[test]
    fn test_non_monotonic_timestamps_count_one_second() {
        let params = ConsensusParams::default();
        let mut chain = Chain::new(BlockIndex {
            height: 0,
            time: 100_000,
            bits: START_BITS,
            chain_work: U256::zero(),
        });
        // Every timestamp goes backwards: each solvetime becomes 1
        for i in 1..=20u32 {
            chain.push(100_000 - i, START_BITS, U256::zero());
        }
        let per_block = target(START_BITS) / 20u64 / 126_000u64;
        let expected = (per_block * 20u64 * 210u64).to_compact();
        assert_eq!(next_for(&chain, &params), expected);
    }

    #[test]
    fn test_min_difficulty_rule() {
        let params = ConsensusParams {
            allow_min_difficulty_blocks: true,
            ..ConsensusParams::default()
        };
        let chain = chain_with_solvetimes(START_BITS, &[600; 40]);
        let tip = chain.tip();

        let late = BlockHeader::new(tip.time + 1201, 0);
        assert_eq!(next_work_required(Some(tip), &late, &params), 0x1d00ffff);

        let on_time = BlockHeader::new(tip.time + 1200, 0);
        assert_ne!(next_work_required(Some(tip), &on_time, &params), 0x1d00ffff);
    }

    #[test]
    fn test_no_retargeting_keeps_tip_bits() {
        let params = ConsensusParams {
            no_retargeting: true,
            ..ConsensusParams::default()
        };
        let chain = chain_with_solvetimes(START_BITS, &[60; 40]);
        assert_eq!(next_for(&chain, &params), START_BITS);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "carries invalid bits 0x1d80ffff")]
    fn test_invalid_bits_in_window_are_fatal() {
        let params = ConsensusParams::default();
        let mut chain = chain_with_solvetimes(START_BITS, &[600; 20]);
        // Sign bit set in the mantissa
        let time = chain.tip().time + 600;
        chain.push(time, 0x1d80ffff, U256::zero());
        next_for(&chain, &params);
    }
}
