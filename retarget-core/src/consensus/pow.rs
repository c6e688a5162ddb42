//! Proof-of-work helpers: per-block work and display difficulty.

use crate::types::uint256::U256;

/// Exponent at which a mantissa of `0xffff` reads as difficulty 1.0
const DIFFICULTY_ONE_EXPONENT: u32 = 29;

/// Expected number of hashes needed to meet `bits`, `floor(2^256 / (target + 1))`.
///
/// Negative, overflowing and zero targets contribute no work.
pub fn block_proof(bits: u32) -> U256 {
    let (target, negative, overflow) = U256::from_compact(bits);
    if negative || overflow || target.is_zero() {
        return U256::zero();
    }
    // 2^256 does not fit, so compute (2^256 - target - 1) / (target + 1) + 1
    match (!target).checked_div(target + U256::one()) {
        Some(quotient) => quotient + U256::one(),
        // target + 1 wrapped: the target is 2^256 - 1
        None => U256::one(),
    }
}

/// Human-readable difficulty of a compact target relative to `0x1d00ffff`.
///
/// A zero mantissa yields positive infinity.
pub fn get_difficulty(bits: u32) -> f64 {
    let mut shift = (bits >> 24) & 0xff;
    let mut difficulty = 0x0000ffff as f64 / (bits & 0x00ffffff) as f64;

    while shift < DIFFICULTY_ONE_EXPONENT {
        difficulty *= 256.0;
        shift += 1;
    }
    while shift > DIFFICULTY_ONE_EXPONENT {
        difficulty /= 256.0;
        shift -= 1;
    }

    difficulty
}
