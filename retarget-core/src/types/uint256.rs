//! 256-bit unsigned integer for proof-of-work targets and chain work
//!
//! All arithmetic wraps modulo 2^256 exactly like the primitive unsigned
//! types do with `wrapping_*`; nothing traps on overflow. Targets travel
//! through the 32-bit compact ("nBits") encoding, see [`U256::from_compact`]
//! and [`U256::to_compact`].

use crate::error::{CompactError, HexError};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::iter::Sum;
use std::ops::{
    Add, AddAssign, Div, DivAssign, Mul, MulAssign, Not, Shl, ShlAssign, Shr, ShrAssign, Sub,
    SubAssign,
};

const WORDS: usize = 4;

/// Sign bit of the compact mantissa
const COMPACT_SIGN_BIT: u32 = 0x0080_0000;
/// Mantissa bits of the compact encoding, sign excluded
const COMPACT_MANTISSA_MASK: u32 = 0x007f_ffff;

/// 256-bit unsigned integer
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct U256([u64; WORDS]); // Little-endian u64 array

impl U256 {
    pub const ZERO: U256 = U256([0; WORDS]);
    pub const ONE: U256 = U256([1, 0, 0, 0]);
    pub const MAX: U256 = U256([u64::MAX; WORDS]);

    pub fn zero() -> Self {
        Self::ZERO
    }

    pub fn one() -> Self {
        Self::ONE
    }

    pub fn max_value() -> Self {
        Self::MAX
    }

    pub const fn from_u64(value: u64) -> Self {
        U256([value, 0, 0, 0])
    }

    /// The least significant 64 bits
    pub fn low_u64(&self) -> u64 {
        self.0[0]
    }

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|&w| w == 0)
    }

    /// Number of significant bits: position of the highest set bit plus one.
    pub fn bits(&self) -> u32 {
        for i in (0..WORDS).rev() {
            if self.0[i] != 0 {
                return 64 * i as u32 + (64 - self.0[i].leading_zeros());
            }
        }
        0
    }

    pub fn from_be_bytes(bytes: [u8; 32]) -> Self {
        let mut words = [0u64; WORDS];
        for (i, word) in words.iter_mut().enumerate() {
            let mut word_bytes = [0u8; 8];
            word_bytes.copy_from_slice(&bytes[24 - i * 8..32 - i * 8]);
            *word = u64::from_be_bytes(word_bytes);
        }
        U256(words)
    }

    pub fn to_be_bytes(&self) -> [u8; 32] {
        let mut bytes = [0u8; 32];
        for i in 0..WORDS {
            let word_bytes = self.0[WORDS - 1 - i].to_be_bytes();
            bytes[i * 8..(i + 1) * 8].copy_from_slice(&word_bytes);
        }
        bytes
    }

    /// Parse a big-endian hex string of up to 64 digits, with or without a
    /// `0x` prefix. Shorter strings are left-padded with zeros.
    pub fn from_hex(s: &str) -> Result<Self, HexError> {
        let digits = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(s);
        if digits.len() > 64 {
            return Err(HexError::TooLong(digits.len()));
        }
        let padded = format!("{:0>64}", digits);
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(&padded, &mut bytes)?;
        Ok(Self::from_be_bytes(bytes))
    }

    /// Big-endian hex string, always 64 digits, no prefix
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_be_bytes())
    }

    pub fn wrapping_add(self, rhs: Self) -> Self {
        let mut result = [0u64; WORDS];
        let mut carry = 0u64;

        for i in 0..WORDS {
            let (sum1, carry1) = self.0[i].overflowing_add(rhs.0[i]);
            let (sum2, carry2) = sum1.overflowing_add(carry);
            result[i] = sum2;
            carry = (carry1 as u64) + (carry2 as u64);
        }

        U256(result)
    }

    pub fn wrapping_sub(self, rhs: Self) -> Self {
        let mut result = [0u64; WORDS];
        let mut borrow = 0u64;

        for i in 0..WORDS {
            let (diff1, borrow1) = self.0[i].overflowing_sub(rhs.0[i]);
            let (diff2, borrow2) = diff1.overflowing_sub(borrow);
            result[i] = diff2;
            borrow = (borrow1 as u64) + (borrow2 as u64);
        }

        U256(result)
    }

    /// Schoolbook multiplication, truncated to the low 256 bits
    pub fn wrapping_mul(self, rhs: Self) -> Self {
        let mut result = [0u64; WORDS];

        for j in 0..WORDS {
            let mut carry: u128 = 0;
            for i in 0..WORDS - j {
                let n = carry
                    + result[i + j] as u128
                    + (self.0[j] as u128) * (rhs.0[i] as u128);
                result[i + j] = n as u64;
                carry = n >> 64;
            }
        }

        U256(result)
    }

    /// Quotient and remainder, or `None` for a zero divisor
    pub fn checked_div_rem(self, rhs: Self) -> Option<(Self, Self)> {
        let div_bits = rhs.bits();
        if div_bits == 0 {
            return None;
        }

        let num_bits = self.bits();
        if div_bits > num_bits {
            return Some((Self::ZERO, self));
        }

        // Shift-subtract long division, one quotient bit per step
        let mut quotient = Self::ZERO;
        let mut remainder = self;
        let mut shift = num_bits - div_bits;
        let mut divisor = rhs << shift;
        loop {
            if remainder >= divisor {
                remainder = remainder.wrapping_sub(divisor);
                quotient = quotient.set_bit(shift);
            }
            if shift == 0 {
                break;
            }
            divisor = divisor >> 1;
            shift -= 1;
        }

        Some((quotient, remainder))
    }

    pub fn checked_div(self, rhs: Self) -> Option<Self> {
        self.checked_div_rem(rhs).map(|(quotient, _)| quotient)
    }

    fn set_bit(mut self, bit: u32) -> Self {
        let word = (bit / 64) as usize;
        if word < WORDS {
            self.0[word] |= 1u64 << (bit % 64);
        }
        self
    }

    /// Decode a compact ("nBits") value.
    ///
    /// Returns `(value, negative, overflow)`. The value is always produced,
    /// truncated to 256 bits when `overflow` is set; the sign bit is never
    /// part of the value.
    pub fn from_compact(compact: u32) -> (Self, bool, bool) {
        let size = compact >> 24;
        let mut word = compact & COMPACT_MANTISSA_MASK;

        let value = if size <= 3 {
            word >>= 8 * (3 - size);
            Self::from(word)
        } else {
            Self::from(word) << (8 * (size - 3))
        };

        let negative = word != 0 && (compact & COMPACT_SIGN_BIT) != 0;
        let overflow = word != 0
            && (size > 34 || (word > 0xff && size > 33) || (word > 0xffff && size > 32));

        (value, negative, overflow)
    }

    /// Decode a compact value, rejecting negative and overflowing encodings
    pub fn try_from_compact(compact: u32) -> Result<Self, CompactError> {
        match Self::from_compact(compact) {
            (_, true, _) => Err(CompactError::Negative(compact)),
            (_, _, true) => Err(CompactError::Overflow(compact)),
            (value, false, false) => Ok(value),
        }
    }

    /// Encode as compact ("nBits"), keeping the three most significant bytes.
    pub fn to_compact(&self) -> u32 {
        let mut size = (self.bits() + 7) / 8;
        let mut compact = if size <= 3 {
            (self.low_u64() << (8 * (3 - size))) as u32
        } else {
            (*self >> (8 * (size - 3))).low_u64() as u32
        };

        // The 0x00800000 bit is the sign; move the mantissa down a byte
        // rather than let a positive value read back as negative.
        if compact & COMPACT_SIGN_BIT != 0 {
            compact >>= 8;
            size += 1;
        }

        compact | (size << 24)
    }
}

impl From<u64> for U256 {
    fn from(value: u64) -> Self {
        Self::from_u64(value)
    }
}

impl From<u32> for U256 {
    fn from(value: u32) -> Self {
        Self::from_u64(value as u64)
    }
}

impl Ord for U256 {
    fn cmp(&self, other: &Self) -> Ordering {
        // Most significant word first
        for i in (0..WORDS).rev() {
            match self.0[i].cmp(&other.0[i]) {
                Ordering::Equal => continue,
                ordering => return ordering,
            }
        }
        Ordering::Equal
    }
}

impl PartialOrd for U256 {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Add for U256 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        self.wrapping_add(rhs)
    }
}

impl AddAssign for U256 {
    fn add_assign(&mut self, rhs: Self) {
        *self = self.wrapping_add(rhs);
    }
}

impl Sub for U256 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        self.wrapping_sub(rhs)
    }
}

impl SubAssign for U256 {
    fn sub_assign(&mut self, rhs: Self) {
        *self = self.wrapping_sub(rhs);
    }
}

impl Mul for U256 {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self::Output {
        self.wrapping_mul(rhs)
    }
}

impl Mul<u64> for U256 {
    type Output = Self;

    fn mul(self, rhs: u64) -> Self::Output {
        self.wrapping_mul(U256::from(rhs))
    }
}

impl MulAssign for U256 {
    fn mul_assign(&mut self, rhs: Self) {
        *self = self.wrapping_mul(rhs);
    }
}

impl MulAssign<u64> for U256 {
    fn mul_assign(&mut self, rhs: u64) {
        *self = *self * rhs;
    }
}

/// # Panics
///
/// Panics on a zero divisor, like the primitive integer types. Use
/// [`U256::checked_div`] when the divisor is not known to be positive.
impl Div for U256 {
    type Output = Self;

    #[allow(clippy::panic)]
    fn div(self, rhs: Self) -> Self::Output {
        match self.checked_div(rhs) {
            Some(quotient) => quotient,
            None => panic!("attempt to divide U256 by zero"),
        }
    }
}

impl Div<u64> for U256 {
    type Output = Self;

    fn div(self, rhs: u64) -> Self::Output {
        self / U256::from(rhs)
    }
}

impl DivAssign for U256 {
    fn div_assign(&mut self, rhs: Self) {
        *self = *self / rhs;
    }
}

impl DivAssign<u64> for U256 {
    fn div_assign(&mut self, rhs: u64) {
        *self = *self / rhs;
    }
}

impl Not for U256 {
    type Output = Self;

    fn not(self) -> Self::Output {
        U256([!self.0[0], !self.0[1], !self.0[2], !self.0[3]])
    }
}

impl Shl<u32> for U256 {
    type Output = Self;

    fn shl(self, shift: u32) -> Self::Output {
        let mut result = [0u64; WORDS];
        let word_shift = (shift / 64) as usize;
        let bit_shift = shift % 64;

        for i in 0..WORDS {
            if i + word_shift >= WORDS {
                break;
            }
            result[i + word_shift] |= self.0[i] << bit_shift;
            if bit_shift > 0 && i + word_shift + 1 < WORDS {
                result[i + word_shift + 1] |= self.0[i] >> (64 - bit_shift);
            }
        }

        U256(result)
    }
}

impl ShlAssign<u32> for U256 {
    fn shl_assign(&mut self, shift: u32) {
        *self = *self << shift;
    }
}

impl Shr<u32> for U256 {
    type Output = Self;

    fn shr(self, shift: u32) -> Self::Output {
        let mut result = [0u64; WORDS];
        let word_shift = (shift / 64) as usize;
        let bit_shift = shift % 64;

        for i in word_shift..WORDS {
            result[i - word_shift] |= self.0[i] >> bit_shift;
            if bit_shift > 0 && i > word_shift {
                result[i - word_shift - 1] |= self.0[i] << (64 - bit_shift);
            }
        }

        U256(result)
    }
}

impl ShrAssign<u32> for U256 {
    fn shr_assign(&mut self, shift: u32) {
        *self = *self >> shift;
    }
}

impl Sum for U256 {
    fn sum<I: Iterator<Item = U256>>(iter: I) -> Self {
        iter.fold(U256::ZERO, Add::add)
    }
}

impl fmt::Display for U256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::LowerHex for U256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            f.write_str("0x")?;
        }
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for U256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "U256(0x{})", self.to_hex())
    }
}

impl Serialize for U256 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for U256 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        U256::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hex(s: &str) -> U256 {
        U256::from_hex(s).unwrap()
    }

    #[test]
    fn test_from_compact_reference_vectors() {
        let test_cases = vec![
            (
                0x1d00ffff,
                "00000000ffff0000000000000000000000000000000000000000000000000000",
            ),
            (
                0x1b0404cb,
                "00000000000404cb000000000000000000000000000000000000000000000000",
            ),
            (
                0x04123456,
                "0000000000000000000000000000000000000000000000000000000012345600",
            ),
            (
                0x03123456,
                "0000000000000000000000000000000000000000000000000000000000123456",
            ),
            (
                0x02123456,
                "0000000000000000000000000000000000000000000000000000000000001234",
            ),
        ];

        for (bits, expected_hex) in test_cases {
            let (target, negative, overflow) = U256::from_compact(bits);
            assert!(!negative && !overflow, "0x{:08x}", bits);
            assert_eq!(target, hex(expected_hex), "0x{:08x}", bits);
        }
    }

    #[test]
    fn test_compact_flags() {
        // Sign bit on a nonzero mantissa
        let (value, negative, overflow) = U256::from_compact(0x04923456);
        assert!(negative);
        assert!(!overflow);
        assert_eq!(value, U256::from(0x1234_5600u64));

        // Sign bit with a zero mantissa is not negative
        let (value, negative, _) = U256::from_compact(0x01800000);
        assert!(!negative);
        assert!(value.is_zero());

        // Exponent too large for the mantissa
        assert!(U256::from_compact(0xff123456).2);
        assert!(U256::from_compact(0x21010000).2);
        assert!(!U256::from_compact(0x20010000).2);
        assert!(!U256::from_compact(0x22000001).2);

        assert_eq!(
            U256::try_from_compact(0x04923456),
            Err(CompactError::Negative(0x04923456))
        );
        assert_eq!(
            U256::try_from_compact(0xff123456),
            Err(CompactError::Overflow(0xff123456))
        );
    }

    #[test]
    fn test_to_compact_reference_vectors() {
        assert_eq!(U256::zero().to_compact(), 0);
        assert_eq!(U256::from(0x12u64).to_compact(), 0x01120000);
        assert_eq!(U256::from(0x80u64).to_compact(), 0x02008000);
        assert_eq!(U256::from(0x1234_5600u64).to_compact(), 0x04123456);
        assert_eq!(
            hex("00000000ffffffffffffffffffffffffffffffffffffffffffffffffffffffff").to_compact(),
            0x1d00ffff
        );
        assert_eq!(
            hex("00000000000404cb000000000000000000000000000000000000000000000000").to_compact(),
            0x1b0404cb
        );
    }

    #[test]
    fn test_compact_round_trip_on_decoded_values() {
        for bits in [0x1d00ffffu32, 0x1b0404cb, 0x1c0ae493, 0x05009234, 0x02008000] {
            let (value, _, _) = U256::from_compact(bits);
            let (again, _, _) = U256::from_compact(value.to_compact());
            assert_eq!(value, again, "0x{:08x}", bits);
        }
    }

    #[test]
    fn test_wrapping_add_sub() {
        assert_eq!(U256::MAX + U256::ONE, U256::ZERO);
        assert_eq!(U256::ZERO - U256::ONE, U256::MAX);

        let a = U256::from(u64::MAX);
        assert_eq!((a + U256::ONE).bits(), 65);
        assert_eq!(a + U256::ONE - U256::ONE, a);
    }

    #[test]
    fn test_wrapping_mul() {
        let a = U256::from(u64::MAX);
        let square = a * a;
        // (2^64 - 1)^2 = 2^128 - 2^65 + 1
        let expected = (U256::ONE << 128) - (U256::ONE << 65) + U256::ONE;
        assert_eq!(square, expected);

        // Truncation to 256 bits
        assert_eq!((U256::ONE << 255) * 2u64, U256::ZERO);
        assert_eq!(U256::MAX * U256::MAX, U256::ONE);
    }

    #[test]
    fn test_division() {
        assert_eq!(U256::from(16u64) / U256::from(4u64), U256::from(4u64));
        assert_eq!(U256::from(17u64) / 4u64, U256::from(4u64));

        let dividend = hex("0000000000000000000000000000000000000000000000000000000000000042");
        assert_eq!(dividend.checked_div(U256::one()), Some(dividend));
        assert_eq!(U256::from(3u64).checked_div(U256::from(7u64)), Some(U256::ZERO));

        let (q, r) = U256::MAX.checked_div_rem(U256::from(10u64)).unwrap();
        assert_eq!(q * 10u64 + r, U256::MAX);
        assert!(r < U256::from(10u64));

        let big = U256::ONE << 200;
        assert_eq!(big / (U256::ONE << 100), U256::ONE << 100);
    }

    #[test]
    fn test_checked_div_zero_divisor() {
        let dividend = U256::from_be_bytes([0xFF; 32]);
        assert_eq!(dividend.checked_div(U256::zero()), None);
    }

    #[test]
    #[should_panic(expected = "divide U256 by zero")]
    fn test_div_trait_zero_divisor_panics() {
        let _ = U256::ONE / U256::ZERO;
    }

    #[test]
    fn test_ordering_uses_most_significant_word() {
        let high = U256::ONE << 192;
        let low = U256::from(u64::MAX);
        assert!(high > low);
        assert!(U256::MAX > high);
        assert_eq!(low.cmp(&low), Ordering::Equal);
    }

    #[test]
    fn test_shifts() {
        let one = U256::ONE;
        assert_eq!((one << 64) >> 64, one);
        assert_eq!((one << 255).bits(), 256);
        assert_eq!(one << 256, U256::ZERO);
        assert_eq!(U256::MAX >> 256, U256::ZERO);
        assert_eq!(U256::MAX >> 252, U256::from(0xfu64));
        assert_eq!(U256::from(0x1234u64) << 4, U256::from(0x12340u64));
    }

    #[test]
    fn test_not_matches_max_minus() {
        let v = hex("00000000ffff0000000000000000000000000000000000000000000000000000");
        assert_eq!(!v, U256::MAX - v);
    }

    #[test]
    fn test_hex_round_trip_and_errors() {
        let limit = "00000000ffffffffffffffffffffffffffffffffffffffffffffffffffffffff";
        assert_eq!(hex(limit).to_hex(), limit);
        assert_eq!(U256::from_hex("0x1f").unwrap(), U256::from(0x1fu64));
        assert_eq!(U256::from_hex("abc").unwrap(), U256::from(0xabcu64));
        assert!(matches!(U256::from_hex(&"f".repeat(65)), Err(HexError::TooLong(65))));
        assert!(U256::from_hex("zz").is_err());
    }

    #[test]
    fn test_hex_decode_error_reports_position() {
        // Short input is left-padded, so the bad digit lands near the end
        let err = U256::from_hex("zz").unwrap_err();
        assert_eq!(
            err,
            HexError::Decode(hex::FromHexError::InvalidHexCharacter { c: 'z', index: 62 })
        );
        assert_ne!(err, HexError::TooLong(2));
        assert_eq!(err.clone(), err);
    }

    #[test]
    fn test_serde_as_hex_string() {
        let value = U256::from(255u64);
        let json = serde_json::to_string(&value).unwrap();
        assert_eq!(
            json,
            "\"00000000000000000000000000000000000000000000000000000000000000ff\""
        );
        let back: U256 = serde_json::from_str(&json).unwrap();
        assert_eq!(back, value);
    }

    #[test]
    fn test_sum() {
        let total: U256 = (1..=4u64).map(U256::from).sum();
        assert_eq!(total, U256::from(10u64));
    }
}
