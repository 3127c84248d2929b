//! Integer fixed-point helpers for pool arithmetic.
//!
//! Every quantity the pool stores is a `u128`. Products of two quantities
//! can exceed `u128`, so intermediates are evaluated in a 256-bit unsigned
//! integer and narrowed back with an explicit overflow check. Swap pricing
//! multiplies two quantities by a `u64` fee term, which needs [`U512`]. Division
//! either truncates ([`mul_div_floor`]) or rounds up ([`mul_div_ceil`]);
//! callers pick the direction that favors the pool.

use crate::error::DexError;

#[allow(
    missing_docs,
    clippy::assign_op_pattern,
    clippy::ptr_offset_with_cast,
    clippy::manual_range_contains,
    clippy::reversed_empty_ranges,
    clippy::indexing_slicing,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic
)]
mod wide {
    use uint::construct_uint;

    construct_uint! {
        /// 256-bit unsigned integer used for intermediate products.
        pub struct U256(4);
    }

    construct_uint! {
        /// 512-bit unsigned integer for three-factor products.
        pub struct U512(8);
    }
}

pub use wide::{U256, U512};

/// Narrows a 256-bit value to `u128`.
///
/// # Errors
///
/// Returns [`DexError::ArithmeticOverflow`] if the value needs more than
/// 128 bits.
pub fn to_u128(value: U256) -> Result<u128, DexError> {
    if value.bits() > 128 {
        return Err(DexError::ArithmeticOverflow);
    }
    Ok(value.low_u128())
}

/// Narrows a 512-bit value to `u128`.
///
/// # Errors
///
/// Returns [`DexError::ArithmeticOverflow`] if the value needs more than
/// 128 bits.
pub fn wide_to_u128(value: U512) -> Result<u128, DexError> {
    if value.bits() > 128 {
        return Err(DexError::ArithmeticOverflow);
    }
    Ok(value.low_u128())
}

/// Computes `floor(a * b / denominator)` without intermediate overflow.
///
/// # Errors
///
/// - [`DexError::DivisionByZero`] if `denominator` is zero.
/// - [`DexError::ArithmeticOverflow`] if the quotient exceeds `u128`.
pub fn mul_div_floor(a: u128, b: u128, denominator: u128) -> Result<u128, DexError> {
    if denominator == 0 {
        return Err(DexError::DivisionByZero);
    }
    let product = U256::from(a) * U256::from(b);
    to_u128(product / U256::from(denominator))
}

/// Computes `ceil(a * b / denominator)` without intermediate overflow.
///
/// # Errors
///
/// - [`DexError::DivisionByZero`] if `denominator` is zero.
/// - [`DexError::ArithmeticOverflow`] if the quotient exceeds `u128`.
pub fn mul_div_ceil(a: u128, b: u128, denominator: u128) -> Result<u128, DexError> {
    if denominator == 0 {
        return Err(DexError::DivisionByZero);
    }
    let product = U256::from(a) * U256::from(b);
    let denominator = U256::from(denominator);
    let (quotient, remainder) = product.div_mod(denominator);
    let quotient = if remainder.is_zero() {
        quotient
    } else {
        quotient + U256::one()
    };
    to_u128(quotient)
}

/// Returns the largest integer whose square does not exceed `n`.
///
/// Newton iteration seeded above the root from the bit length, so the
/// sequence decreases monotonically and stops at the floor root.
#[must_use]
pub fn isqrt(n: U256) -> U256 {
    if n.is_zero() {
        return U256::zero();
    }
    let two = U256::from(2u8);
    let shift = n.bits().div_ceil(2);
    let mut x = U256::one() << shift;
    loop {
        let next = (x + n / x) / two;
        if next >= x {
            return x;
        }
        x = next;
    }
}

/// Floor square root of `a * b`, narrowed to `u128`.
///
/// The root of a product of two `u128` values always fits in `u128`.
///
/// # Errors
///
/// Returns [`DexError::ArithmeticOverflow`] only if that bound is violated.
pub fn sqrt_product(a: u128, b: u128) -> Result<u128, DexError> {
    to_u128(isqrt(U256::from(a) * U256::from(b)))
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn isqrt_small_values() {
        let cases: [(u64, u64); 10] = [
            (0, 0),
            (1, 1),
            (2, 1),
            (3, 1),
            (4, 2),
            (15, 3),
            (16, 4),
            (17, 4),
            (1000, 31),
            (999_999, 999),
        ];
        for (n, root) in cases {
            assert_eq!(isqrt(U256::from(n)), U256::from(root), "isqrt({n})");
        }
    }

    #[test]
    fn isqrt_is_floor_for_large_values() {
        let n = U256::from(u128::MAX) * U256::from(u128::MAX);
        let root = isqrt(n);
        assert_eq!(root, U256::from(u128::MAX));

        let m = n - U256::one();
        let r = isqrt(m);
        assert!(r * r <= m);
        assert!((r + U256::one()) * (r + U256::one()) > m);
    }

    #[test]
    fn sqrt_product_of_wei_amounts() {
        // 100e18 tokens * 10e18 wei exceeds u128 before the root
        let tokens = 100 * 10u128.pow(18);
        let base = 10 * 10u128.pow(18);
        let Ok(root) = sqrt_product(tokens, base) else {
            panic!("root fits in u128");
        };
        let r = U256::from(root);
        let product = U256::from(tokens) * U256::from(base);
        assert!(r * r <= product);
        assert!((r + U256::one()) * (r + U256::one()) > product);
    }

    #[test]
    fn mul_div_floor_truncates() {
        assert!(matches!(mul_div_floor(7, 3, 2), Ok(10)));
        assert!(matches!(mul_div_floor(1, 1, 3), Ok(0)));
    }

    #[test]
    fn mul_div_ceil_rounds_up_only_with_remainder() {
        assert!(matches!(mul_div_ceil(7, 3, 2), Ok(11)));
        assert!(matches!(mul_div_ceil(1, 100, 10), Ok(10)));
        assert!(matches!(mul_div_ceil(1, 1, 3), Ok(1)));
    }

    #[test]
    fn mul_div_handles_wide_intermediates() {
        let big = u128::MAX;
        assert!(matches!(mul_div_floor(big, big, big), Ok(v) if v == big));
        assert!(matches!(mul_div_ceil(big, 2, 4), Ok(v) if v == big / 2 + 1));
    }

    #[test]
    fn zero_denominator_is_an_error() {
        assert!(matches!(mul_div_floor(1, 1, 0), Err(DexError::DivisionByZero)));
        assert!(matches!(mul_div_ceil(1, 1, 0), Err(DexError::DivisionByZero)));
    }

    #[test]
    fn u512_holds_full_width_three_factor_products() {
        let product = U512::from(u128::MAX) * U512::from(u128::MAX) * U512::from(u64::MAX);
        assert!(product.bits() > 256);
        let Ok(back) = wide_to_u128(product / (U512::from(u128::MAX) * U512::from(u64::MAX)))
        else {
            panic!("quotient fits in u128");
        };
        assert_eq!(back, u128::MAX);
        assert!(matches!(
            wide_to_u128(U512::from(u128::MAX) + U512::one()),
            Err(DexError::ArithmeticOverflow)
        ));
    }

    #[test]
    fn narrowing_overflow_is_an_error() {
        assert!(matches!(
            mul_div_floor(u128::MAX, u128::MAX, 1),
            Err(DexError::ArithmeticOverflow)
        ));
    }
}
