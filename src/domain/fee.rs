//! Swap fee rate.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::DexError;

/// Fraction of a swap input that is converted, as `numerator / denominator`.
///
/// `997 / 1000` keeps 0.3% of every input in the pool. The rate is fixed
/// when the pool is constructed; liquidity deposits and withdrawals are
/// fee-free.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeRate {
    numerator: u64,
    denominator: u64,
}

impl FeeRate {
    /// The 0.3% rate used by the reference deployment.
    pub const DEFAULT: Self = Self {
        numerator: 997,
        denominator: 1000,
    };

    /// Creates a fee rate.
    ///
    /// # Errors
    ///
    /// Returns [`DexError::InvalidConfiguration`] if the denominator or
    /// numerator is zero, or if the numerator exceeds the denominator.
    pub fn new(numerator: u64, denominator: u64) -> Result<Self, DexError> {
        if denominator == 0 {
            return Err(DexError::InvalidConfiguration(
                "fee denominator must be positive".to_string(),
            ));
        }
        if numerator == 0 || numerator > denominator {
            return Err(DexError::InvalidConfiguration(format!(
                "fee numerator must be in 1..={denominator}, got {numerator}"
            )));
        }
        Ok(Self {
            numerator,
            denominator,
        })
    }

    /// Portion of the input that is priced.
    #[must_use]
    pub const fn numerator(&self) -> u64 {
        self.numerator
    }

    /// Scale of the rate.
    #[must_use]
    pub const fn denominator(&self) -> u64 {
        self.denominator
    }

    /// Retained fee in basis points, rounded down (30 for 997/1000).
    #[must_use]
    pub fn fee_bps(&self) -> u64 {
        let retained = self.denominator - self.numerator;
        retained.saturating_mul(10_000) / self.denominator
    }
}

impl Default for FeeRate {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for FeeRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}
