//! Constant-product pool state and its state transitions.
//!
//! [`PoolState`] owns the two reserves, the share supply and the share
//! ledger. Every operation is split in two:
//!
//! 1. **Plan** — a `&self` method validates preconditions and computes the
//!    full outcome with checked arithmetic. It never mutates.
//! 2. **Apply** — a `&mut self` method assigns the planned post-state. It
//!    cannot fail, so a plan that validated always commits in full.
//!
//! # Pricing
//!
//! ```text
//! amount_out = floor(reserve_out · fee_num · amount_in
//!                    / (reserve_in · fee_den + fee_num · amount_in))
//! ```
//!
//! which keeps `(reserve_in + amount_in · fee) · (reserve_out − amount_out)`
//! at or above `reserve_in · reserve_out`.
//!
//! # Rounding
//!
//! Swap outputs, minted shares and withdrawal payouts are floored; the
//! token contribution of a deposit is ceiled. Every truncation favors the
//! pool.

use serde::{Deserialize, Serialize};

use super::amount::as_string;
use super::math::{U256, U512, mul_div_ceil, mul_div_floor, sqrt_product, wide_to_u128};
use super::{Address, FeeRate, ShareLedger};
use crate::error::DexError;

/// Which asset the caller sends in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwapDirection {
    /// Base asset (ETH) in, token (0KAGE) out.
    BaseForToken,
    /// Token (0KAGE) in, base asset (ETH) out.
    TokenForBase,
}

impl SwapDirection {
    /// Returns the direction as a static string slice.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::BaseForToken => "base_for_token",
            Self::TokenForBase => "token_for_base",
        }
    }
}

/// Outcome of a validated `initialize`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitializePlan {
    /// Token units pulled from the caller.
    pub token_in: u128,
    /// Base units attached by the caller.
    pub base_in: u128,
    /// `floor(sqrt(token_in · base_in))`.
    pub shares_minted: u128,
}

/// Outcome of a validated swap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapPlan {
    /// Direction of the trade.
    pub direction: SwapDirection,
    /// Units of the input asset pulled from the caller.
    pub amount_in: u128,
    /// Units of the output asset paid to the caller.
    pub amount_out: u128,
    /// Base reserve after the swap.
    pub reserve_base_after: u128,
    /// Token reserve after the swap.
    pub reserve_token_after: u128,
}

/// Outcome of a validated proportional deposit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepositPlan {
    /// Base units attached by the caller.
    pub base_in: u128,
    /// Token units required, rounded up.
    pub token_in: u128,
    /// Shares minted, rounded down.
    pub shares_minted: u128,
    /// Base reserve after the deposit.
    pub reserve_base_after: u128,
    /// Token reserve after the deposit.
    pub reserve_token_after: u128,
    /// Share supply after the deposit.
    pub total_shares_after: u128,
}

/// Outcome of a validated withdrawal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WithdrawPlan {
    /// Shares burned.
    pub shares_redeemed: u128,
    /// Base units paid out, rounded down.
    pub base_out: u128,
    /// Token units paid out, rounded down.
    pub token_out: u128,
}

/// Reserves, share supply and share ledger of the pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolState {
    #[serde(with = "as_string")]
    reserve_base: u128,
    #[serde(with = "as_string")]
    reserve_token: u128,
    #[serde(with = "as_string")]
    total_shares: u128,
    fee: FeeRate,
    initialized: bool,
    shares: ShareLedger,
}

impl PoolState {
    /// Creates an empty, uninitialized pool with a fixed fee rate.
    #[must_use]
    pub fn new(fee: FeeRate) -> Self {
        Self {
            reserve_base: 0,
            reserve_token: 0,
            total_shares: 0,
            fee,
            initialized: false,
            shares: ShareLedger::new(),
        }
    }

    /// Base-asset units held by the pool.
    #[must_use]
    pub const fn reserve_base(&self) -> u128 {
        self.reserve_base
    }

    /// Token units held by the pool.
    #[must_use]
    pub const fn reserve_token(&self) -> u128 {
        self.reserve_token
    }

    /// Outstanding liquidity shares.
    #[must_use]
    pub const fn total_shares(&self) -> u128 {
        self.total_shares
    }

    /// Fee rate fixed at construction.
    #[must_use]
    pub const fn fee(&self) -> FeeRate {
        self.fee
    }

    /// `true` once the first deposit has happened; never reverts.
    #[must_use]
    pub const fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Shares owned by `owner`.
    #[must_use]
    pub fn shares_of(&self, owner: &Address) -> u128 {
        self.shares.shares_of(owner)
    }

    /// The share ledger.
    #[must_use]
    pub const fn share_ledger(&self) -> &ShareLedger {
        &self.shares
    }

    /// `reserve_base · reserve_token` in 256 bits.
    #[must_use]
    pub fn product(&self) -> U256 {
        U256::from(self.reserve_base) * U256::from(self.reserve_token)
    }

    /// `true` when the pool is initialized and still holds liquidity.
    #[must_use]
    pub const fn has_liquidity(&self) -> bool {
        self.initialized && self.total_shares > 0 && self.reserve_base > 0 && self.reserve_token > 0
    }

    // ── initialize ─────────────────────────────────────────────────────

    /// Validates the first deposit.
    ///
    /// # Errors
    ///
    /// - [`DexError::AlreadyInitialized`] if the pool was initialized before,
    ///   even if it has since been drained.
    /// - [`DexError::ZeroAmount`] if either amount is zero.
    pub fn plan_initialize(
        &self,
        token_amount: u128,
        base_amount: u128,
    ) -> Result<InitializePlan, DexError> {
        if self.initialized {
            return Err(DexError::AlreadyInitialized);
        }
        if token_amount == 0 || base_amount == 0 {
            return Err(DexError::ZeroAmount);
        }
        let shares_minted = sqrt_product(token_amount, base_amount)?;
        Ok(InitializePlan {
            token_in: token_amount,
            base_in: base_amount,
            shares_minted,
        })
    }

    /// Commits a plan from [`Self::plan_initialize`].
    pub fn apply_initialize(&mut self, owner: Address, plan: &InitializePlan) {
        self.reserve_token = plan.token_in;
        self.reserve_base = plan.base_in;
        self.total_shares = plan.shares_minted;
        self.shares = ShareLedger::new();
        let credited = self.shares.credit(owner, plan.shares_minted);
        debug_assert!(credited.is_ok(), "fresh share ledger rejected the initial mint");
        self.initialized = true;
    }

    // ── swaps ──────────────────────────────────────────────────────────

    /// Prices a swap against the current reserves.
    ///
    /// # Errors
    ///
    /// - [`DexError::PoolNotInitialized`] if the pool was never initialized
    ///   or has been fully drained.
    /// - [`DexError::ZeroAmount`] if `amount_in` is zero or prices to a zero
    ///   output.
    /// - [`DexError::InsufficientOutputReserve`] if the output would empty
    ///   the output reserve.
    /// - [`DexError::ArithmeticOverflow`] if the input reserve would exceed
    ///   `u128`.
    pub fn plan_swap(
        &self,
        direction: SwapDirection,
        amount_in: u128,
    ) -> Result<SwapPlan, DexError> {
        if !self.has_liquidity() {
            return Err(DexError::PoolNotInitialized);
        }
        if amount_in == 0 {
            return Err(DexError::ZeroAmount);
        }

        let (reserve_in, reserve_out) = match direction {
            SwapDirection::BaseForToken => (self.reserve_base, self.reserve_token),
            SwapDirection::TokenForBase => (self.reserve_token, self.reserve_base),
        };

        let amount_out = constant_product_out(amount_in, reserve_in, reserve_out, self.fee)?;
        if amount_out >= reserve_out {
            return Err(DexError::InsufficientOutputReserve);
        }
        if amount_out == 0 {
            return Err(DexError::ZeroAmount);
        }

        let new_in = reserve_in
            .checked_add(amount_in)
            .ok_or(DexError::ArithmeticOverflow)?;
        let new_out = reserve_out - amount_out;

        let (reserve_base_after, reserve_token_after) = match direction {
            SwapDirection::BaseForToken => (new_in, new_out),
            SwapDirection::TokenForBase => (new_out, new_in),
        };

        Ok(SwapPlan {
            direction,
            amount_in,
            amount_out,
            reserve_base_after,
            reserve_token_after,
        })
    }

    /// Commits a plan from [`Self::plan_swap`].
    pub fn apply_swap(&mut self, plan: &SwapPlan) {
        self.reserve_base = plan.reserve_base_after;
        self.reserve_token = plan.reserve_token_after;
    }

    // ── liquidity ──────────────────────────────────────────────────────

    /// Computes a proportional deposit for `base_amount` of base asset.
    ///
    /// # Errors
    ///
    /// - [`DexError::PoolNotInitialized`] if the pool has no liquidity.
    /// - [`DexError::ZeroAmount`] if `base_amount` is zero or would mint
    ///   zero shares.
    /// - [`DexError::ArithmeticOverflow`] if a reserve or the share supply
    ///   would exceed `u128`.
    pub fn plan_deposit(&self, base_amount: u128) -> Result<DepositPlan, DexError> {
        if !self.has_liquidity() {
            return Err(DexError::PoolNotInitialized);
        }
        if base_amount == 0 {
            return Err(DexError::ZeroAmount);
        }

        let token_in = mul_div_ceil(base_amount, self.reserve_token, self.reserve_base)?;
        let shares_minted = mul_div_floor(base_amount, self.total_shares, self.reserve_base)?;
        if shares_minted == 0 {
            return Err(DexError::ZeroAmount);
        }

        let reserve_base_after = self
            .reserve_base
            .checked_add(base_amount)
            .ok_or(DexError::ArithmeticOverflow)?;
        let reserve_token_after = self
            .reserve_token
            .checked_add(token_in)
            .ok_or(DexError::ArithmeticOverflow)?;
        let total_shares_after = self
            .total_shares
            .checked_add(shares_minted)
            .ok_or(DexError::ArithmeticOverflow)?;

        Ok(DepositPlan {
            base_in: base_amount,
            token_in,
            shares_minted,
            reserve_base_after,
            reserve_token_after,
            total_shares_after,
        })
    }

    /// Commits a plan from [`Self::plan_deposit`].
    pub fn apply_deposit(&mut self, owner: Address, plan: &DepositPlan) {
        self.reserve_base = plan.reserve_base_after;
        self.reserve_token = plan.reserve_token_after;
        self.total_shares = plan.total_shares_after;
        // owner balance <= old total, and old total + minted fits in u128
        let credited = self.shares.credit(owner, plan.shares_minted);
        debug_assert!(credited.is_ok(), "deposit plan minted past the share ledger");
    }

    /// Computes the payout for redeeming `shares` owned by `owner`.
    ///
    /// # Errors
    ///
    /// - [`DexError::PoolNotInitialized`] if the pool was never initialized.
    /// - [`DexError::ZeroAmount`] if `shares` is zero.
    /// - [`DexError::InsufficientShares`] if `owner` holds fewer shares.
    pub fn plan_withdraw(&self, owner: &Address, shares: u128) -> Result<WithdrawPlan, DexError> {
        if !self.initialized {
            return Err(DexError::PoolNotInitialized);
        }
        if shares == 0 {
            return Err(DexError::ZeroAmount);
        }
        let owned = self.shares.shares_of(owner);
        if shares > owned {
            return Err(DexError::InsufficientShares {
                requested: shares,
                available: owned,
            });
        }

        let base_out = mul_div_floor(self.reserve_base, shares, self.total_shares)?;
        let token_out = mul_div_floor(self.reserve_token, shares, self.total_shares)?;

        Ok(WithdrawPlan {
            shares_redeemed: shares,
            base_out,
            token_out,
        })
    }

    /// Commits a plan from [`Self::plan_withdraw`].
    pub fn apply_withdraw(&mut self, owner: &Address, plan: &WithdrawPlan) {
        self.reserve_base -= plan.base_out;
        self.reserve_token -= plan.token_out;
        self.total_shares -= plan.shares_redeemed;
        let debited = self.shares.debit(owner, plan.shares_redeemed);
        debug_assert!(debited.is_ok(), "withdraw plan redeemed unowned shares");
    }

    // ── invariants ─────────────────────────────────────────────────────

    /// Verifies the bookkeeping invariants.
    ///
    /// - uninitialized ⇒ no reserves, no shares;
    /// - shares outstanding ⇒ both reserves positive;
    /// - no shares outstanding ⇒ both reserves empty;
    /// - the ledger sums to `total_shares`.
    ///
    /// # Errors
    ///
    /// Returns [`DexError::Internal`] describing the first violation found.
    pub fn check_invariants(&self) -> Result<(), DexError> {
        if !self.initialized
            && (self.total_shares != 0
                || self.reserve_base != 0
                || self.reserve_token != 0
                || !self.shares.is_empty())
        {
            return Err(violation("uninitialized pool holds state"));
        }
        if self.total_shares > 0 && (self.reserve_base == 0 || self.reserve_token == 0) {
            return Err(violation("shares outstanding against an empty reserve"));
        }
        if self.total_shares == 0 && (self.reserve_base != 0 || self.reserve_token != 0) {
            return Err(violation("reserves held with no shares outstanding"));
        }
        if self.shares.total() != Some(self.total_shares) {
            return Err(violation("share ledger does not sum to total shares"));
        }
        Ok(())
    }
}

fn violation(what: &str) -> DexError {
    DexError::Internal(format!("pool invariant violated: {what}"))
}

/// Fee-adjusted constant-product output for `amount_in`.
///
/// Evaluated in [`U512`]: the numerator is a product of two `u128`
/// quantities and a `u64` fee term.
///
/// # Errors
///
/// - [`DexError::DivisionByZero`] if both `reserve_in` and `amount_in`
///   are zero.
/// - [`DexError::ArithmeticOverflow`] if the quotient exceeds `u128`.
pub fn constant_product_out(
    amount_in: u128,
    reserve_in: u128,
    reserve_out: u128,
    fee: FeeRate,
) -> Result<u128, DexError> {
    let amount_in_with_fee = U512::from(amount_in)
        .checked_mul(U512::from(fee.numerator()))
        .ok_or(DexError::ArithmeticOverflow)?;
    let numerator = U512::from(reserve_out)
        .checked_mul(amount_in_with_fee)
        .ok_or(DexError::ArithmeticOverflow)?;
    let denominator = U512::from(reserve_in)
        .checked_mul(U512::from(fee.denominator()))
        .and_then(|scaled| scaled.checked_add(amount_in_with_fee))
        .ok_or(DexError::ArithmeticOverflow)?;
    if denominator.is_zero() {
        return Err(DexError::DivisionByZero);
    }
    wide_to_u128(numerator / denominator)
}
