//! Asset custody: the capability the pool uses to move funds.
//!
//! The engine never touches balances directly. Every movement between a
//! caller and the pool's custody address goes through [`AssetTransfer`],
//! so the same engine can settle against the bundled [`InMemoryLedger`]
//! or against any other asset backend.
//!
//! Two assets are involved: the **base** asset (ETH, attached by value to
//! a call) and the **token** (0KAGE, an ERC20-style asset that the pool
//! may only pull up to the allowance its owner granted).

pub mod memory;

use std::fmt;
use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::domain::Address;

pub use memory::{InMemoryLedger, LedgerSnapshot};

/// The two assets the pool trades.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Asset {
    /// Native value asset (ETH).
    Base,
    /// Paired ERC20-style token (0KAGE).
    Token,
}

impl Asset {
    /// Returns the asset as a static string slice.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Base => "base",
            Self::Token => "token",
        }
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure of a single asset movement.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransferError {
    /// The sender holds fewer units than requested.
    #[error("insufficient {asset} balance: needed {needed}, available {available}")]
    InsufficientBalance {
        /// Asset being moved.
        asset: Asset,
        /// Units requested.
        needed: u128,
        /// Units the sender holds.
        available: u128,
    },

    /// The owner approved the pool for fewer token units than requested.
    #[error("insufficient allowance: needed {needed}, allowed {allowed}")]
    InsufficientAllowance {
        /// Units requested.
        needed: u128,
        /// Units approved.
        allowed: u128,
    },
}

impl TransferError {
    /// Short machine-readable kind, used as error details in responses.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::InsufficientBalance { .. } => "insufficient_balance",
            Self::InsufficientAllowance { .. } => "insufficient_allowance",
        }
    }
}

/// Asset movements between callers and the pool's custody address.
///
/// Implementations must make each method all-or-nothing: a method that
/// returns an error has moved nothing. The service sequences several
/// calls per operation and compensates completed ones with the inverse
/// methods (`refund_token`, `reclaim_token`, and the base pair) when a
/// later one fails.
///
/// # Contract
///
/// - `pull_*` moves units from `from` into custody.
/// - `push_*` moves units from custody to `to`.
/// - `pull_token` spends allowance granted by `from` to the pool.
/// - Balances are conserved: no method mints or burns units.
pub trait AssetTransfer: Send + Sync {
    /// Moves `amount` token units from `from` into custody, spending the
    /// allowance `from` granted to the pool.
    ///
    /// # Errors
    ///
    /// [`TransferError::InsufficientAllowance`] or
    /// [`TransferError::InsufficientBalance`].
    fn pull_token(
        &self,
        from: Address,
        amount: u128,
    ) -> impl Future<Output = Result<(), TransferError>> + Send;

    /// Moves `amount` token units from custody to `to`.
    ///
    /// # Errors
    ///
    /// [`TransferError::InsufficientBalance`] if custody holds less.
    fn push_token(
        &self,
        to: Address,
        amount: u128,
    ) -> impl Future<Output = Result<(), TransferError>> + Send;

    /// Moves `amount` base units attached by `from` into custody.
    ///
    /// # Errors
    ///
    /// [`TransferError::InsufficientBalance`] if `from` holds less.
    fn pull_base(
        &self,
        from: Address,
        amount: u128,
    ) -> impl Future<Output = Result<(), TransferError>> + Send;

    /// Moves `amount` base units from custody to `to`.
    ///
    /// # Errors
    ///
    /// [`TransferError::InsufficientBalance`] if custody holds less.
    fn push_base(
        &self,
        to: Address,
        amount: u128,
    ) -> impl Future<Output = Result<(), TransferError>> + Send;

    /// Reverses a completed [`Self::pull_token`]: returns the units to
    /// `to` and restores the allowance the pull consumed.
    ///
    /// # Errors
    ///
    /// [`TransferError::InsufficientBalance`] if custody holds less.
    fn refund_token(
        &self,
        to: Address,
        amount: u128,
    ) -> impl Future<Output = Result<(), TransferError>> + Send;

    /// Reverses a completed [`Self::push_token`] without touching
    /// allowances.
    ///
    /// # Errors
    ///
    /// [`TransferError::InsufficientBalance`] if `from` no longer holds
    /// the units.
    fn reclaim_token(
        &self,
        from: Address,
        amount: u128,
    ) -> impl Future<Output = Result<(), TransferError>> + Send;

    /// Token units held by `owner`.
    fn balance_of_token(&self, owner: Address) -> impl Future<Output = u128> + Send;

    /// Base units held by `owner`.
    fn balance_of_base(&self, owner: Address) -> impl Future<Output = u128> + Send;
}
