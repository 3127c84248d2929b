//! Per-provider liquidity share balances.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::Address;
use super::amount::as_string;
use crate::error::DexError;

/// One serialized ledger row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareEntry {
    /// Account holding the shares.
    pub owner: Address,
    /// Share balance (string-encoded u128).
    #[serde(with = "as_string")]
    pub shares: u128,
}

/// Liquidity shares held by each provider.
///
/// Accounts appear on first credit and disappear when their balance
/// returns to zero, so a zero-share account is indistinguishable from
/// one that never existed. The sum of all balances equals the pool's
/// `total_shares` after every committed operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<ShareEntry>", into = "Vec<ShareEntry>")]
pub struct ShareLedger {
    balances: BTreeMap<Address, u128>,
}

impl ShareLedger {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Shares owned by `owner` (zero if the account never held any).
    #[must_use]
    pub fn shares_of(&self, owner: &Address) -> u128 {
        self.balances.get(owner).copied().unwrap_or(0)
    }

    /// Adds `amount` shares to `owner`.
    ///
    /// # Errors
    ///
    /// Returns [`DexError::ArithmeticOverflow`] if the balance would exceed
    /// `u128::MAX`.
    pub fn credit(&mut self, owner: Address, amount: u128) -> Result<(), DexError> {
        if amount == 0 {
            return Ok(());
        }
        let balance = self.shares_of(&owner);
        let updated = balance
            .checked_add(amount)
            .ok_or(DexError::ArithmeticOverflow)?;
        self.balances.insert(owner, updated);
        Ok(())
    }

    /// Removes `amount` shares from `owner`. Over-redemption is rejected,
    /// never clamped.
    ///
    /// # Errors
    ///
    /// Returns [`DexError::InsufficientShares`] if `owner` holds fewer than
    /// `amount` shares.
    pub fn debit(&mut self, owner: &Address, amount: u128) -> Result<(), DexError> {
        let balance = self.shares_of(owner);
        let remaining = balance
            .checked_sub(amount)
            .ok_or(DexError::InsufficientShares {
                requested: amount,
                available: balance,
            })?;
        if remaining == 0 {
            self.balances.remove(owner);
        } else {
            self.balances.insert(*owner, remaining);
        }
        Ok(())
    }

    /// Sum of all balances, or `None` if it does not fit in `u128`.
    #[must_use]
    pub fn total(&self) -> Option<u128> {
        self.balances
            .values()
            .try_fold(0u128, |acc, v| acc.checked_add(*v))
    }

    /// Number of accounts with a non-zero balance.
    #[must_use]
    pub fn holder_count(&self) -> usize {
        self.balances.len()
    }

    /// Returns `true` when no account holds shares.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.balances.is_empty()
    }

    /// Iterates over `(owner, shares)` in address order.
    pub fn iter(&self) -> impl Iterator<Item = (&Address, &u128)> {
        self.balances.iter()
    }
}

impl From<Vec<ShareEntry>> for ShareLedger {
    fn from(entries: Vec<ShareEntry>) -> Self {
        let balances = entries
            .into_iter()
            .filter(|e| e.shares > 0)
            .map(|e| (e.owner, e.shares))
            .collect();
        Self { balances }
    }
}

impl From<ShareLedger> for Vec<ShareEntry> {
    fn from(ledger: ShareLedger) -> Self {
        ledger
            .balances
            .into_iter()
            .map(|(owner, shares)| ShareEntry { owner, shares })
            .collect()
    }
}
