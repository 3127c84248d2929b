//! In-memory ERC20-style ledger.
//!
//! [`InMemoryLedger`] keeps token balances, base balances and token
//! allowances behind a single [`tokio::sync::RwLock`]. It mirrors the
//! token the pool is deployed against: a fixed supply minted once to a
//! genesis account, `approve` / `allowance` for delegated pulls, and plain
//! transfers between accounts. Every method validates before mutating, so
//! a failed call leaves the book untouched.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use super::{Asset, AssetTransfer, TransferError};
use crate::domain::Address;
use crate::domain::amount::as_string;

/// Token supply minted to the genesis account: 1 000 000 tokens at 18 decimals.
pub const DEFAULT_TOKEN_SUPPLY: u128 = 1_000_000 * 1_000_000_000_000_000_000;

/// Base balance credited to the genesis account: 10 000 ETH in wei.
pub const DEFAULT_BASE_BALANCE: u128 = 10_000 * 1_000_000_000_000_000_000;

#[derive(Debug, Default)]
struct Book {
    token: BTreeMap<Address, u128>,
    base: BTreeMap<Address, u128>,
    /// `(owner, spender) -> amount`
    allowances: BTreeMap<(Address, Address), u128>,
}

impl Book {
    fn balances(&self, asset: Asset) -> &BTreeMap<Address, u128> {
        match asset {
            Asset::Base => &self.base,
            Asset::Token => &self.token,
        }
    }

    fn balances_mut(&mut self, asset: Asset) -> &mut BTreeMap<Address, u128> {
        match asset {
            Asset::Base => &mut self.base,
            Asset::Token => &mut self.token,
        }
    }

    fn balance(&self, asset: Asset, owner: &Address) -> u128 {
        self.balances(asset).get(owner).copied().unwrap_or(0)
    }

    fn allowance(&self, owner: Address, spender: Address) -> u128 {
        self.allowances
            .get(&(owner, spender))
            .copied()
            .unwrap_or(0)
    }

    fn set_allowance(&mut self, owner: Address, spender: Address, amount: u128) {
        if amount == 0 {
            self.allowances.remove(&(owner, spender));
        } else {
            self.allowances.insert((owner, spender), amount);
        }
    }

    fn ensure_balance(
        &self,
        asset: Asset,
        owner: &Address,
        needed: u128,
    ) -> Result<(), TransferError> {
        let available = self.balance(asset, owner);
        if available < needed {
            return Err(TransferError::InsufficientBalance {
                asset,
                needed,
                available,
            });
        }
        Ok(())
    }

    /// Moves units after [`Self::ensure_balance`] succeeded.
    fn move_units(&mut self, asset: Asset, from: Address, to: Address, amount: u128) {
        if amount == 0 || from == to {
            return;
        }
        let balances = self.balances_mut(asset);
        let from_balance = balances.get(&from).copied().unwrap_or(0);
        let remaining = from_balance.saturating_sub(amount);
        if remaining == 0 {
            balances.remove(&from);
        } else {
            balances.insert(from, remaining);
        }
        // supply is fixed at genesis, so no balance can exceed u128
        let to_balance = balances.get(&to).copied().unwrap_or(0);
        balances.insert(to, to_balance.saturating_add(amount));
    }

    fn transfer(
        &mut self,
        asset: Asset,
        from: Address,
        to: Address,
        amount: u128,
    ) -> Result<(), TransferError> {
        self.ensure_balance(asset, &from, amount)?;
        self.move_units(asset, from, to, amount);
        Ok(())
    }
}

/// One balance row of a [`LedgerSnapshot`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceEntry {
    /// Account.
    pub owner: Address,
    /// Units held.
    #[serde(with = "as_string")]
    pub amount: u128,
}

/// One allowance row of a [`LedgerSnapshot`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllowanceEntry {
    /// Account granting the allowance.
    pub owner: Address,
    /// Account allowed to spend.
    pub spender: Address,
    /// Units approved.
    #[serde(with = "as_string")]
    pub amount: u128,
}

/// Serializable copy of the whole ledger, stored in persistence snapshots.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    /// Token balances.
    pub token_balances: Vec<BalanceEntry>,
    /// Base balances.
    pub base_balances: Vec<BalanceEntry>,
    /// Token allowances.
    pub allowances: Vec<AllowanceEntry>,
}

impl LedgerSnapshot {
    /// Balance of `owner` in `asset` as recorded in the snapshot.
    #[must_use]
    pub fn balance_of(&self, asset: Asset, owner: Address) -> u128 {
        let rows = match asset {
            Asset::Base => &self.base_balances,
            Asset::Token => &self.token_balances,
        };
        rows.iter()
            .filter(|row| row.owner == owner)
            .fold(0u128, |acc, row| acc.saturating_add(row.amount))
    }
}

/// ERC20-style ledger for the base asset and the paired token.
///
/// `pool_address` is the custody account: `pull_*` credits it and
/// `push_*` debits it, and `pull_token` spends allowance granted to it.
#[derive(Debug)]
pub struct InMemoryLedger {
    pool_address: Address,
    book: RwLock<Book>,
}

impl InMemoryLedger {
    /// Creates an empty ledger with `pool_address` as custody account.
    #[must_use]
    pub fn new(pool_address: Address) -> Self {
        Self {
            pool_address,
            book: RwLock::new(Book::default()),
        }
    }

    /// Creates a ledger and mints the whole token supply plus a base
    /// balance to `genesis`.
    #[must_use]
    pub fn with_genesis(
        pool_address: Address,
        genesis: Address,
        token_supply: u128,
        base_balance: u128,
    ) -> Self {
        let mut book = Book::default();
        if token_supply > 0 {
            book.token.insert(genesis, token_supply);
        }
        if base_balance > 0 {
            book.base.insert(genesis, base_balance);
        }
        Self {
            pool_address,
            book: RwLock::new(book),
        }
    }

    /// Custody account of the pool.
    #[must_use]
    pub const fn pool_address(&self) -> Address {
        self.pool_address
    }

    /// Balance of `owner` in `asset`.
    pub async fn balance_of(&self, asset: Asset, owner: Address) -> u128 {
        self.book.read().await.balance(asset, &owner)
    }

    /// Sum of all balances of `asset`.
    pub async fn total_supply(&self, asset: Asset) -> u128 {
        self.book
            .read()
            .await
            .balances(asset)
            .values()
            .fold(0u128, |acc, v| acc.saturating_add(*v))
    }

    /// Sets the allowance `owner` grants `spender`, replacing any previous
    /// value.
    pub async fn approve(&self, owner: Address, spender: Address, amount: u128) {
        self.book.write().await.set_allowance(owner, spender, amount);
        tracing::debug!(%owner, %spender, amount, "allowance set");
    }

    /// Allowance `owner` granted `spender`.
    pub async fn allowance(&self, owner: Address, spender: Address) -> u128 {
        self.book.read().await.allowance(owner, spender)
    }

    /// Moves `amount` of `asset` from `from` to `to`.
    ///
    /// # Errors
    ///
    /// [`TransferError::InsufficientBalance`] if `from` holds less.
    pub async fn transfer(
        &self,
        asset: Asset,
        from: Address,
        to: Address,
        amount: u128,
    ) -> Result<(), TransferError> {
        self.book.write().await.transfer(asset, from, to, amount)?;
        tracing::debug!(asset = %asset, %from, %to, amount, "transfer");
        Ok(())
    }

    /// Copies the full book.
    pub async fn snapshot(&self) -> LedgerSnapshot {
        let book = self.book.read().await;
        let rows = |map: &BTreeMap<Address, u128>| {
            map.iter()
                .map(|(owner, amount)| BalanceEntry {
                    owner: *owner,
                    amount: *amount,
                })
                .collect::<Vec<_>>()
        };
        LedgerSnapshot {
            token_balances: rows(&book.token),
            base_balances: rows(&book.base),
            allowances: book
                .allowances
                .iter()
                .map(|((owner, spender), amount)| AllowanceEntry {
                    owner: *owner,
                    spender: *spender,
                    amount: *amount,
                })
                .collect(),
        }
    }

    /// Replaces the full book with `snapshot`.
    pub async fn restore(&self, snapshot: LedgerSnapshot) {
        let collect = |rows: Vec<BalanceEntry>| {
            rows.into_iter()
                .filter(|r| r.amount > 0)
                .map(|r| (r.owner, r.amount))
                .collect::<BTreeMap<_, _>>()
        };
        let restored = Book {
            token: collect(snapshot.token_balances),
            base: collect(snapshot.base_balances),
            allowances: snapshot
                .allowances
                .into_iter()
                .filter(|r| r.amount > 0)
                .map(|r| ((r.owner, r.spender), r.amount))
                .collect(),
        };
        *self.book.write().await = restored;
    }
}

impl AssetTransfer for InMemoryLedger {
    async fn pull_token(&self, from: Address, amount: u128) -> Result<(), TransferError> {
        let mut book = self.book.write().await;
        let allowed = book.allowance(from, self.pool_address);
        if allowed < amount {
            return Err(TransferError::InsufficientAllowance {
                needed: amount,
                allowed,
            });
        }
        book.ensure_balance(Asset::Token, &from, amount)?;
        book.set_allowance(from, self.pool_address, allowed - amount);
        book.move_units(Asset::Token, from, self.pool_address, amount);
        Ok(())
    }

    async fn push_token(&self, to: Address, amount: u128) -> Result<(), TransferError> {
        self.book
            .write()
            .await
            .transfer(Asset::Token, self.pool_address, to, amount)
    }

    async fn pull_base(&self, from: Address, amount: u128) -> Result<(), TransferError> {
        self.book
            .write()
            .await
            .transfer(Asset::Base, from, self.pool_address, amount)
    }

    async fn push_base(&self, to: Address, amount: u128) -> Result<(), TransferError> {
        self.book
            .write()
            .await
            .transfer(Asset::Base, self.pool_address, to, amount)
    }

    async fn refund_token(&self, to: Address, amount: u128) -> Result<(), TransferError> {
        let mut book = self.book.write().await;
        book.transfer(Asset::Token, self.pool_address, to, amount)?;
        let allowed = book.allowance(to, self.pool_address);
        book.set_allowance(to, self.pool_address, allowed.saturating_add(amount));
        Ok(())
    }

    async fn reclaim_token(&self, from: Address, amount: u128) -> Result<(), TransferError> {
        self.book
            .write()
            .await
            .transfer(Asset::Token, from, self.pool_address, amount)
    }

    async fn balance_of_token(&self, owner: Address) -> u128 {
        self.balance_of(Asset::Token, owner).await
    }

    async fn balance_of_base(&self, owner: Address) -> u128 {
        self.balance_of(Asset::Base, owner).await
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn pool() -> Address {
        Address::from_bytes([0xee; 20])
    }

    fn alice() -> Address {
        Address::from_bytes([0xa1; 20])
    }

    fn bob() -> Address {
        Address::from_bytes([0xb0; 20])
    }

    fn ledger() -> InMemoryLedger {
        InMemoryLedger::with_genesis(pool(), alice(), 1_000, 50)
    }

    #[tokio::test]
    async fn genesis_mints_supply_to_one_account() {
        let ledger = ledger();
        assert_eq!(ledger.balance_of_token(alice()).await, 1_000);
        assert_eq!(ledger.balance_of_base(alice()).await, 50);
        assert_eq!(ledger.total_supply(Asset::Token).await, 1_000);
        assert_eq!(ledger.balance_of_token(bob()).await, 0);
    }

    #[test]
    fn default_supply_is_one_million_tokens() {
        assert_eq!(DEFAULT_TOKEN_SUPPLY, 1_000_000 * 10u128.pow(18));
    }

    #[tokio::test]
    async fn pull_token_requires_allowance() {
        let ledger = ledger();
        let result = ledger.pull_token(alice(), 100).await;
        assert_eq!(
            result,
            Err(TransferError::InsufficientAllowance {
                needed: 100,
                allowed: 0
            })
        );
        assert_eq!(ledger.balance_of_token(alice()).await, 1_000);
    }

    #[tokio::test]
    async fn pull_token_spends_allowance() {
        let ledger = ledger();
        ledger.approve(alice(), pool(), 300).await;
        assert!(ledger.pull_token(alice(), 100).await.is_ok());
        assert_eq!(ledger.allowance(alice(), pool()).await, 200);
        assert_eq!(ledger.balance_of_token(pool()).await, 100);
        assert_eq!(ledger.balance_of_token(alice()).await, 900);
    }

    #[tokio::test]
    async fn pull_token_with_allowance_but_no_balance_changes_nothing() {
        let ledger = ledger();
        ledger.approve(bob(), pool(), 10).await;
        let result = ledger.pull_token(bob(), 10).await;
        assert!(matches!(
            result,
            Err(TransferError::InsufficientBalance {
                asset: Asset::Token,
                ..
            })
        ));
        assert_eq!(ledger.allowance(bob(), pool()).await, 10);
    }

    #[tokio::test]
    async fn refund_token_restores_balance_and_allowance() {
        let ledger = ledger();
        ledger.approve(alice(), pool(), 100).await;
        assert!(ledger.pull_token(alice(), 100).await.is_ok());
        assert!(ledger.refund_token(alice(), 100).await.is_ok());
        assert_eq!(ledger.balance_of_token(alice()).await, 1_000);
        assert_eq!(ledger.allowance(alice(), pool()).await, 100);
    }

    #[tokio::test]
    async fn base_moves_without_allowance() {
        let ledger = ledger();
        assert!(ledger.pull_base(alice(), 20).await.is_ok());
        assert!(ledger.push_base(bob(), 5).await.is_ok());
        assert_eq!(ledger.balance_of_base(pool()).await, 15);
        assert_eq!(ledger.balance_of_base(bob()).await, 5);
        assert!(ledger.push_base(bob(), 16).await.is_err());
    }

    #[tokio::test]
    async fn transfer_between_accounts() {
        let ledger = ledger();
        assert!(ledger.transfer(Asset::Token, alice(), bob(), 250).await.is_ok());
        assert_eq!(ledger.balance_of_token(bob()).await, 250);
        assert!(ledger.transfer(Asset::Base, bob(), alice(), 1).await.is_err());
    }

    #[tokio::test]
    async fn snapshot_restore_round_trip() {
        let ledger = ledger();
        ledger.approve(alice(), pool(), 77).await;
        let _ = ledger.transfer(Asset::Token, alice(), bob(), 10).await;
        let snapshot = ledger.snapshot().await;

        let other = InMemoryLedger::new(pool());
        other.restore(snapshot.clone()).await;
        assert_eq!(other.snapshot().await, snapshot);
        assert_eq!(other.allowance(alice(), pool()).await, 77);
        assert_eq!(other.balance_of_token(bob()).await, 10);
    }
}
