//! Transfer legs and their all-or-nothing settlement.
//!
//! An operation moves at most two amounts between the caller and the
//! pool. [`settle`] executes the legs in order; if one fails, the legs
//! that already completed are undone in reverse order and the original
//! error is returned, leaving balances and allowances as they were.

use crate::domain::Address;
use crate::ledger::{AssetTransfer, TransferError};

/// One asset movement between a caller and custody.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Leg {
    /// Token from the caller into custody (spends allowance).
    PullToken {
        /// Paying account.
        from: Address,
        /// Units.
        amount: u128,
    },
    /// Base value attached by the caller into custody.
    PullBase {
        /// Paying account.
        from: Address,
        /// Units.
        amount: u128,
    },
    /// Token from custody to the caller.
    PushToken {
        /// Receiving account.
        to: Address,
        /// Units.
        amount: u128,
    },
    /// Base from custody to the caller.
    PushBase {
        /// Receiving account.
        to: Address,
        /// Units.
        amount: u128,
    },
}

impl Leg {
    /// Units moved by this leg.
    #[must_use]
    pub const fn amount(&self) -> u128 {
        match self {
            Self::PullToken { amount, .. }
            | Self::PullBase { amount, .. }
            | Self::PushToken { amount, .. }
            | Self::PushBase { amount, .. } => *amount,
        }
    }

    async fn execute<L: AssetTransfer>(&self, ledger: &L) -> Result<(), TransferError> {
        match *self {
            Self::PullToken { from, amount } => ledger.pull_token(from, amount).await,
            Self::PullBase { from, amount } => ledger.pull_base(from, amount).await,
            Self::PushToken { to, amount } => ledger.push_token(to, amount).await,
            Self::PushBase { to, amount } => ledger.push_base(to, amount).await,
        }
    }

    async fn undo<L: AssetTransfer>(&self, ledger: &L) -> Result<(), TransferError> {
        match *self {
            Self::PullToken { from, amount } => ledger.refund_token(from, amount).await,
            Self::PullBase { from, amount } => ledger.push_base(from, amount).await,
            Self::PushToken { to, amount } => ledger.reclaim_token(to, amount).await,
            Self::PushBase { to, amount } => ledger.pull_base(to, amount).await,
        }
    }
}

/// Executes `legs` in order, skipping zero-amount legs.
///
/// # Errors
///
/// Returns the first leg failure after compensating the legs that had
/// already completed.
pub async fn settle<L: AssetTransfer>(ledger: &L, legs: &[Leg]) -> Result<(), TransferError> {
    let mut completed: Vec<Leg> = Vec::with_capacity(legs.len());
    for leg in legs.iter().filter(|leg| leg.amount() > 0) {
        match leg.execute(ledger).await {
            Ok(()) => completed.push(*leg),
            Err(err) => {
                unwind(ledger, &completed).await;
                return Err(err);
            }
        }
    }
    Ok(())
}

async fn unwind<L: AssetTransfer>(ledger: &L, completed: &[Leg]) {
    for leg in completed.iter().rev() {
        if let Err(err) = leg.undo(ledger).await {
            // only reachable if a balance moved between the leg and its undo
            tracing::error!(?leg, error = %err, "failed to compensate transfer leg");
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use tokio_test::{assert_err, assert_ok};

    use super::*;
    use crate::ledger::{Asset, InMemoryLedger};

    fn pool() -> Address {
        Address::from_bytes([0xee; 20])
    }

    fn alice() -> Address {
        Address::from_bytes([0xa1; 20])
    }

    #[tokio::test]
    async fn all_legs_succeed() {
        let ledger = InMemoryLedger::with_genesis(pool(), alice(), 100, 100);
        ledger.approve(alice(), pool(), 40).await;
        let legs = [
            Leg::PullBase {
                from: alice(),
                amount: 10,
            },
            Leg::PullToken {
                from: alice(),
                amount: 40,
            },
        ];
        assert_ok!(settle(&ledger, &legs).await);
        assert_eq!(ledger.balance_of(Asset::Base, pool()).await, 10);
        assert_eq!(ledger.balance_of(Asset::Token, pool()).await, 40);
    }

    #[tokio::test]
    async fn failed_second_leg_undoes_the_first() {
        let ledger = InMemoryLedger::with_genesis(pool(), alice(), 100, 100);
        let before = ledger.snapshot().await;
        // no allowance granted, so the token pull fails
        let legs = [
            Leg::PullBase {
                from: alice(),
                amount: 10,
            },
            Leg::PullToken {
                from: alice(),
                amount: 40,
            },
        ];
        let result = settle(&ledger, &legs).await;
        assert!(matches!(
            result,
            Err(TransferError::InsufficientAllowance { .. })
        ));
        assert_eq!(ledger.snapshot().await, before);
    }

    #[tokio::test]
    async fn refunded_token_pull_restores_allowance() {
        let ledger = InMemoryLedger::with_genesis(pool(), alice(), 100, 0);
        ledger.approve(alice(), pool(), 60).await;
        let before = ledger.snapshot().await;
        let legs = [
            Leg::PullToken {
                from: alice(),
                amount: 60,
            },
            Leg::PullBase {
                from: alice(),
                amount: 1,
            },
        ];
        assert_err!(settle(&ledger, &legs).await);
        assert_eq!(ledger.snapshot().await, before);
    }

    #[tokio::test]
    async fn zero_amount_legs_are_skipped() {
        let ledger = InMemoryLedger::new(pool());
        let legs = [
            Leg::PushBase {
                to: alice(),
                amount: 0,
            },
            Leg::PushToken {
                to: alice(),
                amount: 0,
            },
        ];
        assert_ok!(settle(&ledger, &legs).await);
    }
}
