//! DEX service: orchestrates pool operations, settlement and events.

use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, MutexGuard};

use super::settlement::{Leg, settle};
use crate::domain::pool_state::{DepositPlan, InitializePlan, SwapPlan, WithdrawPlan};
use crate::domain::{Address, DexEvent, EventBus, FeeRate, PoolEntry, PoolInfo, SwapDirection};
use crate::error::DexError;
use crate::ledger::{Asset, AssetTransfer, InMemoryLedger, LedgerSnapshot};

tokio::task_local! {
    /// Set while an engine call is in flight on the current task.
    static ACTIVE_CALL: ();
}

/// Runs `call` with the reentrancy marker set.
///
/// A call made while the marker is already set (for example from inside a
/// transfer hook) fails with [`DexError::ReentrantCall`] before touching
/// the pool lock.
async fn non_reentrant<T, F>(call: F) -> Result<T, DexError>
where
    F: Future<Output = Result<T, DexError>>,
{
    if ACTIVE_CALL.try_with(|_| ()).is_ok() {
        return Err(DexError::ReentrantCall);
    }
    ACTIVE_CALL.scope((), call).await
}

/// Runs a mutation on its own task with the reentrancy marker set.
///
/// The task owns the lock and every settlement leg, so it runs to
/// completion even when the returned future is dropped.
async fn run_detached<T, F>(call: F) -> Result<T, DexError>
where
    T: Send + 'static,
    F: Future<Output = Result<T, DexError>> + Send + 'static,
{
    if ACTIVE_CALL.try_with(|_| ()).is_ok() {
        return Err(DexError::ReentrantCall);
    }
    tokio::spawn(ACTIVE_CALL.scope((), call))
        .await
        .map_err(|e| DexError::Internal(format!("pool operation task failed: {e}")))?
}

/// Orchestration layer for all pool operations.
///
/// Owns the single [`PoolEntry`] behind an exclusive lock, the asset
/// backend and the [`EventBus`]. Every mutation method follows the
/// pattern: reentrancy check → spawn → acquire lock → plan → snapshot →
/// apply bookkeeping → settle transfers (restore snapshot on failure) →
/// update metadata → release lock → emit events.
#[derive(Debug)]
pub struct DexService<L> {
    entry: Mutex<PoolEntry>,
    ledger: Arc<L>,
    event_bus: EventBus,
}

impl<L: AssetTransfer + 'static> DexService<L> {
    /// Creates a new `DexService` around an existing pool entry.
    #[must_use]
    pub fn new(entry: PoolEntry, ledger: Arc<L>, event_bus: EventBus) -> Self {
        Self {
            entry: Mutex::new(entry),
            ledger,
            event_bus,
        }
    }

    /// Returns a reference to the inner [`EventBus`].
    #[must_use]
    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    /// Returns the asset backend.
    #[must_use]
    pub fn ledger(&self) -> &Arc<L> {
        &self.ledger
    }

    // ── mutations ──────────────────────────────────────────────────────

    /// Seeds the pool with its first liquidity.
    ///
    /// Pulls `token_amount` (allowance required) and `base_amount` from
    /// `caller` and mints `floor(sqrt(token_amount · base_amount))` shares.
    ///
    /// # Errors
    ///
    /// [`DexError::AlreadyInitialized`], [`DexError::ZeroAmount`],
    /// [`DexError::TransferFailed`] or [`DexError::ReentrantCall`].
    pub async fn initialize(
        self: &Arc<Self>,
        caller: Address,
        token_amount: u128,
        base_amount: u128,
    ) -> Result<InitializePlan, DexError> {
        let this = Arc::clone(self);
        run_detached(async move {
            this.initialize_locked(caller, token_amount, base_amount)
                .await
        })
        .await
    }

    async fn initialize_locked(
        &self,
        caller: Address,
        token_amount: u128,
        base_amount: u128,
    ) -> Result<InitializePlan, DexError> {
        let mut entry = self.entry.lock().await;
        let plan = entry.state.plan_initialize(token_amount, base_amount)?;
        tracing::debug!(%caller, ?plan, "initialize planned");

        let snapshot = entry.clone();
        entry.state.apply_initialize(caller, &plan);
        let legs = [
            Leg::PullToken {
                from: caller,
                amount: plan.token_in,
            },
            Leg::PullBase {
                from: caller,
                amount: plan.base_in,
            },
        ];
        self.settle_or_restore(&mut entry, snapshot, caller, &legs)
            .await?;
        entry.touch();

        let timestamp = Utc::now();
        let events = [
            DexEvent::PoolInitialized {
                caller,
                shares_minted: plan.shares_minted,
                base_in: plan.base_in,
                token_in: plan.token_in,
                timestamp,
            },
            reserves_synced(&entry, caller, timestamp),
        ];
        drop(entry);
        self.publish(events);

        tracing::info!(
            %caller,
            token_in = plan.token_in,
            base_in = plan.base_in,
            shares_minted = plan.shares_minted,
            "pool initialized"
        );
        Ok(plan)
    }

    /// Sells `amount_in` base units for token.
    ///
    /// # Errors
    ///
    /// [`DexError::PoolNotInitialized`], [`DexError::ZeroAmount`],
    /// [`DexError::InsufficientOutputReserve`], [`DexError::TransferFailed`]
    /// or [`DexError::ReentrantCall`].
    pub async fn swap_base_for_token(
        self: &Arc<Self>,
        caller: Address,
        amount_in: u128,
    ) -> Result<SwapPlan, DexError> {
        self.swap(caller, SwapDirection::BaseForToken, amount_in)
            .await
    }

    /// Sells `amount_in` token units for base; requires allowance.
    ///
    /// # Errors
    ///
    /// Same as [`Self::swap_base_for_token`].
    pub async fn swap_token_for_base(
        self: &Arc<Self>,
        caller: Address,
        amount_in: u128,
    ) -> Result<SwapPlan, DexError> {
        self.swap(caller, SwapDirection::TokenForBase, amount_in)
            .await
    }

    /// Executes a swap in either direction.
    ///
    /// # Errors
    ///
    /// Same as [`Self::swap_base_for_token`].
    pub async fn swap(
        self: &Arc<Self>,
        caller: Address,
        direction: SwapDirection,
        amount_in: u128,
    ) -> Result<SwapPlan, DexError> {
        let this = Arc::clone(self);
        run_detached(async move { this.swap_locked(caller, direction, amount_in).await }).await
    }

    async fn swap_locked(
        &self,
        caller: Address,
        direction: SwapDirection,
        amount_in: u128,
    ) -> Result<SwapPlan, DexError> {
        let mut entry = self.entry.lock().await;
        let plan = entry.state.plan_swap(direction, amount_in)?;
        tracing::debug!(%caller, ?plan, "swap planned");

        let snapshot = entry.clone();
        entry.state.apply_swap(&plan);
        let legs = match direction {
            SwapDirection::BaseForToken => [
                Leg::PullBase {
                    from: caller,
                    amount: plan.amount_in,
                },
                Leg::PushToken {
                    to: caller,
                    amount: plan.amount_out,
                },
            ],
            SwapDirection::TokenForBase => [
                Leg::PullToken {
                    from: caller,
                    amount: plan.amount_in,
                },
                Leg::PushBase {
                    to: caller,
                    amount: plan.amount_out,
                },
            ],
        };
        self.settle_or_restore(&mut entry, snapshot, caller, &legs)
            .await?;

        entry.swap_count = entry.swap_count.saturating_add(1);
        match direction {
            SwapDirection::BaseForToken => {
                entry.base_volume = entry.base_volume.saturating_add(plan.amount_in);
            }
            SwapDirection::TokenForBase => {
                entry.token_volume = entry.token_volume.saturating_add(plan.amount_in);
            }
        }
        entry.touch();

        let timestamp = Utc::now();
        let swapped = match direction {
            SwapDirection::BaseForToken => DexEvent::SwapBaseForToken {
                caller,
                base_in: plan.amount_in,
                token_out: plan.amount_out,
                timestamp,
            },
            SwapDirection::TokenForBase => DexEvent::SwapTokenForBase {
                caller,
                token_in: plan.amount_in,
                base_out: plan.amount_out,
                timestamp,
            },
        };
        let events = [swapped, reserves_synced(&entry, caller, timestamp)];
        drop(entry);
        self.publish(events);

        tracing::info!(
            %caller,
            direction = direction.as_str(),
            amount_in = plan.amount_in,
            amount_out = plan.amount_out,
            "swap executed"
        );
        Ok(plan)
    }

    /// Adds liquidity in the current reserve ratio.
    ///
    /// Pulls `base_amount` plus `ceil(base_amount · reserve_token /
    /// reserve_base)` token units from `caller`.
    ///
    /// # Errors
    ///
    /// [`DexError::PoolNotInitialized`], [`DexError::ZeroAmount`],
    /// [`DexError::TransferFailed`] or [`DexError::ReentrantCall`].
    pub async fn deposit(
        self: &Arc<Self>,
        caller: Address,
        base_amount: u128,
    ) -> Result<DepositPlan, DexError> {
        let this = Arc::clone(self);
        run_detached(async move { this.deposit_locked(caller, base_amount).await }).await
    }

    async fn deposit_locked(
        &self,
        caller: Address,
        base_amount: u128,
    ) -> Result<DepositPlan, DexError> {
        let mut entry = self.entry.lock().await;
        let plan = entry.state.plan_deposit(base_amount)?;
        tracing::debug!(%caller, ?plan, "deposit planned");

        let snapshot = entry.clone();
        entry.state.apply_deposit(caller, &plan);
        let legs = [
            Leg::PullBase {
                from: caller,
                amount: plan.base_in,
            },
            Leg::PullToken {
                from: caller,
                amount: plan.token_in,
            },
        ];
        self.settle_or_restore(&mut entry, snapshot, caller, &legs)
            .await?;
        entry.touch();

        let timestamp = Utc::now();
        let events = [
            DexEvent::LiquidityAdded {
                caller,
                shares_minted: plan.shares_minted,
                base_in: plan.base_in,
                token_in: plan.token_in,
                timestamp,
            },
            reserves_synced(&entry, caller, timestamp),
        ];
        drop(entry);
        self.publish(events);

        tracing::info!(
            %caller,
            base_in = plan.base_in,
            token_in = plan.token_in,
            shares_minted = plan.shares_minted,
            "liquidity added"
        );
        Ok(plan)
    }

    /// Redeems `shares` for a proportional slice of both reserves.
    ///
    /// # Errors
    ///
    /// [`DexError::PoolNotInitialized`], [`DexError::ZeroAmount`],
    /// [`DexError::InsufficientShares`], [`DexError::TransferFailed`] or
    /// [`DexError::ReentrantCall`].
    pub async fn withdraw(
        self: &Arc<Self>,
        caller: Address,
        shares: u128,
    ) -> Result<WithdrawPlan, DexError> {
        let this = Arc::clone(self);
        run_detached(async move { this.withdraw_locked(caller, shares).await }).await
    }

    async fn withdraw_locked(
        &self,
        caller: Address,
        shares: u128,
    ) -> Result<WithdrawPlan, DexError> {
        let mut entry = self.entry.lock().await;
        let plan = entry.state.plan_withdraw(&caller, shares)?;
        tracing::debug!(%caller, ?plan, "withdraw planned");

        let snapshot = entry.clone();
        entry.state.apply_withdraw(&caller, &plan);
        let legs = [
            Leg::PushBase {
                to: caller,
                amount: plan.base_out,
            },
            Leg::PushToken {
                to: caller,
                amount: plan.token_out,
            },
        ];
        self.settle_or_restore(&mut entry, snapshot, caller, &legs)
            .await?;
        entry.touch();

        let timestamp = Utc::now();
        let events = [
            DexEvent::LiquidityRemoved {
                caller,
                shares_redeemed: plan.shares_redeemed,
                base_out: plan.base_out,
                token_out: plan.token_out,
                timestamp,
            },
            reserves_synced(&entry, caller, timestamp),
        ];
        drop(entry);
        self.publish(events);

        tracing::info!(
            %caller,
            shares_redeemed = plan.shares_redeemed,
            base_out = plan.base_out,
            token_out = plan.token_out,
            "liquidity removed"
        );
        Ok(plan)
    }

    // ── queries ────────────────────────────────────────────────────────

    /// Current reserves, share supply and metadata.
    ///
    /// # Errors
    ///
    /// [`DexError::ReentrantCall`] when called from inside an operation.
    pub async fn pool_info(&self) -> Result<PoolInfo, DexError> {
        non_reentrant(async { Ok(PoolInfo::from(&*self.entry.lock().await)) }).await
    }

    /// Shares owned by `owner`.
    ///
    /// # Errors
    ///
    /// [`DexError::ReentrantCall`] when called from inside an operation.
    pub async fn shares_of(&self, owner: Address) -> Result<u128, DexError> {
        non_reentrant(async { Ok(self.entry.lock().await.state.shares_of(&owner)) }).await
    }

    /// Outstanding shares.
    ///
    /// # Errors
    ///
    /// [`DexError::ReentrantCall`] when called from inside an operation.
    pub async fn total_shares(&self) -> Result<u128, DexError> {
        non_reentrant(async { Ok(self.entry.lock().await.state.total_shares()) }).await
    }

    /// Prices a swap against the current reserves without executing it.
    ///
    /// # Errors
    ///
    /// Same validation errors as [`Self::swap`].
    pub async fn quote_swap(
        &self,
        direction: SwapDirection,
        amount_in: u128,
    ) -> Result<SwapPlan, DexError> {
        non_reentrant(async {
            self.entry
                .lock()
                .await
                .state
                .plan_swap(direction, amount_in)
        })
        .await
    }

    /// Computes the token requirement and minted shares of a deposit
    /// without executing it.
    ///
    /// # Errors
    ///
    /// Same validation errors as [`Self::deposit`].
    pub async fn quote_deposit(&self, base_amount: u128) -> Result<DepositPlan, DexError> {
        non_reentrant(async { self.entry.lock().await.state.plan_deposit(base_amount) }).await
    }

    /// Address of the paired token.
    ///
    /// # Errors
    ///
    /// [`DexError::ReentrantCall`] when called from inside an operation.
    pub async fn token_address(&self) -> Result<Address, DexError> {
        non_reentrant(async { Ok(self.entry.lock().await.token_address) }).await
    }

    /// Swap fee rate fixed at construction.
    ///
    /// # Errors
    ///
    /// [`DexError::ReentrantCall`] when called from inside an operation.
    pub async fn fee_rate(&self) -> Result<FeeRate, DexError> {
        non_reentrant(async { Ok(self.entry.lock().await.state.fee()) }).await
    }

    /// Copy of the full pool entry, for persistence snapshots.
    ///
    /// # Errors
    ///
    /// [`DexError::ReentrantCall`] when called from inside an operation.
    pub async fn snapshot_entry(&self) -> Result<PoolEntry, DexError> {
        non_reentrant(async { Ok(self.entry.lock().await.clone()) }).await
    }

    // ── internals ──────────────────────────────────────────────────────

    /// Settles `legs`; on failure puts `snapshot` back and maps the error.
    async fn settle_or_restore(
        &self,
        entry: &mut MutexGuard<'_, PoolEntry>,
        snapshot: PoolEntry,
        caller: Address,
        legs: &[Leg],
    ) -> Result<(), DexError> {
        match settle(self.ledger.as_ref(), legs).await {
            Ok(()) => {
                debug_assert!(entry.state.check_invariants().is_ok());
                Ok(())
            }
            Err(err) => {
                **entry = snapshot;
                tracing::warn!(%caller, error = %err, "settlement failed; pool state restored");
                Err(DexError::TransferFailed(err))
            }
        }
    }

    fn publish<const N: usize>(&self, events: [DexEvent; N]) {
        for event in events {
            let _ = self.event_bus.publish(event);
        }
    }
}

impl DexService<InMemoryLedger> {
    /// Captures the pool entry and the ledger under one pool lock, so no
    /// operation can commit between the two copies.
    ///
    /// # Errors
    ///
    /// [`DexError::ReentrantCall`] when called from inside an operation.
    pub async fn snapshot_state(&self) -> Result<(PoolEntry, LedgerSnapshot), DexError> {
        non_reentrant(async {
            let entry = self.entry.lock().await;
            let ledger = self.ledger.snapshot().await;
            Ok((entry.clone(), ledger))
        })
        .await
    }

    /// Replaces the pool entry and the ledger with a stored pair.
    ///
    /// # Errors
    ///
    /// - [`DexError::Internal`] if `entry` violates the pool invariants or
    ///   its reserves differ from the custody balances in `ledger`.
    /// - [`DexError::ReentrantCall`] when called from inside an operation.
    pub async fn restore_state(
        &self,
        entry: PoolEntry,
        ledger: LedgerSnapshot,
    ) -> Result<(), DexError> {
        entry.state.check_invariants()?;
        let custody = self.ledger.pool_address();
        let custody_base = ledger.balance_of(Asset::Base, custody);
        let custody_token = ledger.balance_of(Asset::Token, custody);
        if entry.state.reserve_base() != custody_base
            || entry.state.reserve_token() != custody_token
        {
            return Err(DexError::Internal(format!(
                "snapshot reserves ({}, {}) differ from custody balances ({custody_base}, {custody_token})",
                entry.state.reserve_base(),
                entry.state.reserve_token(),
            )));
        }
        non_reentrant(async {
            let mut current = self.entry.lock().await;
            self.ledger.restore(ledger).await;
            *current = entry;
            Ok(())
        })
        .await
    }
}

fn reserves_synced(entry: &PoolEntry, caller: Address, timestamp: DateTime<Utc>) -> DexEvent {
    DexEvent::ReservesSynced {
        caller,
        reserve_base: entry.state.reserve_base(),
        reserve_token: entry.state.reserve_token(),
        total_shares: entry.state.total_shares(),
        timestamp,
    }
}
