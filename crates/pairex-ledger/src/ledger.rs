//! The account-row registry and settlement primitives.
//!
//! Each user maps to one [`Account`] row behind its own `Mutex` — that mutex
//! **is** the exclusive row lock every mutation protocol requires. Callers
//! (the settlement engine) acquire rows through [`Ledger::lock_row`] /
//! [`Ledger::lock_pair`] and pass the guards into the settlement primitives,
//! so no balance can move without its row held.
//!
//! Lock discipline:
//! - Two rows are always acquired in ascending [`UserId`] order
//!   ([`Ledger::lock_pair`]), so two settlements touching the same pair of
//!   accounts in opposite roles cannot deadlock.
//! - Acquisition waits at most the configured budget; timing out surfaces as
//!   `ConcurrencyConflict` and the caller retries from scratch.
//! - The commission pool mutex is only ever taken while row locks are already
//!   held (settlement) or with none held (reads), never the other way around.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, MutexGuard, RwLock};
use pairex_types::{
    CashBalance, ExchangeError, Position, Result, SymbolId, UserId, constants,
};
use rust_decimal::Decimal;

use crate::account::Account;
use crate::conservation::Conservation;

/// A shared handle to one account row. Lock it to mutate the account.
pub type AccountRow = Arc<Mutex<Account>>;

/// The ledger: all account rows, the platform commission pool, and the
/// conservation tracker.
pub struct Ledger {
    /// `UserId → account row`. The outer lock only guards the map shape
    /// (insertion of new rows); balances are guarded by the per-row mutexes.
    accounts: RwLock<HashMap<UserId, AccountRow>>,
    /// Commission accrued from every settled trade. Modeled as a platform
    /// account so conservation stays checkable.
    commission_pool: Mutex<Decimal>,
    conservation: Mutex<Conservation>,
    lock_wait: Duration,
}

impl Ledger {
    /// Create an empty ledger with the default lock wait budget.
    #[must_use]
    pub fn new() -> Self {
        Self::with_lock_wait(Duration::from_millis(constants::DEFAULT_LOCK_WAIT_MS))
    }

    /// Create an empty ledger with a custom lock wait budget.
    #[must_use]
    pub fn with_lock_wait(lock_wait: Duration) -> Self {
        Self {
            accounts: RwLock::new(HashMap::new()),
            commission_pool: Mutex::new(Decimal::ZERO),
            conservation: Mutex::new(Conservation::new()),
            lock_wait,
        }
    }

    // =================================================================
    // Rows and locking
    // =================================================================

    /// Ensure an account row exists for a user. Idempotent.
    pub fn open_account(&self, user_id: UserId) {
        let mut accounts = self.accounts.write();
        accounts
            .entry(user_id)
            .or_insert_with(|| Arc::new(Mutex::new(Account::new(user_id))));
    }

    /// Fetch the row handle for a user.
    ///
    /// # Errors
    /// Returns `AccountNotFound` if the user has no account.
    pub fn row(&self, user_id: UserId) -> Result<AccountRow> {
        self.accounts
            .read()
            .get(&user_id)
            .cloned()
            .ok_or(ExchangeError::AccountNotFound(user_id))
    }

    /// Acquire one row's exclusive lock within the wait budget.
    ///
    /// # Errors
    /// Returns `ConcurrencyConflict` on lock wait timeout.
    pub fn lock_row<'a>(
        &self,
        row: &'a AccountRow,
        user_id: UserId,
    ) -> Result<MutexGuard<'a, Account>> {
        row.try_lock_for(self.lock_wait)
            .ok_or(ExchangeError::ConcurrencyConflict {
                resource: format!("account {user_id}"),
            })
    }

    /// Acquire two rows in ascending `UserId` order, returning the guards
    /// relabeled `(a, b)` to match the argument order. The two users must
    /// differ (self-trades never reach settlement).
    ///
    /// # Errors
    /// Returns `ConcurrencyConflict` if either lock times out.
    pub fn lock_pair<'a>(
        &self,
        row_a: &'a AccountRow,
        user_a: UserId,
        row_b: &'a AccountRow,
        user_b: UserId,
    ) -> Result<(MutexGuard<'a, Account>, MutexGuard<'a, Account>)> {
        debug_assert_ne!(user_a, user_b, "lock_pair requires distinct accounts");
        if user_a < user_b {
            let a = self.lock_row(row_a, user_a)?;
            let b = self.lock_row(row_b, user_b)?;
            Ok((a, b))
        } else {
            let b = self.lock_row(row_b, user_b)?;
            let a = self.lock_row(row_a, user_a)?;
            Ok((a, b))
        }
    }

    // =================================================================
    // Deposits
    // =================================================================

    /// Deposit cash for a user, creating the account if needed.
    pub fn deposit_cash(&self, user_id: UserId, amount: Decimal) -> Result<()> {
        self.open_account(user_id);
        let row = self.row(user_id)?;
        let mut account = self.lock_row(&row, user_id)?;
        account.credit_cash(amount);
        self.conservation.lock().record_cash_deposit(amount);
        Ok(())
    }

    /// Deposit base units of a symbol for a user, creating the account and
    /// position if needed.
    pub fn deposit_asset(&self, user_id: UserId, symbol_id: SymbolId, amount: Decimal) -> Result<()> {
        self.open_account(user_id);
        let row = self.row(user_id)?;
        let mut account = self.lock_row(&row, user_id)?;
        account.credit_asset(symbol_id, amount);
        self.conservation.lock().record_asset_deposit(symbol_id, amount);
        Ok(())
    }

    // =================================================================
    // Settlement primitives (caller holds both row locks)
    // =================================================================

    /// Settle the cash leg of a trade.
    ///
    /// Releases the buyer's full originally-locked amount, refunds the
    /// over-lock (`locked_by_buyer − trade_value`) to the buyer when their
    /// limit exceeded the execution price, credits the seller with
    /// `trade_value − commission`, and accrues the commission to the pool.
    ///
    /// # Errors
    /// Returns `LockedUnderflow` if the buyer's locked cash is short — a
    /// call-discipline bug that must halt the settlement.
    pub fn settle_cash(
        &self,
        buyer: &mut Account,
        seller: &mut Account,
        locked_by_buyer: Decimal,
        trade_value: Decimal,
        commission: Decimal,
    ) -> Result<()> {
        buyer.consume_locked_cash(locked_by_buyer)?;
        if locked_by_buyer > trade_value {
            buyer.credit_cash(locked_by_buyer - trade_value);
        }
        seller.credit_cash(trade_value - commission);
        *self.commission_pool.lock() += commission;
        Ok(())
    }

    /// Settle the asset leg of a trade: release the seller's locked units
    /// and credit them to the buyer's position (created if absent).
    ///
    /// # Errors
    /// Returns `LockedUnderflow` if the seller's locked units are short.
    pub fn settle_asset(
        &self,
        seller: &mut Account,
        buyer: &mut Account,
        symbol_id: SymbolId,
        amount: Decimal,
    ) -> Result<()> {
        seller.consume_locked_asset(symbol_id, amount)?;
        buyer.credit_asset(symbol_id, amount);
        Ok(())
    }

    // =================================================================
    // Queries
    // =================================================================

    /// Snapshot of a user's cash balance.
    pub fn cash_balance(&self, user_id: UserId) -> Result<CashBalance> {
        let row = self.row(user_id)?;
        let account = self.lock_row(&row, user_id)?;
        Ok(account.cash.clone())
    }

    /// Snapshot of a user's position for a symbol; zero if never held.
    pub fn position(&self, user_id: UserId, symbol_id: SymbolId) -> Result<Position> {
        let row = self.row(user_id)?;
        let account = self.lock_row(&row, user_id)?;
        Ok(account.position(symbol_id))
    }

    /// Commission accrued to the platform pool so far.
    #[must_use]
    pub fn commission_pool(&self) -> Decimal {
        *self.commission_pool.lock()
    }

    // =================================================================
    // Conservation
    // =================================================================

    /// Verify conservation of funds across the whole ledger.
    ///
    /// Sums every row under its lock, so run this at a quiescent point —
    /// a deposit racing the sweep can report a transient skew.
    ///
    /// # Errors
    /// Returns `ConservationViolation` if cash or any symbol drifted.
    pub fn verify_conservation(&self) -> Result<()> {
        let accounts = self.accounts.read();
        // Sweep rows in ascending user id, the same global order settlement
        // uses, so the sweep can never participate in a lock cycle.
        let mut user_ids: Vec<UserId> = accounts.keys().copied().collect();
        user_ids.sort_unstable();

        let mut cash_total = Decimal::ZERO;
        let mut asset_totals: HashMap<SymbolId, Decimal> = HashMap::new();
        for user_id in user_ids {
            let row = &accounts[&user_id];
            let account = self.lock_row(row, user_id)?;
            cash_total += account.cash_total();
            for (symbol_id, total) in account.position_totals() {
                *asset_totals.entry(symbol_id).or_insert(Decimal::ZERO) += total;
            }
        }

        let conservation = self.conservation.lock();
        conservation.verify_cash(cash_total, self.commission_pool())?;
        for symbol_id in conservation.tracked_symbols() {
            let actual = asset_totals
                .get(&symbol_id)
                .copied()
                .unwrap_or(Decimal::ZERO);
            conservation.verify_asset(symbol_id, actual)?;
        }
        tracing::debug!(cash = %cash_total, "Conservation verified");
        Ok(())
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}
