//! Conservation-of-funds invariant checker.
//!
//! Invariant enforced across the whole ledger:
//! ```text
//! Σ(balance + locked_balance) + commission_pool == Σ(cash deposits)
//! ∀ symbol: Σ(amount + locked_amount)           == Σ(asset deposits)
//! ```
//!
//! Matching and settlement only move funds between rows (and into the
//! commission pool); nothing but a deposit changes either total. A failed
//! check means the ledger drifted and the operation must halt.

use std::collections::HashMap;

use pairex_types::{ExchangeError, Result, SymbolId};
use rust_decimal::Decimal;

/// Tracks cumulative deposits and validates conservation on demand.
#[derive(Debug, Default)]
pub struct Conservation {
    /// Total cash deposited since genesis.
    cash_deposits: Decimal,
    /// Total base units deposited per symbol since genesis.
    asset_deposits: HashMap<SymbolId, Decimal>,
}

impl Conservation {
    /// Create a new conservation tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a cash deposit.
    pub fn record_cash_deposit(&mut self, amount: Decimal) {
        self.cash_deposits += amount;
    }

    /// Record an asset deposit.
    pub fn record_asset_deposit(&mut self, symbol_id: SymbolId, amount: Decimal) {
        *self.asset_deposits.entry(symbol_id).or_insert(Decimal::ZERO) += amount;
    }

    /// Expected cash in the system (user rows plus commission pool).
    #[must_use]
    pub fn expected_cash(&self) -> Decimal {
        self.cash_deposits
    }

    /// Expected base units in the system for a symbol.
    #[must_use]
    pub fn expected_asset(&self, symbol_id: SymbolId) -> Decimal {
        self.asset_deposits
            .get(&symbol_id)
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    /// Verify the cash side: user totals plus the commission pool must
    /// equal everything ever deposited.
    ///
    /// # Errors
    /// Returns `ConservationViolation` if the totals drifted.
    pub fn verify_cash(&self, user_totals: Decimal, commission_pool: Decimal) -> Result<()> {
        let actual = user_totals + commission_pool;
        let expected = self.expected_cash();
        if actual != expected {
            return Err(ExchangeError::ConservationViolation {
                reason: format!(
                    "cash: users {user_totals} + pool {commission_pool} != deposits {expected}"
                ),
            });
        }
        Ok(())
    }

    /// Verify one symbol's asset side.
    ///
    /// # Errors
    /// Returns `ConservationViolation` if the totals drifted.
    pub fn verify_asset(&self, symbol_id: SymbolId, actual: Decimal) -> Result<()> {
        let expected = self.expected_asset(symbol_id);
        if actual != expected {
            return Err(ExchangeError::ConservationViolation {
                reason: format!("asset {symbol_id}: actual {actual} != deposits {expected}"),
            });
        }
        Ok(())
    }

    /// All symbols that have ever received a deposit.
    #[must_use]
    pub fn tracked_symbols(&self) -> Vec<SymbolId> {
        self.asset_deposits.keys().copied().collect()
    }
}
