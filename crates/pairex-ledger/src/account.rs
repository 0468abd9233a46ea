//! A single ledger row: one user's cash balance and asset positions.
//!
//! Every method here mutates through `&mut self`, which the caller can only
//! obtain by holding the account's row lock (see [`crate::Ledger`]). The
//! methods themselves enforce the non-negativity invariants: reservations
//! reject short balances with `InsufficientFunds`, releases reject drives
//! below zero with `LockedUnderflow` — the latter is a broken-call-discipline
//! bug, never a user error.

use std::collections::HashMap;

use pairex_types::{CashBalance, ExchangeError, Position, Result, SymbolId, UserId};
use rust_decimal::Decimal;

/// One user's ledger row: cash plus per-symbol positions.
#[derive(Debug)]
pub struct Account {
    pub user_id: UserId,
    pub cash: CashBalance,
    /// Positions keyed by symbol; created lazily on first acquisition.
    positions: HashMap<SymbolId, Position>,
}

impl Account {
    /// Create an empty account for a user.
    #[must_use]
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            cash: CashBalance::new(),
            positions: HashMap::new(),
        }
    }

    // =================================================================
    // Cash
    // =================================================================

    /// Credit available cash (deposit or settlement proceeds).
    pub fn credit_cash(&mut self, amount: Decimal) {
        self.cash.available += amount;
    }

    /// Reserve cash for a buy order: available → locked.
    ///
    /// # Errors
    /// Returns `InsufficientFunds` if available cash is short.
    pub fn reserve_cash(&mut self, amount: Decimal) -> Result<()> {
        if self.cash.available < amount {
            return Err(ExchangeError::InsufficientFunds {
                needed: amount,
                available: self.cash.available,
            });
        }
        self.cash.available -= amount;
        self.cash.locked += amount;
        Ok(())
    }

    /// Release reserved cash back to available (order cancelled).
    ///
    /// # Errors
    /// Returns `LockedUnderflow` if more is released than was locked.
    pub fn release_cash(&mut self, amount: Decimal) -> Result<()> {
        if self.cash.locked < amount {
            return Err(ExchangeError::LockedUnderflow {
                requested: amount,
                locked: self.cash.locked,
            });
        }
        self.cash.locked -= amount;
        self.cash.available += amount;
        Ok(())
    }

    /// Remove reserved cash entirely (it is being paid out elsewhere).
    ///
    /// # Errors
    /// Returns `LockedUnderflow` if more is unlocked than was locked.
    pub fn consume_locked_cash(&mut self, amount: Decimal) -> Result<()> {
        if self.cash.locked < amount {
            return Err(ExchangeError::LockedUnderflow {
                requested: amount,
                locked: self.cash.locked,
            });
        }
        self.cash.locked -= amount;
        Ok(())
    }

    // =================================================================
    // Asset positions
    // =================================================================

    /// Snapshot of the position for a symbol; zero if never held.
    #[must_use]
    pub fn position(&self, symbol_id: SymbolId) -> Position {
        self.positions.get(&symbol_id).cloned().unwrap_or_default()
    }

    /// Credit base units to a position, creating it if absent.
    pub fn credit_asset(&mut self, symbol_id: SymbolId, amount: Decimal) {
        let position = self.positions.entry(symbol_id).or_default();
        position.amount += amount;
    }

    /// Reserve units for a sell order: amount → locked.
    ///
    /// # Errors
    /// Returns `InsufficientFunds` if the position is absent or short.
    pub fn reserve_asset(&mut self, symbol_id: SymbolId, amount: Decimal) -> Result<()> {
        let Some(position) = self.positions.get_mut(&symbol_id) else {
            return Err(ExchangeError::InsufficientFunds {
                needed: amount,
                available: Decimal::ZERO,
            });
        };
        if position.amount < amount {
            return Err(ExchangeError::InsufficientFunds {
                needed: amount,
                available: position.amount,
            });
        }
        position.amount -= amount;
        position.locked += amount;
        Ok(())
    }

    /// Release reserved units back to available (order cancelled).
    ///
    /// # Errors
    /// Returns `LockedUnderflow` if more is released than was locked.
    pub fn release_asset(&mut self, symbol_id: SymbolId, amount: Decimal) -> Result<()> {
        let Some(position) = self.positions.get_mut(&symbol_id) else {
            return Err(ExchangeError::LockedUnderflow {
                requested: amount,
                locked: Decimal::ZERO,
            });
        };
        if position.locked < amount {
            return Err(ExchangeError::LockedUnderflow {
                requested: amount,
                locked: position.locked,
            });
        }
        position.locked -= amount;
        position.amount += amount;
        Ok(())
    }

    /// Remove reserved units entirely (they are being delivered to the buyer).
    ///
    /// # Errors
    /// Returns `LockedUnderflow` if more is unlocked than was locked.
    pub fn consume_locked_asset(&mut self, symbol_id: SymbolId, amount: Decimal) -> Result<()> {
        let Some(position) = self.positions.get_mut(&symbol_id) else {
            return Err(ExchangeError::LockedUnderflow {
                requested: amount,
                locked: Decimal::ZERO,
            });
        };
        if position.locked < amount {
            return Err(ExchangeError::LockedUnderflow {
                requested: amount,
                locked: position.locked,
            });
        }
        position.locked -= amount;
        Ok(())
    }

    // =================================================================
    // Conservation support
    // =================================================================

    /// Total cash on this row (available + locked).
    #[must_use]
    pub fn cash_total(&self) -> Decimal {
        self.cash.total()
    }

    /// Per-symbol totals (amount + locked) for conservation sums.
    pub fn position_totals(&self) -> impl Iterator<Item = (SymbolId, Decimal)> + '_ {
        self.positions.iter().map(|(id, p)| (*id, p.total()))
    }
}
