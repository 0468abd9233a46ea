//! Balance tracking types for the Pairex ledger.
//!
//! Cash and asset holdings both split into an `available` part (usable for
//! new orders) and a `locked` part (reserved by open orders). Both parts are
//! non-negative at all times.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A user's cash balance in the quote currency.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CashBalance {
    /// Available for new buy orders.
    pub available: Decimal,
    /// Reserved by open buy orders.
    pub locked: Decimal,
}

impl CashBalance {
    /// Create a zero balance.
    #[must_use]
    pub fn new() -> Self {
        Self {
            available: Decimal::ZERO,
            locked: Decimal::ZERO,
        }
    }

    /// Total cash (available + locked).
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.available + self.locked
    }

    /// Whether this balance holds nothing.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.available.is_zero() && self.locked.is_zero()
    }
}

impl Default for CashBalance {
    fn default() -> Self {
        Self::new()
    }
}

/// A user's holding of the base asset for one symbol.
///
/// Created lazily on first acquisition; a user may hold zero positions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Position {
    /// Units available for new sell orders.
    pub amount: Decimal,
    /// Units reserved by open sell orders.
    pub locked: Decimal,
}

impl Position {
    /// Create an empty position.
    #[must_use]
    pub fn new() -> Self {
        Self {
            amount: Decimal::ZERO,
            locked: Decimal::ZERO,
        }
    }

    /// Total units held (available + locked).
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.amount + self.locked
    }

    /// Whether this position holds nothing.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.amount.is_zero() && self.locked.is_zero()
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::new()
    }
}
