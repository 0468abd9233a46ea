//! Trade types produced by the Pairex settlement engine.
//!
//! A [`Trade`] is the immutable settlement record of one match: created
//! exactly once per matched pair, never updated or deleted.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{OrderId, SymbolId, TradeId, UserId};

/// Immutable record of a settled match between one buy and one sell order.
///
/// `price` is the execution price — always the maker's limit price.
/// `commission` was deducted from the seller's proceeds at settlement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trade {
    pub id: TradeId,
    pub buy_order_id: OrderId,
    pub sell_order_id: OrderId,
    pub buyer_id: UserId,
    pub seller_id: UserId,
    pub symbol_id: SymbolId,
    /// Execution price (maker's limit), scale 18.
    pub price: Decimal,
    /// Settled amount in base units, scale 18.
    pub amount: Decimal,
    /// Platform fee taken from the seller's proceeds, scale 18.
    pub commission: Decimal,
    pub created_at: DateTime<Utc>,
}

impl Trade {
    /// What the seller received for a given trade value: the value minus
    /// the commission recorded at settlement. Takes the settled value rather
    /// than recomputing `price × amount`, so display never drifts from what
    /// the ledger actually moved.
    #[must_use]
    pub fn seller_proceeds(&self, trade_value: Decimal) -> Decimal {
        trade_value - self.commission
    }
}

impl std::fmt::Display for Trade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Trade[{}] {} @ {} (commission {})",
            self.id, self.amount, self.price, self.commission,
        )
    }
}
