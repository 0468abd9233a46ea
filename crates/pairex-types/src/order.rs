//! Order types for the Pairex settlement core.
//!
//! An order is created `Open` with its funds already reserved, and leaves
//! `Open` exactly once — to `Filled` (paired with a trade) or to `Cancelled`
//! (paired with a fund release). Once non-Open it is immutable.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{ExchangeError, OrderId, Result, SymbolId, UserId, decimal};

/// Which side of the pair this order is on.
///
/// The wire contract encodes sides as integers (1=Buy, 2=Sell).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    /// The opposite side, used by the matcher to select counter-orders.
    #[must_use]
    pub fn opposite(self) -> Self {
        match self {
            Self::Buy => Self::Sell,
            Self::Sell => Self::Buy,
        }
    }
}

impl std::fmt::Display for OrderSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Buy => write!(f, "BUY"),
            Self::Sell => write!(f, "SELL"),
        }
    }
}

impl TryFrom<i32> for OrderSide {
    type Error = ExchangeError;

    fn try_from(value: i32) -> Result<Self> {
        match value {
            1 => Ok(Self::Buy),
            2 => Ok(Self::Sell),
            other => Err(ExchangeError::Internal(format!(
                "unknown order side code: {other}"
            ))),
        }
    }
}

impl From<OrderSide> for i32 {
    fn from(side: OrderSide) -> Self {
        match side {
            OrderSide::Buy => 1,
            OrderSide::Sell => 2,
        }
    }
}

/// Lifecycle status of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum OrderStatus {
    Open,
    Filled,
    Cancelled,
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open => write!(f, "OPEN"),
            Self::Filled => write!(f, "FILLED"),
            Self::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

/// A limit order against the single trading pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub symbol_id: SymbolId,
    pub side: OrderSide,
    /// Limit price in quote currency, scale 18.
    pub price: Decimal,
    /// Order size in base units, scale 18.
    pub amount: Decimal,
    pub status: OrderStatus,
    /// Store-assigned monotonic sequence; the secondary tie-break after
    /// price. Assigned once at insertion, never reused.
    pub sequence: u64,
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Create a new `Open` order. `sequence` is assigned by the order store
    /// at insertion; until then it is zero.
    #[must_use]
    pub fn new(
        user_id: UserId,
        symbol_id: SymbolId,
        side: OrderSide,
        price: Decimal,
        amount: Decimal,
    ) -> Self {
        Self {
            id: OrderId::new(),
            user_id,
            symbol_id,
            side,
            price: decimal::to_scale(price),
            amount: decimal::to_scale(amount),
            status: OrderStatus::Open,
            sequence: 0,
            created_at: Utc::now(),
        }
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.status == OrderStatus::Open
    }

    /// The amount this order reserved at placement: `price × amount` cash
    /// for a buy, `amount` base units for a sell. Cancellation and
    /// settlement release exactly this value, never a live recomputation
    /// from fresher data.
    pub fn reserved(&self) -> Result<Decimal> {
        match self.side {
            OrderSide::Buy => decimal::mul(self.price, self.amount),
            OrderSide::Sell => Ok(self.amount),
        }
    }

    /// Whether this order's limit price crosses a counter-order's price.
    #[must_use]
    pub fn price_crosses(&self, counter_price: Decimal) -> bool {
        match self.side {
            OrderSide::Buy => counter_price <= self.price,
            OrderSide::Sell => counter_price >= self.price,
        }
    }
}

impl std::fmt::Display for Order {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Order[{}] {} {} @ {} ({})",
            self.id, self.side, self.amount, self.price, self.status,
        )
    }
}

/// Test helpers.
#[cfg(any(test, feature = "test-helpers"))]
impl Order {
    pub fn dummy(side: OrderSide, price: Decimal, amount: Decimal) -> Self {
        Self::new(UserId::new(), SymbolId::new(), side, price, amount)
    }

    pub fn dummy_for_user(
        user_id: UserId,
        symbol_id: SymbolId,
        side: OrderSide,
        price: Decimal,
        amount: Decimal,
    ) -> Self {
        Self::new(user_id, symbol_id, side, price, amount)
    }
}
