//! Notification payloads delivered to trade participants.
//!
//! After a trade commits, the engine notifies each participant once, on that
//! participant's own channel, with their own order plus the shared trade.
//! Delivery happens strictly after commit and outside every lock.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{Order, OrderId, OrderSide, OrderStatus, Trade, TradeId, UserId};

/// The participant's view of their own order inside a notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderSummary {
    pub id: OrderId,
    pub side: OrderSide,
    pub price: Decimal,
    pub amount: Decimal,
    pub status: OrderStatus,
}

impl From<&Order> for OrderSummary {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id,
            side: order.side,
            price: order.price,
            amount: order.amount,
            status: order.status,
        }
    }
}

/// The shared view of the executed trade inside a notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeSummary {
    pub id: TradeId,
    pub price: Decimal,
    pub amount: Decimal,
    pub commission: Decimal,
    pub created_at: DateTime<Utc>,
}

impl From<&Trade> for TradeSummary {
    fn from(trade: &Trade) -> Self {
        Self {
            id: trade.id,
            price: trade.price,
            amount: trade.amount,
            commission: trade.commission,
            created_at: trade.created_at,
        }
    }
}

/// One participant's notification for one executed trade. Addressed to
/// `user_id` only — never broadcast to the counterparty's channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchNotification {
    pub user_id: UserId,
    pub order: OrderSummary,
    pub trade: TradeSummary,
}

impl MatchNotification {
    /// Build the notification for one participant from their own (already
    /// Filled) order and the shared trade record.
    #[must_use]
    pub fn for_participant(order: &Order, trade: &Trade) -> Self {
        Self {
            user_id: order.user_id,
            order: OrderSummary::from(order),
            trade: TradeSummary::from(trade),
        }
    }
}
