//! Append-only trade log with an exactly-once settlement guard.
//!
//! Like a UTXO set: each order can back at most one trade. Recording a
//! trade whose buy or sell order was already settled fails with
//! `AlreadySettled` — the backstop for the exactly-once invariant when the
//! status state machine has been bypassed by a bug. Trades are never
//! updated or deleted.

use std::collections::HashSet;

use parking_lot::{Mutex, RwLock};
use pairex_types::{ExchangeError, OrderId, Result, Trade, TradeId};
use rust_decimal::Decimal;

/// Append-only store of settled trades.
#[derive(Debug, Default)]
pub struct TradeLog {
    trades: RwLock<Vec<Trade>>,
    /// Orders that already back a trade, buy and sell side alike.
    settled_orders: Mutex<HashSet<OrderId>>,
}

impl TradeLog {
    /// Create an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a trade. Both orders are marked settled atomically with the
    /// append; a repeat of either order id is rejected before anything is
    /// written.
    ///
    /// # Errors
    /// Returns `AlreadySettled` naming the offending order.
    pub fn record(&self, trade: Trade) -> Result<()> {
        let mut settled = self.settled_orders.lock();
        if settled.contains(&trade.buy_order_id) {
            return Err(ExchangeError::AlreadySettled(trade.buy_order_id));
        }
        if settled.contains(&trade.sell_order_id) {
            return Err(ExchangeError::AlreadySettled(trade.sell_order_id));
        }
        settled.insert(trade.buy_order_id);
        settled.insert(trade.sell_order_id);
        self.trades.write().push(trade);
        Ok(())
    }

    /// Look up a trade by id.
    #[must_use]
    pub fn get(&self, trade_id: TradeId) -> Option<Trade> {
        self.trades
            .read()
            .iter()
            .find(|t| t.id == trade_id)
            .cloned()
    }

    /// The trade settled against a given sell order, if any. Used by the
    /// read model to surface execution price and commission on filled
    /// sell orders.
    #[must_use]
    pub fn by_sell_order(&self, order_id: OrderId) -> Option<Trade> {
        self.trades
            .read()
            .iter()
            .find(|t| t.sell_order_id == order_id)
            .cloned()
    }

    /// Snapshot of every trade, in settlement order.
    #[must_use]
    pub fn all(&self) -> Vec<Trade> {
        self.trades.read().clone()
    }

    /// Total commission across all settled trades.
    #[must_use]
    pub fn total_commission(&self) -> Decimal {
        self.trades.read().iter().map(|t| t.commission).sum()
    }

    /// Number of settled trades.
    #[must_use]
    pub fn len(&self) -> usize {
        self.trades.read().len()
    }

    /// Whether no trade has settled yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.trades.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use pairex_types::{SymbolId, UserId};

    fn make_trade(buy: OrderId, sell: OrderId) -> Trade {
        Trade {
            id: TradeId::from_pair(buy, sell),
            buy_order_id: buy,
            sell_order_id: sell,
            buyer_id: UserId::new(),
            seller_id: UserId::new(),
            symbol_id: SymbolId::new(),
            price: Decimal::new(95_000, 0),
            amount: Decimal::new(1, 2),
            commission: Decimal::new(1425, 2),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn record_and_query() {
        let log = TradeLog::new();
        let trade = make_trade(OrderId::new(), OrderId::new());
        log.record(trade.clone()).unwrap();

        assert_eq!(log.len(), 1);
        assert_eq!(log.get(trade.id).unwrap().id, trade.id);
        assert_eq!(
            log.by_sell_order(trade.sell_order_id).unwrap().id,
            trade.id
        );
    }

    #[test]
    fn repeat_buy_order_rejected() {
        let log = TradeLog::new();
        let buy = OrderId::new();
        log.record(make_trade(buy, OrderId::new())).unwrap();

        let err = log.record(make_trade(buy, OrderId::new())).unwrap_err();
        assert!(matches!(err, ExchangeError::AlreadySettled(id) if id == buy));
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn repeat_sell_order_rejected() {
        let log = TradeLog::new();
        let sell = OrderId::new();
        log.record(make_trade(OrderId::new(), sell)).unwrap();

        let err = log.record(make_trade(OrderId::new(), sell)).unwrap_err();
        assert!(matches!(err, ExchangeError::AlreadySettled(id) if id == sell));
    }

    #[test]
    fn rejected_record_writes_nothing() {
        let log = TradeLog::new();
        let buy = OrderId::new();
        let sell = OrderId::new();
        log.record(make_trade(buy, OrderId::new())).unwrap();

        // buy repeats, sell is fresh: sell must remain unsettled afterward.
        assert!(log.record(make_trade(buy, sell)).is_err());
        assert!(log.record(make_trade(OrderId::new(), sell)).is_ok());
    }

    #[test]
    fn total_commission_sums() {
        let log = TradeLog::new();
        log.record(make_trade(OrderId::new(), OrderId::new()))
            .unwrap();
        log.record(make_trade(OrderId::new(), OrderId::new()))
            .unwrap();
        assert_eq!(log.total_commission(), Decimal::new(2850, 2));
    }

    #[test]
    fn unknown_lookups_are_none() {
        let log = TradeLog::new();
        assert!(log.get(TradeId::new()).is_none());
        assert!(log.by_sell_order(OrderId::new()).is_none());
        assert!(log.is_empty());
    }
}
