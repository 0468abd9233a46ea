//! Read model: a user's orders for a symbol, annotated with execution data.
//!
//! Each row carries the order's own limit `price` plus, for a filled sell
//! order only, the `executed_price` and `commission` taken from the
//! associated trade — the execution price can differ from the listed price
//! when the counter-order set the price as maker. Rows are ordered by price
//! descending, then placement time ascending, and split into buy/sell lists.

use chrono::{DateTime, Utc};
use pairex_types::{Order, OrderId, OrderSide, OrderStatus, Symbol, Trade};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One order row as exposed to collaborators.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderView {
    pub id: OrderId,
    pub side: OrderSide,
    /// The order's own limit price.
    pub price: Decimal,
    pub amount: Decimal,
    pub status: OrderStatus,
    /// Actual execution price; populated only for a filled sell order.
    pub executed_price: Option<Decimal>,
    /// Commission charged at settlement; populated only for a filled sell
    /// order.
    pub commission: Option<Decimal>,
    pub created_at: DateTime<Utc>,
}

/// A user's orders for one symbol, split by side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymbolOrders {
    pub symbol: String,
    pub buy_orders: Vec<OrderView>,
    pub sell_orders: Vec<OrderView>,
}

/// Assemble the read model from order snapshots and a trade lookup keyed by
/// sell order id.
pub fn build<F>(symbol: &Symbol, mut orders: Vec<Order>, trade_for_sell: F) -> SymbolOrders
where
    F: Fn(OrderId) -> Option<Trade>,
{
    orders.sort_by(|a, b| {
        b.price
            .cmp(&a.price)
            .then(a.created_at.cmp(&b.created_at))
    });

    let mut buy_orders = Vec::new();
    let mut sell_orders = Vec::new();
    for order in orders {
        let trade = match (order.side, order.status) {
            (OrderSide::Sell, OrderStatus::Filled) => trade_for_sell(order.id),
            _ => None,
        };
        let view = OrderView {
            id: order.id,
            side: order.side,
            price: order.price,
            amount: order.amount,
            status: order.status,
            executed_price: trade.as_ref().map(|t| t.price),
            commission: trade.as_ref().map(|t| t.commission),
            created_at: order.created_at,
        };
        match order.side {
            OrderSide::Buy => buy_orders.push(view),
            OrderSide::Sell => sell_orders.push(view),
        }
    }

    SymbolOrders {
        symbol: symbol.name.clone(),
        buy_orders,
        sell_orders,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pairex_types::{SymbolId, TradeId, UserId};

    fn dec(n: i64) -> Decimal {
        Decimal::new(n, 0)
    }

    #[test]
    fn filled_sell_carries_execution_data() {
        let symbol = Symbol::new("BTC");
        let user = UserId::new();
        let mut sell = Order::dummy_for_user(
            user,
            symbol.id,
            OrderSide::Sell,
            dec(90_000),
            Decimal::ONE,
        );
        sell.status = OrderStatus::Filled;

        let trade = Trade {
            id: TradeId::new(),
            buy_order_id: OrderId::new(),
            sell_order_id: sell.id,
            buyer_id: UserId::new(),
            seller_id: user,
            symbol_id: symbol.id,
            price: dec(100_000), // maker buy order set the price
            amount: Decimal::ONE,
            commission: dec(1500),
            created_at: Utc::now(),
        };

        let sell_id = sell.id;
        let model = build(&symbol, vec![sell], |id| {
            (id == sell_id).then(|| trade.clone())
        });

        assert_eq!(model.symbol, "BTC");
        let view = &model.sell_orders[0];
        assert_eq!(view.price, dec(90_000));
        assert_eq!(view.executed_price, Some(dec(100_000)));
        assert_eq!(view.commission, Some(dec(1500)));
    }

    #[test]
    fn open_and_buy_orders_have_no_execution_data() {
        let symbol = Symbol::new("BTC");
        let user = UserId::new();
        let open_sell =
            Order::dummy_for_user(user, symbol.id, OrderSide::Sell, dec(100), Decimal::ONE);
        let mut filled_buy =
            Order::dummy_for_user(user, symbol.id, OrderSide::Buy, dec(100), Decimal::ONE);
        filled_buy.status = OrderStatus::Filled;

        let model = build(&symbol, vec![open_sell, filled_buy], |_| {
            panic!("lookup must only run for filled sells")
        });

        assert!(model.sell_orders[0].executed_price.is_none());
        assert!(model.buy_orders[0].executed_price.is_none());
        assert!(model.buy_orders[0].commission.is_none());
    }

    #[test]
    fn view_serializes_nullable_execution_fields() {
        let symbol = Symbol::new("BTC");
        let user = UserId::new();
        let open = Order::dummy_for_user(user, symbol.id, OrderSide::Sell, dec(100), Decimal::ONE);
        let model = build(&symbol, vec![open], |_| None);

        // The boundary contract exposes executed_price/commission as nulls
        // until a sell fills.
        let json = serde_json::to_value(&model).unwrap();
        let row = &json["sell_orders"][0];
        assert!(row["executed_price"].is_null());
        assert!(row["commission"].is_null());
        assert_eq!(row["status"], "Open");

        let back: SymbolOrders = serde_json::from_value(json).unwrap();
        assert_eq!(back.symbol, "BTC");
    }

    #[test]
    fn rows_sort_price_desc_then_time_asc() {
        let symbol = Symbol::new("BTC");
        let user = UserId::new();
        let low = Order::dummy_for_user(user, symbol.id, OrderSide::Buy, dec(90), Decimal::ONE);
        let high_a = Order::dummy_for_user(user, symbol.id, OrderSide::Buy, dec(95), Decimal::ONE);
        let high_b = Order::dummy_for_user(user, symbol.id, OrderSide::Buy, dec(95), Decimal::ONE);

        let model = build(
            &symbol,
            vec![low.clone(), high_b.clone(), high_a.clone()],
            |_| None,
        );
        let ids: Vec<OrderId> = model.buy_orders.iter().map(|v| v.id).collect();
        let high_pair = if high_a.created_at <= high_b.created_at {
            [high_a.id, high_b.id]
        } else {
            [high_b.id, high_a.id]
        };
        assert_eq!(ids, vec![high_pair[0], high_pair[1], low.id]);
    }
}
