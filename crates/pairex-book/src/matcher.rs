//! Single-shot counter-order search with strict price-time priority.
//!
//! Given a newly Open taker order, [`find_maker`] selects at most one
//! eligible maker: opposite side, same symbol, still Open, crossing price,
//! **exactly** equal amount (no partial fills — any mismatch disqualifies),
//! and a different user. Among eligible candidates the best price wins
//! (lowest ask for a buy taker, highest bid for a sell taker), ties broken
//! by earliest insertion sequence.
//!
//! This is not a book-crossing loop: one invocation produces at most one
//! maker, and the returned order is an unlocked snapshot — the settlement
//! transaction re-verifies it under locks before any funds move.

use pairex_types::{Order, OrderSide};

use crate::store::OrderStore;

/// Whether `candidate` can be the maker for `taker`.
#[must_use]
pub fn is_eligible(taker: &Order, candidate: &Order) -> bool {
    candidate.side == taker.side.opposite()
        && candidate.symbol_id == taker.symbol_id
        && candidate.is_open()
        && taker.price_crosses(candidate.price)
        && candidate.amount == taker.amount
        && candidate.user_id != taker.user_id
}

/// Find the single best eligible maker for a taker order, if any.
#[must_use]
pub fn find_maker(store: &OrderStore, taker: &Order) -> Option<Order> {
    let maker = store
        .open_orders(taker.symbol_id)
        .into_iter()
        .filter(|candidate| is_eligible(taker, candidate))
        .min_by(|a, b| match taker.side {
            // Buy taker wants the cheapest sell; sell taker the highest bid.
            OrderSide::Buy => a.price.cmp(&b.price).then(a.sequence.cmp(&b.sequence)),
            OrderSide::Sell => b.price.cmp(&a.price).then(a.sequence.cmp(&b.sequence)),
        });

    if let Some(ref maker) = maker {
        tracing::debug!(
            taker = %taker.id,
            maker = %maker.id,
            maker_price = %maker.price,
            "Counter-order selected"
        );
    }
    maker
}

#[cfg(test)]
mod tests {
    use super::*;
    use pairex_types::{SymbolId, UserId};
    use rust_decimal::Decimal;

    fn dec(n: i64) -> Decimal {
        Decimal::new(n, 0)
    }

    fn seed(
        store: &OrderStore,
        symbol: SymbolId,
        side: OrderSide,
        price: Decimal,
        amount: Decimal,
    ) -> Order {
        store
            .insert(Order::dummy_for_user(
                UserId::new(),
                symbol,
                side,
                price,
                amount,
            ))
            .unwrap()
    }

    #[test]
    fn empty_store_no_match() {
        let store = OrderStore::new();
        let taker = Order::dummy(OrderSide::Buy, dec(100), Decimal::ONE);
        assert!(find_maker(&store, &taker).is_none());
    }

    #[test]
    fn crossing_sell_matches_buy_taker() {
        let store = OrderStore::new();
        let sym = SymbolId::new();
        let maker = seed(&store, sym, OrderSide::Sell, dec(99), Decimal::ONE);

        let taker = Order::dummy_for_user(UserId::new(), sym, OrderSide::Buy, dec(100), Decimal::ONE);
        let found = find_maker(&store, &taker).unwrap();
        assert_eq!(found.id, maker.id);
    }

    #[test]
    fn non_crossing_price_no_match() {
        let store = OrderStore::new();
        let sym = SymbolId::new();
        seed(&store, sym, OrderSide::Sell, dec(101), Decimal::ONE);

        let taker = Order::dummy_for_user(UserId::new(), sym, OrderSide::Buy, dec(100), Decimal::ONE);
        assert!(find_maker(&store, &taker).is_none());
    }

    #[test]
    fn amount_mismatch_disqualifies() {
        let store = OrderStore::new();
        let sym = SymbolId::new();
        // Off by the smallest representable unit: still no match.
        seed(
            &store,
            sym,
            OrderSide::Sell,
            dec(99),
            Decimal::ONE + Decimal::new(1, 18),
        );

        let taker = Order::dummy_for_user(UserId::new(), sym, OrderSide::Buy, dec(100), Decimal::ONE);
        assert!(find_maker(&store, &taker).is_none());
    }

    #[test]
    fn self_trade_prevented() {
        let store = OrderStore::new();
        let sym = SymbolId::new();
        let user = UserId::new();
        store
            .insert(Order::dummy_for_user(
                user,
                sym,
                OrderSide::Sell,
                dec(99),
                Decimal::ONE,
            ))
            .unwrap();

        let taker = Order::dummy_for_user(user, sym, OrderSide::Buy, dec(100), Decimal::ONE);
        assert!(find_maker(&store, &taker).is_none());
    }

    #[test]
    fn non_open_candidates_skipped() {
        let store = OrderStore::new();
        let sym = SymbolId::new();
        let maker = seed(&store, sym, OrderSide::Sell, dec(99), Decimal::ONE);
        store.mark_cancelled(maker.id).unwrap();

        let taker = Order::dummy_for_user(UserId::new(), sym, OrderSide::Buy, dec(100), Decimal::ONE);
        assert!(find_maker(&store, &taker).is_none());
    }

    #[test]
    fn best_price_beats_earlier_time() {
        let store = OrderStore::new();
        let sym = SymbolId::new();
        // M1 posted first at 95000, M2 later at 94000. A buy taker crossing
        // both must take the cheaper M2, not the older M1.
        let _m1 = seed(&store, sym, OrderSide::Sell, dec(95_000), Decimal::ONE);
        let m2 = seed(&store, sym, OrderSide::Sell, dec(94_000), Decimal::ONE);

        let taker =
            Order::dummy_for_user(UserId::new(), sym, OrderSide::Buy, dec(95_000), Decimal::ONE);
        let found = find_maker(&store, &taker).unwrap();
        assert_eq!(found.id, m2.id);
    }

    #[test]
    fn sell_taker_prefers_highest_bid() {
        let store = OrderStore::new();
        let sym = SymbolId::new();
        let _low = seed(&store, sym, OrderSide::Buy, dec(94_000), Decimal::ONE);
        let high = seed(&store, sym, OrderSide::Buy, dec(95_000), Decimal::ONE);

        let taker =
            Order::dummy_for_user(UserId::new(), sym, OrderSide::Sell, dec(94_000), Decimal::ONE);
        let found = find_maker(&store, &taker).unwrap();
        assert_eq!(found.id, high.id);
    }

    #[test]
    fn equal_price_ties_break_by_sequence() {
        let store = OrderStore::new();
        let sym = SymbolId::new();
        let first = seed(&store, sym, OrderSide::Sell, dec(100), Decimal::ONE);
        let _second = seed(&store, sym, OrderSide::Sell, dec(100), Decimal::ONE);

        let taker =
            Order::dummy_for_user(UserId::new(), sym, OrderSide::Buy, dec(100), Decimal::ONE);
        let found = find_maker(&store, &taker).unwrap();
        assert_eq!(found.id, first.id);
    }

    #[test]
    fn single_shot_returns_one_maker() {
        let store = OrderStore::new();
        let sym = SymbolId::new();
        seed(&store, sym, OrderSide::Sell, dec(99), Decimal::ONE);
        seed(&store, sym, OrderSide::Sell, dec(98), Decimal::ONE);
        seed(&store, sym, OrderSide::Sell, dec(97), Decimal::ONE);

        let taker =
            Order::dummy_for_user(UserId::new(), sym, OrderSide::Buy, dec(100), Decimal::ONE);
        // Only the single best candidate comes back, and nothing in the
        // store changes.
        let found = find_maker(&store, &taker).unwrap();
        assert_eq!(found.price, dec(97));
        assert_eq!(store.open_orders(sym).len(), 3);
    }
}
