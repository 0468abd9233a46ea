//! Concurrency hazards: simultaneous settlements against shared account
//! rows, racing cancels, and contended single-maker fills.
//!
//! These tests drive the engine from many threads. They assert the safety
//! properties (exactly-once, conservation, no negative balances) rather
//! than any particular interleaving.

use std::sync::Arc;
use std::thread;

use pairex_engine::{OrderRequest, SettlementEngine};
use pairex_types::{
    EngineConfig, ExchangeError, OrderSide, OrderStatus, Symbol, UserId,
};
use rust_decimal::Decimal;

fn dec(n: i64) -> Decimal {
    Decimal::new(n, 0)
}

fn submit(
    engine: &SettlementEngine,
    user_id: UserId,
    symbol: &Symbol,
    side: OrderSide,
    price: Decimal,
    amount: Decimal,
) -> pairex_engine::Placement {
    engine
        .submit_order(OrderRequest {
            user_id,
            symbol_id: symbol.id,
            side,
            price,
            amount,
        })
        .expect("placement should succeed")
}

#[test]
fn contended_single_maker_fills_exactly_once() {
    let engine = Arc::new(SettlementEngine::new(EngineConfig::default()));
    let symbol = engine.register_symbol("BTC");

    // One resting sell of 1 unit; eight buyers race to take it.
    let seller = UserId::new();
    engine.deposit_asset(seller, symbol.id, dec(1)).unwrap();
    let sell = submit(&engine, seller, &symbol, OrderSide::Sell, dec(100), dec(1));

    let buyers: Vec<UserId> = (0..8).map(|_| UserId::new()).collect();
    for buyer in &buyers {
        engine.deposit_cash(*buyer, dec(100)).unwrap();
    }

    let handles: Vec<_> = buyers
        .iter()
        .map(|buyer| {
            let engine = Arc::clone(&engine);
            let symbol = symbol.clone();
            let buyer = *buyer;
            thread::spawn(move || {
                engine
                    .submit_order(OrderRequest {
                        user_id: buyer,
                        symbol_id: symbol.id,
                        side: OrderSide::Buy,
                        price: dec(100),
                        amount: dec(1),
                    })
                    .expect("placement should succeed")
            })
        })
        .collect();
    let placements: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    // A loser whose inline match hit lock contention was parked on the
    // queue; drain it so every attempt has run to completion.
    engine.run_pending_matches().unwrap();

    // The sell filled exactly once, for exactly one buyer.
    assert_eq!(engine.trades().len(), 1);
    assert_eq!(engine.order(sell.order.id).unwrap().status, OrderStatus::Filled);
    let filled_buys = placements
        .iter()
        .filter(|p| engine.order(p.order.id).unwrap().status == OrderStatus::Filled)
        .count();
    assert_eq!(filled_buys, 1);

    // Losers keep their reservations on still-open orders.
    for placement in &placements {
        let order = engine.order(placement.order.id).unwrap();
        if order.status == OrderStatus::Open {
            let cash = engine.cash_balance(order.user_id).unwrap();
            assert_eq!(cash.locked, dec(100));
        }
    }

    engine.verify_conservation().unwrap();
}

#[test]
fn parallel_crossings_conserve_funds() {
    let engine = Arc::new(SettlementEngine::new(EngineConfig::default()));
    let symbol = engine.register_symbol("BTC");

    // One shared seller posts many sells; buyers take them in parallel —
    // concurrent settlements all mutate the same seller row.
    let seller = UserId::new();
    let pairs = 8;
    engine.deposit_asset(seller, symbol.id, dec(pairs)).unwrap();
    for _ in 0..pairs {
        submit(&engine, seller, &symbol, OrderSide::Sell, dec(100), dec(1));
    }

    let buyers: Vec<UserId> = (0..pairs).map(|_| UserId::new()).collect();
    for buyer in &buyers {
        engine.deposit_cash(*buyer, dec(100)).unwrap();
    }

    let handles: Vec<_> = buyers
        .iter()
        .map(|buyer| {
            let engine = Arc::clone(&engine);
            let symbol = symbol.clone();
            let buyer = *buyer;
            thread::spawn(move || {
                engine
                    .submit_order(OrderRequest {
                        user_id: buyer,
                        symbol_id: symbol.id,
                        side: OrderSide::Buy,
                        price: dec(100),
                        amount: dec(1),
                    })
                    .expect("placement should succeed")
            })
        })
        .collect();
    let placements: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    // Racing takers can select the same maker; the losers abort silently
    // and rest Open. Drain the conflict queue, then give every still-open
    // buy one sequential attempt — eligible sells remain for each.
    engine.run_pending_matches().unwrap();
    for placement in &placements {
        engine.run_match(placement.order.id).unwrap();
    }

    assert_eq!(engine.trades().len() as i64, pairs);

    // Seller received 100 × 0.985 per trade, and holds nothing locked.
    let seller_cash = engine.cash_balance(seller).unwrap();
    assert_eq!(seller_cash.available, Decimal::new(985, 1) * dec(pairs));
    assert!(engine.position(seller, symbol.id).unwrap().is_zero());

    // Every buyer owns exactly one unit.
    for buyer in &buyers {
        assert_eq!(engine.position(*buyer, symbol.id).unwrap().amount, dec(1));
        assert!(engine.cash_balance(*buyer).unwrap().is_zero());
    }

    engine.verify_conservation().unwrap();
}

#[test]
fn cancel_racing_match_never_double_spends() {
    // Run several rounds: a resting sell, one thread cancelling it while
    // another submits a crossing buy. Whatever wins, funds stay conserved
    // and the sell leaves Open exactly once.
    for _ in 0..10 {
        let engine = Arc::new(SettlementEngine::new(EngineConfig::default()));
        let symbol = engine.register_symbol("BTC");
        let seller = UserId::new();
        let buyer = UserId::new();
        engine.deposit_asset(seller, symbol.id, dec(1)).unwrap();
        engine.deposit_cash(buyer, dec(100)).unwrap();

        let sell = submit(&engine, seller, &symbol, OrderSide::Sell, dec(100), dec(1));
        let sell_id = sell.order.id;

        let canceller = {
            let engine = Arc::clone(&engine);
            thread::spawn(move || match engine.cancel_order(sell_id) {
                Ok(_) => true,
                Err(ExchangeError::InvalidState { .. }) => false,
                Err(other) => panic!("unexpected cancel failure: {other}"),
            })
        };
        let taker = {
            let engine = Arc::clone(&engine);
            let symbol = symbol.clone();
            thread::spawn(move || {
                engine
                    .submit_order(OrderRequest {
                        user_id: buyer,
                        symbol_id: symbol.id,
                        side: OrderSide::Buy,
                        price: dec(100),
                        amount: dec(1),
                    })
                    .expect("placement should succeed")
            })
        };

        let cancelled = canceller.join().unwrap();
        let placement = taker.join().unwrap();
        let matched = placement.trade.is_some();

        // The sell either cancelled or filled, never both.
        assert_ne!(cancelled, matched);
        let final_status = engine.order(sell_id).unwrap().status;
        if cancelled {
            assert_eq!(final_status, OrderStatus::Cancelled);
            // Seller got their unit back; buyer's order rests with its lock.
            assert_eq!(engine.position(seller, symbol.id).unwrap().amount, dec(1));
        } else {
            assert_eq!(final_status, OrderStatus::Filled);
            assert_eq!(engine.position(buyer, symbol.id).unwrap().amount, dec(1));
        }
        engine.verify_conservation().unwrap();
    }
}

#[test]
fn deferred_queue_drained_from_worker_thread() {
    let engine = Arc::new(SettlementEngine::new(EngineConfig {
        deferred_matching: true,
        ..EngineConfig::default()
    }));
    let symbol = engine.register_symbol("BTC");
    let buyer = UserId::new();
    let seller = UserId::new();
    engine.deposit_cash(buyer, dec(100)).unwrap();
    engine.deposit_asset(seller, symbol.id, dec(1)).unwrap();

    submit(&engine, buyer, &symbol, OrderSide::Buy, dec(100), dec(1));
    submit(&engine, seller, &symbol, OrderSide::Sell, dec(100), dec(1));
    assert!(engine.trades().is_empty());

    let worker = {
        let engine = Arc::clone(&engine);
        thread::spawn(move || engine.run_pending_matches().unwrap())
    };
    let settled = worker.join().unwrap();

    assert_eq!(settled.len(), 1);
    assert_eq!(engine.trades().len(), 1);
    engine.verify_conservation().unwrap();
}
