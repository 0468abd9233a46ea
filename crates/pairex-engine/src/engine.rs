//! The settlement engine: order placement, cancellation, and atomic trade
//! execution.
//!
//! ## Serialization discipline
//!
//! Every order-status transition happens while the owner's account row lock
//! is held: placement and cancellation hold the owner's row, settlement
//! holds both rows (acquired in ascending user-id order). Any status
//! observed under those locks therefore cannot change until they are
//! released, which is what makes the lock-then-re-check steps below sound.
//!
//! ## Failure atomicity
//!
//! - `InsufficientFunds` aborts placement before the order exists; no
//!   reservation survives.
//! - A stale maker (no longer Open under lock) aborts the match silently;
//!   the taker stays Open and its reservation stays intact.
//! - Notification runs strictly after the trade is recorded and every lock
//!   is dropped; a failing notifier cannot affect settlement.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use parking_lot::RwLock;
use pairex_book::{OrderStore, find_maker};
use pairex_ledger::Ledger;
use pairex_types::{
    CashBalance, EngineConfig, ExchangeError, MatchNotification, Order, OrderId, OrderSide,
    Position, Result, Symbol, SymbolId, Trade, TradeId, UserId, decimal,
};
use rust_decimal::Decimal;

use crate::match_queue::MatchQueue;
use crate::notify::{NoopNotifier, Notifier};
use crate::read_model::{self, SymbolOrders};
use crate::trade_log::TradeLog;

/// A pre-validated order placement request. The caller guarantees positive
/// price and amount and a registered symbol; the engine does not re-validate.
#[derive(Debug, Clone)]
pub struct OrderRequest {
    pub user_id: UserId,
    pub symbol_id: SymbolId,
    pub side: OrderSide,
    pub price: Decimal,
    pub amount: Decimal,
}

/// Result of a placement: the created order and, when matching ran inline
/// and found a counterparty, the settled trade.
#[derive(Debug, Clone)]
pub struct Placement {
    pub order: Order,
    pub trade: Option<Trade>,
}

/// The Pairex settlement engine. All methods take `&self`; share the engine
/// across threads with an [`Arc`].
pub struct SettlementEngine {
    ledger: Ledger,
    store: OrderStore,
    trades: TradeLog,
    symbols: RwLock<HashMap<SymbolId, Symbol>>,
    queue: MatchQueue,
    notifier: Arc<dyn Notifier>,
    config: EngineConfig,
}

impl SettlementEngine {
    /// Create an engine with the given configuration and no notifier.
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Self::with_notifier(config, Arc::new(NoopNotifier))
    }

    /// Create an engine delivering notifications through `notifier`.
    #[must_use]
    pub fn with_notifier(config: EngineConfig, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            ledger: Ledger::with_lock_wait(config.lock_wait()),
            store: OrderStore::new(),
            trades: TradeLog::new(),
            symbols: RwLock::new(HashMap::new()),
            queue: MatchQueue::new(),
            notifier,
            config,
        }
    }

    // =================================================================
    // Funding and symbols
    // =================================================================

    /// Register a trading symbol and return it.
    pub fn register_symbol(&self, name: impl Into<String>) -> Symbol {
        let symbol = Symbol::new(name);
        self.symbols.write().insert(symbol.id, symbol.clone());
        symbol
    }

    /// Look up a registered symbol.
    ///
    /// # Errors
    /// Returns `Internal` for an unregistered id — symbol validity is the
    /// caller's contract.
    pub fn symbol(&self, symbol_id: SymbolId) -> Result<Symbol> {
        self.symbols
            .read()
            .get(&symbol_id)
            .cloned()
            .ok_or_else(|| ExchangeError::Internal(format!("unregistered symbol: {symbol_id}")))
    }

    /// Deposit cash for a user, creating their account if needed.
    pub fn deposit_cash(&self, user_id: UserId, amount: Decimal) -> Result<()> {
        self.ledger.deposit_cash(user_id, amount)
    }

    /// Deposit base units of a symbol for a user.
    pub fn deposit_asset(&self, user_id: UserId, symbol_id: SymbolId, amount: Decimal) -> Result<()> {
        self.ledger.deposit_asset(user_id, symbol_id, amount)
    }

    // =================================================================
    // Placement
    // =================================================================

    /// Place an order: reserve funds and create the Open order as one unit,
    /// then attempt matching (inline or deferred per configuration).
    ///
    /// # Errors
    /// - `AccountNotFound` if the user has no ledger account
    /// - `InsufficientFunds` if the reservation fails — nothing is created
    /// - `ConcurrencyConflict` if the account row cannot be locked in time
    pub fn submit_order(&self, request: OrderRequest) -> Result<Placement> {
        let order = Order::new(
            request.user_id,
            request.symbol_id,
            request.side,
            request.price,
            request.amount,
        );
        let reserved = order.reserved()?;

        let row = self.ledger.row(request.user_id)?;
        let order = {
            let mut account = self.ledger.lock_row(&row, request.user_id)?;
            match request.side {
                OrderSide::Buy => account.reserve_cash(reserved)?,
                OrderSide::Sell => account.reserve_asset(request.symbol_id, reserved)?,
            }
            // A fresh UUIDv7 cannot collide, so insertion cannot fail after
            // the reservation succeeded.
            self.store.insert(order)?
        };
        tracing::info!(
            order = %order.id,
            user = %order.user_id,
            side = %order.side,
            price = %order.price,
            amount = %order.amount,
            "Order placed"
        );

        let trade = if self.config.deferred_matching {
            self.queue.push(order.id);
            None
        } else {
            match self.run_match(order.id) {
                Ok(trade) => trade,
                Err(err @ ExchangeError::ConcurrencyConflict { .. }) => {
                    // The placement is committed; retry only the match.
                    tracing::warn!(order = %order.id, error = %err, "Match deferred after lock conflict");
                    self.queue.push(order.id);
                    None
                }
                Err(err) => return Err(err),
            }
        };

        // Refresh: a match flips the order to Filled.
        let order = self.store.get(order.id)?;
        Ok(Placement { order, trade })
    }

    // =================================================================
    // Cancellation
    // =================================================================

    /// Cancel an Open order and release exactly what it reserved.
    ///
    /// Ownership is the caller's responsibility; the engine checks only
    /// order state. A repeat cancel fails with `InvalidState` and releases
    /// nothing.
    ///
    /// # Errors
    /// - `OrderNotFound` if the order does not exist
    /// - `InvalidState` if the order already left Open
    /// - `ConcurrencyConflict` if the account row cannot be locked in time
    pub fn cancel_order(&self, order_id: OrderId) -> Result<Order> {
        let snapshot = self.store.get(order_id)?;
        let row = self.ledger.row(snapshot.user_id)?;
        let mut account = self.ledger.lock_row(&row, snapshot.user_id)?;

        // The transition is the serialization point: it re-checks Open under
        // the store's write lock, so a racing fill or second cancel loses
        // here, before any funds move.
        let cancelled = self.store.mark_cancelled(order_id)?;
        let reserved = cancelled.reserved()?;
        match cancelled.side {
            OrderSide::Buy => account.release_cash(reserved)?,
            OrderSide::Sell => account.release_asset(cancelled.symbol_id, reserved)?,
        }
        tracing::info!(order = %cancelled.id, released = %reserved, "Order cancelled");
        Ok(cancelled)
    }

    // =================================================================
    // Matching and settlement
    // =================================================================

    /// Run one matching attempt for an order. Idempotent: an order that is
    /// missing or already left Open is a silent no-op, so deferred or
    /// re-delivered attempts are harmless.
    ///
    /// # Errors
    /// Propagates lock conflicts and ledger invariant breaches from
    /// settlement; eligibility races are not errors.
    pub fn run_match(&self, order_id: OrderId) -> Result<Option<Trade>> {
        let Ok(taker) = self.store.get(order_id) else {
            return Ok(None);
        };
        if !taker.is_open() {
            return Ok(None);
        }
        let Some(maker) = find_maker(&self.store, &taker) else {
            return Ok(None);
        };
        self.execute_trade(&taker, &maker)
    }

    /// Drain the deferred-match queue, running one attempt per order.
    ///
    /// # Errors
    /// Stops at the first settlement error, re-queueing the failed attempt
    /// and the untouched remainder so a later drain picks them up.
    pub fn run_pending_matches(&self) -> Result<Vec<Trade>> {
        let mut settled = Vec::new();
        let backlog = self.queue.drain();
        for (index, order_id) in backlog.iter().enumerate() {
            match self.run_match(*order_id) {
                Ok(Some(trade)) => settled.push(trade),
                Ok(None) => {}
                Err(err) => {
                    for id in &backlog[index..] {
                        self.queue.push(*id);
                    }
                    return Err(err);
                }
            }
        }
        Ok(settled)
    }

    /// Execute a matched pair inside one atomic unit: both account rows
    /// locked (ascending user id), both orders re-verified Open, cash and
    /// asset legs settled, trade recorded, both orders marked Filled.
    /// Participants are notified after the locks drop.
    fn execute_trade(&self, taker: &Order, maker: &Order) -> Result<Option<Trade>> {
        // Exactly one of the pair is the buy side; the matcher only pairs
        // opposite sides.
        let (buy, sell) = if taker.side == OrderSide::Buy {
            (taker, maker)
        } else {
            (maker, taker)
        };

        let buyer_row = self.ledger.row(buy.user_id)?;
        let seller_row = self.ledger.row(sell.user_id)?;
        let (mut buyer, mut seller) =
            self.ledger
                .lock_pair(&buyer_row, buy.user_id, &seller_row, sell.user_id)?;

        // Re-check under the locks: either side may have been filled or
        // cancelled since the unlocked scan. Abort silently — the taker
        // stays Open for a later attempt.
        let buy_now = self.store.get(buy.id)?;
        let sell_now = self.store.get(sell.id)?;
        if !buy_now.is_open() || !sell_now.is_open() {
            tracing::debug!(
                buy = %buy.id,
                sell = %sell.id,
                "Match abandoned: order left Open before settlement"
            );
            return Ok(None);
        }

        // The maker's limit sets the execution price; amounts are equal by
        // eligibility.
        let execution_price = maker.price;
        let amount = buy_now.amount;
        let trade_value = decimal::mul(execution_price, amount)?;
        let commission = decimal::mul(trade_value, self.config.commission_rate)?;
        let locked_by_buyer = buy_now.reserved()?;

        self.ledger.settle_cash(
            &mut buyer,
            &mut seller,
            locked_by_buyer,
            trade_value,
            commission,
        )?;
        self.ledger
            .settle_asset(&mut seller, &mut buyer, buy_now.symbol_id, amount)?;

        let trade = Trade {
            id: TradeId::from_pair(buy.id, sell.id),
            buy_order_id: buy.id,
            sell_order_id: sell.id,
            buyer_id: buy.user_id,
            seller_id: sell.user_id,
            symbol_id: buy_now.symbol_id,
            price: execution_price,
            amount,
            commission,
            created_at: Utc::now(),
        };
        self.trades.record(trade.clone())?;
        let filled_buy = self.store.mark_filled(buy.id)?;
        let filled_sell = self.store.mark_filled(sell.id)?;

        drop((buyer, seller));

        tracing::info!(
            trade = %trade.id,
            buyer = %trade.buyer_id,
            seller = %trade.seller_id,
            price = %trade.price,
            amount = %trade.amount,
            commission = %trade.commission,
            "Trade settled"
        );

        self.notifier
            .order_matched(&MatchNotification::for_participant(&filled_buy, &trade));
        self.notifier
            .order_matched(&MatchNotification::for_participant(&filled_sell, &trade));

        Ok(Some(trade))
    }

    // =================================================================
    // Queries
    // =================================================================

    /// Snapshot of one order.
    pub fn order(&self, order_id: OrderId) -> Result<Order> {
        self.store.get(order_id)
    }

    /// Snapshot of a user's cash balance.
    pub fn cash_balance(&self, user_id: UserId) -> Result<CashBalance> {
        self.ledger.cash_balance(user_id)
    }

    /// Snapshot of a user's position for a symbol.
    pub fn position(&self, user_id: UserId, symbol_id: SymbolId) -> Result<Position> {
        self.ledger.position(user_id, symbol_id)
    }

    /// Commission accrued to the platform pool.
    #[must_use]
    pub fn commission_pool(&self) -> Decimal {
        self.ledger.commission_pool()
    }

    /// All settled trades, in settlement order.
    #[must_use]
    pub fn trades(&self) -> Vec<Trade> {
        self.trades.all()
    }

    /// Pending deferred-match backlog size.
    #[must_use]
    pub fn pending_matches(&self) -> usize {
        self.queue.len()
    }

    /// A user's orders for a symbol, annotated with execution data for
    /// filled sells (see [`read_model`]).
    pub fn orders_for_symbol(&self, user_id: UserId, symbol_id: SymbolId) -> Result<SymbolOrders> {
        let symbol = self.symbol(symbol_id)?;
        let orders = self.store.orders_for_user(user_id, symbol_id);
        Ok(read_model::build(&symbol, orders, |order_id| {
            self.trades.by_sell_order(order_id)
        }))
    }

    /// Verify conservation of funds across the whole ledger.
    pub fn verify_conservation(&self) -> Result<()> {
        self.ledger.verify_conservation()
    }
}
