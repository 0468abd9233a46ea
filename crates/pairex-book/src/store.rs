//! The order store: every order row with its Open → {Filled, Cancelled}
//! state machine.
//!
//! Status transitions happen only under the store's write lock, and every
//! transition re-checks `status == Open` under that lock before mutating —
//! a row fetched earlier without the lock may have left Open in the
//! meantime. A second cancel or fill attempt is rejected with
//! `InvalidState` and mutates nothing.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use pairex_types::{ExchangeError, Order, OrderId, OrderStatus, Result, SymbolId, UserId};

/// In-memory order store for the single trading pair service.
pub struct OrderStore {
    orders: RwLock<HashMap<OrderId, Order>>,
    /// Monotonic insertion sequence; the matcher's secondary tie-break.
    sequence: AtomicU64,
}

impl OrderStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            orders: RwLock::new(HashMap::new()),
            sequence: AtomicU64::new(1),
        }
    }

    /// Insert a new Open order, assigning its sequence number.
    ///
    /// The caller must have already reserved the order's funds.
    ///
    /// # Errors
    /// Returns `DuplicateOrder` if the id is already present.
    pub fn insert(&self, mut order: Order) -> Result<Order> {
        let mut orders = self.orders.write();
        if orders.contains_key(&order.id) {
            return Err(ExchangeError::DuplicateOrder(order.id));
        }
        order.sequence = self.sequence.fetch_add(1, Ordering::Relaxed);
        orders.insert(order.id, order.clone());
        Ok(order)
    }

    /// Snapshot of one order.
    ///
    /// # Errors
    /// Returns `OrderNotFound` if absent.
    pub fn get(&self, order_id: OrderId) -> Result<Order> {
        self.orders
            .read()
            .get(&order_id)
            .cloned()
            .ok_or(ExchangeError::OrderNotFound(order_id))
    }

    /// Transition an order Open → Filled under the write lock.
    ///
    /// # Errors
    /// - `OrderNotFound` if absent
    /// - `InvalidState` if the order already left Open
    pub fn mark_filled(&self, order_id: OrderId) -> Result<Order> {
        self.transition(order_id, OrderStatus::Filled)
    }

    /// Transition an order Open → Cancelled under the write lock.
    ///
    /// # Errors
    /// - `OrderNotFound` if absent
    /// - `InvalidState` if the order already left Open
    pub fn mark_cancelled(&self, order_id: OrderId) -> Result<Order> {
        self.transition(order_id, OrderStatus::Cancelled)
    }

    fn transition(&self, order_id: OrderId, to: OrderStatus) -> Result<Order> {
        let mut orders = self.orders.write();
        let order = orders
            .get_mut(&order_id)
            .ok_or(ExchangeError::OrderNotFound(order_id))?;
        if order.status != OrderStatus::Open {
            return Err(ExchangeError::InvalidState {
                actual: order.status,
            });
        }
        order.status = to;
        Ok(order.clone())
    }

    /// Snapshot of all Open orders for a symbol, for the matcher scan.
    /// The snapshot is unlocked — settlement re-verifies any candidate
    /// under locks before acting on it.
    #[must_use]
    pub fn open_orders(&self, symbol_id: SymbolId) -> Vec<Order> {
        self.orders
            .read()
            .values()
            .filter(|o| o.symbol_id == symbol_id && o.is_open())
            .cloned()
            .collect()
    }

    /// Snapshot of every order a user has for a symbol (any status),
    /// for the read model.
    #[must_use]
    pub fn orders_for_user(&self, user_id: UserId, symbol_id: SymbolId) -> Vec<Order> {
        self.orders
            .read()
            .values()
            .filter(|o| o.symbol_id == symbol_id && o.user_id == user_id)
            .cloned()
            .collect()
    }

    /// Number of orders in the store.
    #[must_use]
    pub fn len(&self) -> usize {
        self.orders.read().len()
    }

    /// Whether the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.orders.read().is_empty()
    }
}

impl Default for OrderStore {
    fn default() -> Self {
        Self::new()
    }
}
