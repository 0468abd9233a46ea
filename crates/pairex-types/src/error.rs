//! Error types for the Pairex settlement core.
//!
//! All errors use the `PX_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by subsystem:
//! - 1xx: Order errors
//! - 2xx: Balance errors
//! - 3xx: Concurrency errors
//! - 6xx: Settlement errors
//! - 8xx: Invariant violations (bugs, never user errors)
//! - 9xx: General / internal errors
//!
//! The 1xx–6xx variants are user-facing rejections: the operation is refused
//! and no state changes. The 8xx variants mean the ledger/order pairing
//! discipline was broken — callers must halt the operation, never continue.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::{OrderId, OrderStatus, UserId};

/// Central error enum for all Pairex operations.
#[derive(Debug, Error)]
pub enum ExchangeError {
    // =================================================================
    // Order Errors (1xx)
    // =================================================================
    /// The requested order does not exist.
    #[error("PX_ERR_100: Order not found: {0}")]
    OrderNotFound(OrderId),

    /// The order is not in the state the operation requires.
    #[error("PX_ERR_101: Invalid order state: expected OPEN, got {actual}")]
    InvalidState { actual: OrderStatus },

    /// An order with this ID already exists in the store.
    #[error("PX_ERR_102: Order already exists: {0}")]
    DuplicateOrder(OrderId),

    // =================================================================
    // Balance Errors (2xx)
    // =================================================================
    /// Not enough available balance (cash or asset) to reserve.
    #[error("PX_ERR_200: Insufficient funds: need {needed}, have {available}")]
    InsufficientFunds { needed: Decimal, available: Decimal },

    /// No ledger account exists for this user.
    #[error("PX_ERR_201: Account not found: {0}")]
    AccountNotFound(UserId),

    // =================================================================
    // Concurrency Errors (3xx)
    // =================================================================
    /// A row lock could not be acquired within the wait budget.
    /// The caller should retry the whole operation from scratch.
    #[error("PX_ERR_300: Concurrency conflict: lock wait timed out on {resource}")]
    ConcurrencyConflict { resource: String },

    // =================================================================
    // Settlement Errors (6xx)
    // =================================================================
    /// One of the orders in a trade has already been settled.
    #[error("PX_ERR_600: Order already settled: {0}")]
    AlreadySettled(OrderId),

    // =================================================================
    // Invariant Violations (8xx)
    // =================================================================
    /// A release would drive a locked balance negative. This can only
    /// happen through broken call discipline, never through user input.
    #[error("PX_ERR_800: Locked balance underflow: releasing {requested}, locked {locked}")]
    LockedUnderflow { requested: Decimal, locked: Decimal },

    /// Conservation-of-funds invariant violated — critical safety alert.
    #[error("PX_ERR_801: Conservation violation: {reason}")]
    ConservationViolation { reason: String },

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    /// Unrecoverable internal error.
    #[error("PX_ERR_900: Internal error: {0}")]
    Internal(String),

    /// Decimal arithmetic exceeded representable range.
    #[error("PX_ERR_901: Arithmetic overflow in ledger math")]
    ArithmeticOverflow,
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, ExchangeError>;

impl ExchangeError {
    /// Whether the error is a user-facing rejection (retry/correct and
    /// resubmit) as opposed to an invariant breach that must halt.
    #[must_use]
    pub fn is_rejection(&self) -> bool {
        !matches!(
            self,
            Self::LockedUnderflow { .. } | Self::ConservationViolation { .. } | Self::Internal(_)
        )
    }
}
