//! # pairex-types
//!
//! Shared types, errors, and configuration for the **Pairex** settlement core.
//!
//! This crate is the leaf dependency of the workspace — every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`OrderId`], [`UserId`], [`SymbolId`], [`TradeId`], [`Symbol`]
//! - **Order model**: [`Order`], [`OrderSide`], [`OrderStatus`]
//! - **Trade model**: [`Trade`]
//! - **Balance model**: [`CashBalance`], [`Position`]
//! - **Fixed-scale decimal helpers**: [`decimal`]
//! - **Notification payloads**: [`MatchNotification`], [`OrderSummary`], [`TradeSummary`]
//! - **Configuration**: [`EngineConfig`]
//! - **Errors**: [`ExchangeError`] with `PX_ERR_` prefix codes
//! - **Constants**: system-wide defaults

pub mod balance;
pub mod config;
pub mod constants;
pub mod decimal;
pub mod error;
pub mod ids;
pub mod notification;
pub mod order;
pub mod trade;

// Re-export all primary types at crate root for ergonomic imports:
//   use pairex_types::{Order, OrderSide, Trade, CashBalance, ...};

pub use balance::*;
pub use config::*;
pub use error::*;
pub use ids::*;
pub use notification::*;
pub use order::*;
pub use trade::*;

// Constants are accessed via `pairex_types::constants::FOO` and decimal
// helpers via `pairex_types::decimal::*` (not re-exported to avoid
// name collisions).
