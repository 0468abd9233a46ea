//! # pairex-engine
//!
//! The Pairex **Settlement Engine**: the only component that moves money.
//!
//! ## Architecture
//!
//! The engine composes the other planes and owns every mutation protocol:
//! 1. **Placement** (`submit_order`): reserve funds and create the Open
//!    order as one unit, then attempt matching — inline or via the
//!    deferred-match queue.
//! 2. **Matching** (`run_match`): single-shot counter-order search; the
//!    selected maker is re-verified under locks before settlement.
//! 3. **Settlement** (`execute_trade`): both account rows locked in
//!    ascending user-id order, cash and asset legs settled, the immutable
//!    trade recorded exactly once, both orders marked Filled.
//! 4. **Cancellation** (`cancel_order`): release exactly what the order
//!    reserved, transition to Cancelled, idempotent by rejection.
//! 5. **Notification**: each participant informed once, after commit,
//!    outside all locks.
//!
//! ```text
//! submit_order → reserve + insert(Open) → find_maker → execute_trade
//!                                                        └→ notify × 2
//! ```

pub mod engine;
pub mod match_queue;
pub mod notify;
pub mod read_model;
pub mod trade_log;

pub use engine::{OrderRequest, Placement, SettlementEngine};
pub use match_queue::MatchQueue;
pub use notify::{NoopNotifier, Notifier, RecordingNotifier};
pub use read_model::{OrderView, SymbolOrders};
pub use trade_log::TradeLog;
