//! # pairex-book
//!
//! The Pairex **Order Store** and **Matcher**.
//!
//! - [`OrderStore`]: order rows with the Open → {Filled, Cancelled} state
//!   machine; every transition re-checks status under the write lock.
//! - [`matcher`]: the single-shot counter-order search — strict price-time
//!   priority, exact-amount matching, self-trade prevention.
//!
//! The store hands out unlocked snapshots; anything acting on a snapshot
//! (the settlement engine) re-verifies it under locks first.

pub mod matcher;
pub mod store;

pub use matcher::{find_maker, is_eligible};
pub use store::OrderStore;
