//! # pairex-ledger
//!
//! The Pairex **Ledger**: per-user cash balances, per-(user, symbol) asset
//! positions, and the atomic reserve/release/settle primitives the
//! settlement engine builds on.
//!
//! ## Architecture
//!
//! - [`Account`]: one ledger row — cash plus lazily-created positions, with
//!   the non-negativity invariants enforced at every mutation.
//! - [`Ledger`]: the row registry. Each row sits behind its own mutex (the
//!   exclusive row lock); two-row acquisition is always ordered by user id.
//! - [`Conservation`]: the Σ(available + locked) + commission-pool invariant
//!   checker fed by deposits.
//!
//! ## Lifecycle for a trade
//!
//! 1. `deposit_*` → funds arrive (available increases)
//! 2. `reserve_*` → order placed, available moves to locked
//! 3. `settle_cash` / `settle_asset` → trade executed, locked funds move to
//!    the counterparty (commission to the pool)
//! 4. `release_*` → order cancelled, locked funds return to available

pub mod account;
pub mod conservation;
pub mod ledger;

pub use account::Account;
pub use conservation::Conservation;
pub use ledger::{AccountRow, Ledger};
