//! Configuration for the Pairex settlement engine.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::constants;

/// Engine-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Fraction of trade value deducted from the seller's proceeds on every
    /// trade. The buyer is never charged directly.
    pub commission_rate: Decimal,
    /// When true, `submit_order` enqueues the matching attempt on the match
    /// queue instead of running it inline.
    pub deferred_matching: bool,
    /// Maximum time to wait for an account row lock before the operation
    /// fails with a concurrency conflict, in milliseconds.
    pub lock_wait_ms: u64,
}

impl EngineConfig {
    /// Lock wait budget as a [`std::time::Duration`].
    #[must_use]
    pub fn lock_wait(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.lock_wait_ms)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            commission_rate: constants::default_commission_rate(),
            deferred_matching: false,
            lock_wait_ms: constants::DEFAULT_LOCK_WAIT_MS,
        }
    }
}
