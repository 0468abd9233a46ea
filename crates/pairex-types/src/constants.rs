//! System-wide constants for the Pairex settlement core.

use rust_decimal::Decimal;

/// Default commission rate: 1.5% of trade value, charged to the seller.
#[must_use]
pub fn default_commission_rate() -> Decimal {
    Decimal::new(15, 3)
}

/// Default account row lock wait budget in milliseconds. Past this the
/// operation fails with `ConcurrencyConflict` and the caller retries.
pub const DEFAULT_LOCK_WAIT_MS: u64 = 1_000;

/// Version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine name.
pub const ENGINE_NAME: &str = "Pairex";
