//! Participant notification seam.
//!
//! The engine notifies each trade participant exactly once, on that
//! participant's own channel, strictly after the settlement transaction has
//! committed and every lock has been dropped. Delivery is fire-and-forget:
//! a slow or failing notifier can never affect settlement correctness.

use parking_lot::Mutex;
use pairex_types::MatchNotification;

/// Delivery hook for per-participant trade notifications.
pub trait Notifier: Send + Sync {
    /// Deliver one participant's notification for one executed trade.
    fn order_matched(&self, notification: &MatchNotification);
}

/// Discards every notification. The default when no transport is wired up.
#[derive(Debug, Default)]
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn order_matched(&self, _notification: &MatchNotification) {}
}

/// Buffers every notification in memory. Useful for tests and for
/// collaborators that poll instead of subscribing.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    delivered: Mutex<Vec<MatchNotification>>,
}

impl RecordingNotifier {
    /// Create an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything delivered so far, in delivery order.
    #[must_use]
    pub fn delivered(&self) -> Vec<MatchNotification> {
        self.delivered.lock().clone()
    }

    /// Number of deliveries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.delivered.lock().len()
    }

    /// Whether nothing has been delivered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.delivered.lock().is_empty()
    }
}

impl Notifier for RecordingNotifier {
    fn order_matched(&self, notification: &MatchNotification) {
        self.delivered.lock().push(notification.clone());
    }
}
