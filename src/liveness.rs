//! Appliance liveness tracking.
//!
//! The appliance is "connected" while its last decoded status report is
//! younger than the liveness timeout. There is no grace period and no
//! hysteresis: the answer flips the instant the timeout elapses.
//!
//! The timestamp is a single atomic scalar (nanoseconds since the tracker
//! was created, offset by one so that zero means "never"), so readers and
//! the exchange worker never contend on a lock.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::time::Instant;

/// Default liveness window.
pub const DEFAULT_LIVENESS_TIMEOUT: Duration = Duration::from_secs(10);

const NEVER: u64 = 0;

/// Last-contact tracker.
#[derive(Debug)]
pub struct LivenessTracker {
    origin: Instant,
    /// Nanoseconds after `origin`, plus one. `NEVER` before first contact.
    last_contact: AtomicU64,
    timeout: Duration,
}

impl LivenessTracker {
    /// Create a tracker with the default 10 s window.
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_LIVENESS_TIMEOUT)
    }

    /// Create a tracker with a custom window.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            origin: Instant::now(),
            last_contact: AtomicU64::new(NEVER),
            timeout,
        }
    }

    /// Overwrite the last-contact timestamp.
    pub fn record_contact(&self, now: Instant) {
        let elapsed = now.saturating_duration_since(self.origin).as_nanos();
        let offset = u64::try_from(elapsed).unwrap_or(u64::MAX - 1);
        self.last_contact
            .store(offset.saturating_add(1), Ordering::Release);
    }

    /// True iff a contact was recorded less than `timeout` before `now`.
    pub fn is_connected(&self, now: Instant) -> bool {
        match self.last_contact() {
            Some(at) => now.saturating_duration_since(at) < self.timeout,
            None => false,
        }
    }

    /// Time of the last recorded contact.
    pub fn last_contact(&self) -> Option<Instant> {
        match self.last_contact.load(Ordering::Acquire) {
            NEVER => None,
            stored => Some(self.origin + Duration::from_nanos(stored - 1)),
        }
    }

    /// Configured liveness window.
    #[inline]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl Default for LivenessTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_never_contacted_is_disconnected() {
        let tracker = LivenessTracker::new();
        assert!(!tracker.is_connected(Instant::now()));
        assert!(tracker.last_contact().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_connected_within_window() {
        let tracker = LivenessTracker::new();
        let now = Instant::now();
        tracker.record_contact(now);

        assert!(tracker.is_connected(now));
        assert!(tracker.is_connected(now + Duration::from_millis(9_999)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_disconnected_at_exactly_timeout() {
        let tracker = LivenessTracker::new();
        let now = Instant::now();
        tracker.record_contact(now);

        assert!(!tracker.is_connected(now + DEFAULT_LIVENESS_TIMEOUT));
        assert!(!tracker.is_connected(now + Duration::from_secs(60)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_record_contact_overwrites() {
        let tracker = LivenessTracker::with_timeout(Duration::from_secs(2));
        let start = Instant::now();
        tracker.record_contact(start);

        let later = start + Duration::from_secs(5);
        assert!(!tracker.is_connected(later));

        tracker.record_contact(later);
        assert!(tracker.is_connected(later + Duration::from_secs(1)));
        assert_eq!(tracker.last_contact(), Some(later));
    }

    #[tokio::test(start_paused = true)]
    async fn test_follows_paused_clock() {
        let tracker = LivenessTracker::with_timeout(Duration::from_millis(500));
        tracker.record_contact(Instant::now());
        assert!(tracker.is_connected(Instant::now()));

        tokio::time::advance(Duration::from_millis(500)).await;
        assert!(!tracker.is_connected(Instant::now()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_sub_millisecond_contact_keeps_full_window() {
        let tracker = LivenessTracker::new();
        tokio::time::advance(Duration::from_micros(500)).await;
        let contact = Instant::now();
        tracker.record_contact(contact);
        assert_eq!(tracker.last_contact(), Some(contact));

        assert!(tracker.is_connected(contact + Duration::from_micros(9_999_800)));
        assert!(!tracker.is_connected(contact + DEFAULT_LIVENESS_TIMEOUT));
    }

    #[test]
    fn test_timeout_accessor() {
        assert_eq!(LivenessTracker::new().timeout(), DEFAULT_LIVENESS_TIMEOUT);
    }
}
