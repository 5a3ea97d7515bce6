//! Per-client sliding-window rate limiting.
//!
//! Uses [`tokio::time::Instant`] so paused-clock tests drive the window
//! deterministically.

use std::time::Duration;
use tokio::time::Instant;

/// Outcome of one delivery attempt against the window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RateDecision {
    /// Deliver the payload.
    Allow,
    /// Suppress the payload; substitute a single `rate_limit_exceeded` frame.
    Limited,
}

/// Sliding-window counter for one client.
///
/// The window restarts whenever more than the window duration has elapsed
/// since `window_start`; every attempt increments the counter after that
/// check. The substituted error frame is written straight to the sink by
/// the caller and never re-enters the limiter, so suppression cannot
/// recurse.
#[derive(Clone, Debug)]
pub struct RateWindow {
    count: u32,
    window_start: Instant,
}

impl RateWindow {
    /// Fresh window starting now.
    #[must_use]
    pub fn new(now: Instant) -> Self {
        Self {
            count: 0,
            window_start: now,
        }
    }

    /// Account one delivery attempt. The window admits exactly `max`
    /// deliveries; the attempt after the ceiling is the first `Limited`.
    pub fn check(&mut self, now: Instant, window: Duration, max: u32) -> RateDecision {
        if now.duration_since(self.window_start) > window {
            self.window_start = now;
            self.count = 0;
        }
        self.count += 1;
        if self.count > max {
            RateDecision::Limited
        } else {
            RateDecision::Allow
        }
    }

    /// Reset the counter if the window has lapsed (maintenance path).
    /// Returns whether a reset happened.
    pub fn reset_if_expired(&mut self, now: Instant, window: Duration) -> bool {
        if now.duration_since(self.window_start) > window {
            self.window_start = now;
            self.count = 0;
            true
        } else {
            false
        }
    }

    /// Attempts accounted in the current window.
    #[must_use]
    pub fn count(&self) -> u32 {
        self.count
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_secs(60);

    #[test]
    fn admits_up_to_max() {
        let now = Instant::now();
        let mut rw = RateWindow::new(now);
        for _ in 0..5 {
            assert_eq!(rw.check(now, WINDOW, 5), RateDecision::Allow);
        }
        assert_eq!(rw.count(), 5);
    }

    #[test]
    fn attempt_past_ceiling_is_limited() {
        let now = Instant::now();
        let mut rw = RateWindow::new(now);
        for _ in 0..3 {
            let _ = rw.check(now, WINDOW, 3);
        }
        assert_eq!(rw.check(now, WINDOW, 3), RateDecision::Limited);
        assert_eq!(rw.check(now, WINDOW, 3), RateDecision::Limited);
    }

    #[tokio::test(start_paused = true)]
    async fn window_restarts_after_duration() {
        let start = Instant::now();
        let mut rw = RateWindow::new(start);
        for _ in 0..3 {
            let _ = rw.check(start, WINDOW, 3);
        }
        assert_eq!(rw.check(start, WINDOW, 3), RateDecision::Limited);

        tokio::time::advance(WINDOW + Duration::from_secs(1)).await;
        let later = Instant::now();
        assert_eq!(rw.check(later, WINDOW, 3), RateDecision::Allow);
        assert_eq!(rw.count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn elapsed_exactly_window_does_not_reset() {
        let start = Instant::now();
        let mut rw = RateWindow::new(start);
        let _ = rw.check(start, WINDOW, 10);

        tokio::time::advance(WINDOW).await;
        let _ = rw.check(Instant::now(), WINDOW, 10);
        assert_eq!(rw.count(), 2, "boundary instant stays in the same window");
    }

    #[tokio::test(start_paused = true)]
    async fn reset_if_expired() {
        let start = Instant::now();
        let mut rw = RateWindow::new(start);
        let _ = rw.check(start, WINDOW, 10);
        assert!(!rw.reset_if_expired(start, WINDOW));
        assert_eq!(rw.count(), 1);

        tokio::time::advance(WINDOW + Duration::from_secs(1)).await;
        assert!(rw.reset_if_expired(Instant::now(), WINDOW));
        assert_eq!(rw.count(), 0);
    }
}
