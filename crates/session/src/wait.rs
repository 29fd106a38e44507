//! Bounded polling
//!
//! Browser waits (network-idle, URL match) are polling loops with
//! timeouts. [`Poller`] makes the loop explicit: a declared deadline,
//! a declared interval, and whatever success predicate the caller
//! checks between ticks.

use std::time::Duration;
use tokio::time::Instant;

/// Default interval between poll attempts.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// A bounded retry loop. `next()` yields `true` while the deadline has
/// not passed, sleeping one interval between consecutive ticks (the
/// first tick fires immediately).
///
/// ```no_run
/// # async fn demo() {
/// use std::time::Duration;
/// use couponly_session::wait::Poller;
///
/// let mut poller = Poller::new(Duration::from_secs(30), Duration::from_millis(250));
/// while poller.next().await {
///     // check the success predicate; break when it holds
/// }
/// # }
/// ```
pub struct Poller {
    deadline: Instant,
    interval: Duration,
    started: bool,
}

impl Poller {
    pub fn new(timeout: Duration, interval: Duration) -> Self {
        Self {
            deadline: Instant::now() + timeout,
            interval,
            started: false,
        }
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self::new(timeout, DEFAULT_POLL_INTERVAL)
    }

    /// Time remaining until the deadline.
    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    pub async fn next(&mut self) -> bool {
        if !self.started {
            self.started = true;
            return true;
        }
        if Instant::now() >= self.deadline {
            return false;
        }
        // Never sleep past the deadline.
        let nap = self.interval.min(self.remaining());
        tokio::time::sleep(nap).await;
        Instant::now() < self.deadline
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn first_tick_is_immediate() {
        let start = Instant::now();
        let mut poller = Poller::new(Duration::from_secs(5), Duration::from_secs(1));
        assert!(poller.next().await);
        assert_eq!(Instant::now(), start);
    }

    #[tokio::test(start_paused = true)]
    async fn stops_at_deadline() {
        let mut poller = Poller::new(Duration::from_secs(2), Duration::from_millis(500));
        let mut ticks = 0;
        while poller.next().await {
            ticks += 1;
            assert!(ticks < 100, "poller must terminate");
        }
        // Immediate tick plus three full 500ms intervals within 2s.
        assert_eq!(ticks, 4);
        assert!(poller.remaining().is_zero());
    }

    #[tokio::test(start_paused = true)]
    async fn respects_interval_spacing() {
        let mut poller = Poller::new(Duration::from_secs(10), Duration::from_secs(1));
        assert!(poller.next().await);
        let before = Instant::now();
        assert!(poller.next().await);
        assert_eq!(Instant::now() - before, Duration::from_secs(1));
    }
}
