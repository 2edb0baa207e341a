//! Inbound frame rate limiting for lobby and table sockets.
//!
//! Frames over the limit are dropped without a reply, like any other
//! ignored frame.

use std::collections::VecDeque;
use std::time::Duration;
use tokio::time::Instant;

/// Rate limiter using a sliding window algorithm
#[derive(Debug)]
pub struct RateLimiter {
    /// Timestamps of recently accepted frames
    timestamps: VecDeque<Instant>,
    max_requests: usize,
    window: Duration,
}

impl RateLimiter {
    /// Allow `max_requests` within any `window`
    ///
    /// # Example
    ///
    /// ```
    /// use cl_server::api::rate_limiter::RateLimiter;
    /// use std::time::Duration;
    ///
    /// // Allow 10 frames per second
    /// let limiter = RateLimiter::new(10, Duration::from_secs(1));
    /// ```
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            timestamps: VecDeque::with_capacity(max_requests),
            max_requests,
            window,
        }
    }

    fn evict(&mut self, now: Instant) {
        while let Some(ts) = self.timestamps.front() {
            if now.duration_since(*ts) >= self.window {
                self.timestamps.pop_front();
            } else {
                break;
            }
        }
    }

    fn has_room(&mut self, now: Instant) -> bool {
        self.evict(now);
        self.timestamps.len() < self.max_requests
    }

    fn record(&mut self, now: Instant) {
        self.timestamps.push_back(now);
    }

    /// Accept or reject one frame arriving now
    pub fn check(&mut self) -> bool {
        let now = Instant::now();
        if self.has_room(now) {
            self.record(now);
            true
        } else {
            false
        }
    }

    /// Frames accepted within the current window
    pub fn current_count(&self) -> usize {
        self.timestamps.len()
    }
}

/// Burst and sustained limits applied together to one socket.
///
/// A frame counts against both windows only when both accept it, so a
/// rejected burst never eats into the sustained budget.
#[derive(Debug)]
pub struct FrameLimiter {
    burst: RateLimiter,
    sustained: RateLimiter,
}

impl FrameLimiter {
    pub fn new(burst: RateLimiter, sustained: RateLimiter) -> Self {
        Self { burst, sustained }
    }

    /// 10 frames per second, 100 frames per minute
    pub fn per_connection() -> Self {
        Self::new(
            RateLimiter::new(10, Duration::from_secs(1)),
            RateLimiter::new(100, Duration::from_secs(60)),
        )
    }

    pub fn check(&mut self) -> bool {
        let now = Instant::now();
        if self.burst.has_room(now) && self.sustained.has_room(now) {
            self.burst.record(now);
            self.sustained.record(now);
            true
        } else {
            false
        }
    }
}

impl Default for FrameLimiter {
    fn default() -> Self {
        Self::per_connection()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_rate_limiter_blocks_over_limit() {
        let mut limiter = RateLimiter::new(3, Duration::from_secs(1));

        for _ in 0..3 {
            assert!(limiter.check());
        }
        assert!(!limiter.check(), "Should block frame over limit");
        assert_eq!(limiter.current_count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limiter_window_slides() {
        let mut limiter = RateLimiter::new(2, Duration::from_millis(100));

        assert!(limiter.check());
        tokio::time::advance(Duration::from_millis(60)).await;
        assert!(limiter.check());
        assert!(!limiter.check());

        // Only the first frame has left the window
        tokio::time::advance(Duration::from_millis(50)).await;
        assert!(limiter.check());
        assert!(!limiter.check());
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_limit() {
        let mut limiter = FrameLimiter::per_connection();

        for _ in 0..10 {
            assert!(limiter.check());
        }
        assert!(!limiter.check(), "Burst limiter should block 11th frame");

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(limiter.check());
    }

    #[tokio::test(start_paused = true)]
    async fn test_sustained_limit() {
        let mut limiter = FrameLimiter::per_connection();

        // 10 frames per second for 10 seconds fills the minute budget
        for _ in 0..10 {
            for _ in 0..10 {
                assert!(limiter.check());
            }
            tokio::time::advance(Duration::from_secs(1)).await;
        }
        assert!(!limiter.check(), "Sustained limiter should block 101st frame");

        tokio::time::advance(Duration::from_secs(60)).await;
        assert!(limiter.check());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejected_burst_keeps_sustained_budget() {
        let mut limiter = FrameLimiter::per_connection();

        for _ in 0..50 {
            limiter.check();
        }
        assert_eq!(limiter.burst.current_count(), 10);
        assert_eq!(limiter.sustained.current_count(), 10);
    }
}
