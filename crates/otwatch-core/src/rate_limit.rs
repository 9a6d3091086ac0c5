//! Per-identifier sliding-window rate limiter.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tracing::debug;

/// Sliding-window limiter: at most `max_requests` accepted calls per
/// identifier within any `window`. Timestamps older than the window are
/// dropped on every check, so memory stays proportional to recent traffic.
#[derive(Debug)]
pub struct RateLimiter {
    max_requests: usize,
    window: Duration,
    requests: HashMap<String, Vec<Instant>>,
}

impl RateLimiter {
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            requests: HashMap::new(),
        }
    }

    /// Record an attempt for `identifier`. Returns `true` when the call is
    /// admitted, `false` when the window is already full.
    pub fn is_allowed(&mut self, identifier: &str) -> bool {
        self.is_allowed_at(identifier, Instant::now())
    }

    /// Testable variant with an injected clock.
    pub fn is_allowed_at(&mut self, identifier: &str, now: Instant) -> bool {
        let window = self.window;
        let timestamps = self.requests.entry(identifier.to_owned()).or_default();
        timestamps.retain(|t| now.duration_since(*t) < window);

        if timestamps.len() >= self.max_requests {
            debug!(identifier, "rate limit window full");
            return false;
        }
        timestamps.push(now);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admits_up_to_limit_then_rejects() {
        let mut limiter = RateLimiter::new(3, Duration::from_secs(60));
        let now = Instant::now();
        assert!(limiter.is_allowed_at("scan", now));
        assert!(limiter.is_allowed_at("scan", now));
        assert!(limiter.is_allowed_at("scan", now));
        assert!(!limiter.is_allowed_at("scan", now));
    }

    #[test]
    fn identifiers_are_independent() {
        let mut limiter = RateLimiter::new(1, Duration::from_secs(60));
        let now = Instant::now();
        assert!(limiter.is_allowed_at("a", now));
        assert!(!limiter.is_allowed_at("a", now));
        assert!(limiter.is_allowed_at("b", now));
    }

    #[test]
    fn window_expiry_readmits() {
        let mut limiter = RateLimiter::new(2, Duration::from_secs(10));
        let start = Instant::now();
        assert!(limiter.is_allowed_at("x", start));
        assert!(limiter.is_allowed_at("x", start));
        assert!(!limiter.is_allowed_at("x", start + Duration::from_secs(5)));
        // Both original timestamps age out.
        assert!(limiter.is_allowed_at("x", start + Duration::from_secs(11)));
    }

    #[test]
    fn no_window_ever_admits_more_than_limit() {
        let mut limiter = RateLimiter::new(5, Duration::from_secs(10));
        let start = Instant::now();
        let mut accepted: Vec<Duration> = Vec::new();
        // Hammer one identifier every 800ms for 40 seconds.
        for i in 0..50u64 {
            let offset = Duration::from_millis(i * 800);
            if limiter.is_allowed_at("burst", start + offset) {
                accepted.push(offset);
            }
        }
        // Slide a 10s window across the accepted offsets.
        for (i, t0) in accepted.iter().enumerate() {
            let in_window = accepted[i..]
                .iter()
                .take_while(|t| **t - *t0 < Duration::from_secs(10))
                .count();
            assert!(in_window <= 5, "window starting at {t0:?} admitted {in_window}");
        }
    }
}
