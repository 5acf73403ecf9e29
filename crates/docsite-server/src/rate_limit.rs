//! Per-client submission rate limiting.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Bounded, time-windowed rate limiter keyed by client address.
///
/// A client may submit once per `window`. At most `capacity` clients are
/// tracked; when full, expired entries are evicted first, then the oldest.
#[derive(Debug)]
pub struct RateLimiter {
    window: Duration,
    capacity: usize,
    seen: Mutex<HashMap<String, Instant>>,
}

impl RateLimiter {
    #[must_use]
    pub fn new(window: Duration, capacity: usize) -> Self {
        Self {
            window,
            capacity: capacity.max(1),
            seen: Mutex::new(HashMap::new()),
        }
    }

    /// Record a submission from `client`, returning `false` if it is too soon.
    pub fn check(&self, client: &str) -> bool {
        self.check_at(client, Instant::now())
    }

    /// Number of tracked clients.
    #[must_use]
    pub fn len(&self) -> usize {
        self.seen.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_at(&self, client: &str, now: Instant) -> bool {
        let mut seen = self.seen.lock().unwrap_or_else(PoisonError::into_inner);

        match seen.get(client) {
            Some(last) if now.duration_since(*last) < self.window => return false,
            Some(_) => {}
            None if seen.len() >= self.capacity => {
                seen.retain(|_, last| now.duration_since(*last) < self.window);
                if seen.len() >= self.capacity
                    && let Some(oldest) = seen
                        .iter()
                        .min_by_key(|(_, last)| **last)
                        .map(|(key, _)| key.clone())
                {
                    seen.remove(&oldest);
                }
            }
            None => {}
        }

        seen.insert(client.to_owned(), now);
        true
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    const WINDOW: Duration = Duration::from_secs(1);

    #[test]
    fn test_second_request_within_window_is_rejected() {
        let limiter = RateLimiter::new(WINDOW, 10);
        let start = Instant::now();

        assert!(limiter.check_at("1.2.3.4", start));
        assert!(!limiter.check_at("1.2.3.4", start + Duration::from_millis(500)));
        assert!(limiter.check_at("5.6.7.8", start + Duration::from_millis(500)));
    }

    #[test]
    fn test_request_after_window_is_accepted() {
        let limiter = RateLimiter::new(WINDOW, 10);
        let start = Instant::now();

        assert!(limiter.check_at("1.2.3.4", start));
        assert!(limiter.check_at("1.2.3.4", start + WINDOW));
    }

    #[test]
    fn test_rejected_request_does_not_extend_window() {
        let limiter = RateLimiter::new(WINDOW, 10);
        let start = Instant::now();

        assert!(limiter.check_at("a", start));
        assert!(!limiter.check_at("a", start + Duration::from_millis(900)));
        assert!(limiter.check_at("a", start + Duration::from_millis(1000)));
    }

    #[test]
    fn test_capacity_evicts_expired_entries() {
        let limiter = RateLimiter::new(WINDOW, 2);
        let start = Instant::now();

        limiter.check_at("a", start);
        limiter.check_at("b", start + Duration::from_millis(100));
        assert!(limiter.check_at("c", start + Duration::from_millis(1050)));

        assert_eq!(limiter.len(), 2);
        // "b" is still inside its window and was kept.
        assert!(!limiter.check_at("b", start + Duration::from_millis(1060)));
    }

    #[test]
    fn test_capacity_evicts_oldest_when_all_active() {
        let limiter = RateLimiter::new(WINDOW, 2);
        let start = Instant::now();

        limiter.check_at("a", start);
        limiter.check_at("b", start + Duration::from_millis(10));
        assert!(limiter.check_at("c", start + Duration::from_millis(20)));

        assert_eq!(limiter.len(), 2);
        assert!(limiter.check_at("a", start + Duration::from_millis(30)));
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let limiter = RateLimiter::new(WINDOW, 0);

        assert!(limiter.check("a"));
        assert_eq!(limiter.len(), 1);
        assert!(!limiter.is_empty());
    }
}
