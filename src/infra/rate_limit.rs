use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};

use async_trait::async_trait;

use crate::app_error::{AppError, AppResult};

/// Time source for the limiter, injected so tests never depend on a live
/// clock.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Trait for rate limiting implementations.
#[async_trait]
pub trait RateLimiterTrait: Send + Sync {
    /// Check the rate limit for a client key.
    /// Returns Ok(()) if within limits, Err(AppError::RateLimited) if exceeded.
    async fn check(&self, key: &str) -> AppResult<()>;
}

/// Process-local sliding-window limiter.
///
/// Best-effort only: state does not survive restarts and is not shared
/// across instances. Only accepted requests count against the window.
pub struct SlidingWindowRateLimiter {
    window: Duration,
    max_requests: usize,
    clock: Arc<dyn Clock>,
    hits: Mutex<HashMap<String, VecDeque<Instant>>>,
}

impl SlidingWindowRateLimiter {
    pub fn new(window: Duration, max_requests: usize, clock: Arc<dyn Clock>) -> Self {
        Self {
            window,
            max_requests,
            clock,
            hits: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl RateLimiterTrait for SlidingWindowRateLimiter {
    async fn check(&self, key: &str) -> AppResult<()> {
        let now = self.clock.now();
        let mut hits = self.hits.lock().expect("rate limit table poisoned");

        // Evict keys whose whole window has expired, so the table doesn't
        // grow without bound across distinct client addresses.
        hits.retain(|_, timestamps| {
            timestamps
                .front()
                .is_some_and(|oldest| now.duration_since(*oldest) < self.window)
        });

        let timestamps = hits.entry(key.to_string()).or_default();
        while let Some(oldest) = timestamps.front() {
            if now.duration_since(*oldest) >= self.window {
                timestamps.pop_front();
            } else {
                break;
            }
        }

        if timestamps.len() >= self.max_requests {
            return Err(AppError::RateLimited);
        }

        timestamps.push_back(now);
        Ok(())
    }
}
