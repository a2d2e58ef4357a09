//! Per-domain request spacing
//!
//! Every domain gets its own async lock holding the instant of the last
//! granted request. Callers for the same domain queue on that lock; other
//! domains are never blocked by it.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

type Slot = Arc<tokio::sync::Mutex<Option<Instant>>>;

/// Enforces a minimum interval between requests to the same domain
#[derive(Debug)]
pub struct RateLimiter {
    interval: Duration,
    slots: Mutex<HashMap<String, Slot>>,
}

impl RateLimiter {
    /// Creates a rate limiter with the given minimum interval
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Creates a rate limiter from a number of seconds
    ///
    /// Negative or non-finite values are treated as zero.
    pub fn from_secs_f64(seconds: f64) -> Self {
        let seconds = if seconds.is_finite() && seconds > 0.0 {
            seconds
        } else {
            0.0
        };
        Self::new(Duration::from_secs_f64(seconds))
    }

    /// The configured minimum interval
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Waits until a request to `domain` is allowed, then records it
    ///
    /// The first request for a domain is granted immediately. A zero interval
    /// never waits.
    pub async fn acquire(&self, domain: &str) {
        let slot = self.slot(domain);
        let mut last = slot.lock().await;

        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < self.interval {
                let wait = self.interval - elapsed;
                tracing::debug!("Rate limiting {}: waiting {:?}", domain, wait);
                tokio::time::sleep(wait).await;
            }
        }

        *last = Some(Instant::now());
    }

    /// Time remaining before `domain` may be requested again, without acquiring
    ///
    /// Returns zero for unknown domains and for domains whose slot is
    /// currently held by another caller.
    pub fn time_until_ready(&self, domain: &str) -> Duration {
        let slot = match self.slots.lock() {
            Ok(slots) => slots.get(domain).cloned(),
            Err(_) => None,
        };

        let Some(slot) = slot else {
            return Duration::ZERO;
        };

        let Ok(last) = slot.try_lock() else {
            return Duration::ZERO;
        };

        match *last {
            Some(previous) => self.interval.saturating_sub(previous.elapsed()),
            None => Duration::ZERO,
        }
    }

    /// Returns the lock for a domain, creating it on first use
    fn slot(&self, domain: &str) -> Slot {
        let mut slots = match self.slots.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        slots
            .entry(domain.to_string())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(None)))
            .clone()
    }
}
