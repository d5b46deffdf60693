//! Keyed token-bucket rate gate.
//!
//! The one piece of explicitly shared, concurrently mutated guardrail
//! state. Buckets are keyed by user (falling back to session) and checked
//! atomically during input validation; no other component touches them.

use governor::{
    Quota, RateLimiter,
    clock::{Clock, DefaultClock},
    state::keyed::DefaultKeyedStateStore,
};
use std::num::NonZeroU32;

type KeyedLimiter = RateLimiter<String, DefaultKeyedStateStore<String>, DefaultClock>;

/// Token bucket configuration.
///
/// `burst` is the bucket capacity; `per_minute` sets the refill rate.
#[derive(Debug, Clone)]
pub struct RateConfig {
    /// Sustained requests per minute per key.
    pub per_minute: u32,
    /// Maximum burst capacity per key.
    pub burst: u32,
}

impl Default for RateConfig {
    fn default() -> Self {
        Self {
            per_minute: 120,
            burst: 30,
        }
    }
}

/// Atomic check-and-decrement gate over per-key token buckets.
pub struct RateGate {
    limiter: KeyedLimiter,
}

impl RateGate {
    /// Create a rate gate with the given configuration.
    ///
    /// # Panics
    ///
    /// Panics if any rate value is 0. Use `try_new` for fallible
    /// construction.
    pub fn new(config: RateConfig) -> Self {
        Self::try_new(config).expect("rate configuration must have non-zero values")
    }

    /// Try to create a rate gate; `None` if any rate value is 0.
    pub fn try_new(config: RateConfig) -> Option<Self> {
        let quota = Quota::per_minute(NonZeroU32::new(config.per_minute)?)
            .allow_burst(NonZeroU32::new(config.burst)?);
        Some(Self {
            limiter: RateLimiter::keyed(quota),
        })
    }

    /// Check whether a request under `key` is within budget.
    ///
    /// On rejection returns the number of seconds until the next request
    /// would be admitted.
    pub fn check(&self, key: &str) -> Result<(), u64> {
        self.limiter.check_key(&key.to_string()).map_err(|not_until| {
            not_until
                .wait_time_from(DefaultClock::default().now())
                .as_secs()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn burst_capacity_bounds_requests() {
        let gate = RateGate::new(RateConfig {
            per_minute: 60,
            burst: 3,
        });
        for _ in 0..3 {
            assert!(gate.check("user-1").is_ok());
        }
        assert!(gate.check("user-1").is_err());
        // Separate key, separate bucket.
        assert!(gate.check("user-2").is_ok());
    }

    #[test]
    fn refill_admits_after_interval() {
        // 6000/min replenishes one token every 10ms.
        let gate = RateGate::new(RateConfig {
            per_minute: 6000,
            burst: 1,
        });
        assert!(gate.check("user-1").is_ok());
        assert!(gate.check("user-1").is_err());
        std::thread::sleep(std::time::Duration::from_millis(30));
        assert!(gate.check("user-1").is_ok());
    }

    #[test]
    fn zero_rates_are_rejected() {
        assert!(
            RateGate::try_new(RateConfig {
                per_minute: 0,
                burst: 1
            })
            .is_none()
        );
    }
}
