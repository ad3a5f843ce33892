// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Keyed token-bucket rate limiter.
//!
//! Each caller key owns a [`RateBucket`] that refills linearly at `rate`
//! tokens per second up to `burst`. An admission check refills, then tries to
//! consume one token. Refill and consume for one key happen under that key's
//! shard lock, so concurrent requests from the same caller are serialized
//! while unrelated callers only contend when they hash to the same shard.
//!
//! Buckets untouched for longer than `idle_expire` are dropped by
//! [`RateLimiter::purge_idle`], which a [`crate::Sweeper`] runs every
//! `purge_interval`.

use std::time::Duration;

use dashmap::DashMap;
use tokio::time::Instant;

use crate::error::{CoreError, CoreResult};
use crate::sweeper::Sweepable;

// =============================================================================
// RateLimiterConfig
// =============================================================================

/// Parameters of the token-bucket limiter.
#[derive(Debug, Clone, PartialEq)]
pub struct RateLimiterConfig {
    /// Tokens added per second.
    ///
    /// Refill is linear: with `rate = 5.0` one token returns every 200ms, so
    /// an emptied bucket of `burst = 5` admits five more requests after a
    /// full second, not one. A "one extra request per second" policy is
    /// `rate = 1.0`.
    pub rate: f64,
    /// Bucket capacity.
    pub burst: u32,
    /// How often idle buckets are swept.
    pub purge_interval: Duration,
    /// How long a bucket may stay untouched before it is swept.
    pub idle_expire: Duration,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self {
            rate: 5.0,
            burst: 5,
            purge_interval: Duration::from_secs(60),
            idle_expire: Duration::from_secs(300),
        }
    }
}

impl RateLimiterConfig {
    /// Creates a configuration with the given refill rate and capacity.
    pub fn new(rate: f64, burst: u32) -> Self {
        Self {
            rate,
            burst,
            ..Default::default()
        }
    }

    /// Sets the purge interval.
    pub fn with_purge_interval(mut self, interval: Duration) -> Self {
        self.purge_interval = interval;
        self
    }

    /// Sets the idle expiry.
    pub fn with_idle_expire(mut self, expire: Duration) -> Self {
        self.idle_expire = expire;
        self
    }

    /// Validates the parameters.
    pub fn validate(&self) -> CoreResult<()> {
        if !self.rate.is_finite() || self.rate <= 0.0 {
            return Err(CoreError::invalid("rate", "must be a positive number"));
        }
        if self.burst == 0 {
            return Err(CoreError::invalid("burst", "must be at least 1"));
        }
        if self.purge_interval.is_zero() {
            return Err(CoreError::invalid("purge_interval", "must be non-zero"));
        }
        if self.idle_expire.is_zero() {
            return Err(CoreError::invalid("idle_expire", "must be non-zero"));
        }
        Ok(())
    }
}

// =============================================================================
// RateBucket
// =============================================================================

/// Token bucket state for a single caller key.
#[derive(Debug, Clone)]
pub struct RateBucket {
    tokens: f64,
    last_refill: Instant,
    last_seen: Instant,
}

impl RateBucket {
    /// Creates a full bucket.
    pub fn full(burst: u32, now: Instant) -> Self {
        Self {
            tokens: burst as f64,
            last_refill: now,
            last_seen: now,
        }
    }

    /// Tokens currently available (as of the last refill).
    pub fn tokens(&self) -> f64 {
        self.tokens
    }

    /// Instant of the last admission check.
    pub fn last_seen(&self) -> Instant {
        self.last_seen
    }

    fn refill(&mut self, rate: f64, burst: u32, now: Instant) {
        let elapsed = now.saturating_duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * rate).min(burst as f64);
        self.last_refill = now;
    }

    /// Refills, then attempts to consume one token.
    pub fn try_acquire(&mut self, rate: f64, burst: u32, now: Instant) -> RateDecision {
        self.refill(rate, burst, now);
        self.last_seen = now;

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            RateDecision::Admitted {
                remaining: self.tokens.floor() as u32,
            }
        } else {
            let needed = 1.0 - self.tokens;
            RateDecision::Limited {
                retry_after: Duration::from_secs_f64(needed / rate),
            }
        }
    }

    fn is_idle(&self, now: Instant, idle_expire: Duration) -> bool {
        now.saturating_duration_since(self.last_seen) > idle_expire
    }
}

/// Outcome of an admission check.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RateDecision {
    /// A token was consumed.
    Admitted {
        /// Whole tokens left in the bucket.
        remaining: u32,
    },
    /// The bucket is empty.
    Limited {
        /// Time until the next token becomes available.
        retry_after: Duration,
    },
}

impl RateDecision {
    /// Returns true if the request was admitted.
    pub fn is_admitted(&self) -> bool {
        matches!(self, Self::Admitted { .. })
    }

    /// Retry delay rounded up to whole seconds, at least one.
    ///
    /// Returns `None` for admitted requests.
    pub fn retry_after_secs(&self) -> Option<u64> {
        match self {
            Self::Admitted { .. } => None,
            Self::Limited { retry_after } => Some(retry_after.as_secs_f64().ceil().max(1.0) as u64),
        }
    }
}

// =============================================================================
// RateLimiter
// =============================================================================

/// Token-bucket limiter keyed by caller.
#[derive(Debug)]
pub struct RateLimiter {
    config: RateLimiterConfig,
    buckets: DashMap<String, RateBucket>,
}

impl RateLimiter {
    /// Creates a limiter after validating its configuration.
    pub fn new(config: RateLimiterConfig) -> CoreResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            buckets: DashMap::new(),
        })
    }

    /// Returns the limiter configuration.
    pub fn config(&self) -> &RateLimiterConfig {
        &self.config
    }

    /// Checks and records one request for `key`.
    pub fn check(&self, key: &str) -> RateDecision {
        let now = Instant::now();
        let RateLimiterConfig { rate, burst, .. } = self.config;

        if let Some(mut bucket) = self.buckets.get_mut(key) {
            return bucket.try_acquire(rate, burst, now);
        }

        self.buckets
            .entry(key.to_owned())
            .or_insert_with(|| RateBucket::full(burst, now))
            .try_acquire(rate, burst, now)
    }

    /// Returns a snapshot of the bucket for `key`.
    pub fn bucket(&self, key: &str) -> Option<RateBucket> {
        self.buckets.get(key).map(|b| b.clone())
    }

    /// Removes buckets idle for longer than `idle_expire`.
    ///
    /// Returns the number of buckets removed.
    pub fn purge_idle(&self) -> usize {
        let now = Instant::now();
        let expire = self.config.idle_expire;
        let before = self.buckets.len();
        self.buckets.retain(|_, bucket| !bucket.is_idle(now, expire));
        before.saturating_sub(self.buckets.len())
    }

    /// Number of tracked buckets.
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    /// Returns true if no bucket is tracked.
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

impl Sweepable for RateLimiter {
    fn sweep(&self) -> usize {
        self.purge_idle()
    }

    fn label(&self) -> &'static str {
        "rate_limiter"
    }
}

// =============================================================================
// Tests
// =============================================================================
