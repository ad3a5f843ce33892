// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # fixdesk-core
//!
//! Runtime primitives shared by the FixDesk request pipeline and its
//! feature modules. Nothing in this crate knows about HTTP.
//!
//! ## Components
//!
//! - [`limiter`]: keyed token-bucket admission control with idle purge
//! - [`cache`]: process-wide key/value store with per-entry TTL
//! - [`hooks`]: eviction callbacks registered by key prefix
//! - [`sweeper`]: background tasks that periodically sweep shared maps
//!
//! Both shared maps are sharded [`dashmap::DashMap`]s, so request-path
//! accesses and sweeps lock a single shard at a time instead of the whole map.

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod cache;
pub mod error;
pub mod hooks;
pub mod limiter;
pub mod sweeper;

pub use cache::{CacheValue, ExpiringCache};
pub use error::{CoreError, CoreResult};
pub use hooks::{EvictionHook, EvictionHooks};
pub use limiter::{RateBucket, RateDecision, RateLimiter, RateLimiterConfig};
pub use sweeper::{SweepHandle, Sweepable, Sweeper};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Convenience re-exports for common use cases.
pub mod prelude {
    pub use crate::cache::{CacheValue, ExpiringCache};
    pub use crate::error::{CoreError, CoreResult};
    pub use crate::limiter::{RateDecision, RateLimiter, RateLimiterConfig};
    pub use crate::sweeper::{SweepHandle, Sweeper};
}
