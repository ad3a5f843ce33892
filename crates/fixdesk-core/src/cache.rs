// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Process-wide expiring key/value cache.
//!
//! Entries carry an absolute expiry. [`ExpiringCache::get`] checks expiry on
//! read, so an entry past its deadline is never returned even if the sweep
//! has not run yet. [`ExpiringCache::purge_expired`] removes expired entries
//! in the background.
//!
//! Keys are not namespaced. Feature modules prefix their own keys
//! (`"images:<id>"`) and register eviction hooks for that prefix.
//!
//! # Limitations
//!
//! Eviction is TTL-only. There is no capacity bound and no LRU policy; a
//! caller that inserts faster than entries expire grows the cache without
//! limit.

use std::any::Any;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::time::Instant;

use crate::hooks::EvictionHooks;
use crate::sweeper::Sweepable;

/// Type-erased value stored in the shared application cache.
pub type CacheValue = Arc<dyn Any + Send + Sync>;

#[derive(Clone)]
struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
}

impl<V> CacheEntry<V> {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

// =============================================================================
// ExpiringCache
// =============================================================================

/// Key/value store with per-entry TTL.
pub struct ExpiringCache<V> {
    entries: DashMap<String, CacheEntry<V>>,
    default_ttl: Duration,
    hooks: EvictionHooks<V>,
}

impl<V> ExpiringCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Creates an empty cache with the TTL used by [`Self::set_default`].
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            default_ttl,
            hooks: EvictionHooks::new(),
        }
    }

    /// Default TTL for [`Self::set_default`].
    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Inserts or overwrites `key`, expiring after `ttl`.
    pub fn set(&self, key: impl Into<String>, value: V, ttl: Duration) {
        let expires_at = Instant::now() + ttl;
        self.entries.insert(key.into(), CacheEntry { value, expires_at });
    }

    /// Inserts or overwrites `key` with the default TTL.
    pub fn set_default(&self, key: impl Into<String>, value: V) {
        self.set(key, value, self.default_ttl);
    }

    /// Returns the value for `key` unless it is absent or expired.
    ///
    /// An expired entry found here is removed and its eviction hooks run.
    pub fn get(&self, key: &str) -> Option<V> {
        let now = Instant::now();
        {
            let entry = self.entries.get(key)?;
            if !entry.is_expired(now) {
                return Some(entry.value.clone());
            }
        }
        // Shard read guard released above; re-check under the write lock in
        // case a concurrent `set` refreshed the entry.
        if let Some((key, entry)) = self.entries.remove_if(key, |_, e| e.is_expired(now)) {
            self.hooks.invoke(&key, &entry.value);
        }
        None
    }

    /// Returns the remaining lifetime of `key`.
    pub fn ttl(&self, key: &str) -> Option<Duration> {
        let now = Instant::now();
        let entry = self.entries.get(key)?;
        (!entry.is_expired(now)).then(|| entry.expires_at - now)
    }

    /// Returns true if `key` holds an unexpired value.
    pub fn contains(&self, key: &str) -> bool {
        self.ttl(key).is_some()
    }

    /// Removes `key`, returning its value if it had not expired.
    ///
    /// Deleting a live entry fires no hooks. An entry that had already
    /// expired counts as an expiry and fires its hooks before `None` is
    /// returned.
    pub fn delete(&self, key: &str) -> Option<V> {
        let now = Instant::now();
        let (key, entry) = self.entries.remove(key)?;
        if entry.is_expired(now) {
            self.hooks.invoke(&key, &entry.value);
            return None;
        }
        Some(entry.value)
    }

    /// Removes every expired entry and fires its hooks.
    ///
    /// Returns the number of entries removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let expired: Vec<String> = self
            .entries
            .iter()
            .filter(|e| e.value().is_expired(now))
            .map(|e| e.key().clone())
            .collect();

        let mut removed = 0;
        for key in expired {
            if let Some((key, entry)) = self.entries.remove_if(&key, |_, e| e.is_expired(now)) {
                self.hooks.invoke(&key, &entry.value);
                removed += 1;
            }
        }
        removed
    }

    /// Registers an eviction hook for keys starting with `prefix`.
    pub fn on_evict<F>(&self, prefix: impl Into<String>, hook: F)
    where
        F: Fn(&str, &V) + Send + Sync + 'static,
    {
        self.hooks.on_evict(prefix, hook);
    }

    /// Number of stored entries, including expired ones not yet swept.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ExpiringCache<CacheValue> {
    /// Stores a typed value.
    pub fn set_typed<T: Any + Send + Sync>(&self, key: impl Into<String>, value: T, ttl: Duration) {
        self.set(key, Arc::new(value), ttl);
    }

    /// Returns the value for `key` if it holds a `T`.
    pub fn get_as<T: Any + Send + Sync>(&self, key: &str) -> Option<Arc<T>> {
        self.get(key)?.downcast::<T>().ok()
    }
}

impl<V> Sweepable for ExpiringCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn sweep(&self) -> usize {
        self.purge_expired()
    }

    fn label(&self) -> &'static str {
        "cache"
    }
}

impl<V> fmt::Debug for ExpiringCache<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExpiringCache")
            .field("entries", &self.entries.len())
            .field("default_ttl", &self.default_ttl)
            .field("hooks", &self.hooks)
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================
