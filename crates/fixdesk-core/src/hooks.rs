// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Eviction hooks.
//!
//! Feature modules own a key prefix in the shared cache and may subscribe a
//! callback that runs whenever one of their entries expires. Hooks are
//! matched by prefix and invoked after the entry has been removed, with no
//! cache lock held, so a hook may freely read or write the cache.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

/// Callback invoked with the key and value of an expired entry.
pub type EvictionHook<V> = Arc<dyn Fn(&str, &V) + Send + Sync>;

/// Registry of eviction callbacks keyed by key prefix.
pub struct EvictionHooks<V> {
    hooks: RwLock<Vec<(String, EvictionHook<V>)>>,
}

impl<V> EvictionHooks<V> {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            hooks: RwLock::new(Vec::new()),
        }
    }

    /// Registers a hook for every key starting with `prefix`.
    ///
    /// An empty prefix matches every key.
    pub fn on_evict<F>(&self, prefix: impl Into<String>, hook: F)
    where
        F: Fn(&str, &V) + Send + Sync + 'static,
    {
        let prefix = prefix.into();
        tracing::debug!(prefix = %prefix, "Eviction hook registered");
        self.hooks.write().push((prefix, Arc::new(hook)));
    }

    /// Invokes every hook whose prefix matches `key`.
    ///
    /// Returns the number of hooks invoked.
    pub fn invoke(&self, key: &str, value: &V) -> usize {
        // Clone the matching callbacks out so none runs under the lock.
        let matching: Vec<EvictionHook<V>> = self
            .hooks
            .read()
            .iter()
            .filter(|(prefix, _)| key.starts_with(prefix.as_str()))
            .map(|(_, hook)| Arc::clone(hook))
            .collect();

        for hook in &matching {
            hook(key, value);
        }
        matching.len()
    }

    /// Returns the number of registered hooks.
    pub fn len(&self) -> usize {
        self.hooks.read().len()
    }

    /// Returns true if no hook is registered.
    pub fn is_empty(&self) -> bool {
        self.hooks.read().is_empty()
    }

    /// Removes all hooks.
    pub fn clear(&self) {
        self.hooks.write().clear();
    }
}

impl<V> Default for EvictionHooks<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> fmt::Debug for EvictionHooks<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefixes: Vec<String> = self.hooks.read().iter().map(|(p, _)| p.clone()).collect();
        f.debug_struct("EvictionHooks")
            .field("prefixes", &prefixes)
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================
