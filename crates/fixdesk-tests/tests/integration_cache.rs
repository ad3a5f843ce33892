// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Cache Integration Tests
//!
//! - `test_expiry_*`: Lazy expiry and sweeps
//! - `test_hooks_*`: Prefix eviction hooks
//! - `test_shared_*`: The context-owned cache

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use fixdesk_api::AppContext;
use fixdesk_core::{ExpiringCache, Sweeper};
use fixdesk_tests::common::*;
use parking_lot::Mutex;

// =============================================================================
// Expiry Tests
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_expiry_lazy_on_read() {
    let cache: ExpiringCache<u32> = ExpiringCache::new(Duration::from_secs(60));
    cache.set("session:1", 7, Duration::from_secs(5));

    tokio::time::advance(Duration::from_secs(4)).await;
    assert_eq!(cache.get("session:1"), Some(7));
    assert_eq!(cache.ttl("session:1"), Some(Duration::from_secs(1)));

    tokio::time::advance(Duration::from_secs(1)).await;
    assert_eq!(cache.get("session:1"), None);
    assert!(cache.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_expiry_overwrite_resets_ttl() {
    let cache: ExpiringCache<&'static str> = ExpiringCache::new(Duration::from_secs(10));
    cache.set_default("k", "old");

    tokio::time::advance(Duration::from_secs(8)).await;
    cache.set_default("k", "new");

    tokio::time::advance(Duration::from_secs(8)).await;
    assert_eq!(cache.get("k"), Some("new"));
}

#[tokio::test(start_paused = true)]
async fn test_expiry_sweeper_removes_unread_entries() {
    let cache = Arc::new(ExpiringCache::<u32>::new(Duration::from_secs(60)));
    cache.set("a", 1, Duration::from_secs(2));
    cache.set("b", 2, Duration::from_secs(30));
    let _handle = Sweeper::spawn(&cache, Duration::from_secs(1));

    tokio::time::sleep(Duration::from_millis(3500)).await;
    assert_eq!(cache.len(), 1);
    assert!(cache.contains("b"));
}

// =============================================================================
// Hook Tests
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_hooks_fire_once_per_expired_entry() {
    let cache: ExpiringCache<u32> = ExpiringCache::new(Duration::from_secs(60));
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    cache.on_evict("upload:", move |key, value| {
        sink.lock().push(format!("{key}={value}"));
    });

    cache.set("upload:1", 10, Duration::from_secs(1));
    cache.set("upload:2", 20, Duration::from_secs(1));
    cache.set("other:3", 30, Duration::from_secs(1));
    tokio::time::advance(Duration::from_secs(2)).await;

    assert_eq!(cache.get("upload:1"), None);
    assert_eq!(cache.purge_expired(), 2);
    assert_eq!(cache.purge_expired(), 0);

    let mut seen = seen.lock().clone();
    seen.sort();
    assert_eq!(seen, vec!["upload:1=10", "upload:2=20"]);
}

#[tokio::test(start_paused = true)]
async fn test_hooks_skip_explicit_delete() {
    let cache: ExpiringCache<u32> = ExpiringCache::new(Duration::from_secs(60));
    let fired = Arc::new(AtomicUsize::new(0));
    let counter = fired.clone();
    cache.on_evict("", move |_, _| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    cache.set("k", 1, Duration::from_secs(1));
    assert_eq!(cache.delete("k"), Some(1));

    tokio::time::advance(Duration::from_secs(2)).await;
    assert_eq!(cache.purge_expired(), 0);
    assert_eq!(fired.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn test_hooks_overlapping_prefixes_all_run() {
    let cache: ExpiringCache<u32> = ExpiringCache::new(Duration::from_secs(60));
    let fired = Arc::new(AtomicUsize::new(0));
    for prefix in ["img", "img:", "img:thumb:", "doc:"] {
        let counter = fired.clone();
        cache.on_evict(prefix, move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
    }

    cache.set("img:thumb:9", 1, Duration::from_secs(1));
    tokio::time::advance(Duration::from_secs(1)).await;
    assert_eq!(cache.purge_expired(), 1);
    assert_eq!(fired.load(Ordering::SeqCst), 3);
}

// =============================================================================
// Shared Cache Tests
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_shared_cache_typed_values_and_sweeps() {
    let mut config = test_config();
    config.cache.default_ttl = Duration::from_secs(10);
    config.cache.purge = Duration::from_secs(2);
    let context = AppContext::from_config(config).unwrap();
    let tasks = context.start_background_tasks();
    assert_eq!(tasks.labels(), vec!["rate_limiter", "cache"]);

    let cache = context.cache();
    cache.set_typed("ticket:1", String::from("pump leaking"), Duration::from_secs(5));
    assert_eq!(
        cache.get_as::<String>("ticket:1").as_deref().map(String::as_str),
        Some("pump leaking")
    );
    assert!(cache.get_as::<u64>("ticket:1").is_none());

    tokio::time::sleep(Duration::from_secs(7)).await;
    assert!(cache.is_empty());

    tasks.stop();
}
