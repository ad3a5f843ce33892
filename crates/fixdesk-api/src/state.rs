// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Process-scoped application context.

use std::sync::Arc;
use std::time::{Duration, Instant};

use fixdesk_config::FixdeskConfig;
use fixdesk_core::{
    CacheValue, ExpiringCache, RateLimiter, RateLimiterConfig, SweepHandle, Sweeper,
};
use parking_lot::RwLock;

use crate::auth::{CredentialExtractor, PermissionLookup, PermissionTable};
use crate::error::{ApiError, ApiResult};
use crate::filter::FilterKit;
use crate::module::ModuleInfo;

// =============================================================================
// AppContext
// =============================================================================

/// Shared state threaded into every filter, handler and module.
///
/// Built once at start-up. Cloning is cheap; every clone refers to the same
/// limiter, cache and module catalog.
#[derive(Clone)]
pub struct AppContext {
    config: Arc<FixdeskConfig>,
    credentials: Arc<CredentialExtractor>,
    permissions: Arc<dyn PermissionLookup>,
    limiter: Arc<RateLimiter>,
    cache: Arc<ExpiringCache<CacheValue>>,
    modules: Arc<RwLock<Vec<ModuleInfo>>>,
    filters: FilterKit,
    started_at: Instant,
}

impl AppContext {
    /// Creates a context builder.
    pub fn builder(config: FixdeskConfig) -> AppContextBuilder {
        AppContextBuilder::new(config)
    }

    /// Builds a context with default collaborators.
    pub fn from_config(config: FixdeskConfig) -> ApiResult<Self> {
        Self::builder(config).build()
    }

    /// Configuration the context was built from.
    pub fn config(&self) -> &FixdeskConfig {
        &self.config
    }

    /// Bearer credential verifier.
    pub fn credentials(&self) -> &Arc<CredentialExtractor> {
        &self.credentials
    }

    /// Role to permission lookup.
    pub fn permissions(&self) -> &Arc<dyn PermissionLookup> {
        &self.permissions
    }

    /// Per-caller token buckets.
    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    /// Process-wide expiring cache.
    pub fn cache(&self) -> &Arc<ExpiringCache<CacheValue>> {
        &self.cache
    }

    /// Pre-built pipeline filters.
    pub fn filters(&self) -> &FilterKit {
        &self.filters
    }

    /// Snapshot of the module catalog.
    pub fn modules(&self) -> Vec<ModuleInfo> {
        self.modules.read().clone()
    }

    pub(crate) fn set_modules(&self, modules: Vec<ModuleInfo>) {
        *self.modules.write() = modules;
    }

    /// Time since the context was built.
    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Starts the limiter and cache sweepers.
    ///
    /// Must be called from within a tokio runtime. The sweepers stop when
    /// the returned value is dropped.
    pub fn start_background_tasks(&self) -> BackgroundTasks {
        BackgroundTasks {
            handles: vec![
                Sweeper::spawn(&self.limiter, self.limiter.config().purge_interval),
                Sweeper::spawn(&self.cache, self.config.cache.purge),
            ],
        }
    }
}

impl std::fmt::Debug for AppContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppContext")
            .field("limiter", &self.limiter)
            .field("cache", &self.cache)
            .field("modules", &self.modules.read().len())
            .finish_non_exhaustive()
    }
}

/// Running sweepers owned by the context.
#[derive(Debug)]
pub struct BackgroundTasks {
    handles: Vec<SweepHandle>,
}

impl BackgroundTasks {
    /// Labels of the running sweepers.
    pub fn labels(&self) -> Vec<&'static str> {
        self.handles.iter().map(SweepHandle::label).collect()
    }

    /// Stops every sweeper.
    pub fn stop(self) {
        for handle in self.handles {
            tracing::debug!(sweeper = handle.label(), "Stopping sweeper");
            handle.stop();
        }
    }
}

// =============================================================================
// AppContextBuilder
// =============================================================================

/// Builder for [`AppContext`].
pub struct AppContextBuilder {
    config: FixdeskConfig,
    permissions: Option<Arc<dyn PermissionLookup>>,
    cache: Option<Arc<ExpiringCache<CacheValue>>>,
}

impl AppContextBuilder {
    /// Creates a builder.
    pub fn new(config: FixdeskConfig) -> Self {
        Self {
            config,
            permissions: None,
            cache: None,
        }
    }

    /// Replaces the configured permission table.
    pub fn permissions(mut self, lookup: Arc<dyn PermissionLookup>) -> Self {
        self.permissions = Some(lookup);
        self
    }

    /// Uses an existing cache.
    pub fn cache(mut self, cache: Arc<ExpiringCache<CacheValue>>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Builds the context.
    ///
    /// # Errors
    ///
    /// Fails if the signing key is empty or the rate-limit parameters are
    /// invalid.
    pub fn build(self) -> ApiResult<AppContext> {
        let config = self.config;

        let credentials = Arc::new(CredentialExtractor::new(&config.auth)?);

        let permissions = self
            .permissions
            .unwrap_or_else(|| Arc::new(PermissionTable::from_config(&config.permissions)));

        let limiter_config = RateLimiterConfig::new(config.rate_limit.rate, config.rate_limit.burst)
            .with_purge_interval(config.rate_limit.purge)
            .with_idle_expire(config.rate_limit.expire);
        let limiter = Arc::new(
            RateLimiter::new(limiter_config).map_err(|e| ApiError::internal(e.to_string()))?,
        );

        let cache = self
            .cache
            .unwrap_or_else(|| Arc::new(ExpiringCache::new(config.cache.default_ttl)));

        let filters = FilterKit::new(&config, credentials.clone(), permissions.clone(), limiter.clone());

        Ok(AppContext {
            config: Arc::new(config),
            credentials,
            permissions,
            limiter,
            cache,
            modules: Arc::new(RwLock::new(Vec::new())),
            filters,
            started_at: Instant::now(),
        })
    }
}

impl axum::extract::FromRef<AppContext> for Arc<CredentialExtractor> {
    fn from_ref(context: &AppContext) -> Self {
        context.credentials.clone()
    }
}

impl axum::extract::FromRef<AppContext> for Arc<ExpiringCache<CacheValue>> {
    fn from_ref(context: &AppContext) -> Self {
        context.cache.clone()
    }
}
