// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Handle passed to a module's entry point.

use std::collections::HashMap;

use axum::{Router, routing::MethodRouter};
use fixdesk_core::{CacheValue, ExpiringCache};
use serde_json::Value;

use super::{ExportedFn, ModuleError, ModuleExports};
use crate::filter::{FilterChain, FilterKit};
use crate::server::BUILTIN_PATHS;
use crate::state::AppContext;

/// Routing surface and imports available while a module attaches.
///
/// Routes added here are merged into the shared router only if the entry
/// point returns `Ok`.
///
/// A path may be registered several times by the same module (one method
/// router per call), but never over a built-in route or a path owned by
/// another module.
pub struct ModuleServer<'a> {
    module: &'a str,
    context: &'a AppContext,
    published: &'a HashMap<String, ModuleExports>,
    claimed: &'a HashMap<String, String>,
    router: Router<AppContext>,
    paths: Vec<String>,
    hooks: usize,
}

impl<'a> ModuleServer<'a> {
    pub(crate) fn new(
        module: &'a str,
        context: &'a AppContext,
        published: &'a HashMap<String, ModuleExports>,
        claimed: &'a HashMap<String, String>,
    ) -> Self {
        Self {
            module,
            context,
            published,
            claimed,
            router: Router::new(),
            paths: Vec::new(),
            hooks: 0,
        }
    }

    /// Name of the module being attached.
    pub fn module_name(&self) -> &str {
        self.module
    }

    /// Adds a route behind the router-wide gate only.
    ///
    /// Fails with [`ModuleError::Attach`] when `path` clashes with a
    /// built-in route or a route of another module.
    pub fn route(
        &mut self,
        path: &str,
        method_router: MethodRouter<AppContext>,
    ) -> Result<&mut Self, ModuleError> {
        if !path.starts_with('/') {
            return Err(ModuleError::attach(
                self.module,
                format!("route '{path}' must start with '/'"),
            ));
        }
        let shape = route_shape(path);
        if BUILTIN_PATHS.iter().any(|builtin| route_shape(builtin) == shape) {
            return Err(ModuleError::attach(
                self.module,
                format!("route '{path}' clashes with a built-in route"),
            ));
        }
        if let Some(owner) = self.claimed.get(&shape) {
            return Err(ModuleError::attach(
                self.module,
                format!("route '{path}' is already registered by module '{owner}'"),
            ));
        }

        self.router = std::mem::take(&mut self.router).route(path, method_router);
        if !self.paths.contains(&shape) {
            self.paths.push(shape);
        }
        Ok(self)
    }

    /// Adds a route wrapped in `chain`.
    pub fn route_with(
        &mut self,
        path: &str,
        method_router: MethodRouter<AppContext>,
        chain: FilterChain,
    ) -> Result<&mut Self, ModuleError> {
        tracing::trace!(
            module = %self.module,
            path = %path,
            filters = ?chain.names(),
            "Adding filtered route"
        );
        self.route(path, method_router.layer(chain))
    }

    /// Pre-built pipeline filters.
    pub fn filters(&self) -> &FilterKit {
        self.context.filters()
    }

    /// Shared application context.
    pub fn context(&self) -> &AppContext {
        self.context
    }

    /// Process-wide expiring cache.
    pub fn cache(&self) -> &ExpiringCache<CacheValue> {
        self.context.cache()
    }

    /// Key prefix this module should use for its cache entries.
    pub fn cache_prefix(&self) -> String {
        format!("{}:", self.module)
    }

    /// Subscribes to expiry of cache entries whose key starts with `prefix`.
    pub fn on_evict<F>(&mut self, prefix: impl Into<String>, hook: F) -> &mut Self
    where
        F: Fn(&str, &CacheValue) + Send + Sync + 'static,
    {
        self.context.cache().on_evict(prefix, hook);
        self.hooks += 1;
        self
    }

    /// Reads a value exported by an already attached module.
    pub fn import_value(&self, module: &str, name: &str) -> Result<Value, ModuleError> {
        self.published
            .get(module)
            .and_then(|exports| exports.get_value(name))
            .cloned()
            .ok_or_else(|| ModuleError::dependency_missing(module, name))
    }

    /// Reads a function exported by an already attached module.
    pub fn import_fn(&self, module: &str, name: &str) -> Result<ExportedFn, ModuleError> {
        self.published
            .get(module)
            .and_then(|exports| exports.get_fn(name))
            .cloned()
            .ok_or_else(|| ModuleError::dependency_missing(module, name))
    }

    pub(crate) fn route_count(&self) -> usize {
        self.paths.len()
    }

    pub(crate) fn hook_count(&self) -> usize {
        self.hooks
    }

    /// Router and the normalised paths it serves.
    pub(crate) fn into_parts(self) -> (Router<AppContext>, Vec<String>) {
        (self.router, self.paths)
    }
}

/// Path with every `{param}` segment blanked, so `/a/{id}` and `/a/{key}`
/// compare equal the way the router sees them.
pub(crate) fn route_shape(path: &str) -> String {
    let mut shape = String::with_capacity(path.len());
    for segment in path.split('/').skip(1) {
        shape.push('/');
        if segment.starts_with("{*") {
            shape.push_str("{*}");
        } else if segment.starts_with('{') && segment.ends_with('}') {
            shape.push_str("{}");
        } else {
            shape.push_str(segment);
        }
    }
    if shape.is_empty() {
        shape.push('/');
    }
    shape
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_shape() {
        assert_eq!(route_shape("/"), "/");
        assert_eq!(route_shape("/api/v1/images"), "/api/v1/images");
        assert_eq!(route_shape("/api/v1/images/{id}"), route_shape("/api/v1/images/{key}"));
        assert_eq!(route_shape("/files/{*rest}"), "/files/{*}");
        assert_ne!(route_shape("/api/v1/images"), route_shape("/api/v1/images/{id}"));
    }
}
