// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Pre-built filters handed to modules.

use std::sync::Arc;

use fixdesk_config::FixdeskConfig;
use fixdesk_core::RateLimiter;

use super::{Authenticate, FilterChain, RateLimit, RequireAuth, RequirePermission};
use crate::auth::{CredentialExtractor, PermissionLookup};

/// Factory for the pipeline's filters, sharing one set of collaborators.
#[derive(Debug, Clone)]
pub struct FilterKit {
    authenticate: Authenticate,
    rate_limit: RateLimit,
    permissions: Arc<dyn PermissionLookup>,
    anonymous_role: String,
}

impl FilterKit {
    /// Builds the kit from shared state and configuration.
    pub fn new(
        config: &FixdeskConfig,
        credentials: Arc<CredentialExtractor>,
        permissions: Arc<dyn PermissionLookup>,
        limiter: Arc<RateLimiter>,
    ) -> Self {
        let trust = config.server.trust_proxy_headers;
        Self {
            authenticate: Authenticate::new(credentials, trust),
            rate_limit: RateLimit::new(limiter, config.rate_limit.key_by)
                .enabled(config.rate_limit.enabled)
                .trust_proxy_headers(trust),
            permissions,
            anonymous_role: config.permissions.anonymous_role.clone(),
        }
    }

    /// Credential verification filter.
    pub fn authenticate(&self) -> Authenticate {
        self.authenticate.clone()
    }

    /// Rejects anonymous callers.
    pub fn require_auth(&self) -> RequireAuth {
        RequireAuth
    }

    /// Rejects callers lacking `permission`.
    pub fn require_permission(&self, permission: impl Into<String>) -> RequirePermission {
        RequirePermission::new(permission, self.permissions.clone(), self.anonymous_role.clone())
    }

    /// Token-bucket filter.
    pub fn rate_limit(&self) -> RateLimit {
        self.rate_limit.clone()
    }

    /// Router-wide chain: credential extraction only.
    pub fn gate(&self) -> FilterChain {
        FilterChain::new().then(self.authenticate())
    }

    /// Chain for public routes.
    pub fn public(&self) -> FilterChain {
        FilterChain::new().then(self.rate_limit())
    }

    /// Chain for routes that demand an authenticated caller.
    pub fn authenticated(&self) -> FilterChain {
        FilterChain::new()
            .then(self.require_auth())
            .then(self.rate_limit())
    }

    /// Chain for routes open to any role holding `permission`, including
    /// the anonymous role.
    pub fn permitted(&self, permission: impl Into<String>) -> FilterChain {
        FilterChain::new()
            .then(self.require_permission(permission))
            .then(self.rate_limit())
    }

    /// Chain for routes that demand an authenticated caller holding
    /// `permission`.
    pub fn protected(&self, permission: impl Into<String>) -> FilterChain {
        FilterChain::new()
            .then(self.require_auth())
            .then(self.require_permission(permission))
            .then(self.rate_limit())
    }
}
