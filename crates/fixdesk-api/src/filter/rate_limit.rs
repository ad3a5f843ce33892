// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Rate-limit filter.

use std::sync::Arc;

use axum::{body::Body, http::Request};
use fixdesk_config::RateLimitKey;
use fixdesk_core::{RateDecision, RateLimiter};

use super::{Admission, RequestFilter, caller_address};
use crate::auth::Caller;
use crate::error::ApiError;

/// Consumes one token from the caller's bucket.
#[derive(Debug, Clone)]
pub struct RateLimit {
    limiter: Arc<RateLimiter>,
    enabled: bool,
    key_by: RateLimitKey,
    trust_proxy_headers: bool,
}

impl RateLimit {
    /// Creates the filter.
    pub fn new(limiter: Arc<RateLimiter>, key_by: RateLimitKey) -> Self {
        Self {
            limiter,
            enabled: true,
            key_by,
            trust_proxy_headers: false,
        }
    }

    /// Turns the filter into a pass-through when `enabled` is false.
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Trusts proxy headers when no caller context is present.
    pub fn trust_proxy_headers(mut self, trust: bool) -> Self {
        self.trust_proxy_headers = trust;
        self
    }

    /// Bucket key for a request.
    pub fn key_for(&self, request: &Request<Body>) -> String {
        match request.extensions().get::<Caller>() {
            Some(Caller::Authenticated(info)) if self.key_by == RateLimitKey::User => {
                format!("user:{}", info.user)
            }
            Some(caller) => format!("addr:{}", caller.remote_address()),
            None => format!(
                "addr:{}",
                caller_address(request, self.trust_proxy_headers)
            ),
        }
    }
}

impl RequestFilter for RateLimit {
    fn name(&self) -> &'static str {
        "rate_limit"
    }

    fn apply(&self, request: &mut Request<Body>) -> Admission {
        if !self.enabled {
            return Admission::Admit;
        }

        let key = self.key_for(request);
        match self.limiter.check(&key) {
            RateDecision::Admitted { .. } => Admission::Admit,
            decision @ RateDecision::Limited { .. } => {
                let retry_after = decision.retry_after_secs().unwrap_or(1);
                tracing::debug!(key = %key, retry_after, "Rate limit exceeded");
                Admission::Reject(ApiError::rate_limited(retry_after))
            }
        }
    }
}
