// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Request admission filters.
//!
//! A [`FilterChain`] is an ordered list of [`RequestFilter`]s. Each filter
//! either admits the request or rejects it with an [`ApiError`]; the chain
//! stops at the first rejection and the inner service is never called. A
//! chain is a [`tower::Layer`], so it can wrap a whole router or a single
//! route.
//!
//! Filters are synchronous. Everything a filter commits (such as consuming a
//! rate-limit token) is decided before the handler runs, so a request
//! cancelled later leaves no half-applied admission state.

mod authenticate;
mod kit;
mod permission;
mod rate_limit;

pub use authenticate::{Authenticate, RequireAuth, caller_address};
pub use kit::FilterKit;
pub use permission::RequirePermission;
pub use rate_limit::RateLimit;

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::{
    body::Body,
    http::Request,
    response::{IntoResponse, Response},
};
use tower::{Layer, Service};

use crate::error::ApiError;

// =============================================================================
// RequestFilter
// =============================================================================

/// Decision of a single filter.
#[derive(Debug)]
pub enum Admission {
    /// Continue with the next filter.
    Admit,
    /// Stop and answer with this error.
    Reject(ApiError),
}

impl Admission {
    /// Returns `true` for [`Admission::Admit`].
    pub fn is_admit(&self) -> bool {
        matches!(self, Admission::Admit)
    }
}

/// One stage of the admission pipeline.
pub trait RequestFilter: Send + Sync + 'static {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Inspects, and may annotate, the request.
    fn apply(&self, request: &mut Request<Body>) -> Admission;
}

// =============================================================================
// FilterChain
// =============================================================================

/// Ordered list of filters, usable as a tower layer.
#[derive(Clone, Default)]
pub struct FilterChain {
    filters: Arc<Vec<Arc<dyn RequestFilter>>>,
}

impl FilterChain {
    /// Creates an empty chain that admits everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a filter.
    pub fn then<F: RequestFilter>(self, filter: F) -> Self {
        self.then_arc(Arc::new(filter))
    }

    /// Appends a shared filter.
    pub fn then_arc(mut self, filter: Arc<dyn RequestFilter>) -> Self {
        Arc::make_mut(&mut self.filters).push(filter);
        self
    }

    /// Appends every filter of `other`.
    pub fn extend(mut self, other: &FilterChain) -> Self {
        Arc::make_mut(&mut self.filters).extend(other.filters.iter().cloned());
        self
    }

    /// Filter names in evaluation order.
    pub fn names(&self) -> Vec<&'static str> {
        self.filters.iter().map(|f| f.name()).collect()
    }

    /// Number of filters.
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    /// Returns `true` if the chain has no filters.
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Runs the filters in order, stopping at the first rejection.
    pub fn evaluate(&self, request: &mut Request<Body>) -> Admission {
        for filter in self.filters.iter() {
            if let Admission::Reject(err) = filter.apply(request) {
                tracing::debug!(
                    filter = filter.name(),
                    method = %request.method(),
                    path = %request.uri().path(),
                    status = err.status_code().as_u16(),
                    "Request rejected"
                );
                return Admission::Reject(err);
            }
        }
        Admission::Admit
    }
}

impl fmt::Debug for FilterChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterChain")
            .field("filters", &self.names())
            .finish()
    }
}

impl<S> Layer<S> for FilterChain {
    type Service = FilterService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        FilterService {
            inner,
            chain: self.clone(),
        }
    }
}

// =============================================================================
// FilterService
// =============================================================================

/// Service produced by [`FilterChain`].
#[derive(Clone)]
pub struct FilterService<S> {
    inner: S,
    chain: FilterChain,
}

impl<S> Service<Request<Body>> for FilterService<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut request: Request<Body>) -> Self::Future {
        if let Admission::Reject(err) = self.chain.evaluate(&mut request) {
            return Box::pin(async move { Ok(err.into_response()) });
        }

        // Take the service that was driven to readiness, leave a fresh clone.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        Box::pin(async move { inner.call(request).await })
    }
}

// =============================================================================
// Tests
// =============================================================================
