// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Authentication gate filters.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{HeaderMap, Request},
};

use super::{Admission, RequestFilter};
use crate::auth::{AuthInfo, Caller, CredentialError, CredentialExtractor};
use crate::error::ApiError;

const X_FORWARDED_FOR: &str = "x-forwarded-for";
const X_REAL_IP: &str = "x-real-ip";
const UNKNOWN_ADDRESS: &str = "unknown";

/// Resolves the caller network address of a request.
///
/// Proxy headers are only consulted when `trust_proxy_headers` is set.
pub fn caller_address(request: &Request<Body>, trust_proxy_headers: bool) -> String {
    if trust_proxy_headers {
        if let Some(addr) = forwarded_address(request.headers()) {
            return addr;
        }
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| UNKNOWN_ADDRESS.to_string())
}

fn forwarded_address(headers: &HeaderMap) -> Option<String> {
    let first_hop = headers
        .get(X_FORWARDED_FOR)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());
    if let Some(hop) = first_hop {
        return Some(hop.to_string());
    }

    headers
        .get(X_REAL_IP)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

// =============================================================================
// Authenticate
// =============================================================================

/// Verifies the bearer credential and attaches a [`Caller`].
///
/// A missing credential yields an anonymous caller. A credential that is
/// present but invalid rejects the request with 401.
#[derive(Debug, Clone)]
pub struct Authenticate {
    credentials: Arc<CredentialExtractor>,
    trust_proxy_headers: bool,
}

impl Authenticate {
    /// Creates the filter.
    pub fn new(credentials: Arc<CredentialExtractor>, trust_proxy_headers: bool) -> Self {
        Self {
            credentials,
            trust_proxy_headers,
        }
    }
}

impl RequestFilter for Authenticate {
    fn name(&self) -> &'static str {
        "authenticate"
    }

    fn apply(&self, request: &mut Request<Body>) -> Admission {
        let remote_address = caller_address(request, self.trust_proxy_headers);

        let caller = match self.credentials.extract_from_headers(request.headers()) {
            Ok(claims) => Caller::Authenticated(AuthInfo::from_claims(&claims, remote_address)),
            Err(CredentialError::Missing) => Caller::Anonymous { remote_address },
            Err(err) => {
                tracing::debug!(
                    remote_address = %remote_address,
                    path = %request.uri().path(),
                    reason = %err,
                    "Credential rejected"
                );
                return Admission::Reject(err.into());
            }
        };

        request.extensions_mut().insert(caller);
        Admission::Admit
    }
}

// =============================================================================
// RequireAuth
// =============================================================================

/// Rejects anonymous callers.
///
/// A request that reaches this filter with no [`Caller`] at all was routed
/// around [`Authenticate`]; that state is answered with 401 as well.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequireAuth;

impl RequestFilter for RequireAuth {
    fn name(&self) -> &'static str {
        "require_auth"
    }

    fn apply(&self, request: &mut Request<Body>) -> Admission {
        match request.extensions().get::<Caller>() {
            Some(Caller::Authenticated(_)) => Admission::Admit,
            Some(Caller::Anonymous { .. }) => Admission::Reject(ApiError::authentication_required()),
            None => {
                tracing::warn!(
                    path = %request.uri().path(),
                    "Authenticated route reached without caller context"
                );
                Admission::Reject(ApiError::auth_context_missing())
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
