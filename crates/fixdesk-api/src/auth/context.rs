// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Per-request caller identity.

use serde::{Deserialize, Serialize};

use super::ClaimSet;

/// Identity of an authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthInfo {
    /// User id from the verified claims.
    pub user: i64,
    /// Role from the verified claims.
    pub role: String,
    /// Caller network address.
    pub remote_address: String,
}

impl AuthInfo {
    /// Builds the identity from verified claims and the caller address.
    pub fn from_claims(claims: &ClaimSet, remote_address: impl Into<String>) -> Self {
        Self {
            user: claims.user_id,
            role: claims.user_role.clone(),
            remote_address: remote_address.into(),
        }
    }
}

/// Caller attached to every request that passed credential extraction.
///
/// Exactly one `Caller` is inserted into the request extensions. A request
/// without one never went through the authentication filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Caller {
    /// No credential was presented.
    Anonymous {
        /// Caller network address.
        remote_address: String,
    },
    /// A valid credential was presented.
    Authenticated(AuthInfo),
}

impl Caller {
    /// Returns the identity for authenticated callers.
    pub fn auth_info(&self) -> Option<&AuthInfo> {
        match self {
            Caller::Authenticated(info) => Some(info),
            Caller::Anonymous { .. } => None,
        }
    }

    /// Returns the caller network address.
    pub fn remote_address(&self) -> &str {
        match self {
            Caller::Anonymous { remote_address } => remote_address,
            Caller::Authenticated(info) => &info.remote_address,
        }
    }

    /// Returns `true` for anonymous callers.
    pub fn is_anonymous(&self) -> bool {
        matches!(self, Caller::Anonymous { .. })
    }
}
