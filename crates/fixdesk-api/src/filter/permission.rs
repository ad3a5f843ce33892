// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Permission gate filter.

use std::sync::Arc;

use axum::{body::Body, http::Request};

use super::{Admission, RequestFilter};
use crate::auth::{Caller, PermissionLookup};
use crate::error::ApiError;

/// Rejects callers whose role does not hold `permission`.
///
/// Callers without an [`AuthInfo`](crate::auth::AuthInfo) are checked with
/// the anonymous role.
#[derive(Debug, Clone)]
pub struct RequirePermission {
    permission: String,
    lookup: Arc<dyn PermissionLookup>,
    anonymous_role: String,
}

impl RequirePermission {
    /// Creates the filter for one permission string.
    pub fn new(
        permission: impl Into<String>,
        lookup: Arc<dyn PermissionLookup>,
        anonymous_role: impl Into<String>,
    ) -> Self {
        Self {
            permission: permission.into(),
            lookup,
            anonymous_role: anonymous_role.into(),
        }
    }

    /// The permission this filter checks.
    pub fn permission(&self) -> &str {
        &self.permission
    }
}

impl RequestFilter for RequirePermission {
    fn name(&self) -> &'static str {
        "require_permission"
    }

    fn apply(&self, request: &mut Request<Body>) -> Admission {
        let role = request
            .extensions()
            .get::<Caller>()
            .and_then(Caller::auth_info)
            .map(|info| info.role.as_str())
            .unwrap_or(self.anonymous_role.as_str());

        match self.lookup.allowed(role, &self.permission) {
            Ok(true) => Admission::Admit,
            Ok(false) => Admission::Reject(ApiError::forbidden(format!(
                "permission denied: {}",
                self.permission
            ))),
            Err(err) => {
                tracing::warn!(
                    role = %role,
                    permission = %self.permission,
                    error = %err,
                    "Permission lookup failed"
                );
                Admission::Reject(ApiError::forbidden(format!(
                    "permission denied: {}",
                    self.permission
                )))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{AuthInfo, LookupError, PermissionTable};
    use axum::http::StatusCode;

    #[derive(Debug)]
    struct Failing;

    impl PermissionLookup for Failing {
        fn allowed(&self, _role: &str, _permission: &str) -> Result<bool, LookupError> {
            Err(LookupError("table offline".to_string()))
        }
    }

    fn table() -> Arc<dyn PermissionLookup> {
        Arc::new(
            PermissionTable::new()
                .with_role("manager", ["order:assign"])
                .with_role("guest", ["order:read"]),
        )
    }

    fn request_as(role: Option<&str>) -> Request<Body> {
        let mut request = Request::builder().body(Body::empty()).unwrap();
        let caller = match role {
            Some(role) => Caller::Authenticated(AuthInfo {
                user: 7,
                role: role.to_string(),
                remote_address: "127.0.0.1".to_string(),
            }),
            None => Caller::Anonymous {
                remote_address: "127.0.0.1".to_string(),
            },
        };
        request.extensions_mut().insert(caller);
        request
    }

    fn rejected_with(admission: Admission) -> Option<StatusCode> {
        match admission {
            Admission::Admit => None,
            Admission::Reject(err) => Some(err.status_code()),
        }
    }

    #[test]
    fn test_role_with_permission_admitted() {
        let filter = RequirePermission::new("order:assign", table(), "guest");
        assert!(filter.apply(&mut request_as(Some("manager"))).is_admit());
    }

    #[test]
    fn test_role_without_permission_denied() {
        let filter = RequirePermission::new("order:assign", table(), "guest");
        assert_eq!(
            rejected_with(filter.apply(&mut request_as(Some("technician")))),
            Some(StatusCode::FORBIDDEN)
        );
    }

    #[test]
    fn test_anonymous_uses_lowest_role() {
        let read = RequirePermission::new("order:read", table(), "guest");
        assert!(read.apply(&mut request_as(None)).is_admit());

        let assign = RequirePermission::new("order:assign", table(), "guest");
        assert_eq!(
            rejected_with(assign.apply(&mut request_as(None))),
            Some(StatusCode::FORBIDDEN)
        );
    }

    #[test]
    fn test_missing_caller_treated_as_anonymous() {
        let filter = RequirePermission::new("order:read", table(), "guest");
        let mut request = Request::builder().body(Body::empty()).unwrap();
        assert!(filter.apply(&mut request).is_admit());
    }

    #[test]
    fn test_lookup_error_denies() {
        let filter = RequirePermission::new("order:read", Arc::new(Failing), "guest");
        assert_eq!(
            rejected_with(filter.apply(&mut request_as(Some("admin")))),
            Some(StatusCode::FORBIDDEN)
        );
    }
}
