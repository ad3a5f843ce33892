// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Custom extractors for handlers.

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::auth::{AuthInfo, Caller};
use crate::error::ApiError;

// =============================================================================
// Auth Extractor
// =============================================================================

/// Extracts the authenticated caller's [`AuthInfo`].
///
/// Anonymous callers get 401 "authentication required". A request without
/// any caller context gets 401 "authentication context missing".
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(Auth(info): Auth) -> impl IntoResponse {
///     format!("Hello, user {}", info.user)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Auth(pub AuthInfo);

impl<S> FromRequestParts<S> for Auth
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match parts.extensions.get::<Caller>() {
            Some(Caller::Authenticated(info)) => Ok(Auth(info.clone())),
            Some(Caller::Anonymous { .. }) => Err(ApiError::authentication_required()),
            None => {
                tracing::warn!(path = %parts.uri.path(), "Handler reached without caller context");
                Err(ApiError::auth_context_missing())
            }
        }
    }
}

// =============================================================================
// Optional Auth Extractor
// =============================================================================

/// Extracts the [`AuthInfo`] if the caller is authenticated.
#[derive(Debug, Clone)]
pub struct OptionalAuth(pub Option<AuthInfo>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let info = parts
            .extensions
            .get::<Caller>()
            .and_then(Caller::auth_info)
            .cloned();
        Ok(OptionalAuth(info))
    }
}

// =============================================================================
// Caller Address Extractor
// =============================================================================

/// Extracts the caller network address resolved by the authentication gate.
#[derive(Debug, Clone)]
pub struct CallerAddr(pub String);

impl<S> FromRequestParts<S> for CallerAddr
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let addr = parts
            .extensions
            .get::<Caller>()
            .map(|c| c.remote_address().to_string())
            .unwrap_or_else(|| "unknown".to_string());
        Ok(CallerAddr(addr))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request};

    fn parts(caller: Option<Caller>) -> Parts {
        let mut request = Request::builder().uri("/x").body(Body::empty()).unwrap();
        if let Some(caller) = caller {
            request.extensions_mut().insert(caller);
        }
        request.into_parts().0
    }

    fn info() -> AuthInfo {
        AuthInfo {
            user: 3,
            role: "reporter".to_string(),
            remote_address: "192.0.2.1".to_string(),
        }
    }

    #[tokio::test]
    async fn test_auth_extractor() {
        let mut authed = parts(Some(Caller::Authenticated(info())));
        let Auth(extracted) = Auth::from_request_parts(&mut authed, &()).await.unwrap();
        assert_eq!(extracted, info());

        let mut anonymous = parts(Some(Caller::Anonymous {
            remote_address: "192.0.2.1".to_string(),
        }));
        let err = Auth::from_request_parts(&mut anonymous, &()).await.unwrap_err();
        assert_eq!(err.user_message(), "authentication required");

        let mut missing = parts(None);
        let err = Auth::from_request_parts(&mut missing, &()).await.unwrap_err();
        assert_eq!(err.user_message(), "authentication context missing");
    }

    #[tokio::test]
    async fn test_optional_auth_and_addr() {
        let mut anonymous = parts(Some(Caller::Anonymous {
            remote_address: "192.0.2.9".to_string(),
        }));
        let OptionalAuth(info) = OptionalAuth::from_request_parts(&mut anonymous, &())
            .await
            .unwrap();
        assert!(info.is_none());

        let CallerAddr(addr) = CallerAddr::from_request_parts(&mut anonymous, &())
            .await
            .unwrap();
        assert_eq!(addr, "192.0.2.9");
    }
}
