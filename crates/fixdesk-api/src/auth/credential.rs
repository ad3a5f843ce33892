// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Bearer credential extraction and verification.
//!
//! Tokens are HS256 JWTs signed with a single pre-shared key. A missing
//! header is reported as [`CredentialError::Missing`], which callers treat
//! as anonymous access; every other error is terminal.

use std::sync::Arc;
use std::time::Duration;

use axum::http::{HeaderMap, header};
use fixdesk_config::AuthConfig;
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use thiserror::Error;

use super::ClaimSet;
use crate::error::{ApiError, ApiResult};

/// The only accepted signing algorithm.
pub const SIGNING_ALGORITHM: Algorithm = Algorithm::HS256;

// =============================================================================
// CredentialError
// =============================================================================

/// Why a request carries no usable credential.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CredentialError {
    /// No `Authorization` header.
    #[error("credential missing")]
    Missing,

    /// The header or token cannot be parsed, or its claims have the wrong shape.
    #[error("malformed credential: {0}")]
    Malformed(String),

    /// The signature does not verify against the signing key.
    #[error("invalid credential signature")]
    SignatureInvalid,

    /// The token expired.
    #[error("credential expired")]
    Expired,
}

impl CredentialError {
    /// Returns `true` when no credential was presented at all.
    pub fn is_missing(&self) -> bool {
        matches!(self, CredentialError::Missing)
    }
}

impl From<jsonwebtoken::errors::Error> for CredentialError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            ErrorKind::ExpiredSignature => CredentialError::Expired,
            ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                CredentialError::SignatureInvalid
            }
            _ => CredentialError::Malformed(err.to_string()),
        }
    }
}

// =============================================================================
// CredentialExtractor
// =============================================================================

/// Verifies bearer tokens and mints new ones.
#[derive(Clone)]
pub struct CredentialExtractor {
    encoding_key: Arc<EncodingKey>,
    decoding_key: Arc<DecodingKey>,
    validation: Arc<Validation>,
    issuer: Option<String>,
    token_ttl: Duration,
}

impl CredentialExtractor {
    /// Creates an extractor from the auth configuration.
    ///
    /// Fails when the signing key is empty.
    pub fn new(config: &AuthConfig) -> ApiResult<Self> {
        let secret = config.signing_key.expose();
        if secret.is_empty() {
            return Err(ApiError::internal("signing key is not configured"));
        }

        let mut validation = Validation::new(SIGNING_ALGORITHM);
        validation.leeway = config.leeway.as_secs();
        validation.validate_aud = false;
        if let Some(ref issuer) = config.issuer {
            // `iss` is only compared when present unless it is also required.
            validation.set_issuer(&[issuer]);
            validation.set_required_spec_claims(&["exp", "iss"]);
        }

        Ok(Self {
            encoding_key: Arc::new(EncodingKey::from_secret(secret.as_bytes())),
            decoding_key: Arc::new(DecodingKey::from_secret(secret.as_bytes())),
            validation: Arc::new(validation),
            issuer: config.issuer.clone(),
            token_ttl: config.token_ttl,
        })
    }

    /// Parses and verifies a raw `Authorization` header value.
    pub fn extract(&self, header: Option<&str>) -> Result<ClaimSet, CredentialError> {
        let raw = header.ok_or(CredentialError::Missing)?.trim();

        let (scheme, token) = raw
            .split_once(' ')
            .ok_or_else(|| CredentialError::Malformed("expected 'Bearer <token>'".to_string()))?;
        if !scheme.eq_ignore_ascii_case("bearer") {
            return Err(CredentialError::Malformed(format!(
                "unsupported authorization scheme '{scheme}'"
            )));
        }

        let token = token.trim();
        if token.is_empty() {
            return Err(CredentialError::Malformed("empty bearer token".to_string()));
        }

        self.verify(token)
    }

    /// Reads and verifies the `Authorization` header of a request.
    pub fn extract_from_headers(&self, headers: &HeaderMap) -> Result<ClaimSet, CredentialError> {
        match headers.get(header::AUTHORIZATION) {
            None => Err(CredentialError::Missing),
            Some(value) => {
                let value = value.to_str().map_err(|_| {
                    CredentialError::Malformed("authorization header is not valid ASCII".to_string())
                })?;
                self.extract(Some(value))
            }
        }
    }

    /// Verifies a bare token.
    pub fn verify(&self, token: &str) -> Result<ClaimSet, CredentialError> {
        decode::<ClaimSet>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(CredentialError::from)
    }

    /// Signs a token for `user_id` with the configured lifetime.
    pub fn issue(&self, user_id: i64, role: &str) -> ApiResult<String> {
        let mut claims = ClaimSet::new(user_id, role, self.token_ttl.as_secs() as i64);
        if let Some(ref issuer) = self.issuer {
            claims = claims.with_issuer(issuer);
        }
        self.sign(&claims)
    }

    /// Signs arbitrary claims.
    pub fn sign(&self, claims: &ClaimSet) -> ApiResult<String> {
        encode(&Header::new(SIGNING_ALGORITHM), claims, &self.encoding_key)
            .map_err(|e| ApiError::internal(format!("Failed to create token: {}", e)))
    }

    /// Lifetime of issued tokens.
    pub fn token_ttl(&self) -> Duration {
        self.token_ttl
    }
}

impl std::fmt::Debug for CredentialExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialExtractor")
            .field("algorithm", &SIGNING_ALGORITHM)
            .field("issuer", &self.issuer)
            .field("token_ttl", &self.token_ttl)
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    const KEY: &str = "test-signing-key-for-the-credential-extractor";

    fn extractor() -> CredentialExtractor {
        CredentialExtractor::new(&AuthConfig::with_key(KEY)).unwrap()
    }

    fn bearer(token: &str) -> String {
        format!("Bearer {token}")
    }

    #[test]
    fn test_empty_key_rejected() {
        assert!(CredentialExtractor::new(&AuthConfig::default()).is_err());
    }

    #[test]
    fn test_valid_token() {
        let extractor = extractor();
        let token = extractor.issue(42, "technician").unwrap();

        let claims = extractor.extract(Some(&bearer(&token))).unwrap();
        assert_eq!(claims.user_id, 42);
        assert_eq!(claims.user_role, "technician");
    }

    #[test]
    fn test_scheme_is_case_insensitive() {
        let extractor = extractor();
        let token = extractor.issue(1, "admin").unwrap();
        assert!(extractor.extract(Some(&format!("bearer {token}"))).is_ok());
    }

    #[test]
    fn test_missing() {
        assert_eq!(extractor().extract(None), Err(CredentialError::Missing));
        assert!(extractor().extract_from_headers(&HeaderMap::new()).unwrap_err().is_missing());
    }

    #[test]
    fn test_malformed_header() {
        let extractor = extractor();
        for header in ["", "Bearer", "Bearer   ", "Basic dXNlcjpwYXNz", "Token abc", "Bearer not.a.jwt"] {
            assert!(
                matches!(extractor.extract(Some(header)), Err(CredentialError::Malformed(_))),
                "header {header:?} should be malformed"
            );
        }
    }

    #[test]
    fn test_wrong_signature() {
        let other = CredentialExtractor::new(&AuthConfig::with_key("another-key-entirely-0123456789")).unwrap();
        let token = other.issue(42, "admin").unwrap();

        assert_eq!(
            extractor().extract(Some(&bearer(&token))),
            Err(CredentialError::SignatureInvalid)
        );
    }

    #[test]
    fn test_tampered_payload() {
        let extractor = extractor();
        let token = extractor.issue(42, "reporter").unwrap();
        let forged = extractor.issue(1, "admin").unwrap();

        let parts: Vec<&str> = token.split('.').collect();
        let forged_parts: Vec<&str> = forged.split('.').collect();
        let tampered = format!("{}.{}.{}", parts[0], forged_parts[1], parts[2]);

        assert_eq!(
            extractor.extract(Some(&bearer(&tampered))),
            Err(CredentialError::SignatureInvalid)
        );
    }

    #[test]
    fn test_other_algorithm_rejected() {
        let claims = ClaimSet::new(42, "admin", 3600);
        let token = encode(
            &Header::new(Algorithm::HS384),
            &claims,
            &EncodingKey::from_secret(KEY.as_bytes()),
        )
        .unwrap();

        assert_eq!(
            extractor().extract(Some(&bearer(&token))),
            Err(CredentialError::SignatureInvalid)
        );
    }

    #[test]
    fn test_expired() {
        let extractor = extractor();
        let now = Utc::now().timestamp();
        let claims = ClaimSet {
            user_id: 42,
            user_role: "admin".to_string(),
            iat: now - 7200,
            exp: now - 3600,
            iss: None,
        };
        let token = extractor.sign(&claims).unwrap();

        assert_eq!(
            extractor.extract(Some(&bearer(&token))),
            Err(CredentialError::Expired)
        );
    }

    #[test]
    fn test_wrong_claim_shape() {
        let exp = Utc::now().timestamp() + 3600;
        let payload = serde_json::json!({"sub": "42", "roles": ["admin"], "exp": exp});
        let token = encode(
            &Header::new(SIGNING_ALGORITHM),
            &payload,
            &EncodingKey::from_secret(KEY.as_bytes()),
        )
        .unwrap();

        assert!(matches!(
            extractor().extract(Some(&bearer(&token))),
            Err(CredentialError::Malformed(_))
        ));
    }

    fn strict_extractor(issuer: &str) -> CredentialExtractor {
        let mut config = AuthConfig::with_key(KEY);
        config.issuer = Some(issuer.to_string());
        CredentialExtractor::new(&config).unwrap()
    }

    #[test]
    fn test_issuer_enforced() {
        let strict = strict_extractor("fixdesk");

        let own = strict.issue(42, "admin").unwrap();
        let claims = strict.extract(Some(&bearer(&own))).unwrap();
        assert_eq!(claims.iss.as_deref(), Some("fixdesk"));
    }

    #[test]
    fn test_missing_issuer_rejected() {
        let strict = strict_extractor("fixdesk");

        // Same key, no `iss` claim.
        let unissued = extractor().issue(42, "admin").unwrap();
        assert!(matches!(
            strict.extract(Some(&bearer(&unissued))),
            Err(CredentialError::Malformed(_))
        ));
    }

    #[test]
    fn test_wrong_issuer_rejected() {
        let strict = strict_extractor("fixdesk");

        let foreign = strict_extractor("someone-else").issue(42, "admin").unwrap();
        assert!(matches!(
            strict.extract(Some(&bearer(&foreign))),
            Err(CredentialError::Malformed(_))
        ));
    }

    #[test]
    fn test_non_ascii_header() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            axum::http::HeaderValue::from_bytes(b"Bearer \xff").unwrap(),
        );
        assert!(matches!(
            extractor().extract_from_headers(&headers),
            Err(CredentialError::Malformed(_))
        ));
    }
}
