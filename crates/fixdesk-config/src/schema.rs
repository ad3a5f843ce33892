// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Configuration schema for FixDesk.
//!
//! Every section has defaults, so a minimal file only needs the signing key:
//!
//! ```yaml
//! auth:
//!   signing_key: "${FIXDESK_SIGNING_KEY}"
//! ```
//!
//! Durations are written as whole seconds.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

/// Minimum recommended signing key length in bytes.
pub const RECOMMENDED_KEY_LEN: usize = 32;

// =============================================================================
// Root Configuration
// =============================================================================

/// Root configuration for the FixDesk server.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FixdeskConfig {
    /// HTTP listener settings.
    pub server: ServerConfig,
    /// Bearer credential verification.
    pub auth: AuthConfig,
    /// Role to permission table.
    pub permissions: PermissionsConfig,
    /// Token-bucket admission control.
    pub rate_limit: RateLimitConfig,
    /// Shared expiring cache.
    pub cache: CacheConfig,
    /// Per-module configuration blocks, passed to each module untouched.
    pub modules: BTreeMap<String, serde_json::Value>,
}

impl FixdeskConfig {
    /// Validates every section.
    pub fn validate(&self) -> ConfigResult<()> {
        self.server.validate()?;
        self.auth.validate()?;
        self.permissions.validate()?;
        self.rate_limit.validate()?;
        self.cache.validate()?;
        Ok(())
    }

    /// Returns the configuration block for a module, or `null`.
    pub fn module(&self, name: &str) -> serde_json::Value {
        self.modules.get(name).cloned().unwrap_or(serde_json::Value::Null)
    }
}

// =============================================================================
// Server
// =============================================================================

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address.
    pub host: String,
    /// Listen port.
    pub port: u16,
    /// Per-request timeout.
    #[serde(with = "duration_secs")]
    pub request_timeout: Duration,
    /// Take the caller address from `X-Forwarded-For` / `X-Real-IP`.
    pub trust_proxy_headers: bool,
    /// Maximum accepted request body.
    pub max_body_bytes: usize,
    /// CORS settings.
    pub cors: CorsConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            request_timeout: Duration::from_secs(30),
            trust_proxy_headers: false,
            max_body_bytes: 10 * 1024 * 1024,
            cors: CorsConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Returns `host:port`.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    fn validate(&self) -> ConfigResult<()> {
        if self.host.is_empty() {
            return Err(ConfigError::validation("server.host", "cannot be empty"));
        }
        if self.port == 0 {
            return Err(ConfigError::validation("server.port", "must be non-zero"));
        }
        if self.request_timeout.is_zero() {
            return Err(ConfigError::validation("server.request_timeout", "must be non-zero"));
        }
        if self.max_body_bytes == 0 {
            return Err(ConfigError::validation("server.max_body_bytes", "must be non-zero"));
        }
        Ok(())
    }
}

/// CORS settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Allowed origins. Empty allows any origin.
    pub allowed_origins: Vec<String>,
    /// Preflight cache lifetime.
    #[serde(with = "duration_secs")]
    pub max_age: Duration,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: Vec::new(),
            max_age: Duration::from_secs(3600),
        }
    }
}

// =============================================================================
// Auth
// =============================================================================

/// Bearer credential settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Pre-shared HMAC signing key.
    pub signing_key: SecretValue,
    /// Expected `iss` claim, if any.
    pub issuer: Option<String>,
    /// Clock skew tolerated when checking `exp`.
    #[serde(with = "duration_secs")]
    pub leeway: Duration,
    /// Lifetime of tokens minted by the server.
    #[serde(with = "duration_secs")]
    pub token_ttl: Duration,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            signing_key: SecretValue::default(),
            issuer: None,
            leeway: Duration::ZERO,
            token_ttl: Duration::from_secs(24 * 3600),
        }
    }
}

impl AuthConfig {
    /// Creates an auth configuration with the given key.
    pub fn with_key(key: impl Into<String>) -> Self {
        Self {
            signing_key: SecretValue::new(key),
            ..Default::default()
        }
    }

    fn validate(&self) -> ConfigResult<()> {
        if self.signing_key.is_empty() {
            return Err(ConfigError::validation("auth.signing_key", "cannot be empty"));
        }
        if self.signing_key.len() < RECOMMENDED_KEY_LEN {
            tracing::warn!(
                "auth.signing_key is shorter than {} bytes; use a longer key in production",
                RECOMMENDED_KEY_LEN
            );
        }
        if self.token_ttl.is_zero() {
            return Err(ConfigError::validation("auth.token_ttl", "must be non-zero"));
        }
        Ok(())
    }
}

/// A secret that never appears in `Debug` or `Display` output.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SecretValue(String);

impl SecretValue {
    /// Wraps a secret.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the secret.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Returns true if the secret is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Secret length in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl fmt::Debug for SecretValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretValue(***)")
    }
}

impl fmt::Display for SecretValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("***")
    }
}

// =============================================================================
// Permissions
// =============================================================================

/// Role to permission table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PermissionsConfig {
    /// Role assumed for callers without credentials.
    pub anonymous_role: String,
    /// Permissions held by each role. `"*"` grants every permission.
    ///
    /// When empty, the built-in maintenance roles are used.
    pub roles: BTreeMap<String, Vec<String>>,
}

impl Default for PermissionsConfig {
    fn default() -> Self {
        Self {
            anonymous_role: "guest".to_string(),
            roles: BTreeMap::new(),
        }
    }
}

impl PermissionsConfig {
    fn validate(&self) -> ConfigResult<()> {
        if self.anonymous_role.is_empty() {
            return Err(ConfigError::validation(
                "permissions.anonymous_role",
                "cannot be empty",
            ));
        }
        for (role, permissions) in &self.roles {
            if role.is_empty() {
                return Err(ConfigError::validation("permissions.roles", "role name cannot be empty"));
            }
            if permissions.iter().any(|p| p.is_empty()) {
                return Err(ConfigError::validation(
                    format!("permissions.roles.{role}"),
                    "permission cannot be empty",
                ));
            }
        }
        Ok(())
    }
}

// =============================================================================
// Rate Limit
// =============================================================================

/// Token-bucket admission control settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Whether the rate-limit filter rejects anything.
    pub enabled: bool,
    /// Tokens refilled per second.
    pub rate: f64,
    /// Bucket capacity.
    pub burst: u32,
    /// Interval between idle-bucket sweeps.
    #[serde(with = "duration_secs")]
    pub purge: Duration,
    /// Idle time after which a bucket is swept.
    #[serde(with = "duration_secs")]
    pub expire: Duration,
    /// Which caller identity keys the buckets.
    pub key_by: RateLimitKey,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            rate: 5.0,
            burst: 5,
            purge: Duration::from_secs(60),
            expire: Duration::from_secs(300),
            key_by: RateLimitKey::User,
        }
    }
}

impl RateLimitConfig {
    fn validate(&self) -> ConfigResult<()> {
        if !self.rate.is_finite() || self.rate <= 0.0 {
            return Err(ConfigError::validation("rate_limit.rate", "must be a positive number"));
        }
        if self.burst == 0 {
            return Err(ConfigError::validation("rate_limit.burst", "must be at least 1"));
        }
        if self.purge.is_zero() {
            return Err(ConfigError::validation("rate_limit.purge", "must be non-zero"));
        }
        if self.expire.is_zero() {
            return Err(ConfigError::validation("rate_limit.expire", "must be non-zero"));
        }
        Ok(())
    }
}

/// Caller identity used as the rate-limit key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateLimitKey {
    /// Authenticated user id, falling back to the address for anonymous callers.
    #[default]
    User,
    /// Caller network address only.
    Address,
}

// =============================================================================
// Cache
// =============================================================================

/// Shared expiring cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// TTL for entries stored without an explicit TTL.
    #[serde(with = "duration_secs")]
    pub default_ttl: Duration,
    /// Interval between expiry sweeps.
    #[serde(with = "duration_secs")]
    pub purge: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl: Duration::from_secs(300),
            purge: Duration::from_secs(60),
        }
    }
}

impl CacheConfig {
    fn validate(&self) -> ConfigResult<()> {
        if self.default_ttl.is_zero() {
            return Err(ConfigError::validation("cache.default_ttl", "must be non-zero"));
        }
        if self.purge.is_zero() {
            return Err(ConfigError::validation("cache.purge", "must be non-zero"));
        }
        Ok(())
    }
}

// =============================================================================
// Serde Helpers
// =============================================================================

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_secs().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

// =============================================================================
// Tests
// =============================================================================
