// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Config Integration Tests
//!
//! - `test_load_*`: Files on disk and environment overrides
//! - `test_context_*`: Contexts and routers built from loaded files

use std::collections::HashMap;
use std::time::Duration;

use axum::http::StatusCode;
use fixdesk_api::ApiServer;
use fixdesk_api::AppContext;
use fixdesk_config::{ConfigError, ConfigLoader, EnvSource, RateLimitKey};
use fixdesk_tests::common::*;

const CONFIG_YAML: &str = r#"
server:
  host: 127.0.0.1
  port: 9100
  trust_proxy_headers: true
auth:
  signing_key: "${DESK_KEY}"
  issuer: fixdesk
  token_ttl: 900
permissions:
  anonymous_role: visitor
  roles:
    supervisor: ["system:modules", "order:read"]
    visitor: []
rate_limit:
  rate: 0.5
  burst: 3
  key_by: address
cache:
  default_ttl: 45
  purge: 5
"#;

fn loader(vars: &[(&str, &str)]) -> ConfigLoader {
    let vars: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    ConfigLoader::new().with_env_source(EnvSource::Map(vars))
}

fn write_config(dir: &tempfile::TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).unwrap();
    path
}

// =============================================================================
// Loading Tests
// =============================================================================

#[test]
fn test_load_yaml_file_with_placeholders() {
    let dir = temp_test_dir("fixdesk-config");
    let path = write_config(&dir, "fixdesk.yaml", CONFIG_YAML);

    let config = loader(&[("DESK_KEY", TEST_SIGNING_KEY)]).load(&path).unwrap();

    assert_eq!(config.server.bind_address(), "127.0.0.1:9100");
    assert!(config.server.trust_proxy_headers);
    assert_eq!(config.auth.signing_key.expose(), TEST_SIGNING_KEY);
    assert_eq!(config.auth.issuer.as_deref(), Some("fixdesk"));
    assert_eq!(config.auth.token_ttl, Duration::from_secs(900));
    assert_eq!(config.permissions.anonymous_role, "visitor");
    assert_eq!(config.rate_limit.key_by, RateLimitKey::Address);
    assert_eq!(config.cache.default_ttl, Duration::from_secs(45));
}

#[test]
fn test_load_unresolved_key_fails_validation() {
    let dir = temp_test_dir("fixdesk-config");
    let path = write_config(&dir, "fixdesk.yaml", "auth:\n  signing_key: \"\"\n");

    let err = loader(&[]).load(&path).unwrap_err();
    assert!(matches!(err, ConfigError::Validation { .. }));
}

#[test]
fn test_load_env_overrides_file() {
    let dir = temp_test_dir("fixdesk-config");
    let path = write_config(&dir, "fixdesk.yaml", CONFIG_YAML);

    let config = loader(&[
        ("DESK_KEY", TEST_SIGNING_KEY),
        ("FIXDESK_SERVER_PORT", "9200"),
        ("FIXDESK_RATE_LIMIT_BURST", "8"),
    ])
    .load(&path)
    .unwrap();

    assert_eq!(config.server.port, 9200);
    assert_eq!(config.rate_limit.burst, 8);
    assert_eq!(config.rate_limit.rate, 0.5);
}

#[test]
fn test_load_toml_and_json_files() {
    let dir = temp_test_dir("fixdesk-config");
    let toml = write_config(
        &dir,
        "fixdesk.toml",
        &format!("[auth]\nsigning_key = \"{TEST_SIGNING_KEY}\"\n\n[rate_limit]\nburst = 9\n"),
    );
    let json = write_config(
        &dir,
        "fixdesk.json",
        &format!(r#"{{"auth": {{"signing_key": "{TEST_SIGNING_KEY}"}}, "server": {{"port": 7001}}}}"#),
    );

    assert_eq!(loader(&[]).load(&toml).unwrap().rate_limit.burst, 9);
    assert_eq!(loader(&[]).load(&json).unwrap().server.port, 7001);
}

#[test]
fn test_load_rejects_unknown_extension_and_missing_file() {
    let dir = temp_test_dir("fixdesk-config");
    let ini = write_config(&dir, "fixdesk.ini", "port=1");

    assert!(matches!(
        loader(&[]).load(&ini).unwrap_err(),
        ConfigError::UnsupportedFormat { .. }
    ));
    assert!(matches!(
        loader(&[]).load(dir.path().join("absent.yaml")).unwrap_err(),
        ConfigError::FileNotFound { .. }
    ));
}

#[test]
fn test_load_invalid_rate_rejected() {
    let dir = temp_test_dir("fixdesk-config");
    let path = write_config(
        &dir,
        "fixdesk.yaml",
        &format!("auth:\n  signing_key: {TEST_SIGNING_KEY}\nrate_limit:\n  rate: 0\n"),
    );

    let err = loader(&[]).load(&path).unwrap_err();
    assert!(err.to_string().contains("rate_limit.rate"));
}

// =============================================================================
// Context Tests
// =============================================================================

#[tokio::test]
async fn test_context_uses_configured_roles() {
    use tower::ServiceExt;

    let dir = temp_test_dir("fixdesk-config");
    let path = write_config(&dir, "fixdesk.yaml", CONFIG_YAML);
    let mut config = loader(&[("DESK_KEY", TEST_SIGNING_KEY)]).load(&path).unwrap();
    config.rate_limit.enabled = false;

    let context = AppContext::from_config(config).unwrap();
    let router = ApiServer::new(context.clone()).router();

    let supervisor = context.credentials().issue(1, "supervisor").unwrap();
    let response = router
        .clone()
        .oneshot(TestRequest::get("/api/v1/modules").bearer(&supervisor).build())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Built-in roles are replaced, not merged.
    let admin = context.credentials().issue(2, "admin").unwrap();
    let response = router
        .oneshot(TestRequest::get("/api/v1/modules").bearer(&admin).build())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_context_limiter_follows_config() {
    let dir = temp_test_dir("fixdesk-config");
    let path = write_config(&dir, "fixdesk.yaml", CONFIG_YAML);
    let config = loader(&[("DESK_KEY", TEST_SIGNING_KEY)]).load(&path).unwrap();

    let context = AppContext::from_config(config).unwrap();
    let limiter = context.limiter().config();
    assert_eq!(limiter.rate, 0.5);
    assert_eq!(limiter.burst, 3);
    assert_eq!(context.cache().default_ttl(), Duration::from_secs(45));
    assert_eq!(context.credentials().token_ttl(), Duration::from_secs(900));
}
