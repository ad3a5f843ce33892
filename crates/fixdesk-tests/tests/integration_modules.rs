// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Module Integration Tests
//!
//! - `test_lifecycle_*`: Registration, configuration and attachment order
//! - `test_wiring_*`: Exports consumed by later modules
//! - `test_images_*`: The images module behind the full pipeline

use std::sync::Arc;

use axum::http::StatusCode;
use fixdesk_api::{AppContext, ModuleError, ModuleRegistry, ModuleState};
use fixdesk_images::ImagesModule;
use fixdesk_tests::common::*;
use parking_lot::Mutex;
use serde_json::json;

fn call_log() -> CallLog {
    Arc::new(Mutex::new(Vec::new()))
}

fn registry(log: &CallLog) -> ModuleRegistry {
    let mut registry = ModuleRegistry::new();
    registry
        .register(Box::new(GreeterModule::new(log.clone())))
        .unwrap();
    registry
        .register(Box::new(DispatchModule::new(log.clone())))
        .unwrap();
    registry
}

// =============================================================================
// Lifecycle Tests
// =============================================================================

#[tokio::test]
async fn test_lifecycle_phases_run_in_order() {
    let log = call_log();
    let app = TestApp::with_registry(unlimited_config(), registry(&log));

    assert_eq!(
        *log.lock(),
        vec![
            "greeter:configure",
            "dispatch:configure",
            "greeter:attach",
            "dispatch:attach",
        ]
    );
    assert_eq!(app.registry.state("greeter"), Some(ModuleState::Attached));
    assert_eq!(app.registry.state("dispatch"), Some(ModuleState::Attached));
}

#[tokio::test]
async fn test_lifecycle_attach_runs_once() {
    let log = call_log();
    let mut app = TestApp::with_registry(unlimited_config(), registry(&log));

    let err = app.registry.attach_all(&app.context).unwrap_err();
    assert!(matches!(err, ModuleError::AlreadyAttached { .. }));
    assert_eq!(log.lock().iter().filter(|e| e.ends_with(":attach")).count(), 2);
}

#[tokio::test]
async fn test_lifecycle_duplicate_name_rejected() {
    let log = call_log();
    let mut registry = registry(&log);

    let err = registry
        .register(Box::new(GreeterModule::new(log.clone())))
        .unwrap_err();
    assert!(matches!(err, ModuleError::Duplicate { .. }));
    assert_eq!(registry.len(), 2);
}

#[tokio::test]
async fn test_lifecycle_bad_config_stops_configuration() {
    let log = call_log();
    let mut config = unlimited_config();
    config
        .modules
        .insert("greeter".to_string(), json!({ "greeting": 12 }));
    let mut registry = registry(&log);

    let err = registry.configure_all(&config).unwrap_err();
    assert!(matches!(err, ModuleError::Config { .. }));
    assert_eq!(registry.state("greeter"), Some(ModuleState::Declared));
    assert_eq!(registry.state("dispatch"), Some(ModuleState::Declared));
}

#[tokio::test]
async fn test_lifecycle_catalog_reports_states() {
    let log = call_log();
    let app = TestApp::with_registry(unlimited_config(), registry(&log));
    let admin = app.token(1, "admin");

    let response = app
        .send(TestRequest::get("/api/v1/modules").bearer(&admin).build())
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(
        json["data"],
        json!([
            { "name": "greeter", "version": "1.0.0", "state": "attached" },
            { "name": "dispatch", "version": "0.3.0", "state": "attached" },
        ])
    );

    let health = body_json(app.send(TestRequest::get("/health").build()).await).await;
    assert_eq!(health["data"]["modules"], 2);
}

// =============================================================================
// Wiring Tests
// =============================================================================

#[tokio::test]
async fn test_wiring_consumer_uses_provider_export() {
    let log = call_log();
    let mut config = unlimited_config();
    config
        .modules
        .insert("greeter".to_string(), json!({ "greeting": "bonjour" }));
    let app = TestApp::with_registry(config, registry(&log));

    let manager = app.token(4, "manager");
    let response = app
        .send(TestRequest::get("/api/v1/dispatch").bearer(&manager).build())
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"], "bonjour, technician");

    let technician = app.token(5, "technician");
    let response = app
        .send(TestRequest::get("/api/v1/dispatch").bearer(&technician).build())
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app.send(TestRequest::get("/api/v1/greeting").build()).await;
    assert_eq!(body_json(response).await["data"]["greeting"], "bonjour");
}

#[tokio::test]
async fn test_wiring_consumer_before_provider_fails_fast() {
    let log = call_log();
    let mut registry = ModuleRegistry::new();
    registry
        .register(Box::new(DispatchModule::new(log.clone())))
        .unwrap();
    registry
        .register(Box::new(GreeterModule::new(log.clone())))
        .unwrap();

    let context = AppContext::from_config(unlimited_config()).unwrap();
    registry.configure_all(context.config()).unwrap();
    let err = registry.attach_all(&context).unwrap_err();

    assert!(err.is_dependency_missing());
    assert_eq!(err.to_string(), "module dependency missing: 'greeter' does not export 'greet'");
    assert_eq!(registry.state("dispatch"), Some(ModuleState::Configured));
    assert_eq!(registry.state("greeter"), Some(ModuleState::Configured));
    assert!(!log.lock().iter().any(|e| e.ends_with(":attach")));
}

// =============================================================================
// Images Tests
// =============================================================================

fn images_app(images: serde_json::Value) -> TestApp {
    let mut config = unlimited_config();
    config.modules.insert("images".to_string(), images);
    let mut registry = ModuleRegistry::new();
    registry.register(Box::new(ImagesModule::new())).unwrap();
    TestApp::with_registry(config, registry)
}

#[tokio::test]
async fn test_images_roundtrip_through_pipeline() {
    init_test_logging();
    let app = images_app(json!({ "ttl": 600 }));
    let technician = app.token(21, "technician");

    let response = app
        .send(
            TestRequest::post("/api/v1/images")
                .bearer(&technician)
                .header("content-type", "image/png")
                .body(vec![0x89, b'P', b'N', b'G'])
                .build(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["data"]["size"], 4);
    assert_eq!(json["data"]["expires_in"], 600);
    let url = json["data"]["url"].as_str().unwrap().to_string();
    assert!(url.starts_with("/api/v1/images/"));

    let response = app.send(TestRequest::get(&url).build()).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "image/png");
    assert_eq!(body_bytes(response).await, vec![0x89, b'P', b'N', b'G']);

    let response = app
        .send(TestRequest::delete(&url).bearer(&technician).build())
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let manager = app.token(2, "manager");
    let response = app
        .send(TestRequest::delete(&url).bearer(&manager).build())
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.send(TestRequest::get(&url).build()).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_images_guest_cannot_upload() {
    let app = images_app(serde_json::Value::Null);
    let guest = app.token(30, "guest");

    let response = app
        .send(
            TestRequest::post("/api/v1/images")
                .bearer(&guest)
                .header("content-type", "image/jpeg")
                .body(vec![1, 2, 3])
                .build(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_images_custom_prefix() {
    let app = images_app(json!({ "path_prefix": "/api/v2/photos" }));
    let reporter = app.token(3, "reporter");

    let response = app
        .send(
            TestRequest::post("/api/v2/photos")
                .bearer(&reporter)
                .header("content-type", "image/gif")
                .body(vec![7; 16])
                .build(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .send(
            TestRequest::post("/api/v1/images")
                .bearer(&reporter)
                .header("content-type", "image/gif")
                .body(vec![7; 16])
                .build(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
