// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Test fixtures.

use std::net::SocketAddr;

use axum::{
    Router,
    body::Body,
    extract::ConnectInfo,
    http::{Method, Request, header},
    response::Response,
};
use fixdesk_api::{ApiServer, AppContext, ModuleRegistry};
use fixdesk_config::{AuthConfig, FixdeskConfig};
use http_body_util::BodyExt;
use tower::ServiceExt;

/// Signing key shared by every fixture.
pub const TEST_SIGNING_KEY: &str = "integration-test-signing-key-0123456789";

/// Default client address attached to requests.
pub const CLIENT_ADDR: ([u8; 4], u16) = ([10, 0, 0, 7], 41000);

/// Configuration with a valid key and defaults elsewhere.
pub fn test_config() -> FixdeskConfig {
    FixdeskConfig {
        auth: AuthConfig::with_key(TEST_SIGNING_KEY),
        ..Default::default()
    }
}

/// Configuration with rate limiting switched off.
pub fn unlimited_config() -> FixdeskConfig {
    let mut config = test_config();
    config.rate_limit.enabled = false;
    config
}

/// A running application: context, wired modules and the full router.
pub struct TestApp {
    /// Shared context.
    pub context: AppContext,
    /// Registry after attachment.
    pub registry: ModuleRegistry,
    /// Full router including module routes.
    pub router: Router,
}

impl TestApp {
    /// Builds the app with no modules.
    pub fn new(config: FixdeskConfig) -> Self {
        Self::with_registry(config, ModuleRegistry::new())
    }

    /// Configures and attaches `registry`, then builds the router.
    pub fn with_registry(config: FixdeskConfig, mut registry: ModuleRegistry) -> Self {
        let context = AppContext::from_config(config).expect("context");
        registry.configure_all(context.config()).expect("configure");
        let routes = registry.attach_all(&context).expect("attach");
        let router = ApiServer::new(context.clone()).with_modules(routes).router();
        Self {
            context,
            registry,
            router,
        }
    }

    /// Signs a token for `user` with `role`.
    pub fn token(&self, user: i64, role: &str) -> String {
        self.context.credentials().issue(user, role).expect("token")
    }

    /// Sends one request through the router.
    pub async fn send(&self, request: Request<Body>) -> Response {
        self.router.clone().oneshot(request).await.expect("infallible")
    }
}

/// Request builder that attaches the peer address.
pub struct TestRequest {
    method: Method,
    uri: String,
    token: Option<String>,
    headers: Vec<(String, String)>,
    peer: SocketAddr,
    body: Vec<u8>,
}

impl TestRequest {
    /// `GET uri`.
    pub fn get(uri: &str) -> Self {
        Self::new(Method::GET, uri)
    }

    /// `POST uri`.
    pub fn post(uri: &str) -> Self {
        Self::new(Method::POST, uri)
    }

    /// `DELETE uri`.
    pub fn delete(uri: &str) -> Self {
        Self::new(Method::DELETE, uri)
    }

    fn new(method: Method, uri: &str) -> Self {
        Self {
            method,
            uri: uri.to_string(),
            token: None,
            headers: Vec::new(),
            peer: SocketAddr::from(CLIENT_ADDR),
            body: Vec::new(),
        }
    }

    /// Adds a bearer token.
    pub fn bearer(mut self, token: &str) -> Self {
        self.token = Some(token.to_string());
        self
    }

    /// Adds a raw header.
    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    /// Sets the peer address.
    pub fn peer(mut self, addr: impl Into<SocketAddr>) -> Self {
        self.peer = addr.into();
        self
    }

    /// Sets the body.
    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Builds the request.
    pub fn build(self) -> Request<Body> {
        let mut builder = Request::builder().method(self.method).uri(self.uri);
        if let Some(token) = self.token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        for (name, value) in self.headers {
            builder = builder.header(name, value);
        }
        let mut request = builder.body(Body::from(self.body)).expect("request");
        request.extensions_mut().insert(ConnectInfo(self.peer));
        request
    }
}

/// Reads a response body as JSON.
pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.expect("body").to_bytes();
    serde_json::from_slice(&bytes).expect("json body")
}

/// Reads a response body as raw bytes.
pub async fn body_bytes(response: Response) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes()
        .to_vec()
}
