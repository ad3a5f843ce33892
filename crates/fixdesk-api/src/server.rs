// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! API server implementation.

use std::future::Future;
use std::net::SocketAddr;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method, StatusCode, header},
    routing::get,
};
use fixdesk_config::CorsConfig;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::info;

use crate::error::{ApiError, ApiResult};
use crate::handlers;
use crate::state::AppContext;

/// Permission guarding the module catalog.
pub const MODULES_PERMISSION: &str = "system:modules";

/// Liveness route.
pub const HEALTH_PATH: &str = "/health";

/// Caller identity route.
pub const ME_PATH: &str = "/api/v1/me";

/// Module catalog route.
pub const MODULES_PATH: &str = "/api/v1/modules";

/// Routes owned by the server; modules may not register over them.
pub const BUILTIN_PATHS: &[&str] = &[HEALTH_PATH, ME_PATH, MODULES_PATH];

// =============================================================================
// ApiServer
// =============================================================================

/// The HTTP server: built-in routes, module routes and the global layers.
pub struct ApiServer {
    context: AppContext,
    modules: Router<AppContext>,
}

impl ApiServer {
    /// Creates a server with no module routes.
    pub fn new(context: AppContext) -> Self {
        Self {
            context,
            modules: Router::new(),
        }
    }

    /// Adds the routes returned by [`ModuleRegistry::attach_all`](crate::module::ModuleRegistry::attach_all).
    pub fn with_modules(mut self, modules: Router<AppContext>) -> Self {
        self.modules = self.modules.merge(modules);
        self
    }

    /// Shared application context.
    pub fn context(&self) -> &AppContext {
        &self.context
    }

    /// Builds the complete router.
    pub fn router(&self) -> Router {
        let config = self.context.config();
        let filters = self.context.filters();

        let middleware_stack = ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(TimeoutLayer::with_status_code(
                StatusCode::REQUEST_TIMEOUT,
                config.server.request_timeout,
            ))
            .layer(create_cors_layer(&config.server.cors))
            .layer(filters.gate());

        Router::new()
            // Health (public)
            .route(HEALTH_PATH, get(handlers::health))
            // Caller identity
            .route(
                ME_PATH,
                get(handlers::current_caller).layer(filters.authenticated()),
            )
            // Module catalog
            .route(
                MODULES_PATH,
                get(handlers::list_modules).layer(filters.protected(MODULES_PERMISSION)),
            )
            .merge(self.modules.clone())
            .fallback(handlers::not_found)
            .layer(DefaultBodyLimit::max(config.server.max_body_bytes))
            .layer(middleware_stack)
            .with_state(self.context.clone())
    }

    /// Serves on `listener` until `shutdown_signal` resolves.
    pub async fn serve(
        self,
        listener: TcpListener,
        shutdown_signal: impl Future<Output = ()> + Send + 'static,
    ) -> ApiResult<()> {
        let router = self.router();
        let addr = listener
            .local_addr()
            .map_err(|e| ApiError::internal(format!("Failed to read local address: {}", e)))?;

        info!(address = %addr, "API server listening");

        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal)
        .await
        .map_err(|e| ApiError::internal(format!("Server error: {}", e)))?;

        info!("API server shutdown complete");
        Ok(())
    }

    /// Binds the configured address and serves until `shutdown_signal`
    /// resolves.
    pub async fn run_with_shutdown(
        self,
        shutdown_signal: impl Future<Output = ()> + Send + 'static,
    ) -> ApiResult<()> {
        let addr = self.context.config().server.bind_address();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| ApiError::internal(format!("Failed to bind {}: {}", addr, e)))?;

        self.serve(listener, shutdown_signal).await
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Creates the CORS layer from configuration.
fn create_cors_layer(cors: &CorsConfig) -> CorsLayer {
    let layer = CorsLayer::new()
        .max_age(cors.max_age)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT]);

    let origins: Vec<HeaderValue> = cors
        .allowed_origins
        .iter()
        .filter(|o| o.as_str() != "*")
        .filter_map(|o| match o.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %o, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    if origins.is_empty() {
        layer.allow_origin(Any)
    } else {
        layer.allow_origin(AllowOrigin::list(origins))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        extract::ConnectInfo,
        http::Request,
        response::Response,
    };
    use fixdesk_config::{AuthConfig, FixdeskConfig};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    const KEY: &str = "server-test-signing-key-0123456789abc";

    fn server() -> ApiServer {
        let config = FixdeskConfig {
            auth: AuthConfig::with_key(KEY),
            ..Default::default()
        };
        ApiServer::new(AppContext::from_config(config).unwrap())
    }

    fn get_request(path: &str, token: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri(path);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let mut request = builder.body(Body::empty()).unwrap();
        request
            .extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([127, 0, 0, 1], 5000))));
        request
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_is_public() {
        let response = server().router().oneshot(get_request("/health", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["code"], 200);
        assert_eq!(json["data"]["status"], "healthy");
    }

    #[tokio::test]
    async fn test_me_requires_auth() {
        let server = server();
        let response = server
            .router()
            .oneshot(get_request("/api/v1/me", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let token = server.context().credentials().issue(11, "reporter").unwrap();
        let response = server
            .router()
            .oneshot(get_request("/api/v1/me", Some(&token)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["data"]["user"], 11);
        assert_eq!(json["data"]["remote_address"], "127.0.0.1");
    }

    #[tokio::test]
    async fn test_modules_requires_permission() {
        let server = server();
        let reporter = server.context().credentials().issue(2, "reporter").unwrap();
        let response = server
            .router()
            .oneshot(get_request("/api/v1/modules", Some(&reporter)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let admin = server.context().credentials().issue(1, "admin").unwrap();
        let response = server
            .router()
            .oneshot(get_request("/api/v1/modules", Some(&admin)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_invalid_token_rejected_on_public_route() {
        let response = server()
            .router()
            .oneshot(get_request("/health", Some("not.a.token")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_unknown_route_envelope() {
        let response = server()
            .router()
            .oneshot(get_request("/nope", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["code"], 404);
    }

    #[test]
    fn test_cors_layer() {
        let _any = create_cors_layer(&CorsConfig::default());
        let _list = create_cors_layer(&CorsConfig {
            allowed_origins: vec!["https://desk.example.com".to_string()],
            ..Default::default()
        });
    }
}
