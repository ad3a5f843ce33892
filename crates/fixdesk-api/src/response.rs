// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! API response types.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

// =============================================================================
// ApiResponse
// =============================================================================

/// Uniform response envelope.
///
/// The HTTP status of the response always equals `code`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// HTTP status code.
    pub code: u16,
    /// Human-readable message.
    pub message: String,
    /// Payload.
    pub data: T,
}

impl<T> ApiResponse<T> {
    /// Creates an envelope with an explicit status.
    pub fn new(status: StatusCode, message: impl Into<String>, data: T) -> Self {
        Self {
            code: status.as_u16(),
            message: message.into(),
            data,
        }
    }

    /// 200 OK.
    pub fn ok(data: T) -> Self {
        Self::new(StatusCode::OK, "ok", data)
    }

    /// 201 Created.
    pub fn created(data: T) -> Self {
        Self::new(StatusCode::CREATED, "created", data)
    }

    /// Replaces the message.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Returns the status the envelope is sent with.
    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}

// =============================================================================
// Health Response
// =============================================================================

/// Payload of `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always `"healthy"` when the server answers.
    pub status: String,
    /// Server version.
    pub version: String,
    /// Seconds since the application context was built.
    pub uptime_secs: u64,
    /// Number of attached modules.
    pub modules: usize,
}

impl HealthResponse {
    /// Creates a healthy response.
    pub fn healthy(uptime_secs: u64, modules: usize) -> Self {
        Self {
            status: "healthy".to_string(),
            version: crate::VERSION.to_string(),
            uptime_secs,
            modules,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ok_envelope() {
        let response = ApiResponse::ok(serde_json::json!({"id": 7}));
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["code"], 200);
        assert_eq!(json["message"], "ok");
        assert_eq!(json["data"]["id"], 7);
    }

    #[test]
    fn test_created_status() {
        let response = ApiResponse::created(()).into_response();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    #[test]
    fn test_health_response() {
        let health = HealthResponse::healthy(12, 1);
        assert_eq!(health.status, "healthy");
        assert_eq!(health.version, crate::VERSION);
    }
}
