// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Built-in route handlers.

mod auth;
mod health;
mod modules;

pub use auth::current_caller;
pub use health::health;
pub use modules::list_modules;

use crate::error::ApiError;

/// Fallback for unmatched routes.
pub async fn not_found(uri: axum::http::Uri) -> ApiError {
    ApiError::not_found(format!("route {}", uri.path()))
}
