// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Health check handler.

use axum::extract::State;

use crate::module::ModuleState;
use crate::response::{ApiResponse, HealthResponse};
use crate::state::AppContext;

/// GET /health
///
/// Liveness check. Public.
pub async fn health(State(context): State<AppContext>) -> ApiResponse<HealthResponse> {
    let attached = context
        .modules()
        .iter()
        .filter(|m| m.state == ModuleState::Attached)
        .count();
    ApiResponse::ok(HealthResponse::healthy(context.uptime().as_secs(), attached))
}
