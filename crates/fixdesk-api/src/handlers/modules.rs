// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Module catalog handler.

use axum::extract::State;

use crate::module::ModuleInfo;
use crate::response::ApiResponse;
use crate::state::AppContext;

/// GET /api/v1/modules
///
/// Lists registered modules with their lifecycle state.
pub async fn list_modules(State(context): State<AppContext>) -> ApiResponse<Vec<ModuleInfo>> {
    ApiResponse::ok(context.modules())
}
