// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Caller identity handler.

use crate::auth::AuthInfo;
use crate::extractors::Auth;
use crate::response::ApiResponse;

/// GET /api/v1/me
///
/// Returns the authenticated caller.
pub async fn current_caller(Auth(info): Auth) -> ApiResponse<AuthInfo> {
    ApiResponse::ok(info)
}
