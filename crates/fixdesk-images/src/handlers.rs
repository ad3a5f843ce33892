// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Image route handlers.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use axum::{
    extract::{Path, rejection::BytesRejection},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use fixdesk_api::{ApiError, ApiResponse, ApiResult, Auth};
use fixdesk_core::{CacheValue, ExpiringCache};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An image held in the shared cache.
#[derive(Debug, Clone)]
pub struct StoredImage {
    /// Raw image bytes.
    pub bytes: Bytes,
    /// `Content-Type` sent on download.
    pub content_type: String,
    /// Uploading user.
    pub owner: i64,
}

/// Upload response payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadedImage {
    /// Image id.
    pub id: Uuid,
    /// Download URL path.
    pub url: String,
    /// Size in bytes.
    pub size: usize,
    /// Stored content type.
    pub content_type: String,
    /// Seconds until the image expires.
    pub expires_in: u64,
}

/// State shared by the image routes, hook and exports.
#[derive(Debug)]
pub(crate) struct ImageStore {
    pub(crate) cache: Arc<ExpiringCache<CacheValue>>,
    pub(crate) key_prefix: String,
    pub(crate) path_prefix: String,
    pub(crate) max_bytes: usize,
    pub(crate) ttl: Duration,
    pub(crate) live: Arc<AtomicUsize>,
}

impl ImageStore {
    fn key(&self, id: &Uuid) -> String {
        format!("{}{}", self.key_prefix, id)
    }

    pub(crate) fn url_for(path_prefix: &str, id: &str) -> String {
        format!("{}/{}", path_prefix, id)
    }
}

/// Decrements the live-image counter without wrapping below zero.
pub(crate) fn release(live: &AtomicUsize) {
    let _ = live.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
}

fn parse_id(raw: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| ApiError::bad_request(format!("invalid image id '{raw}'")))
}

/// POST {prefix}
pub(crate) async fn upload(
    store: Arc<ImageStore>,
    Auth(caller): Auth,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> ApiResult<ApiResponse<UploadedImage>> {
    let body = body.map_err(|rejection| {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::payload_too_large(store.max_bytes)
        } else {
            ApiError::bad_request(rejection.body_text())
        }
    })?;

    if body.is_empty() {
        return Err(ApiError::bad_request("image body is empty"));
    }
    if body.len() > store.max_bytes {
        return Err(ApiError::payload_too_large(store.max_bytes));
    }

    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .filter(|v| v.starts_with("image/"))
        .ok_or_else(|| ApiError::bad_request("content type must be image/*"))?
        .to_string();

    let id = Uuid::new_v4();
    let size = body.len();
    let image = StoredImage {
        bytes: body,
        content_type: content_type.clone(),
        owner: caller.user,
    };
    store.cache.set_typed(store.key(&id), image, store.ttl);
    store.live.fetch_add(1, Ordering::SeqCst);

    tracing::debug!(image = %id, size, owner = caller.user, "Image stored");

    Ok(ApiResponse::created(UploadedImage {
        id,
        url: ImageStore::url_for(&store.path_prefix, &id.to_string()),
        size,
        content_type,
        expires_in: store.ttl.as_secs(),
    }))
}

/// GET {prefix}/{id}
pub(crate) async fn download(store: Arc<ImageStore>, Path(raw): Path<String>) -> ApiResult<Response> {
    let id = parse_id(&raw)?;
    let image = store
        .cache
        .get_as::<StoredImage>(&store.key(&id))
        .ok_or_else(|| ApiError::not_found(format!("image {id}")))?;

    Ok((
        [(header::CONTENT_TYPE, image.content_type.clone())],
        image.bytes.clone(),
    )
        .into_response())
}

/// DELETE {prefix}/{id}
pub(crate) async fn remove(
    store: Arc<ImageStore>,
    Auth(caller): Auth,
    Path(raw): Path<String>,
) -> ApiResult<ApiResponse<serde_json::Value>> {
    let id = parse_id(&raw)?;
    // Live deletes skip the eviction hook; an expired entry releases through it.
    store
        .cache
        .delete(&store.key(&id))
        .ok_or_else(|| ApiError::not_found(format!("image {id}")))?;
    release(&store.live);

    tracing::debug!(image = %id, by = caller.user, "Image deleted");
    Ok(ApiResponse::ok(serde_json::json!({ "id": id })).with_message("deleted"))
}
