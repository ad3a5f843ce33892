// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # fixdesk-images
//!
//! Image hosting feature module.
//!
//! Images are kept in the shared expiring cache under `images:<uuid>` and
//! disappear when their TTL runs out. The module publishes its limits and
//! two functions to modules attached after it:
//!
//! | Export        | Kind  | Description                           |
//! |---------------|-------|---------------------------------------|
//! | `max_bytes`   | value | Largest accepted upload               |
//! | `path_prefix` | value | Route prefix                          |
//! | `url_for`     | func  | `{"id": "<uuid>"}` to `{"url": ...}`  |
//! | `count`       | func  | Number of live images                 |

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod config;
mod handlers;

pub use config::ImagesConfig;
pub use handlers::{StoredImage, UploadedImage};

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use axum::{
    extract::{DefaultBodyLimit, Path, rejection::BytesRejection},
    http::HeaderMap,
    routing::{get, post},
};
use bytes::Bytes;
use fixdesk_api::{Auth, Module, ModuleError, ModuleExports, ModuleServer};
use serde_json::{Value, json};

use crate::handlers::{ImageStore, release};

/// Registered module name.
pub const MODULE_NAME: &str = "images";

/// Permission required to upload.
pub const UPLOAD_PERMISSION: &str = "image:upload";

/// Permission required to delete.
pub const DELETE_PERMISSION: &str = "image:delete";

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// The image hosting module.
#[derive(Debug, Default)]
pub struct ImagesModule {
    config: ImagesConfig,
    live: Arc<AtomicUsize>,
}

impl ImagesModule {
    /// Creates the module with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current configuration.
    pub fn config(&self) -> &ImagesConfig {
        &self.config
    }

    /// Number of images currently stored.
    pub fn live_count(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }
}

impl Module for ImagesModule {
    fn name(&self) -> &str {
        MODULE_NAME
    }

    fn version(&self) -> &str {
        VERSION
    }

    fn configure(&mut self, config: &Value) -> Result<(), ModuleError> {
        self.config = ImagesConfig::from_value(config)?;
        Ok(())
    }

    fn exports(&self) -> ModuleExports {
        let prefix = self.config.path_prefix.clone();
        let live = self.live.clone();

        ModuleExports::new()
            .value("max_bytes", self.config.max_bytes)
            .value("path_prefix", self.config.path_prefix.clone())
            .func("url_for", move |args: Value| {
                let id = args
                    .get("id")
                    .and_then(Value::as_str)
                    .ok_or_else(|| ModuleError::call("url_for expects {\"id\": <uuid>}"))?;
                Ok(json!({ "url": ImageStore::url_for(&prefix, id) }))
            })
            .func("count", move |_args: Value| {
                Ok(json!(live.load(Ordering::SeqCst)))
            })
    }

    fn attach(&self, server: &mut ModuleServer<'_>) -> Result<(), ModuleError> {
        let key_prefix = server.cache_prefix();
        let store = Arc::new(ImageStore {
            cache: server.context().cache().clone(),
            key_prefix: key_prefix.clone(),
            path_prefix: self.config.path_prefix.clone(),
            max_bytes: self.config.max_bytes,
            ttl: self.config.ttl_or(server.cache().default_ttl()),
            live: self.live.clone(),
        });

        let live = self.live.clone();
        server.on_evict(key_prefix, move |key, _value| {
            release(&live);
            tracing::debug!(key = %key, "Image expired");
        });

        let filters = server.filters().clone();
        let collection = self.config.path_prefix.clone();
        let item = format!("{}/{{id}}", self.config.path_prefix);

        let upload_store = store.clone();
        server.route_with(
            &collection,
            post(
                move |auth: Auth, headers: HeaderMap, body: Result<Bytes, BytesRejection>| {
                    handlers::upload(upload_store.clone(), auth, headers, body)
                },
            )
            .layer(DefaultBodyLimit::max(self.config.max_bytes)),
            filters.protected(UPLOAD_PERMISSION),
        )?;

        let download_store = store.clone();
        server.route_with(
            &item,
            get(move |path: Path<String>| handlers::download(download_store.clone(), path)),
            filters.public(),
        )?;

        let delete_store = store;
        server.route_with(
            &item,
            axum::routing::delete(move |auth: Auth, path: Path<String>| {
                handlers::remove(delete_store.clone(), auth, path)
            }),
            filters.protected(DELETE_PERMISSION),
        )?;

        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
