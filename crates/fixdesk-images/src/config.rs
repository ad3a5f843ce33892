// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Image module configuration.

use std::time::Duration;

use fixdesk_api::ModuleError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::MODULE_NAME;

/// Default upload limit (5 MiB).
pub const DEFAULT_MAX_BYTES: usize = 5 * 1024 * 1024;

/// Default route prefix.
pub const DEFAULT_PATH_PREFIX: &str = "/api/v1/images";

/// `modules.images` configuration block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImagesConfig {
    /// Largest accepted upload in bytes.
    pub max_bytes: usize,
    /// Image lifetime in seconds. Absent means the cache default.
    pub ttl: Option<u64>,
    /// Route prefix, without a trailing slash.
    pub path_prefix: String,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_MAX_BYTES,
            ttl: None,
            path_prefix: DEFAULT_PATH_PREFIX.to_string(),
        }
    }
}

impl ImagesConfig {
    /// Parses a configuration block. `null` yields the defaults.
    pub fn from_value(value: &Value) -> Result<Self, ModuleError> {
        let config: Self = if value.is_null() {
            Self::default()
        } else {
            serde_json::from_value(value.clone())
                .map_err(|e| ModuleError::config(MODULE_NAME, e.to_string()))?
        };
        config.validate()?;
        Ok(config)
    }

    /// Image lifetime, falling back to `default_ttl`.
    pub fn ttl_or(&self, default_ttl: Duration) -> Duration {
        self.ttl.map(Duration::from_secs).unwrap_or(default_ttl)
    }

    fn validate(&self) -> Result<(), ModuleError> {
        if self.max_bytes == 0 {
            return Err(ModuleError::config(MODULE_NAME, "max_bytes must be non-zero"));
        }
        if self.ttl == Some(0) {
            return Err(ModuleError::config(MODULE_NAME, "ttl must be non-zero"));
        }
        if !self.path_prefix.starts_with('/') || self.path_prefix.ends_with('/') {
            return Err(ModuleError::config(
                MODULE_NAME,
                "path_prefix must start with '/' and must not end with '/'",
            ));
        }
        Ok(())
    }
}
