// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # fixdesk-config
//!
//! Configuration management for the FixDesk server.
//!
//! ## Features
//!
//! - **Schema Definition**: server, auth, permissions, rate limit, cache and
//!   opaque per-module blocks, each with defaults and validation
//! - **Multi-Format Support**: YAML, TOML, and JSON configuration files
//! - **Environment Overrides**: `FIXDESK_*` variables override file values
//! - **Placeholders**: `${VAR}` and `${VAR:default}` inside config files
//!
//! ## Quick Start
//!
//! ```no_run
//! use fixdesk_config::load_config;
//!
//! let config = load_config("fixdesk.yaml").unwrap();
//! println!("Rate: {}/s, burst {}", config.rate_limit.rate, config.rate_limit.burst);
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod error;
pub mod loader;
pub mod schema;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigFormat, ConfigLoader, EnvSource, load_config, load_config_str};
pub use schema::{
    AuthConfig, CacheConfig, CorsConfig, FixdeskConfig, PermissionsConfig, RateLimitConfig,
    RateLimitKey, SecretValue, ServerConfig,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
