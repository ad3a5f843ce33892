// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # FixDesk Integration Tests
//!
//! Cross-crate tests for the FixDesk admission pipeline and its shared
//! services.
//!
//! ## Module Structure
//!
//! - [`common`]: Shared test utilities
//!   - `fixtures`: Configurations, tokens and request builders
//!   - `mocks`: Permission sources and modules built for tests
//!
//! ## Running Tests
//!
//! ```bash
//! # Run all integration tests
//! cargo test -p fixdesk-tests
//!
//! # Run a single suite
//! cargo test -p fixdesk-tests --test integration_pipeline
//! cargo test -p fixdesk-tests --test integration_limiter
//! cargo test -p fixdesk-tests --test integration_cache
//! cargo test -p fixdesk-tests --test integration_modules
//! cargo test -p fixdesk-tests --test integration_config
//! ```
//!
//! ## Test Categories
//!
//! ### Pipeline Tests (`integration_pipeline.rs`)
//! - Credential extraction and rejection
//! - Authentication and permission gates on real routes
//! - Response envelopes for every rejection
//!
//! ### Limiter Tests (`integration_limiter.rs`)
//! - Per-user and per-address buckets
//! - Refill and idle purge under paused time
//!
//! ### Cache Tests (`integration_cache.rs`)
//! - Lazy expiry and sweeps
//! - Eviction hooks by prefix
//!
//! ### Module Tests (`integration_modules.rs`)
//! - Lifecycle ordering and export wiring
//! - The images module behind the full pipeline
//!
//! ### Config Tests (`integration_config.rs`)
//! - File loading and environment overrides
//! - Config-driven context construction

pub mod common;
