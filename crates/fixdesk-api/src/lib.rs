// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # fixdesk-api
//!
//! HTTP surface of the FixDesk backend.
//!
//! Every request passes through an ordered admission pipeline before it
//! reaches a handler:
//!
//! 1. [`filter::Authenticate`] verifies the bearer credential (router-wide)
//! 2. [`filter::RequireAuth`] rejects anonymous callers (per route)
//! 3. [`filter::RequirePermission`] checks the caller's role (per route)
//! 4. [`filter::RateLimit`] consumes a token from the caller's bucket
//!
//! Feature packages extend the server through the [`module`] contract.

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod auth;
pub mod error;
pub mod extractors;
pub mod filter;
pub mod handlers;
pub mod module;
pub mod response;
pub mod server;
pub mod state;

pub use auth::{AuthInfo, Caller, ClaimSet, CredentialError, CredentialExtractor, PermissionLookup, PermissionTable};
pub use error::{ApiError, ApiResult};
pub use extractors::{Auth, CallerAddr, OptionalAuth};
pub use filter::{Admission, FilterChain, FilterKit, RequestFilter};
pub use module::{
    ExportRef, ExportedFn, Module, ModuleError, ModuleExports, ModuleInfo, ModuleRegistry,
    ModuleServer, ModuleState,
};
pub use response::{ApiResponse, HealthResponse};
pub use server::{ApiServer, BUILTIN_PATHS};
pub use state::{AppContext, AppContextBuilder, BackgroundTasks};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
