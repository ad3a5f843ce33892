// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Authentication and authorization primitives.
//!
//! This module provides:
//! - Bearer credential verification producing a typed [`ClaimSet`]
//! - The per-request caller identity ([`Caller`], [`AuthInfo`])
//! - Role to permission lookup ([`PermissionLookup`], [`PermissionTable`])
//!
//! The request filters built on top of these live in [`crate::filter`].

mod claims;
mod context;
mod credential;
pub mod permission;

pub use claims::ClaimSet;
pub use context::{AuthInfo, Caller};
pub use credential::{CredentialError, CredentialExtractor};
pub use permission::{LookupError, PermissionLookup, PermissionTable};
