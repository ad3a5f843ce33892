// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Role to permission lookup.
//!
//! Permissions are plain strings of the form `resource:action`
//! (`order:assign`, `image:upload`). A role holding [`WILDCARD`] is granted
//! every permission. Lookups are pure functions of `(role, permission)`.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;

use fixdesk_config::PermissionsConfig;
use thiserror::Error;

/// Permission entry that grants everything.
pub const WILDCARD: &str = "*";

/// Built-in role names.
pub mod roles {
    /// Full access.
    pub const ADMIN: &str = "admin";
    /// Dispatches and supervises work orders.
    pub const MANAGER: &str = "manager";
    /// Works on assigned orders.
    pub const TECHNICIAN: &str = "technician";
    /// Files new orders.
    pub const REPORTER: &str = "reporter";
    /// Unauthenticated callers.
    pub const GUEST: &str = "guest";
}

/// A permission source failed to answer.
#[derive(Debug, Clone, Error)]
#[error("permission lookup failed: {0}")]
pub struct LookupError(pub String);

/// Answers whether a role holds a permission.
pub trait PermissionLookup: Send + Sync + fmt::Debug {
    /// Returns `Ok(true)` if `role` holds `permission`.
    fn allowed(&self, role: &str, permission: &str) -> Result<bool, LookupError>;
}

// =============================================================================
// PermissionTable
// =============================================================================

/// Static, read-only permission table.
#[derive(Debug, Clone, Default)]
pub struct PermissionTable {
    roles: HashMap<String, HashSet<String>>,
}

impl PermissionTable {
    /// Creates an empty table. Every lookup denies.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a role with the given permissions.
    pub fn with_role<I, P>(mut self, role: impl Into<String>, permissions: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        self.roles
            .entry(role.into())
            .or_default()
            .extend(permissions.into_iter().map(Into::into));
        self
    }

    /// Builds a table from role to permission lists.
    pub fn from_map(roles: &BTreeMap<String, Vec<String>>) -> Self {
        roles
            .iter()
            .fold(Self::new(), |table, (role, perms)| table.with_role(role, perms.iter().cloned()))
    }

    /// Builds the table from configuration, falling back to [`Self::builtin`].
    pub fn from_config(config: &PermissionsConfig) -> Self {
        if config.roles.is_empty() {
            Self::builtin()
        } else {
            Self::from_map(&config.roles)
        }
    }

    /// Default maintenance desk roles.
    pub fn builtin() -> Self {
        Self::new()
            .with_role(roles::ADMIN, [WILDCARD])
            .with_role(
                roles::MANAGER,
                [
                    "order:read",
                    "order:create",
                    "order:write",
                    "order:assign",
                    "order:delete",
                    "item:read",
                    "item:write",
                    "comment:read",
                    "comment:write",
                    "division:read",
                    "user:read",
                    "image:upload",
                    "image:delete",
                    "system:modules",
                ],
            )
            .with_role(
                roles::TECHNICIAN,
                [
                    "order:read",
                    "order:write",
                    "item:read",
                    "comment:read",
                    "comment:write",
                    "image:upload",
                ],
            )
            .with_role(
                roles::REPORTER,
                ["order:read", "order:create", "comment:read", "comment:write", "image:upload"],
            )
            .with_role(roles::GUEST, Vec::<String>::new())
    }

    /// Returns `true` if the role exists in the table.
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains_key(role)
    }

    /// Permissions held by a role, sorted.
    pub fn permissions_of(&self, role: &str) -> Vec<&str> {
        let mut perms: Vec<&str> = self
            .roles
            .get(role)
            .map(|set| set.iter().map(String::as_str).collect())
            .unwrap_or_default();
        perms.sort_unstable();
        perms
    }

    /// Number of roles.
    pub fn len(&self) -> usize {
        self.roles.len()
    }

    /// Returns `true` if the table has no roles.
    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }
}

impl PermissionLookup for PermissionTable {
    fn allowed(&self, role: &str, permission: &str) -> Result<bool, LookupError> {
        Ok(self
            .roles
            .get(role)
            .is_some_and(|perms| perms.contains(WILDCARD) || perms.contains(permission)))
    }
}

// =============================================================================
// Tests
// =============================================================================
