// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Feature modules.
//!
//! A [`Module`] is an independently packaged feature that extends the server
//! with routes, cache eviction hooks and exported values or functions. The
//! [`ModuleRegistry`] drives every module through
//! `Declared -> Configured -> Attached` in registration order. A module may
//! import the exports of modules attached before it; importing anything else
//! fails start-up with [`ModuleError::DependencyMissing`].
//!
//! # Example
//!
//! ```rust,ignore
//! let mut registry = ModuleRegistry::new();
//! registry.register(Box::new(ImagesModule::new()))?;
//! registry.configure_all(&config)?;
//! let routes = registry.attach_all(&context)?;
//! ```

mod registry;
mod server;

pub use registry::ModuleRegistry;
pub use server::ModuleServer;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::error::ApiError;

// =============================================================================
// Module Trait
// =============================================================================

/// Capability interface every feature module implements.
pub trait Module: Send + Sync + 'static {
    /// Unique module name.
    fn name(&self) -> &str;

    /// Module version.
    fn version(&self) -> &str;

    /// Applies the module's configuration block (`null` when absent).
    fn configure(&mut self, config: &Value) -> Result<(), ModuleError> {
        let _ = config;
        Ok(())
    }

    /// Exports of other modules that must be attached first.
    fn dependencies(&self) -> Vec<ExportRef> {
        Vec::new()
    }

    /// Values and functions published once the module is attached.
    fn exports(&self) -> ModuleExports {
        ModuleExports::new()
    }

    /// Entry point. Called exactly once per process.
    fn attach(&self, server: &mut ModuleServer<'_>) -> Result<(), ModuleError>;
}

// =============================================================================
// Exports
// =============================================================================

/// Function published by a module.
pub type ExportedFn = Arc<dyn Fn(Value) -> Result<Value, ModuleError> + Send + Sync>;

/// Named values and functions a module publishes to later modules.
#[derive(Clone, Default)]
pub struct ModuleExports {
    values: HashMap<String, Value>,
    funcs: HashMap<String, ExportedFn>,
}

impl ModuleExports {
    /// Creates an empty export set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Publishes a value.
    pub fn value(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }

    /// Publishes a function.
    pub fn func<F>(mut self, name: impl Into<String>, func: F) -> Self
    where
        F: Fn(Value) -> Result<Value, ModuleError> + Send + Sync + 'static,
    {
        self.funcs.insert(name.into(), Arc::new(func));
        self
    }

    /// Looks up a value.
    pub fn get_value(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Looks up a function.
    pub fn get_fn(&self, name: &str) -> Option<&ExportedFn> {
        self.funcs.get(name)
    }

    /// Returns `true` if a value or function named `name` exists.
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name) || self.funcs.contains_key(name)
    }

    /// Sorted names of all exports.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .values
            .keys()
            .chain(self.funcs.keys())
            .map(String::as_str)
            .collect();
        names.sort_unstable();
        names
    }

    /// Number of exports.
    pub fn len(&self) -> usize {
        self.values.len() + self.funcs.len()
    }

    /// Returns `true` if nothing is exported.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for ModuleExports {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut funcs: Vec<&String> = self.funcs.keys().collect();
        funcs.sort_unstable();
        f.debug_struct("ModuleExports")
            .field("values", &self.values)
            .field("funcs", &funcs)
            .finish()
    }
}

/// Reference to an export of another module.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExportRef {
    /// Exporting module.
    pub module: String,
    /// Export name.
    pub name: String,
}

impl ExportRef {
    /// Creates a reference.
    pub fn new(module: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for ExportRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.module, self.name)
    }
}

// =============================================================================
// State
// =============================================================================

/// Lifecycle state of a registered module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleState {
    /// Registered, not yet configured.
    Declared,
    /// Configuration accepted.
    Configured,
    /// Entry point has run.
    Attached,
}

impl fmt::Display for ModuleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ModuleState::Declared => "declared",
            ModuleState::Configured => "configured",
            ModuleState::Attached => "attached",
        };
        f.write_str(name)
    }
}

/// Summary of a registered module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleInfo {
    /// Module name.
    pub name: String,
    /// Module version.
    pub version: String,
    /// Current lifecycle state.
    pub state: ModuleState,
}

// =============================================================================
// Errors
// =============================================================================

/// Module lifecycle and export errors.
#[derive(Debug, Clone, Error)]
pub enum ModuleError {
    /// A module with the same name is already registered.
    #[error("module '{name}' is already registered")]
    Duplicate {
        /// Module name.
        name: String,
    },

    /// A referenced export does not exist (yet).
    #[error("module dependency missing: '{module}' does not export '{export}'")]
    DependencyMissing {
        /// Exporting module.
        module: String,
        /// Export name.
        export: String,
    },

    /// Attach was attempted before configuration.
    #[error("module '{name}' has not been configured")]
    NotConfigured {
        /// Module name.
        name: String,
    },

    /// The module rejected its configuration.
    #[error("module '{module}' configuration error: {message}")]
    Config {
        /// Module name.
        module: String,
        /// Error message.
        message: String,
    },

    /// The module's entry point already ran.
    #[error("module '{name}' is already attached")]
    AlreadyAttached {
        /// Module name.
        name: String,
    },

    /// The module's entry point failed.
    #[error("module '{module}' failed to attach: {message}")]
    Attach {
        /// Module name.
        module: String,
        /// Error message.
        message: String,
    },

    /// An exported function failed.
    #[error("exported function failed: {message}")]
    Call {
        /// Error message.
        message: String,
    },
}

impl ModuleError {
    /// Creates a dependency missing error.
    pub fn dependency_missing(module: impl Into<String>, export: impl Into<String>) -> Self {
        Self::DependencyMissing {
            module: module.into(),
            export: export.into(),
        }
    }

    /// Creates a configuration error.
    pub fn config(module: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Config {
            module: module.into(),
            message: message.into(),
        }
    }

    /// Creates an attach error.
    pub fn attach(module: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Attach {
            module: module.into(),
            message: message.into(),
        }
    }

    /// Creates a call error.
    pub fn call(message: impl Into<String>) -> Self {
        Self::Call {
            message: message.into(),
        }
    }

    /// Returns `true` for [`ModuleError::DependencyMissing`].
    pub fn is_dependency_missing(&self) -> bool {
        matches!(self, ModuleError::DependencyMissing { .. })
    }
}

impl From<ModuleError> for ApiError {
    fn from(err: ModuleError) -> Self {
        match err {
            ModuleError::Call { message } => ApiError::bad_request(message),
            other => ApiError::internal(other.to_string()),
        }
    }
}
