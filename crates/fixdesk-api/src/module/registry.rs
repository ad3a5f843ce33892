// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Ordered module registry.

use std::collections::HashMap;
use std::fmt;

use axum::Router;
use fixdesk_config::FixdeskConfig;

use super::{Module, ModuleError, ModuleExports, ModuleInfo, ModuleServer, ModuleState};
use crate::state::AppContext;

struct Entry {
    module: Box<dyn Module>,
    state: ModuleState,
}

impl Entry {
    fn info(&self) -> ModuleInfo {
        ModuleInfo {
            name: self.module.name().to_string(),
            version: self.module.version().to_string(),
            state: self.state,
        }
    }
}

/// Registry of feature modules, attached in registration order.
#[derive(Default)]
pub struct ModuleRegistry {
    entries: Vec<Entry>,
    published: HashMap<String, ModuleExports>,
    // Route shape -> owning module.
    claimed: HashMap<String, String>,
}

impl ModuleRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a module.
    ///
    /// # Errors
    ///
    /// [`ModuleError::Duplicate`] if a module with the same name exists.
    pub fn register(&mut self, module: Box<dyn Module>) -> Result<(), ModuleError> {
        let name = module.name().to_string();
        if self.entries.iter().any(|e| e.module.name() == name) {
            return Err(ModuleError::Duplicate { name });
        }

        tracing::debug!(module = %name, version = %module.version(), "Registered module");
        self.entries.push(Entry {
            module,
            state: ModuleState::Declared,
        });
        Ok(())
    }

    /// Hands every declared module its configuration block.
    ///
    /// Modules that are already configured or attached are left alone.
    pub fn configure_all(&mut self, config: &FixdeskConfig) -> Result<(), ModuleError> {
        for entry in self
            .entries
            .iter_mut()
            .filter(|e| e.state == ModuleState::Declared)
        {
            let block = config.module(entry.module.name());
            entry.module.configure(&block)?;
            entry.state = ModuleState::Configured;
            tracing::debug!(module = %entry.module.name(), "Configured module");
        }
        Ok(())
    }

    /// Runs every module's entry point in registration order and returns the
    /// routes they added.
    ///
    /// Stops at the first failure. A module's exports become visible to later
    /// modules only after its entry point succeeds.
    ///
    /// # Errors
    ///
    /// - [`ModuleError::AlreadyAttached`] if an entry point already ran
    /// - [`ModuleError::NotConfigured`] if a module was never configured
    /// - [`ModuleError::DependencyMissing`] if a declared or imported export
    ///   is not published yet
    /// - any error returned by the entry point
    pub fn attach_all(&mut self, context: &AppContext) -> Result<Router<AppContext>, ModuleError> {
        let Self {
            entries,
            published,
            claimed,
        } = &mut *self;
        let mut router = Router::new();

        for entry in entries.iter_mut() {
            let name = entry.module.name().to_string();
            match entry.state {
                ModuleState::Attached => return Err(ModuleError::AlreadyAttached { name }),
                ModuleState::Declared => return Err(ModuleError::NotConfigured { name }),
                ModuleState::Configured => {}
            }

            for dep in entry.module.dependencies() {
                let available = published
                    .get(&dep.module)
                    .is_some_and(|exports| exports.contains(&dep.name));
                if !available {
                    tracing::error!(module = %name, dependency = %dep, "Module dependency missing");
                    return Err(ModuleError::dependency_missing(dep.module, dep.name));
                }
            }

            let mut server = ModuleServer::new(&name, context, published, claimed);
            entry.module.attach(&mut server)?;
            let (routes, hooks) = (server.route_count(), server.hook_count());
            let (module_router, paths) = server.into_parts();
            router = router.merge(module_router);
            for path in paths {
                claimed.insert(path, name.clone());
            }

            let exports = entry.module.exports();
            tracing::info!(
                module = %name,
                version = %entry.module.version(),
                routes,
                hooks,
                exports = ?exports.names(),
                "Module attached"
            );
            published.insert(name, exports);
            entry.state = ModuleState::Attached;
        }

        context.set_modules(self.describe());
        Ok(router)
    }

    /// Name, version and state of every module, in registration order.
    pub fn describe(&self) -> Vec<ModuleInfo> {
        self.entries.iter().map(Entry::info).collect()
    }

    /// State of one module.
    pub fn state(&self, name: &str) -> Option<ModuleState> {
        self.entries
            .iter()
            .find(|e| e.module.name() == name)
            .map(|e| e.state)
    }

    /// Exports published by an attached module.
    pub fn exports(&self, name: &str) -> Option<&ModuleExports> {
        self.published.get(name)
    }

    /// Number of registered modules.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no module is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for ModuleRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleRegistry")
            .field("modules", &self.describe())
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================
