// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Server runtime orchestration.
//!
//! Start-up order:
//!
//! 1. Build the [`AppContext`] from configuration
//! 2. Register modules in a fixed order, configure and attach them
//! 3. Start the limiter and cache sweepers
//! 4. Serve until a shutdown signal arrives

use std::path::{Path, PathBuf};

use tokio::net::TcpListener;
use tracing::info;

use fixdesk_api::{ApiServer, AppContext, Module, ModuleRegistry};
use fixdesk_config::{FixdeskConfig, load_config};
use fixdesk_images::ImagesModule;

use crate::error::{BinError, BinResult};
use crate::shutdown::ShutdownCoordinator;

/// Modules shipped with the binary, in attachment order.
pub fn default_modules() -> Vec<Box<dyn Module>> {
    vec![Box::new(ImagesModule::new())]
}

/// Registers, configures and attaches `modules` in order.
///
/// Any failure here aborts start-up.
pub fn wire_modules(
    context: &AppContext,
    modules: Vec<Box<dyn Module>>,
) -> BinResult<(ModuleRegistry, ApiServer)> {
    let mut registry = ModuleRegistry::new();
    for module in modules {
        registry.register(module)?;
    }
    registry.configure_all(context.config())?;
    let routes = registry.attach_all(context)?;

    let server = ApiServer::new(context.clone()).with_modules(routes);
    Ok((registry, server))
}

// =============================================================================
// FixdeskRuntime
// =============================================================================

/// The server runtime.
pub struct FixdeskRuntime {
    config: FixdeskConfig,
    modules: Vec<Box<dyn Module>>,
    shutdown: ShutdownCoordinator,
}

impl FixdeskRuntime {
    /// Creates a runtime with the default module set.
    pub fn new(config: FixdeskConfig) -> Self {
        Self {
            config,
            modules: default_modules(),
            shutdown: ShutdownCoordinator::new(),
        }
    }

    /// Replaces the module set.
    pub fn with_modules(mut self, modules: Vec<Box<dyn Module>>) -> Self {
        self.modules = modules;
        self
    }

    /// Handle that can stop the runtime.
    pub fn shutdown_handle(&self) -> ShutdownCoordinator {
        self.shutdown.clone()
    }

    /// Binds the configured address and runs until shutdown.
    pub async fn run(self) -> BinResult<()> {
        let addr = self.config.server.bind_address();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| BinError::init(format!("Failed to bind {}: {}", addr, e)))?;
        self.run_with_listener(listener).await
    }

    /// Runs on an already bound listener until shutdown.
    pub async fn run_with_listener(self, listener: TcpListener) -> BinResult<()> {
        info!("Starting FixDesk v{}", fixdesk_api::VERSION);

        let context = AppContext::from_config(self.config)
            .map_err(|e| BinError::init(e.to_string()))?;
        let (registry, server) = wire_modules(&context, self.modules)?;
        info!(modules = registry.len(), "Modules attached");

        let background = context.start_background_tasks();
        info!(sweepers = ?background.labels(), "Background tasks started");

        let coordinator = self.shutdown.clone();
        let signals = tokio::spawn(async move { coordinator.wait_for_shutdown().await });

        let result = server
            .serve(listener, self.shutdown.shutdown_signal())
            .await
            .map_err(BinError::from);

        signals.abort();
        background.stop();
        info!("FixDesk shutdown complete");
        result
    }
}

// =============================================================================
// RuntimeBuilder
// =============================================================================

/// Builder for constructing the runtime.
#[derive(Default)]
pub struct RuntimeBuilder {
    config_path: Option<PathBuf>,
    config: Option<FixdeskConfig>,
}

impl RuntimeBuilder {
    /// Creates a new runtime builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the configuration file path.
    pub fn config_path(mut self, path: impl AsRef<Path>) -> Self {
        self.config_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Sets the configuration directly.
    pub fn config(mut self, config: FixdeskConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Builds the runtime.
    pub fn build(self) -> BinResult<FixdeskRuntime> {
        let config = match self.config {
            Some(config) => config,
            None => {
                let path = self
                    .config_path
                    .ok_or_else(|| BinError::config("No configuration provided"))?;
                load_config(&path).map_err(|e| {
                    BinError::from(e).with_context(format!("loading {}", path.display()))
                })?
            }
        };

        Ok(FixdeskRuntime::new(config))
    }
}

// =============================================================================
// Tests
// =============================================================================
