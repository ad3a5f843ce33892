// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Mock permission sources and modules.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use axum::routing::get;
use fixdesk_api::auth::LookupError;
use fixdesk_api::{
    ApiResponse, ExportRef, Module, ModuleError, ModuleExports, ModuleServer, PermissionLookup,
};
use parking_lot::Mutex;
use serde_json::{Value, json};

// =============================================================================
// Permission sources
// =============================================================================

/// Grants exactly the listed `(role, permission)` pairs and counts lookups.
#[derive(Debug, Default)]
pub struct CountingLookup {
    grants: Vec<(String, String)>,
    calls: AtomicUsize,
}

impl CountingLookup {
    /// Creates a lookup granting `grants`.
    pub fn new(grants: &[(&str, &str)]) -> Self {
        Self {
            grants: grants
                .iter()
                .map(|(r, p)| (r.to_string(), p.to_string()))
                .collect(),
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of lookups answered.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl PermissionLookup for CountingLookup {
    fn allowed(&self, role: &str, permission: &str) -> Result<bool, LookupError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .grants
            .iter()
            .any(|(r, p)| r == role && p == permission))
    }
}

/// A permission source that is always down.
#[derive(Debug, Default)]
pub struct UnavailableLookup;

impl PermissionLookup for UnavailableLookup {
    fn allowed(&self, _role: &str, _permission: &str) -> Result<bool, LookupError> {
        Err(LookupError("permission store offline".to_string()))
    }
}

// =============================================================================
// Modules
// =============================================================================

/// Shared record of lifecycle calls across modules.
pub type CallLog = Arc<Mutex<Vec<String>>>;

/// Publishes a greeting and serves it publicly.
pub struct GreeterModule {
    log: CallLog,
    greeting: String,
}

impl GreeterModule {
    /// Creates the module.
    pub fn new(log: CallLog) -> Self {
        Self {
            log,
            greeting: "hello".to_string(),
        }
    }
}

impl Module for GreeterModule {
    fn name(&self) -> &str {
        "greeter"
    }

    fn version(&self) -> &str {
        "1.0.0"
    }

    fn configure(&mut self, config: &Value) -> Result<(), ModuleError> {
        self.log.lock().push("greeter:configure".to_string());
        if let Some(greeting) = config.get("greeting") {
            self.greeting = greeting
                .as_str()
                .ok_or_else(|| ModuleError::config("greeter", "greeting must be a string"))?
                .to_string();
        }
        Ok(())
    }

    fn exports(&self) -> ModuleExports {
        let greeting = self.greeting.clone();
        ModuleExports::new()
            .value("greeting", self.greeting.clone())
            .func("greet", move |args| {
                let who = args.as_str().unwrap_or("world");
                Ok(json!(format!("{greeting}, {who}")))
            })
    }

    fn attach(&self, server: &mut ModuleServer<'_>) -> Result<(), ModuleError> {
        self.log.lock().push("greeter:attach".to_string());
        let greeting = self.greeting.clone();
        let public = server.filters().public();
        server.route_with(
            "/api/v1/greeting",
            get(move || {
                let greeting = greeting.clone();
                async move { ApiResponse::ok(json!({ "greeting": greeting })) }
            }),
            public,
        )?;
        Ok(())
    }
}

/// Depends on the greeter and serves its greeting to technicians.
pub struct DispatchModule {
    log: CallLog,
}

impl DispatchModule {
    /// Creates the module.
    pub fn new(log: CallLog) -> Self {
        Self { log }
    }
}

impl Module for DispatchModule {
    fn name(&self) -> &str {
        "dispatch"
    }

    fn version(&self) -> &str {
        "0.3.0"
    }

    fn configure(&mut self, _config: &Value) -> Result<(), ModuleError> {
        self.log.lock().push("dispatch:configure".to_string());
        Ok(())
    }

    fn dependencies(&self) -> Vec<ExportRef> {
        vec![ExportRef::new("greeter", "greet")]
    }

    fn attach(&self, server: &mut ModuleServer<'_>) -> Result<(), ModuleError> {
        self.log.lock().push("dispatch:attach".to_string());
        let greet = server.import_fn("greeter", "greet")?;
        let message = greet(json!("technician"))?;
        let protected = server.filters().protected("order:assign");
        server.route_with(
            "/api/v1/dispatch",
            get(move || {
                let message = message.clone();
                async move { ApiResponse::ok(message) }
            }),
            protected,
        )?;
        Ok(())
    }
}
