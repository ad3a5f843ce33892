// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # fixdesk-bin
//!
//! CLI binary for the FixDesk backend.
//!
//! - CLI argument parsing with clap
//! - Runtime orchestration: context, module wiring, sweepers, HTTP server
//! - Graceful shutdown handling
//! - Logging initialization
//! - Command implementations (run, validate, version, token)
//!
//! ## Architecture
//!
//! ```text
//!                      main.rs
//!                         │
//!                      cli.rs
//!                         │
//!          ┌──────────────┼──────────────┐
//!          ▼              ▼              ▼
//!      commands        runtime        logging
//!                         │
//!              ┌──────────┼──────────┐
//!              ▼          ▼          ▼
//!         AppContext  ModuleRegistry  shutdown
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Start the server (default command)
//! fixdesk
//!
//! # Start with a custom config
//! fixdesk -c /etc/fixdesk/fixdesk.yaml
//!
//! # Validate configuration
//! fixdesk validate --strict
//!
//! # Mint a token for local testing
//! fixdesk token --user 7 --role technician
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

// =============================================================================
// Modules
// =============================================================================

pub mod cli;
pub mod commands;
pub mod error;
pub mod logging;
pub mod runtime;
pub mod shutdown;

// =============================================================================
// Re-exports
// =============================================================================

pub use cli::{Cli, Commands};
pub use error::{BinError, BinResult};
pub use logging::init_logging;
pub use runtime::{FixdeskRuntime, RuntimeBuilder, default_modules, wire_modules};
pub use shutdown::ShutdownCoordinator;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
