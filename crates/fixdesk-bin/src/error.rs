// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Start-up and command errors, and the process exit codes they map to.
//!
//! | Code | Cause |
//! |------|-------|
//! | 1 | configuration file missing, unreadable or invalid |
//! | 2 | start-up: logging, listener bind, signal handlers |
//! | 3 | the server failed while running |
//! | 4 | I/O outside configuration loading |
//! | 5 | module registration, configuration or wiring |
//! | 6 | credentials or application context could not be built |

use thiserror::Error;

/// Result of a `fixdesk` command.
pub type BinResult<T> = Result<T, BinError>;

/// Why a `fixdesk` command failed.
#[derive(Debug, Error)]
pub enum BinError {
    /// Exit code 1.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// Exit code 2.
    #[error("start-up failed: {0}")]
    Startup(String),

    /// Exit code 3.
    #[error("server failed: {0}")]
    Runtime(String),

    /// Exit code 4.
    #[error("I/O error: {0}")]
    Io(String),

    /// Start-up aborts before the listener is bound.
    #[error("module wiring failed: {0}")]
    Module(#[from] fixdesk_api::ModuleError),

    /// Usually a missing or unusable signing key.
    #[error("application context: {0}")]
    Api(#[from] fixdesk_api::ApiError),

    /// Exit code 1.
    #[error("loading configuration: {0}")]
    Config(#[from] fixdesk_config::ConfigError),

    /// Keeps the exit code of `source`.
    #[error("{context}: {source}")]
    WithContext {
        /// What was being done.
        context: String,
        /// Underlying failure.
        #[source]
        source: Box<BinError>,
    },
}

impl BinError {
    /// Exit code 1.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Exit code 2.
    pub fn init(msg: impl Into<String>) -> Self {
        Self::Startup(msg.into())
    }

    /// Exit code 3.
    pub fn runtime(msg: impl Into<String>) -> Self {
        Self::Runtime(msg.into())
    }

    /// Exit code 4.
    pub fn io(msg: impl Into<String>) -> Self {
        Self::Io(msg.into())
    }

    /// Wraps `self` with what was being done.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        Self::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Process exit code, see the module table.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Configuration(_) | Self::Config(_) => 1,
            Self::Startup(_) => 2,
            Self::Runtime(_) => 3,
            Self::Io(_) => 4,
            Self::Module(_) => 5,
            Self::Api(_) => 6,
            Self::WithContext { source, .. } => source.exit_code(),
        }
    }
}

impl From<std::io::Error> for BinError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

// anyhow only appears at command edges (token minting); keep its chain.
impl From<anyhow::Error> for BinError {
    fn from(err: anyhow::Error) -> Self {
        Self::Runtime(format!("{:#}", err))
    }
}

/// Prints `error` and its causes to stderr.
pub fn report_error(error: &BinError) {
    eprintln!("fixdesk: {}", error);

    let mut source = std::error::Error::source(error);
    while let Some(cause) = source {
        eprintln!("  caused by: {}", cause);
        source = cause.source();
    }
}

/// Prints `error` and exits with its code.
pub fn report_error_and_exit(error: BinError) -> ! {
    report_error(&error);
    std::process::exit(error.exit_code())
}
