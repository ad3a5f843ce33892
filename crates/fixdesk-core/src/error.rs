// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Error types for fixdesk-core.

use thiserror::Error;

/// Errors raised while constructing core primitives.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A primitive was given parameters it cannot operate with.
    #[error("Invalid parameter '{field}': {message}")]
    InvalidParameter {
        /// Name of the offending parameter.
        field: &'static str,
        /// What is wrong with it.
        message: String,
    },
}

impl CoreError {
    /// Creates an invalid parameter error.
    pub fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            field,
            message: message.into(),
        }
    }
}

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_display() {
        let err = CoreError::invalid("burst", "must be at least 1");
        assert_eq!(err.to_string(), "Invalid parameter 'burst': must be at least 1");
    }
}
