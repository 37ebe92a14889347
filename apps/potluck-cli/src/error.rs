//! # CLI Error Type
//!
//! Unified error type for every command.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in potluck                                │
//! │                                                                         │
//! │  Command                                                                │
//! │     │                                                                   │
//! │     ├── file missing / bad JSON ── anyhow::Error ──────┐                │
//! │     ├── bad environment ────────── ConfigError ────────┤                │
//! │     └── ledger rejects input ───── CoreError ──────────┼──► CliError    │
//! │                                                        │       │        │
//! │                                                        │       ▼        │
//! │                                            stderr: {"code","message"}   │
//! │                                            exit status: failure         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::fmt;

use potluck_core::{CoreError, ErrorKind};
use serde::Serialize;

use crate::config::ConfigError;

/// Error report printed to stderr when a command fails.
///
/// ## Serialization
/// ```json
/// {
///   "code": "NOT_FOUND",
///   "message": "Member not found: 9"
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct CliError {
    /// Machine-readable error code for scripts
    pub code: ErrorCode,

    /// Human-readable error message
    pub message: String,
}

/// Error codes for CLI failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Malformed expense or snapshot content
    ValidationError,

    /// Totals that do not add up
    ConsistencyError,

    /// Unknown member or expense
    NotFound,

    /// Unreadable file or JSON
    InvalidInput,

    /// Bad environment configuration
    ConfigError,
}

impl CliError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        CliError {
            code,
            message: message.into(),
        }
    }

    /// The report as one line of JSON.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| self.message.clone())
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.code, self.message)
    }
}

impl std::error::Error for CliError {}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        let code = match err.kind() {
            ErrorKind::Validation => ErrorCode::ValidationError,
            ErrorKind::Consistency => ErrorCode::ConsistencyError,
            ErrorKind::NotFound => ErrorCode::NotFound,
        };
        CliError::new(code, err.to_string())
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        CliError::new(ErrorCode::ConfigError, err.to_string())
    }
}

/// File and parse failures. The full context chain goes into the message.
impl From<anyhow::Error> for CliError {
    fn from(err: anyhow::Error) -> Self {
        CliError::new(ErrorCode::InvalidInput, format!("{:#}", err))
    }
}
