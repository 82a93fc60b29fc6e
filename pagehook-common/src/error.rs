//! Error types for pagehook
//!
//! Expected outcomes (a second `init`, a rejected menu registration, a
//! registry miss) are reported through `bool`/`Option` returns. The types in
//! this module are reserved for contract violations at constructor-like
//! boundaries, which must fail synchronously at the call site.

use thiserror::Error as ThisError;

/// Severity levels for error classification
///
/// - **Warning**: Potential issue but the operation can proceed.
/// - **Error**: The operation failed but the page engine stays usable.
/// - **Critical**: The engine cannot continue.
///
/// # Examples
///
/// ```rust
/// use pagehook_common::{ErrorSeverity, PageHookError, Severity};
///
/// let err = PageHookError::UnknownProperty("colour".to_string());
/// assert_eq!(err.severity(), ErrorSeverity::Error);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Potential issue but operation can proceed
    Warning,

    /// Operation failed but the engine can continue
    Error,

    /// Engine cannot continue, requires immediate attention
    Critical,
}

/// Trait for error types that have severity levels
///
/// Every pagehook error type implements this so callers can pick a log level
/// without matching on individual variants.
pub trait Severity {
    /// Get the severity level of this error
    fn severity(&self) -> ErrorSeverity;
}

/// Result type alias for pagehook operations
pub type Result<T> = std::result::Result<T, PageHookError>;

/// Contract violations raised by pagehook entry points
#[derive(Debug, ThisError)]
#[non_exhaustive]
pub enum PageHookError {
    /// A constructor-like entry point received arguments of the wrong shape
    #[error("Contract violation in {entry}: {message}")]
    ContractViolation {
        /// The entry point that rejected its arguments
        entry: String,
        /// What was wrong with them
        message: String,
    },

    /// A shared page property name that the property table does not know
    #[error("Unknown shared property: {0}")]
    UnknownProperty(String),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PageHookError {
    /// Create a contract violation error for the given entry point
    pub fn contract(entry: impl Into<String>, message: impl Into<String>) -> Self {
        PageHookError::ContractViolation {
            entry: entry.into(),
            message: message.into(),
        }
    }
}

impl Severity for PageHookError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            PageHookError::ContractViolation { .. } => ErrorSeverity::Critical,
            PageHookError::UnknownProperty(_) => ErrorSeverity::Error,
            PageHookError::Json(_) => ErrorSeverity::Error,
        }
    }
}
