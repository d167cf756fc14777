//! Unified error interface for patchbay crates.
//!
//! All patchbay error types implement [`ErrorCode`] so that callers get:
//!
//! - **Machine-readable codes** for programmatic handling
//! - **Recoverability info** for retry logic
//!
//! # Code Format
//!
//! Error codes are UPPER_SNAKE_CASE and prefixed with the owning crate's
//! domain (`MSG_`, `COMPONENT_`). Codes are stable once defined.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unified error code interface.
///
/// # Recoverability
///
/// An error is recoverable if retrying the operation may succeed or the
/// caller can take corrective action. Invalid input and configuration
/// mistakes are not recoverable; transient channel conditions are.
///
/// # Example
///
/// ```
/// use patchbay_msg::ErrorCode;
///
/// #[derive(Debug)]
/// enum WireError {
///     Truncated,
/// }
///
/// impl ErrorCode for WireError {
///     fn code(&self) -> &'static str {
///         "WIRE_TRUNCATED"
///     }
///
///     fn is_recoverable(&self) -> bool {
///         true
///     }
/// }
///
/// let err = WireError::Truncated;
/// assert_eq!(err.code(), "WIRE_TRUNCATED");
/// assert!(err.is_recoverable());
/// ```
pub trait ErrorCode {
    /// Returns a machine-readable error code.
    ///
    /// UPPER_SNAKE_CASE, prefixed with the owning domain, stable across
    /// versions.
    fn code(&self) -> &'static str;

    /// Returns whether the error is recoverable.
    fn is_recoverable(&self) -> bool;
}

/// Message layer error.
///
/// | Variant | Code | Recoverable |
/// |---------|------|-------------|
/// | [`InvalidType`](MsgError::InvalidType) | `MSG_INVALID_TYPE` | No |
/// | [`ReservedNamespace`](MsgError::ReservedNamespace) | `MSG_RESERVED_NAMESPACE` | No |
#[derive(Debug, Clone, Serialize, Deserialize, Error)]
pub enum MsgError {
    /// A message type string did not parse as `domain/name`.
    #[error("invalid message type: {0}")]
    InvalidType(String),

    /// A user message type used a namespace reserved by the runtime.
    #[error("reserved namespace: {0}")]
    ReservedNamespace(String),
}

impl ErrorCode for MsgError {
    fn code(&self) -> &'static str {
        match self {
            Self::InvalidType(_) => "MSG_INVALID_TYPE",
            Self::ReservedNamespace(_) => "MSG_RESERVED_NAMESPACE",
        }
    }

    fn is_recoverable(&self) -> bool {
        match self {
            Self::InvalidType(_) => false,
            Self::ReservedNamespace(_) => false,
        }
    }
}

/// Validates that an error code follows patchbay conventions.
///
/// # Checks
///
/// 1. Code is UPPER_SNAKE_CASE
/// 2. Code starts with the expected prefix
/// 3. Code is not empty
///
/// # Panics
///
/// Panics with a descriptive message if validation fails.
pub fn assert_error_code<E: ErrorCode>(err: &E, expected_prefix: &str) {
    let code = err.code();

    assert!(!code.is_empty(), "Error code must not be empty");

    assert!(
        code.starts_with(expected_prefix),
        "Error code '{}' must start with prefix '{}'",
        code,
        expected_prefix
    );

    assert!(
        is_upper_snake_case(code),
        "Error code '{}' must be UPPER_SNAKE_CASE",
        code
    );
}

/// Validates multiple error codes at once.
///
/// Use this to verify all variants of an error enum.
pub fn assert_error_codes<E: ErrorCode>(errors: &[E], expected_prefix: &str) {
    for err in errors {
        assert_error_code(err, expected_prefix);
    }
}

/// Checks if a string is UPPER_SNAKE_CASE.
fn is_upper_snake_case(s: &str) -> bool {
    if s.is_empty() {
        return false;
    }

    if s.starts_with('_') || s.ends_with('_') {
        return false;
    }

    if s.contains("__") {
        return false;
    }

    s.chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}
