//! Unified error interface for tidings.
//!
//! Every error enum in the workspace implements [`ErrorCode`] so callers can
//! branch on a stable, machine-readable code instead of matching on display
//! strings.
//!
//! | Crate | Prefix |
//! |-------|--------|
//! | `tidings-event` | `EVENT_` |
//! | `tidings-dispatch` (dispatch) | `DISPATCH_` |
//! | `tidings-dispatch` (config) | `CONFIG_` |
//!
//! # Example
//!
//! ```
//! use tidings_types::ErrorCode;
//!
//! #[derive(Debug)]
//! enum RegistryError {
//!     Poisoned,
//!     Full,
//! }
//!
//! impl ErrorCode for RegistryError {
//!     fn code(&self) -> &'static str {
//!         match self {
//!             Self::Poisoned => "REGISTRY_POISONED",
//!             Self::Full => "REGISTRY_FULL",
//!         }
//!     }
//!
//!     fn is_recoverable(&self) -> bool {
//!         matches!(self, Self::Full)
//!     }
//! }
//!
//! let err = RegistryError::Full;
//! assert_eq!(err.code(), "REGISTRY_FULL");
//! assert!(err.is_recoverable());
//! ```

/// Machine-readable error code plus recoverability.
///
/// # Code Format
///
/// - **UPPER_SNAKE_CASE**, e.g. `"DISPATCH_NOT_CALLABLE"`
/// - **Prefixed** with the owning crate's namespace
/// - **Stable** once published
///
/// # Recoverability
///
/// An error is recoverable when the same call may succeed later without a
/// code change (e.g. a listener that failed on transient input). Misuse of
/// the API (registering an aggregate as a plain listener, an empty event
/// type) is never recoverable.
pub trait ErrorCode {
    /// Returns the machine-readable code.
    fn code(&self) -> &'static str;

    /// Returns whether retrying may succeed.
    fn is_recoverable(&self) -> bool;
}

/// Asserts that an error code is non-empty, prefixed and UPPER_SNAKE_CASE.
///
/// # Panics
///
/// Panics with a descriptive message if any check fails.
///
/// ```
/// use tidings_types::{assert_error_code, ErrorCode};
///
/// struct Boom;
/// impl ErrorCode for Boom {
///     fn code(&self) -> &'static str { "TEST_BOOM" }
///     fn is_recoverable(&self) -> bool { false }
/// }
///
/// assert_error_code(&Boom, "TEST_");
/// ```
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

/// Runs [`assert_error_code`] over every given variant.
pub fn assert_error_codes<E: ErrorCode>(errors: &[E], expected_prefix: &str) {
    for err in errors {
        assert_error_code(err, expected_prefix);
    }
}

fn is_upper_snake_case(s: &str) -> bool {
    if s.is_empty() || s.starts_with('_') || s.ends_with('_') || s.contains("__") {
        return false;
    }
    s.chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}
