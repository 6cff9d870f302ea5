//! Event layer errors.
//!
//! | Error | Code | Recoverable |
//! |-------|------|-------------|
//! | [`EventError::InvalidState`] | `EVENT_INVALID_STATE` | No |
//! | [`EventError::IndexOutOfRange`] | `EVENT_INDEX_OUT_OF_RANGE` | No |
//!
//! Both variants describe a caller bug: the params container has the wrong
//! shape for the requested write, and retrying the same call cannot help.

use thiserror::Error;
use tidings_types::ErrorCode;

/// Error raised by [`Event`](crate::Event) parameter mutation.
///
/// # Example
///
/// ```
/// use tidings_event::{Event, EventError};
/// use tidings_types::ErrorCode;
///
/// let mut event = Event::new("user.saved");
/// let err = event.set_param("id", 7).unwrap_err();
///
/// assert!(matches!(err, EventError::InvalidState(_)));
/// assert_eq!(err.code(), "EVENT_INVALID_STATE");
/// assert!(!err.is_recoverable());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EventError {
    /// The params container cannot hold a named value: it is unset, `null`,
    /// a scalar, or a sequence addressed with a non-numeric key.
    #[error("invalid event state: {0}")]
    InvalidState(String),

    /// A sequence index lies past the end of the params sequence.
    ///
    /// Writing at exactly `len` appends; anything beyond is rejected.
    #[error("param index {index} out of range (len {len})")]
    IndexOutOfRange {
        /// Requested index.
        index: usize,
        /// Current sequence length.
        len: usize,
    },
}

impl ErrorCode for EventError {
    fn code(&self) -> &'static str {
        match self {
            Self::InvalidState(_) => "EVENT_INVALID_STATE",
            Self::IndexOutOfRange { .. } => "EVENT_INDEX_OUT_OF_RANGE",
        }
    }

    fn is_recoverable(&self) -> bool {
        false
    }
}
