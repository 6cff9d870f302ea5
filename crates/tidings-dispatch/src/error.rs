//! Error types for the dispatcher.
//!
//! | Error | Code | Recoverable |
//! |-------|------|-------------|
//! | [`DispatchError::NotCallable`] | `DISPATCH_NOT_CALLABLE` | No |
//! | [`DispatchError::NotObject`] | `DISPATCH_NOT_OBJECT` | No |
//! | [`DispatchError::InvalidArgument`] | `DISPATCH_INVALID_ARGUMENT` | No |
//! | [`DispatchError::ListenerFailed`] | `DISPATCH_LISTENER_FAILED` | Yes |
//! | [`DispatchError::Event`] | `DISPATCH_EVENT` | No |

use thiserror::Error;
use tidings_event::EventError;
use tidings_types::{ErrorCode, ListenerId};

/// Boxed error returned by a fallible listener.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors raised by [`Dispatcher`](crate::Dispatcher) operations.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// A method-table listener was passed where a plain listener is required.
    #[error("listener for '{event_type}' is not callable")]
    NotCallable {
        /// Event type the registration or removal targeted.
        event_type: String,
    },

    /// A plain listener was passed where a method-table listener is required.
    #[error("listener for aggregate '{pattern}' is not a method table")]
    NotObject {
        /// Component pattern the registration targeted.
        pattern: String,
    },

    /// The dispatch input cannot be resolved to an event.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A fallible listener returned an error; the cycle was aborted.
    #[error("listener {listener} failed on '{event_type}': {source}")]
    ListenerFailed {
        /// Event type being dispatched.
        event_type: String,
        /// The failing listener.
        listener: ListenerId,
        /// Error returned by the listener.
        #[source]
        source: BoxError,
    },

    /// Event mutation failed while applying call-site arguments.
    #[error(transparent)]
    Event(#[from] EventError),
}

impl ErrorCode for DispatchError {
    fn code(&self) -> &'static str {
        match self {
            Self::NotCallable { .. } => "DISPATCH_NOT_CALLABLE",
            Self::NotObject { .. } => "DISPATCH_NOT_OBJECT",
            Self::InvalidArgument(_) => "DISPATCH_INVALID_ARGUMENT",
            Self::ListenerFailed { .. } => "DISPATCH_LISTENER_FAILED",
            Self::Event(_) => "DISPATCH_EVENT",
        }
    }

    fn is_recoverable(&self) -> bool {
        matches!(self, Self::ListenerFailed { .. })
    }
}

/// Result alias for dispatcher operations.
pub type Result<T, E = DispatchError> = std::result::Result<T, E>;
