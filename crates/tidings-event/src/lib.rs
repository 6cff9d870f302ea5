//! Event value object for tidings.
//!
//! This crate defines the [`Event`] that flows through one dispatch cycle of
//! the `tidings-dispatch` crate:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  tidings-types    : ListenerId, ForwardMode, ErrorCode      │
//! ├─────────────────────────────────────────────────────────────┤
//! │  tidings-event    : Event, EventTarget, EventError   ◄ HERE │
//! ├─────────────────────────────────────────────────────────────┤
//! │  tidings-dispatch : Dispatcher, listeners, registry, config │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Event anatomy
//!
//! | Field | Meaning |
//! |-------|---------|
//! | type | dispatch key, e.g. `"user.saved"` or `"cache:flush"` |
//! | target | opaque calling context ([`EventTarget`]) |
//! | params | a [`serde_json::Value`]: object, array or scalar |
//! | cancelable | whether `stop_propagation` has any effect |
//! | metadata | free-form bag, typically stamped by an event factory |
//!
//! Events carry no permission or routing logic; they are plain data that
//! listeners read and mutate during a cycle.
//!
//! # Usage
//!
//! ```
//! use tidings_event::{Event, EventError};
//! use serde_json::json;
//!
//! let mut event = Event::new("user.saved").with_params(json!(["alice", 7]));
//! assert_eq!(event.param("0"), Some(&json!("alice")));
//! assert_eq!(event.param_list().len(), 2);
//!
//! let err = Event::new("bare").set_param("k", 1).unwrap_err();
//! assert!(matches!(err, EventError::InvalidState(_)));
//! # event.set_param("1", 8).unwrap();
//! ```

mod error;
mod event;
mod params;
mod target;

pub use error::EventError;
pub use event::Event;
pub use params::is_empty_value;
pub use target::EventTarget;

// Re-export for convenience
pub use serde_json::Value;
