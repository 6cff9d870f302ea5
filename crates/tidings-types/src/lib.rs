//! Core types for tidings.
//!
//! This crate provides the small, dependency-light vocabulary shared by the
//! rest of the workspace:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  tidings-types    : ListenerId, ForwardMode, ErrorCode ◄ HERE│
//! ├─────────────────────────────────────────────────────────────┤
//! │  tidings-event    : Event, EventTarget, EventError          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  tidings-dispatch : Dispatcher, listeners, registry, config │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use tidings_types::{ForwardMode, ListenerId, DEFAULT_PRIORITY};
//!
//! let id = ListenerId::new();
//! assert_ne!(id, ListenerId::new());
//! assert_eq!(ForwardMode::default(), ForwardMode::PassEvent);
//! assert_eq!(DEFAULT_PRIORITY, 1);
//! ```

mod error;
mod forward;
mod id;

pub use error::{assert_error_code, assert_error_codes, ErrorCode};
pub use forward::{ForwardMode, UnknownForwardMode, DEFAULT_PRIORITY};
pub use id::ListenerId;
