//! In-process event dispatcher for tidings.
//!
//! # Crate Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Foundation Layer                          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  tidings-types : ListenerId, ForwardMode, ErrorCode         │
//! │  tidings-event : Event, EventTarget, EventError             │
//! └─────────────────────────────────────────────────────────────┘
//!           ↕
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Dispatch Layer                ◄── HERE   │
//! ├─────────────────────────────────────────────────────────────┤
//! │  tidings-dispatch : Dispatcher, Listener, Registry, Config  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Overview
//!
//! Callers register listeners for named event types, then trigger dispatch
//! cycles. A cycle invokes the matching listeners in priority order, in the
//! calling thread, and either collects every response or stops at the first
//! meaningful one.
//!
//! # Core Concepts
//!
//! ## Listeners
//!
//! - [`Callable`]: a function registered for a full event type such as
//!   `"user.saved"`.
//! - [`Aggregate`]: a table of named methods registered under a component
//!   pattern. Dispatching `"cache:flush"` calls the `flush` method of every
//!   aggregate registered under `"cache"`.
//!
//! Clones of a listener share its [`ListenerId`](tidings_types::ListenerId);
//! removal matches on that identity.
//!
//! ## Ordering
//!
//! Higher priority runs first. Equal priorities run in registration order
//! unless [`TieBreak::NewestFirst`] is configured.
//!
//! ## Dispatch variants
//!
//! | Method | Returns |
//! |--------|---------|
//! | [`Dispatcher::dispatch`] | every response, `None` if nothing ran |
//! | [`Dispatcher::dispatch_until`] | first response that is not `null`/`false` |
//! | [`Dispatcher::dispatch_get_first`] | first response of a full cycle |
//!
//! A listener may call [`Event::stop_propagation`](tidings_event::Event::stop_propagation)
//! to end the cycle early when the event is cancelable.
//!
//! ## Forwarding
//!
//! A plain listener receives either the event or its params unpacked as
//! positional values ([`ForwardMode`](tidings_types::ForwardMode)). The
//! caller picks a mode per dispatch; a listener built with
//! [`Callable::on_params`] switches the rest of the cycle to params.
//!
//! ## Configuration
//!
//! [`DispatcherConfig`] is TOML-serializable and accepts `TIDINGS_*`
//! environment overrides.
//!
//! ## Shared instance
//!
//! [`DispatcherContext`] hands out one lazily built `Arc<Dispatcher>` for
//! the lifetime of the context.
//!
//! # Concurrency
//!
//! The registry sits behind a `parking_lot::Mutex` that is never held while
//! a listener runs, so listeners may register, remove or dispatch on the
//! same dispatcher. Changes made during a cycle apply from the next cycle.
//!
//! # Example
//!
//! ```
//! use tidings_dispatch::{Aggregate, Callable, DispatchArgs, Dispatcher};
//! use tidings_event::Event;
//! use serde_json::json;
//!
//! let dispatcher = Dispatcher::new();
//!
//! // Plain listeners
//! dispatcher.add_listener("order.placed", Callable::on_event(|_e: &mut Event| false))?;
//! dispatcher.add_listener_with_priority(
//!     "order.placed",
//!     Callable::on_event(|e: &mut Event| e.param_or("id", 0)),
//!     10,
//! )?;
//!
//! let first = dispatcher.dispatch_until_with(
//!     "order.placed",
//!     DispatchArgs::new().with_params(json!({"id": 42})),
//! )?;
//! assert_eq!(first, Some(json!(42)));
//!
//! // Aggregates
//! dispatcher.add_listener_aggregate(
//!     "cache",
//!     Aggregate::new().with_method("flush", |_e: &mut Event| "flushed"),
//! )?;
//! assert_eq!(dispatcher.dispatch("cache:flush")?, Some(vec![json!("flushed")]));
//! assert_eq!(dispatcher.dispatch("cache:warm")?, None);
//! # Ok::<(), tidings_dispatch::DispatchError>(())
//! ```

mod config;
mod context;
mod descriptor;
mod dispatcher;
mod error;
mod factory;
mod listener;
mod registry;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use config::{
    ConfigError, DispatcherConfig, TieBreak, ENV_DEFAULT_PRIORITY, ENV_FORWARD_MODE,
    ENV_SEPARATOR, ENV_TIE_BREAK,
};
pub use context::DispatcherContext;
pub use descriptor::ListenerDescriptor;
pub use dispatcher::{DispatchArgs, Dispatcher, EventSource};
pub use error::{BoxError, DispatchError, Result};
pub use factory::{DefaultEventFactory, EventFactory};
pub use listener::{Aggregate, Args, Callable, Listener, ListenerHandle, ListenerResult};
pub use registry::ListenerRegistry;

// Re-export for convenience
pub use tidings_event::{Event, EventTarget};
pub use tidings_types::{ErrorCode, ForwardMode, ListenerId};
