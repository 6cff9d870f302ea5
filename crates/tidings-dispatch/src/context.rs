//! Application-scope dispatcher handle.
//!
//! [`DispatcherContext`] replaces a process-wide static dispatcher. The
//! application constructs one context at startup and passes it (or clones
//! of the `Arc` it hands out) to whoever needs to emit or observe events.
//! The dispatcher inside is built lazily on first use and is the same
//! instance for the context's whole lifetime.

use crate::{Dispatcher, DispatcherConfig};
use std::ops::Deref;
use std::sync::{Arc, OnceLock};

/// Lazily built, shared [`Dispatcher`].
///
/// Derefs to [`Dispatcher`], so every dispatcher operation is available on
/// the context directly.
///
/// ```
/// use tidings_dispatch::{Callable, DispatcherContext};
/// use tidings_event::Event;
/// use std::sync::Arc;
///
/// let ctx = DispatcherContext::default();
/// assert!(!ctx.is_initialized());
///
/// ctx.add_listener("boot", Callable::on_event(|_e: &mut Event| "ok"))?;
/// assert!(ctx.is_initialized());
///
/// let shared = ctx.dispatcher();
/// assert!(Arc::ptr_eq(&shared, &ctx.dispatcher()));
/// assert!(shared.has_listener("boot"));
/// # Ok::<(), tidings_dispatch::DispatchError>(())
/// ```
#[derive(Debug, Default)]
pub struct DispatcherContext {
    config: DispatcherConfig,
    dispatcher: OnceLock<Arc<Dispatcher>>,
}

impl DispatcherContext {
    /// Creates a context whose dispatcher will use `config`.
    #[must_use]
    pub fn new(config: DispatcherConfig) -> Self {
        Self {
            config,
            dispatcher: OnceLock::new(),
        }
    }

    /// Returns the shared dispatcher, building it on first call.
    #[must_use]
    pub fn dispatcher(&self) -> Arc<Dispatcher> {
        Arc::clone(self.get())
    }

    /// Returns `true` once the dispatcher has been built.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.dispatcher.get().is_some()
    }

    /// Returns the configuration the dispatcher is (or will be) built with.
    #[must_use]
    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    fn get(&self) -> &Arc<Dispatcher> {
        self.dispatcher.get_or_init(|| {
            tracing::debug!("building shared dispatcher");
            Arc::new(Dispatcher::with_config(self.config.clone()))
        })
    }
}

impl Deref for DispatcherContext {
    type Target = Dispatcher;

    fn deref(&self) -> &Self::Target {
        self.get()
    }
}
