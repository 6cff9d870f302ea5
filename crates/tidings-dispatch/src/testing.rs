//! Test utilities for the dispatcher.

use crate::error::{BoxError, Result};
use crate::{Callable, Dispatcher, ListenerResult};
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tidings_event::Event;
use tidings_types::{ListenerId, DEFAULT_PRIORITY};

type ActionFn = dyn Fn(&mut Event) -> ListenerResult + Send + Sync;

/// Shared, ordered record of which mock listeners ran.
#[derive(Debug, Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<String>>>);

impl CallLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Names in invocation order.
    #[must_use]
    pub fn entries(&self) -> Vec<String> {
        self.0.lock().clone()
    }

    fn push(&self, name: &str) {
        self.0.lock().push(name.to_string());
    }
}

/// A mock listener for testing.
///
/// Runs a fixed action on every invocation and counts calls. Clones of
/// [`callable`](Self::callable) share the count and the identity.
pub struct MockListener {
    /// Name recorded in a [`CallLog`].
    pub name: String,
    /// Priority used by [`register`](Self::register).
    pub priority: i32,
    /// Number of invocations.
    pub call_count: Arc<AtomicUsize>,
    log: Arc<Mutex<Option<CallLog>>>,
    callable: Callable,
}

impl MockListener {
    fn build(name: &str, action: Arc<ActionFn>) -> Self {
        let call_count = Arc::new(AtomicUsize::new(0));
        let log: Arc<Mutex<Option<CallLog>>> = Arc::new(Mutex::new(None));
        let callable = {
            let name = name.to_string();
            let call_count = Arc::clone(&call_count);
            let log = Arc::clone(&log);
            Callable::try_on_event(move |event: &mut Event| {
                call_count.fetch_add(1, Ordering::SeqCst);
                if let Some(log) = log.lock().as_ref() {
                    log.push(&name);
                }
                action(event)
            })
        };
        Self {
            name: name.to_string(),
            priority: DEFAULT_PRIORITY,
            call_count,
            log,
            callable,
        }
    }

    /// Creates a mock that returns `value`.
    pub fn returning(name: &str, value: Value) -> Self {
        Self::build(name, Arc::new(move |_event: &mut Event| -> ListenerResult {
            Ok(value.clone())
        }))
    }

    /// Creates a mock that stops propagation and returns `value`.
    pub fn stopper(name: &str, value: Value) -> Self {
        Self::build(
            name,
            Arc::new(move |event: &mut Event| -> ListenerResult {
                event.stop_propagation();
                Ok(value.clone())
            }),
        )
    }

    /// Creates a mock that fails with `message`.
    pub fn failing(name: &str, message: &str) -> Self {
        let message = message.to_string();
        Self::build(
            name,
            Arc::new(move |_event: &mut Event| -> ListenerResult {
                Err(BoxError::from(message.clone()))
            }),
        )
    }

    /// Creates a mock that runs `f` on the event.
    pub fn modifier(
        name: &str,
        f: impl Fn(&mut Event) -> Value + Send + Sync + 'static,
    ) -> Self {
        Self::build(
            name,
            Arc::new(move |event: &mut Event| -> ListenerResult { Ok(f(event)) }),
        )
    }

    /// Sets the priority.
    #[must_use]
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Records every invocation into `log`.
    #[must_use]
    pub fn with_log(self, log: &CallLog) -> Self {
        *self.log.lock() = Some(log.clone());
        self
    }

    /// The listener to register.
    #[must_use]
    pub fn callable(&self) -> Callable {
        self.callable.clone()
    }

    /// Registers under `event_type` at [`priority`](Self::priority).
    ///
    /// # Errors
    ///
    /// Never fails for a mock; returns the dispatcher's result.
    pub fn register(&self, dispatcher: &Dispatcher, event_type: &str) -> Result<ListenerId> {
        dispatcher.add_listener_with_priority(event_type, self.callable(), self.priority)
    }

    /// Returns the number of times this listener has run.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }
}
