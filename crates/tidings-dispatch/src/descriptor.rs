//! Registered listener entries.

use crate::Listener;
use std::fmt;
use tidings_types::ListenerId;

/// One registration: a listener bound to a type (or aggregate pattern) at a
/// priority.
///
/// Descriptors are created by the registry and never mutated; queries on the
/// [`Dispatcher`](crate::Dispatcher) return clones.
#[derive(Clone)]
pub struct ListenerDescriptor {
    type_or_pattern: String,
    listener: Listener,
    priority: i32,
    sequence: u64,
}

impl ListenerDescriptor {
    pub(crate) fn new(
        type_or_pattern: impl Into<String>,
        listener: Listener,
        priority: i32,
        sequence: u64,
    ) -> Self {
        Self {
            type_or_pattern: type_or_pattern.into(),
            listener,
            priority,
            sequence,
        }
    }

    /// Event type, or component pattern for aggregates.
    #[must_use]
    pub fn type_or_pattern(&self) -> &str {
        &self.type_or_pattern
    }

    /// The registered listener.
    #[must_use]
    pub fn listener(&self) -> &Listener {
        &self.listener
    }

    /// Identity of the registered listener.
    #[must_use]
    pub fn listener_id(&self) -> ListenerId {
        self.listener.id()
    }

    /// Higher runs first.
    #[must_use]
    pub fn priority(&self) -> i32 {
        self.priority
    }

    /// Registration counter, unique per dispatcher and increasing.
    #[must_use]
    pub fn sequence(&self) -> u64 {
        self.sequence
    }
}

impl fmt::Debug for ListenerDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerDescriptor")
            .field("type_or_pattern", &self.type_or_pattern)
            .field("listener", &self.listener.id())
            .field("priority", &self.priority)
            .field("sequence", &self.sequence)
            .finish()
    }
}
