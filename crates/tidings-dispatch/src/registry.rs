//! Listener registry: storage behind the dispatcher.
//!
//! The registry only stores. It does not sort, validate listener kinds, or
//! invoke anything; [`Dispatcher`](crate::Dispatcher) does all of that and
//! guards the registry with a mutex.
//!
//! Two tables are kept:
//!
//! - plain listeners keyed by full event type
//! - aggregates keyed by component pattern
//!
//! Both preserve first-insertion order of keys and registration order within
//! a key. A key whose last descriptor is removed is dropped from the table.

use crate::{Listener, ListenerDescriptor};
use indexmap::IndexMap;
use tidings_types::ListenerId;

type Table = IndexMap<String, Vec<ListenerDescriptor>>;

/// Storage for listener descriptors.
#[derive(Debug, Default)]
pub struct ListenerRegistry {
    listeners: Table,
    aggregates: Table,
    next_sequence: u64,
}

impl ListenerRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a plain listener under `event_type`.
    pub fn add(&mut self, event_type: &str, listener: Listener, priority: i32) -> ListenerId {
        let descriptor = self.descriptor(event_type, listener, priority);
        push(&mut self.listeners, event_type, descriptor)
    }

    /// Appends an aggregate under `pattern`.
    pub fn add_aggregate(&mut self, pattern: &str, listener: Listener, priority: i32) -> ListenerId {
        let descriptor = self.descriptor(pattern, listener, priority);
        push(&mut self.aggregates, pattern, descriptor)
    }

    fn descriptor(&mut self, key: &str, listener: Listener, priority: i32) -> ListenerDescriptor {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        ListenerDescriptor::new(key, listener, priority, sequence)
    }

    /// Removes every plain descriptor under `event_type` with this identity.
    pub fn remove(&mut self, event_type: &str, id: ListenerId) -> bool {
        remove_matching(&mut self.listeners, event_type, id) > 0
    }

    /// Removes every aggregate descriptor under `pattern` with this identity.
    pub fn remove_aggregate(&mut self, pattern: &str, id: ListenerId) -> bool {
        remove_matching(&mut self.aggregates, pattern, id) > 0
    }

    /// Removes all plain listeners for a type; returns how many there were.
    pub fn remove_all_for(&mut self, event_type: &str) -> usize {
        self.listeners
            .shift_remove(event_type)
            .map_or(0, |removed| removed.len())
    }

    /// Empties both tables. The sequence counter keeps counting.
    pub fn clear(&mut self) {
        self.listeners.clear();
        self.aggregates.clear();
    }

    /// Returns `true` if any plain listener is registered for the type.
    #[must_use]
    pub fn has(&self, event_type: &str) -> bool {
        self.listeners.contains_key(event_type)
    }

    /// Returns `true` if any aggregate is registered under the pattern.
    #[must_use]
    pub fn has_aggregate(&self, pattern: &str) -> bool {
        self.aggregates.contains_key(pattern)
    }

    /// Plain descriptors for a type, in registration order.
    #[must_use]
    pub fn listeners_for(&self, event_type: &str) -> Vec<ListenerDescriptor> {
        self.listeners.get(event_type).cloned().unwrap_or_default()
    }

    /// Aggregate descriptors for a pattern, in registration order.
    #[must_use]
    pub fn aggregates_for(&self, pattern: &str) -> Vec<ListenerDescriptor> {
        self.aggregates.get(pattern).cloned().unwrap_or_default()
    }

    /// All plain descriptors, grouped by type in first-registration order.
    #[must_use]
    pub fn all(&self) -> Vec<ListenerDescriptor> {
        self.listeners.values().flatten().cloned().collect()
    }

    /// A copy of the plain table.
    #[must_use]
    pub fn structured(&self) -> IndexMap<String, Vec<ListenerDescriptor>> {
        self.listeners.clone()
    }

    /// Number of descriptors across both tables.
    #[must_use]
    pub fn len(&self) -> usize {
        self.listeners
            .values()
            .chain(self.aggregates.values())
            .map(Vec::len)
            .sum()
    }

    /// Returns `true` if both tables are empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty() && self.aggregates.is_empty()
    }
}

fn push(table: &mut Table, key: &str, descriptor: ListenerDescriptor) -> ListenerId {
    let id = descriptor.listener_id();
    table.entry(key.to_string()).or_default().push(descriptor);
    id
}

fn remove_matching(table: &mut Table, key: &str, id: ListenerId) -> usize {
    let Some(entries) = table.get_mut(key) else {
        return 0;
    };
    let before = entries.len();
    entries.retain(|d| d.listener_id() != id);
    let removed = before - entries.len();
    if entries.is_empty() {
        table.shift_remove(key);
    }
    removed
}
