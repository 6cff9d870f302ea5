//! The event value object.

use crate::params;
use crate::{EventError, EventTarget};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

/// A single event travelling through one dispatch cycle.
///
/// Listeners receive `&mut Event` and may read or rewrite its params, or stop
/// propagation. The dispatcher creates one per dispatch call (or borrows the
/// caller's) and never keeps it afterwards.
///
/// # Cancellation
///
/// [`stop_propagation`](Self::stop_propagation) only has an effect when the
/// event is cancelable (the default). A non-cancelable event always reaches
/// every selected listener.
///
/// # Example
///
/// ```
/// use tidings_event::Event;
/// use serde_json::json;
///
/// let mut event = Event::new("order.placed")
///     .with_target("checkout")
///     .with_params(json!({"order_id": 42}));
///
/// assert_eq!(event.event_type(), "order.placed");
/// assert_eq!(event.param("order_id"), Some(&json!(42)));
/// assert_eq!(event.param_or("coupon", "none"), json!("none"));
///
/// event.set_param("total", 99.5).unwrap();
/// assert_eq!(event.param("total"), Some(&json!(99.5)));
///
/// event.stop_propagation();
/// assert!(event.is_propagation_stopped());
/// ```
#[derive(Debug, Clone)]
pub struct Event {
    event_type: String,
    target: Option<EventTarget>,
    params: Option<Value>,
    cancelable: bool,
    propagation_stopped: bool,
    metadata: HashMap<String, Value>,
}

impl Event {
    /// Creates a cancelable event with no target and no params.
    #[must_use]
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            target: None,
            params: None,
            cancelable: true,
            propagation_stopped: false,
            metadata: HashMap::new(),
        }
    }

    /// Sets the target.
    #[must_use]
    pub fn with_target(mut self, target: impl Into<EventTarget>) -> Self {
        self.target = Some(target.into());
        self
    }

    /// Sets the params.
    #[must_use]
    pub fn with_params(mut self, params: impl Into<Value>) -> Self {
        self.params = Some(params.into());
        self
    }

    /// Sets whether propagation can be stopped.
    #[must_use]
    pub fn with_cancelable(mut self, cancelable: bool) -> Self {
        self.cancelable = cancelable;
        self
    }

    /// Adds a metadata entry.
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    // ── type ────────────────────────────────────────────────

    /// Returns the dispatch key.
    #[must_use]
    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    /// Replaces the dispatch key.
    pub fn set_type(&mut self, event_type: impl Into<String>) -> &mut Self {
        self.event_type = event_type.into();
        self
    }

    // ── target ──────────────────────────────────────────────

    /// Returns the calling context, if any.
    #[must_use]
    pub fn target(&self) -> Option<&EventTarget> {
        self.target.as_ref()
    }

    /// Replaces the calling context.
    pub fn set_target(&mut self, target: impl Into<EventTarget>) -> &mut Self {
        self.target = Some(target.into());
        self
    }

    // ── params ──────────────────────────────────────────────

    /// Returns the whole params value as stored, `None` when unset.
    #[must_use]
    pub fn params(&self) -> Option<&Value> {
        self.params.as_ref()
    }

    /// Mutable access to the stored params.
    pub fn params_mut(&mut self) -> Option<&mut Value> {
        self.params.as_mut()
    }

    /// Replaces the params wholesale.
    pub fn set_params(&mut self, params: impl Into<Value>) -> &mut Self {
        self.params = Some(params.into());
        self
    }

    /// Looks up one parameter by key (object) or index (array).
    ///
    /// Returns `None` when params are unset, the key is missing, or the
    /// stored value is `null`.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&Value> {
        self.params.as_ref().and_then(|p| params::lookup(p, name))
    }

    /// Like [`param`](Self::param) but falls back to `default`.
    #[must_use]
    pub fn param_or(&self, name: &str, default: impl Into<Value>) -> Value {
        match self.param(name) {
            Some(value) => value.clone(),
            None => default.into(),
        }
    }

    /// Writes one parameter.
    ///
    /// # Errors
    ///
    /// - [`EventError::InvalidState`] when params are unset, `null` or a
    ///   scalar, or when an array is addressed with a non-numeric key.
    /// - [`EventError::IndexOutOfRange`] when an array index lies past its end.
    pub fn set_param(
        &mut self,
        name: &str,
        value: impl Into<Value>,
    ) -> Result<&mut Self, EventError> {
        params::assign(&mut self.params, name, value.into())?;
        Ok(self)
    }

    /// Params as positional values: array elements, or a single-element list
    /// for any other non-null value, or empty when unset.
    #[must_use]
    pub fn param_list(&self) -> Vec<Value> {
        params::positional(self.params.as_ref())
    }

    // ── cancellation ────────────────────────────────────────

    /// Returns whether propagation can be stopped.
    #[must_use]
    pub fn is_cancelable(&self) -> bool {
        self.cancelable
    }

    /// Sets whether propagation can be stopped.
    pub fn set_cancelable(&mut self, cancelable: bool) -> &mut Self {
        self.cancelable = cancelable;
        self
    }

    /// Returns whether a listener stopped propagation.
    #[must_use]
    pub fn is_propagation_stopped(&self) -> bool {
        self.propagation_stopped
    }

    /// Stops propagation; silently ignored on non-cancelable events.
    pub fn stop_propagation(&mut self) {
        self.set_propagation_stopped(true);
    }

    /// Sets or clears the stopped flag; ignored on non-cancelable events.
    pub fn set_propagation_stopped(&mut self, stopped: bool) {
        if self.cancelable {
            self.propagation_stopped = stopped;
        }
    }

    // ── metadata ────────────────────────────────────────────

    /// Returns the metadata bag.
    #[must_use]
    pub fn metadata(&self) -> &HashMap<String, Value> {
        &self.metadata
    }

    /// Inserts a metadata entry, returning the previous value.
    pub fn insert_metadata(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.metadata.insert(key.into(), value.into())
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.event_type)
    }
}
