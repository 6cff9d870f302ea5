//! The dispatcher: registration, selection, ordering and invocation.

use crate::config::{DispatcherConfig, TieBreak};
use crate::error::{DispatchError, Result};
use crate::factory::{DefaultEventFactory, EventFactory};
use crate::listener::{Args, ListenerHandle};
use crate::registry::ListenerRegistry;
use crate::{Listener, ListenerDescriptor, ListenerResult};
use indexmap::IndexMap;
use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use std::ops::ControlFlow;
use std::sync::Arc;
use tidings_event::{is_empty_value, Event, EventTarget};
use tidings_types::{ForwardMode, ListenerId};

/// What to dispatch: a type to build an event for, or a ready event.
#[derive(Debug, Clone)]
pub enum EventSource {
    /// Event type; the event factory builds the event.
    Type(String),
    /// A caller-built event, dispatched as-is.
    Event(Event),
}

impl From<&str> for EventSource {
    fn from(event_type: &str) -> Self {
        Self::Type(event_type.to_string())
    }
}

impl From<String> for EventSource {
    fn from(event_type: String) -> Self {
        Self::Type(event_type)
    }
}

impl From<Event> for EventSource {
    fn from(event: Event) -> Self {
        Self::Event(event)
    }
}

/// Call-site arguments of a dispatch.
///
/// Target and params are applied to the event only when non-empty, so they
/// never erase what a caller-built event already carries.
#[derive(Debug, Clone, Default)]
pub struct DispatchArgs {
    /// Calling context.
    pub target: Option<EventTarget>,
    /// Event params.
    pub params: Option<Value>,
    /// Forwarding mode; `None` uses the configured default.
    pub forward: Option<ForwardMode>,
}

impl DispatchArgs {
    /// Empty arguments.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
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

    /// Sets the forwarding mode.
    #[must_use]
    pub fn with_forward(mut self, mode: ForwardMode) -> Self {
        self.forward = Some(mode);
        self
    }
}

/// A selected candidate for one cycle.
enum Invocation {
    Plain(ListenerDescriptor),
    Method(ListenerDescriptor, String),
}

impl Invocation {
    fn descriptor(&self) -> &ListenerDescriptor {
        match self {
            Self::Plain(d) | Self::Method(d, _) => d,
        }
    }
}

/// Priority-ordered synchronous event dispatcher.
///
/// # Ordering
///
/// Higher priority runs first. Equal priorities follow the configured
/// [`TieBreak`]; the default keeps registration order.
///
/// # Concurrency
///
/// All methods take `&self`. The registry lock is held only while reading
/// or writing descriptors and is released before any listener runs, so a
/// listener may register, remove or dispatch on the same dispatcher. Such
/// changes apply from the next cycle on.
///
/// # Example
///
/// ```
/// use tidings_dispatch::{Callable, DispatchArgs, Dispatcher};
/// use tidings_event::Event;
/// use serde_json::json;
///
/// let dispatcher = Dispatcher::new();
/// dispatcher.add_listener_with_priority(
///     "user.saved",
///     Callable::on_event(|e: &mut Event| json!({"audit": e.param_or("id", 0)})),
///     10,
/// )?;
/// dispatcher.add_listener("user.saved", Callable::on_event(|_e: &mut Event| "indexed"))?;
///
/// let responses = dispatcher
///     .dispatch_with("user.saved", DispatchArgs::new().with_params(json!({"id": 7})))?
///     .unwrap_or_default();
/// assert_eq!(responses, vec![json!({"audit": 7}), json!("indexed")]);
/// # Ok::<(), tidings_dispatch::DispatchError>(())
/// ```
pub struct Dispatcher {
    registry: Mutex<ListenerRegistry>,
    factory: RwLock<Arc<dyn EventFactory>>,
    config: DispatcherConfig,
}

impl Dispatcher {
    /// Creates a dispatcher with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(DispatcherConfig::default())
    }

    /// Creates a dispatcher with the given configuration.
    #[must_use]
    pub fn with_config(config: DispatcherConfig) -> Self {
        Self {
            registry: Mutex::new(ListenerRegistry::new()),
            factory: RwLock::new(Arc::new(DefaultEventFactory)),
            config,
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    /// Replaces the factory used for type-string dispatches.
    pub fn set_event_factory(&self, factory: impl EventFactory + 'static) {
        *self.factory.write() = Arc::new(factory);
        tracing::debug!("event factory replaced");
    }

    // ── Registration ────────────────────────────────────────

    /// Adds a plain listener at the default priority.
    ///
    /// # Errors
    ///
    /// [`DispatchError::NotCallable`] if `listener` is an aggregate.
    pub fn add_listener(&self, event_type: &str, listener: impl Into<Listener>) -> Result<ListenerId> {
        self.add_listener_with_priority(event_type, listener, self.config.default_priority)
    }

    /// Adds a plain listener at the given priority.
    ///
    /// # Errors
    ///
    /// [`DispatchError::NotCallable`] if `listener` is an aggregate.
    pub fn add_listener_with_priority(
        &self,
        event_type: &str,
        listener: impl Into<Listener>,
        priority: i32,
    ) -> Result<ListenerId> {
        let listener = listener.into();
        if listener.is_aggregate() {
            return Err(DispatchError::NotCallable {
                event_type: event_type.to_string(),
            });
        }
        let id = self.registry.lock().add(event_type, listener, priority);
        tracing::debug!(event_type, listener = %id, priority, "listener added");
        Ok(id)
    }

    /// Adds an aggregate under a component pattern at the default priority.
    ///
    /// # Errors
    ///
    /// [`DispatchError::NotObject`] if `listener` is a plain callable.
    pub fn add_listener_aggregate(
        &self,
        pattern: &str,
        listener: impl Into<Listener>,
    ) -> Result<ListenerId> {
        self.add_listener_aggregate_with_priority(pattern, listener, self.config.default_priority)
    }

    /// Adds an aggregate under a component pattern at the given priority.
    ///
    /// # Errors
    ///
    /// [`DispatchError::NotObject`] if `listener` is a plain callable.
    pub fn add_listener_aggregate_with_priority(
        &self,
        pattern: &str,
        listener: impl Into<Listener>,
        priority: i32,
    ) -> Result<ListenerId> {
        let listener = listener.into();
        if !listener.is_aggregate() {
            return Err(DispatchError::NotObject {
                pattern: pattern.to_string(),
            });
        }
        let id = self.registry.lock().add_aggregate(pattern, listener, priority);
        tracing::debug!(pattern, listener = %id, priority, "aggregate added");
        Ok(id)
    }

    // ── Removal ─────────────────────────────────────────────

    /// Removes every registration of `listener` (or any clone) under
    /// `event_type`. Returns whether anything was removed.
    ///
    /// # Errors
    ///
    /// [`DispatchError::NotCallable`] if `listener` is an aggregate.
    pub fn remove_listener(&self, event_type: &str, listener: &impl ListenerHandle) -> Result<bool> {
        if listener.is_aggregate() {
            return Err(DispatchError::NotCallable {
                event_type: event_type.to_string(),
            });
        }
        let id = listener.listener_id();
        let removed = self.registry.lock().remove(event_type, id);
        tracing::debug!(event_type, listener = %id, removed, "remove listener");
        Ok(removed)
    }

    /// Removes every registration of `listener` (or any clone) under
    /// `pattern`. Returns whether anything was removed.
    ///
    /// # Errors
    ///
    /// [`DispatchError::NotObject`] if `listener` is a plain callable.
    pub fn remove_listener_aggregate(
        &self,
        pattern: &str,
        listener: &impl ListenerHandle,
    ) -> Result<bool> {
        if !listener.is_aggregate() {
            return Err(DispatchError::NotObject {
                pattern: pattern.to_string(),
            });
        }
        let id = listener.listener_id();
        let removed = self.registry.lock().remove_aggregate(pattern, id);
        tracing::debug!(pattern, listener = %id, removed, "remove aggregate");
        Ok(removed)
    }

    /// Removes all plain listeners for a type; returns the count removed.
    pub fn remove_listeners_for_event(&self, event_type: &str) -> usize {
        let count = self.registry.lock().remove_all_for(event_type);
        tracing::debug!(event_type, count, "listeners removed for event");
        count
    }

    /// Removes every plain listener and aggregate.
    pub fn remove_all_listeners(&self) {
        self.registry.lock().clear();
        tracing::debug!("all listeners removed");
    }

    // ── Queries ─────────────────────────────────────────────

    /// Returns `true` if a plain listener is registered for the type.
    #[must_use]
    pub fn has_listener(&self, event_type: &str) -> bool {
        self.registry.lock().has(event_type)
    }

    /// Returns `true` if an aggregate is registered under the pattern.
    #[must_use]
    pub fn has_listener_aggregate(&self, pattern: &str) -> bool {
        self.registry.lock().has_aggregate(pattern)
    }

    /// Plain descriptors for a type, in registration order.
    #[must_use]
    pub fn listeners_for_event(&self, event_type: &str) -> Vec<ListenerDescriptor> {
        self.registry.lock().listeners_for(event_type)
    }

    /// All plain descriptors, grouped by type.
    #[must_use]
    pub fn all_listeners(&self) -> Vec<ListenerDescriptor> {
        self.registry.lock().all()
    }

    /// All plain descriptors keyed by type.
    #[must_use]
    pub fn all_listeners_structured(&self) -> IndexMap<String, Vec<ListenerDescriptor>> {
        self.registry.lock().structured()
    }

    /// Number of registrations, aggregates included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.registry.lock().len()
    }

    /// Returns `true` if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.registry.lock().is_empty()
    }

    // ── Dispatch ────────────────────────────────────────────

    /// Invokes every selected listener and collects their responses.
    ///
    /// Returns `None` when no listener ran.
    ///
    /// # Errors
    ///
    /// [`DispatchError::InvalidArgument`] for an empty event type,
    /// [`DispatchError::ListenerFailed`] if a listener fails.
    pub fn dispatch(&self, event: impl Into<EventSource>) -> Result<Option<Vec<Value>>> {
        self.dispatch_with(event, DispatchArgs::default())
    }

    /// [`dispatch`](Self::dispatch) with call-site arguments.
    ///
    /// # Errors
    ///
    /// See [`dispatch`](Self::dispatch).
    pub fn dispatch_with(
        &self,
        event: impl Into<EventSource>,
        args: DispatchArgs,
    ) -> Result<Option<Vec<Value>>> {
        let mode = self.mode_of(&args);
        let mut event = self.resolve(event.into(), args)?;
        self.dispatch_event(&mut event, mode)
    }

    /// Stops at the first response that is neither `null` nor `false`.
    ///
    /// # Errors
    ///
    /// See [`dispatch`](Self::dispatch).
    pub fn dispatch_until(&self, event: impl Into<EventSource>) -> Result<Option<Value>> {
        self.dispatch_until_with(event, DispatchArgs::default())
    }

    /// [`dispatch_until`](Self::dispatch_until) with call-site arguments.
    ///
    /// # Errors
    ///
    /// See [`dispatch`](Self::dispatch).
    pub fn dispatch_until_with(
        &self,
        event: impl Into<EventSource>,
        args: DispatchArgs,
    ) -> Result<Option<Value>> {
        let mode = self.mode_of(&args);
        let mut event = self.resolve(event.into(), args)?;
        self.dispatch_event_until(&mut event, mode)
    }

    /// Runs a full cycle and returns the first response.
    ///
    /// # Errors
    ///
    /// See [`dispatch`](Self::dispatch).
    pub fn dispatch_get_first(&self, event: impl Into<EventSource>) -> Result<Option<Value>> {
        self.dispatch_get_first_with(event, DispatchArgs::default())
    }

    /// [`dispatch_get_first`](Self::dispatch_get_first) with call-site
    /// arguments.
    ///
    /// # Errors
    ///
    /// See [`dispatch`](Self::dispatch).
    pub fn dispatch_get_first_with(
        &self,
        event: impl Into<EventSource>,
        args: DispatchArgs,
    ) -> Result<Option<Value>> {
        Ok(self
            .dispatch_with(event, args)?
            .and_then(|responses| responses.into_iter().next()))
    }

    /// Runs a full cycle on a borrowed event.
    ///
    /// The caller keeps the event and can inspect it afterwards.
    ///
    /// # Errors
    ///
    /// See [`dispatch`](Self::dispatch).
    pub fn dispatch_event(&self, event: &mut Event, mode: ForwardMode) -> Result<Option<Vec<Value>>> {
        let mut responses = Vec::new();
        self.run(event, mode, |value| {
            responses.push(value);
            ControlFlow::Continue(())
        })?;
        Ok((!responses.is_empty()).then_some(responses))
    }

    /// Halting cycle on a borrowed event.
    ///
    /// # Errors
    ///
    /// See [`dispatch`](Self::dispatch).
    pub fn dispatch_event_until(&self, event: &mut Event, mode: ForwardMode) -> Result<Option<Value>> {
        self.run(event, mode, |value| {
            if halts(&value) {
                ControlFlow::Break(value)
            } else {
                ControlFlow::Continue(())
            }
        })
    }

    fn mode_of(&self, args: &DispatchArgs) -> ForwardMode {
        args.forward.unwrap_or(self.config.forward_mode)
    }

    fn resolve(&self, source: EventSource, args: DispatchArgs) -> Result<Event> {
        let mut event = match source {
            EventSource::Event(event) => event,
            EventSource::Type(event_type) => {
                let factory = Arc::clone(&*self.factory.read());
                let mut event = factory.create(&event_type);
                event.set_type(event_type);
                event
            }
        };

        if let Some(target) = args.target.filter(|t| !t.is_empty()) {
            event.set_target(target);
        }
        if let Some(params) = args.params.filter(|p| !is_empty_value(p)) {
            event.set_params(params);
        }
        Ok(event)
    }

    /// Selects candidates for the event type and orders them.
    fn select(&self, event_type: &str) -> Vec<Invocation> {
        let mut candidates: Vec<Invocation> = {
            let registry = self.registry.lock();
            let mut parts = event_type.split(self.config.separator);
            match (parts.next(), parts.next()) {
                (Some(component), Some(method)) => registry
                    .aggregates_for(component)
                    .into_iter()
                    .map(|d| Invocation::Method(d, method.to_string()))
                    .collect(),
                _ => registry
                    .listeners_for(event_type)
                    .into_iter()
                    .map(Invocation::Plain)
                    .collect(),
            }
        };

        if candidates.len() > 1 {
            let tie_break = self.config.tie_break;
            candidates.sort_by(|a, b| {
                let (a, b) = (a.descriptor(), b.descriptor());
                let by_sequence = match tie_break {
                    TieBreak::Registration => a.sequence().cmp(&b.sequence()),
                    TieBreak::NewestFirst => b.sequence().cmp(&a.sequence()),
                };
                b.priority().cmp(&a.priority()).then(by_sequence)
            });
        }
        candidates
    }

    /// Invokes the candidates in order, handing each response to `on_response`.
    ///
    /// Returns the value `on_response` breaks with, or `None` when the loop
    /// runs out of candidates.
    fn run(
        &self,
        event: &mut Event,
        mode: ForwardMode,
        mut on_response: impl FnMut(Value) -> ControlFlow<Value>,
    ) -> Result<Option<Value>> {
        let event_type = event.event_type().to_string();
        if event_type.is_empty() {
            return Err(DispatchError::InvalidArgument(
                "event type must not be empty".into(),
            ));
        }

        let candidates = self.select(&event_type);
        tracing::trace!(
            event_type = %event_type,
            candidates = candidates.len(),
            mode = %mode,
            "dispatch cycle"
        );
        if candidates.is_empty() {
            return Ok(None);
        }

        let mut mode = mode;

        for invocation in &candidates {
            if event.is_propagation_stopped() {
                tracing::debug!(event_type = %event_type, "propagation stopped");
                break;
            }

            let descriptor = invocation.descriptor();
            let Some(result) = self.invoke(invocation, event, &mut mode) else {
                continue;
            };

            let value = result.map_err(|source| DispatchError::ListenerFailed {
                event_type: event_type.clone(),
                listener: descriptor.listener_id(),
                source,
            })?;
            tracing::trace!(
                event_type = %event_type,
                listener = %descriptor.listener_id(),
                priority = descriptor.priority(),
                "listener invoked"
            );

            if let ControlFlow::Break(value) = on_response(value) {
                return Ok(Some(value));
            }
        }
        Ok(None)
    }

    /// Invokes one candidate. `None` means an aggregate lacks the method.
    fn invoke(
        &self,
        invocation: &Invocation,
        event: &mut Event,
        mode: &mut ForwardMode,
    ) -> Option<ListenerResult> {
        match invocation {
            Invocation::Method(descriptor, method) => {
                let aggregate = descriptor.listener().as_aggregate()?;
                let result = aggregate.call(method, event);
                if result.is_none() {
                    tracing::debug!(
                        pattern = descriptor.type_or_pattern(),
                        method = method.as_str(),
                        listener = %descriptor.listener_id(),
                        "aggregate has no such method, skipping"
                    );
                }
                result
            }
            Invocation::Plain(descriptor) => {
                let callable = descriptor.listener().as_callable()?;
                if callable.mode().forwards_params() {
                    *mode = ForwardMode::PassParams;
                }
                match mode {
                    ForwardMode::PassEvent => callable.call(Args::Event(event)),
                    ForwardMode::PassParams => {
                        let params = event.param_list();
                        callable.call(Args::Params(&params)).or_else(|| {
                            tracing::trace!(
                                event_type = descriptor.type_or_pattern(),
                                listener = %descriptor.listener_id(),
                                "listener takes the event, not params"
                            );
                            callable.call(Args::Event(event))
                        })
                    }
                }
            }
        }
    }
}

/// A halting cycle stops on anything but `null` and `false`.
fn halts(value: &Value) -> bool {
    !matches!(value, Value::Null | Value::Bool(false))
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("config", &self.config)
            .field("registrations", &self.len())
            .finish_non_exhaustive()
    }
}
