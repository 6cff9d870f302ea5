//! Listener values: plain callables and method-table aggregates.
//!
//! A listener is stored as a [`Listener`], which is either
//!
//! - a [`Callable`]: a single function invoked for a full event type, or
//! - an [`Aggregate`]: a table of named methods invoked for
//!   `component:method` event types.
//!
//! Both carry a [`ListenerId`] assigned at construction. Clones share the id,
//! so removing "the same listener" means passing any clone of it.

use crate::error::BoxError;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tidings_event::Event;
use tidings_types::{ForwardMode, ListenerId};

/// Outcome of one listener invocation.
pub type ListenerResult = Result<Value, BoxError>;

/// Input handed to a [`Callable`].
#[derive(Debug)]
pub enum Args<'a> {
    /// The event itself.
    Event(&'a mut Event),
    /// The event's params unpacked as positional values.
    Params(&'a [Value]),
}

type CallFn = dyn Fn(Args<'_>) -> Option<ListenerResult> + Send + Sync;
type MethodFn = dyn Fn(&mut Event) -> ListenerResult + Send + Sync;

fn erase<F>(f: F) -> Arc<CallFn>
where
    F: Fn(Args<'_>) -> Option<ListenerResult> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// A plain listener for a full event type.
///
/// The constructor decides which [`ForwardMode`] the listener declares:
///
/// | Constructor | Mode | Receives |
/// |-------------|------|----------|
/// | [`Callable::new`] | `PassEvent` | raw [`Args`] |
/// | [`Callable::on_event`] | `PassEvent` | `&mut Event` |
/// | [`Callable::on_params`] | `PassParams` | `&[Value]` |
///
/// An `on_event` listener cannot accept unpacked params. In a cycle that
/// forwards params the dispatcher hands it the event instead.
///
/// # Example
///
/// ```
/// use tidings_dispatch::{Args, Callable};
/// use tidings_event::Event;
/// use tidings_types::ForwardMode;
/// use serde_json::{json, Value};
///
/// let greet = Callable::on_params(|args: &[Value]| {
///     format!("hello {}", args.first().and_then(Value::as_str).unwrap_or("?"))
/// });
/// assert_eq!(greet.mode(), ForwardMode::PassParams);
///
/// let out = greet.call(Args::Params(&[json!("ada")])).unwrap().unwrap();
/// assert_eq!(out, json!("hello ada"));
///
/// let mut event = Event::new("greet").with_params(json!(["bob"]));
/// let out = greet.call(Args::Event(&mut event)).unwrap().unwrap();
/// assert_eq!(out, json!("hello bob"));
/// ```
#[derive(Clone)]
pub struct Callable {
    id: ListenerId,
    func: Arc<CallFn>,
    mode: ForwardMode,
}

impl Callable {
    /// Wraps a function over raw [`Args`]. Declares `PassEvent`.
    pub fn new<F, R>(f: F) -> Self
    where
        F: Fn(Args<'_>) -> R + Send + Sync + 'static,
        R: Into<Value>,
    {
        Self::from_parts(
            erase(move |args| Some(Ok(f(args).into()))),
            ForwardMode::PassEvent,
        )
    }

    /// Wraps a function over the event.
    pub fn on_event<F, R>(f: F) -> Self
    where
        F: Fn(&mut Event) -> R + Send + Sync + 'static,
        R: Into<Value>,
    {
        Self::from_parts(
            erase(move |args| match args {
                Args::Event(event) => Some(Ok(f(event).into())),
                Args::Params(_) => None,
            }),
            ForwardMode::PassEvent,
        )
    }

    /// Wraps a function over the unpacked params.
    ///
    /// Given the event directly, the function receives
    /// [`Event::param_list`].
    pub fn on_params<F, R>(f: F) -> Self
    where
        F: Fn(&[Value]) -> R + Send + Sync + 'static,
        R: Into<Value>,
    {
        Self::from_parts(
            erase(move |args| match args {
                Args::Params(params) => Some(Ok(f(params).into())),
                Args::Event(event) => Some(Ok(f(&event.param_list()).into())),
            }),
            ForwardMode::PassParams,
        )
    }

    /// Fallible [`on_event`](Self::on_event). An `Err` aborts the cycle.
    pub fn try_on_event<F, R, E>(f: F) -> Self
    where
        F: Fn(&mut Event) -> Result<R, E> + Send + Sync + 'static,
        R: Into<Value>,
        E: Into<BoxError>,
    {
        Self::from_parts(
            erase(move |args| match args {
                Args::Event(event) => Some(f(event).map(Into::into).map_err(Into::into)),
                Args::Params(_) => None,
            }),
            ForwardMode::PassEvent,
        )
    }

    /// Fallible [`on_params`](Self::on_params). An `Err` aborts the cycle.
    pub fn try_on_params<F, R, E>(f: F) -> Self
    where
        F: Fn(&[Value]) -> Result<R, E> + Send + Sync + 'static,
        R: Into<Value>,
        E: Into<BoxError>,
    {
        Self::from_parts(
            erase(move |args| {
                let result = match args {
                    Args::Params(params) => f(params),
                    Args::Event(event) => f(&event.param_list()),
                };
                Some(result.map(Into::into).map_err(Into::into))
            }),
            ForwardMode::PassParams,
        )
    }

    fn from_parts(func: Arc<CallFn>, mode: ForwardMode) -> Self {
        Self {
            id: ListenerId::new(),
            func,
            mode,
        }
    }

    /// Overrides the declared mode.
    #[must_use]
    pub fn with_mode(mut self, mode: ForwardMode) -> Self {
        self.mode = mode;
        self
    }

    /// Returns the listener's identity.
    #[must_use]
    pub fn id(&self) -> ListenerId {
        self.id
    }

    /// Returns the declared forwarding mode.
    #[must_use]
    pub fn mode(&self) -> ForwardMode {
        self.mode
    }

    /// Invokes the listener.
    ///
    /// Returns `None` when the listener does not accept this kind of input,
    /// as with an `on_event` listener given [`Args::Params`].
    pub fn call(&self, args: Args<'_>) -> Option<ListenerResult> {
        (self.func)(args)
    }
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callable")
            .field("id", &self.id)
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}

/// A table of named methods, registered under a component pattern.
///
/// Dispatching `"cache:flush"` invokes the `flush` method of every aggregate
/// registered under `"cache"`. Methods always receive the event.
///
/// ```
/// use tidings_dispatch::Aggregate;
/// use tidings_event::Event;
/// use serde_json::json;
///
/// let cache = Aggregate::new()
///     .with_method("flush", |_event: &mut Event| json!("flushed"))
///     .with_method("warm", |event: &mut Event| event.param_or("keys", 0));
///
/// assert!(cache.has_method("flush"));
/// assert!(!cache.has_method("evict"));
///
/// let mut event = Event::new("cache:flush");
/// assert_eq!(cache.call("flush", &mut event).unwrap().unwrap(), json!("flushed"));
/// assert!(cache.call("evict", &mut event).is_none());
/// ```
#[derive(Clone)]
pub struct Aggregate {
    id: ListenerId,
    methods: HashMap<String, Arc<MethodFn>>,
}

impl Aggregate {
    /// Creates an aggregate with no methods.
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: ListenerId::new(),
            methods: HashMap::new(),
        }
    }

    /// Adds (or replaces) a method.
    #[must_use]
    pub fn with_method<F, R>(self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&mut Event) -> R + Send + Sync + 'static,
        R: Into<Value>,
    {
        self.with_try_method(name, move |event: &mut Event| {
            Ok::<_, BoxError>(f(event))
        })
    }

    /// Adds (or replaces) a fallible method.
    #[must_use]
    pub fn with_try_method<F, R, E>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&mut Event) -> Result<R, E> + Send + Sync + 'static,
        R: Into<Value>,
        E: Into<BoxError>,
    {
        let method: Arc<MethodFn> = Arc::new(move |event: &mut Event| -> ListenerResult {
            f(event).map(Into::into).map_err(Into::into)
        });
        self.methods.insert(name.into(), method);
        self
    }

    /// Returns the listener's identity.
    #[must_use]
    pub fn id(&self) -> ListenerId {
        self.id
    }

    /// Returns `true` if a method with this name exists.
    #[must_use]
    pub fn has_method(&self, name: &str) -> bool {
        self.methods.contains_key(name)
    }

    /// Returns method names in unspecified order.
    pub fn method_names(&self) -> impl Iterator<Item = &str> {
        self.methods.keys().map(String::as_str)
    }

    /// Invokes a method; `None` if it does not exist.
    pub fn call(&self, method: &str, event: &mut Event) -> Option<ListenerResult> {
        self.methods.get(method).map(|f| f(event))
    }
}

impl Default for Aggregate {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Aggregate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.method_names().collect();
        names.sort_unstable();
        f.debug_struct("Aggregate")
            .field("id", &self.id)
            .field("methods", &names)
            .finish()
    }
}

/// Any registrable listener.
#[derive(Debug, Clone)]
pub enum Listener {
    /// A plain function.
    Callable(Callable),
    /// A method table.
    Aggregate(Aggregate),
}

impl Listener {
    /// Returns the listener's identity.
    #[must_use]
    pub fn id(&self) -> ListenerId {
        match self {
            Self::Callable(c) => c.id(),
            Self::Aggregate(a) => a.id(),
        }
    }

    /// Returns the callable, if this is one.
    #[must_use]
    pub fn as_callable(&self) -> Option<&Callable> {
        match self {
            Self::Callable(c) => Some(c),
            Self::Aggregate(_) => None,
        }
    }

    /// Returns the aggregate, if this is one.
    #[must_use]
    pub fn as_aggregate(&self) -> Option<&Aggregate> {
        match self {
            Self::Aggregate(a) => Some(a),
            Self::Callable(_) => None,
        }
    }
}

impl From<Callable> for Listener {
    fn from(c: Callable) -> Self {
        Self::Callable(c)
    }
}

impl From<Aggregate> for Listener {
    fn from(a: Aggregate) -> Self {
        Self::Aggregate(a)
    }
}

/// Borrowed view used to identify a registered listener for removal.
pub trait ListenerHandle {
    /// Identity shared by every clone of the listener.
    fn listener_id(&self) -> ListenerId;

    /// Whether the listener is a method table.
    fn is_aggregate(&self) -> bool;
}

impl ListenerHandle for Callable {
    fn listener_id(&self) -> ListenerId {
        self.id
    }

    fn is_aggregate(&self) -> bool {
        false
    }
}

impl ListenerHandle for Aggregate {
    fn listener_id(&self) -> ListenerId {
        self.id
    }

    fn is_aggregate(&self) -> bool {
        true
    }
}

impl ListenerHandle for Listener {
    fn listener_id(&self) -> ListenerId {
        self.id()
    }

    fn is_aggregate(&self) -> bool {
        matches!(self, Self::Aggregate(_))
    }
}
