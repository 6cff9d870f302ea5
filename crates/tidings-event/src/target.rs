//! Event target: the calling context attached to an event.
//!
//! The dispatcher never inspects a target; it is carried through to
//! listeners untouched. A target is either a symbolic name (for example the
//! name of the operation that emitted the event) or an opaque shared handle
//! to an arbitrary value.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// The calling context of an event.
///
/// # Example
///
/// ```
/// use tidings_event::EventTarget;
///
/// struct Repo { name: &'static str }
///
/// let by_name = EventTarget::from("UserRepo::save");
/// assert_eq!(by_name.as_name(), Some("UserRepo::save"));
///
/// let by_handle = EventTarget::handle(Repo { name: "users" });
/// assert_eq!(by_handle.downcast_ref::<Repo>().map(|r| r.name), Some("users"));
/// assert!(by_handle.downcast_ref::<String>().is_none());
/// ```
#[derive(Clone)]
pub enum EventTarget {
    /// A symbolic name.
    Name(String),
    /// A shared, type-erased handle.
    Handle(Arc<dyn Any + Send + Sync>),
}

impl EventTarget {
    /// Wraps a value into a shared handle.
    #[must_use]
    pub fn handle<T: Any + Send + Sync>(value: T) -> Self {
        Self::Handle(Arc::new(value))
    }

    /// Wraps an already-shared value.
    #[must_use]
    pub fn from_arc(value: Arc<dyn Any + Send + Sync>) -> Self {
        Self::Handle(value)
    }

    /// Returns the name if this is a [`EventTarget::Name`].
    #[must_use]
    pub fn as_name(&self) -> Option<&str> {
        match self {
            Self::Name(name) => Some(name),
            Self::Handle(_) => None,
        }
    }

    /// Downcasts a handle target to `T`.
    #[must_use]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        match self {
            Self::Handle(value) => value.downcast_ref::<T>(),
            Self::Name(_) => None,
        }
    }

    /// An empty name counts as "no target" when the dispatcher applies
    /// call-site arguments to an event.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Name(name) if name.is_empty())
    }

    /// Identity comparison: names by value, handles by pointer.
    #[must_use]
    pub fn same_as(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Name(a), Self::Name(b)) => a == b,
            (Self::Handle(a), Self::Handle(b)) => {
                Arc::as_ptr(a) as *const () == Arc::as_ptr(b) as *const ()
            }
            _ => false,
        }
    }
}

impl PartialEq for EventTarget {
    fn eq(&self, other: &Self) -> bool {
        self.same_as(other)
    }
}

impl fmt::Debug for EventTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(name) => f.debug_tuple("Name").field(name).finish(),
            Self::Handle(value) => write!(f, "Handle({:p})", Arc::as_ptr(value) as *const ()),
        }
    }
}

impl From<&str> for EventTarget {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl From<String> for EventTarget {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

impl From<Arc<dyn Any + Send + Sync>> for EventTarget {
    fn from(value: Arc<dyn Any + Send + Sync>) -> Self {
        Self::Handle(value)
    }
}
