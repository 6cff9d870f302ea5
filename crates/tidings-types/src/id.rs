//! Identifier types for tidings.
//!
//! Identifiers are UUID-based so that two listeners built from the
//! same closure body still have distinct identities.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identity of a registered listener.
///
/// Every `Callable` and `Aggregate` receives a fresh [`ListenerId`] when it
/// is constructed. Clones of a listener share the id, which is what
/// `remove_listener` compares against, so removal works by identity and
/// never by structural equality of the wrapped closures.
///
/// ```text
/// ┌──────────────┐  clone   ┌──────────────┐
/// │ Callable     │ ───────► │ Callable     │
/// │ id = lst:a1  │          │ id = lst:a1  │   same identity
/// └──────────────┘          └──────────────┘
///
/// ┌──────────────┐          ┌──────────────┐
/// │ Callable::.. │          │ Callable::.. │
/// │ id = lst:a1  │          │ id = lst:b7  │   distinct identity
/// └──────────────┘          └──────────────┘
/// ```
///
/// # Example
///
/// ```
/// use tidings_types::ListenerId;
///
/// let a = ListenerId::new();
/// let b = ListenerId::new();
/// assert_ne!(a, b);
/// assert!(a.to_string().starts_with("lst:"));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ListenerId(pub Uuid);

impl ListenerId {
    /// Creates a new [`ListenerId`] with a random UUID v4.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the inner UUID.
    #[must_use]
    pub fn uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for ListenerId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ListenerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "lst:{}", self.0)
    }
}
