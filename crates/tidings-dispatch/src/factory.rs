//! Event construction for type-string dispatches.

use tidings_event::Event;

/// Builds the [`Event`] used when a dispatch is given only a type string.
///
/// The dispatcher calls [`create`](Self::create) and then sets the event's
/// type to the dispatched type, so a factory cannot redirect a dispatch.
/// Any `Fn(&str) -> Event + Send + Sync` is a factory.
///
/// ```
/// use tidings_dispatch::Dispatcher;
/// use tidings_event::Event;
///
/// let dispatcher = Dispatcher::new();
/// dispatcher.set_event_factory(|event_type: &str| {
///     Event::new(event_type).with_metadata("origin", "billing")
/// });
/// ```
pub trait EventFactory: Send + Sync {
    /// Creates an event for the given type.
    fn create(&self, event_type: &str) -> Event;
}

/// Factory producing a plain [`Event::new`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultEventFactory;

impl EventFactory for DefaultEventFactory {
    fn create(&self, event_type: &str) -> Event {
        Event::new(event_type)
    }
}

impl<F> EventFactory for F
where
    F: Fn(&str) -> Event + Send + Sync,
{
    fn create(&self, event_type: &str) -> Event {
        self(event_type)
    }
}
