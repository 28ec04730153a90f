use crate::event::{Event, EventKind};

mod registry;
pub(crate) use registry::*;

mod immediate;
pub use immediate::*;

mod queued;
pub use queued::*;

/// The most subscribers a single [`EventKind`] can have.
pub const MAX_SUBSCRIBERS: usize = 8;

/// Anything events can be handed to.
///
/// Subscribers receive the bus that delivered an event as a `&dyn Publish`, which is how they report events of their
/// own without holding a reference to the bus.
pub trait Publish {
    /// Delivers `event` to every subscriber of its kind, or queues it for delivery.
    fn publish(&self, event: Event) -> Result<(), PublishError>;
}

/// Reacts to events routed by a bus.
///
/// Any `Fn(&Event, &dyn Publish) + Sync` closure is a `Subscriber`, so small adapters can be registered directly.
pub trait Subscriber: Sync {
    /// Called once for every published event whose kind this subscriber was registered for.
    fn notify(&self, event: &Event, bus: &dyn Publish);
}

impl<F> Subscriber for F
where
    F: Fn(&Event, &dyn Publish) + Sync,
{
    fn notify(&self, event: &Event, bus: &dyn Publish) {
        self(event, bus)
    }
}

/// The interface shared by [`SyncBus`] and [`QueuedBus`].
///
/// Subscribers are borrowed, not owned; the lifetime `'a` guarantees they outlive the bus.
pub trait EventBus<'a>: Publish {
    /// Appends `subscriber` to the delivery list for `kind`. Delivery order is subscription order.
    fn subscribe(&self, kind: EventKind, subscriber: &'a dyn Subscriber) -> Result<(), SubscribeError>;

    /// Drops every subscription. Events already being delivered are not affected.
    fn reset(&self);
}

/// Why an event could not be published.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PublishError {
    /// The queue was full; the event was dropped.
    #[error("event queue is full, dropped {0:?}")]
    QueueFull(EventKind),
    /// Synchronous delivery nested more than [`MAX_DEPTH`] levels deep, most likely because of a subscription
    /// cycle; the event was dropped.
    #[error("delivery nested too deeply, dropped {0:?}")]
    TooDeep(EventKind),
}

/// Why a subscription was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SubscribeError {
    /// The kind already has [`MAX_SUBSCRIBERS`] subscribers.
    #[error("{0:?} has no room for another subscriber")]
    RegistryFull(EventKind),
}
