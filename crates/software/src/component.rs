//! Glue between plain state machines and the [bus](crate::bus).
//!
//! The classifier, resolver and output stage are ordinary structs with `&mut self` methods. [`Component`] gives
//! them interior mutability so a bus can hold them as shared [`Subscriber`]s, and [`Outbox`] lets them emit events
//! without knowing which bus they are attached to.

use crate::bus::{EventBus, Publish, SubscribeError, Subscriber};
use crate::event::{Event, EventKind};
use core::cell::RefCell;
use embassy_sync::blocking_mutex::{Mutex, raw::CriticalSectionRawMutex};
use tinyvec::ArrayVec;

/// The most events a single reaction can emit.
pub const OUTBOX_CAPACITY: usize = 4;

/// Events emitted by a reaction, published once the component's lock is released.
#[derive(Debug, Default, Clone)]
pub struct Outbox {
    events: ArrayVec<[Option<Event>; OUTBOX_CAPACITY]>,
}

impl Outbox {
    /// Queues `event` for publication.
    ///
    /// No reaction emits more than [`OUTBOX_CAPACITY`] events; in release builds any excess is dropped.
    pub fn push(&mut self, event: Event) {
        let overflow = self.events.try_push(Some(event));
        debug_assert!(overflow.is_none(), "outbox is full, dropped {event:?}");
    }

    /// Returns `true` if nothing has been pushed.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Removes and returns the queued events, oldest first.
    pub fn drain(&mut self) -> impl Iterator<Item = Event> + '_ {
        self.events.drain(..).flatten()
    }
}

/// A state machine driven by events.
pub trait React {
    /// The kinds [`react`](Self::react) wants to receive.
    const SUBSCRIPTIONS: &'static [EventKind];

    /// Updates state in response to `event`, pushing any resulting events into `outbox`.
    fn react(&mut self, event: &Event, outbox: &mut Outbox);
}

/// Shares a [`React`] implementor with a bus.
pub struct Component<T> {
    inner: Mutex<CriticalSectionRawMutex, RefCell<T>>,
}

impl<T> Component<T> {
    /// Wraps `state`.
    pub fn new(state: T) -> Self {
        Self {
            inner: Mutex::new(RefCell::new(state)),
        }
    }

    /// Runs `f` with exclusive access to the wrapped state.
    pub fn with<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        self.inner.lock(|cell| f(&mut cell.borrow_mut()))
    }

    /// Runs `f` with exclusive access to the wrapped state, then publishes whatever it left in the outbox.
    ///
    /// Used for inputs that do not arrive through the bus, such as a table reload.
    pub fn run<R>(&self, bus: &dyn Publish, f: impl FnOnce(&mut T, &mut Outbox) -> R) -> R {
        let mut outbox = Outbox::default();
        let result = self.with(|state| f(state, &mut outbox));
        for event in outbox.drain() {
            // failures are logged by the bus
            let _ = bus.publish(event);
        }
        result
    }
}

impl<T: React> Component<T> {
    /// Subscribes this component to each of [`React::SUBSCRIPTIONS`].
    pub fn attach<'a>(&'a self, bus: &dyn EventBus<'a>) -> Result<(), SubscribeError>
    where
        T: Send,
    {
        T::SUBSCRIPTIONS
            .iter()
            .try_for_each(|&kind| bus.subscribe(kind, self))
    }
}

impl<T: React + Send> Subscriber for Component<T> {
    fn notify(&self, event: &Event, bus: &dyn Publish) {
        self.run(bus, |state, outbox| state.react(event, outbox));
    }
}
