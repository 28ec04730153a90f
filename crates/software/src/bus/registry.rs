//! The dispatch table shared by both bus backends.

use super::{MAX_SUBSCRIBERS, Publish, SubscribeError, Subscriber};
use crate::event::{Event, EventKind};
use core::cell::RefCell;
use embassy_sync::blocking_mutex::{Mutex, raw::CriticalSectionRawMutex};
use tinyvec::ArrayVec;

/// The subscribers of a single [`EventKind`], in delivery order.
///
/// `tinyvec` requires `Default` items, hence the `Option`; every slot below `len()` is `Some`.
pub(crate) type Subscribers<'a> = ArrayVec<[Option<&'a dyn Subscriber>; MAX_SUBSCRIBERS]>;

/// Maps each [`EventKind`] to its [`Subscribers`].
#[derive(Default)]
pub(crate) struct Registry<'a> {
    slots: [Subscribers<'a>; EventKind::COUNT],
}

impl<'a> Registry<'a> {
    fn add(&mut self, kind: EventKind, subscriber: &'a dyn Subscriber) -> Result<(), SubscribeError> {
        match self.slots[kind.index()].try_push(Some(subscriber)) {
            None => Ok(()),
            Some(_) => Err(SubscribeError::RegistryFull(kind)),
        }
    }

    fn clear(&mut self) {
        self.slots.iter_mut().for_each(|slot| slot.clear());
    }
}

/// A [`Registry`] that may be shared between execution contexts.
///
/// The lock is only held long enough to copy a subscriber list, never while an event is being delivered, so
/// subscribers may subscribe or reset from inside a callback.
pub(crate) struct SharedRegistry<'a> {
    inner: Mutex<CriticalSectionRawMutex, RefCell<Registry<'a>>>,
}

impl<'a> SharedRegistry<'a> {
    pub(crate) fn new() -> Self {
        Self {
            inner: Mutex::new(RefCell::new(Registry::default())),
        }
    }

    pub(crate) fn subscribe(
        &self,
        kind: EventKind,
        subscriber: &'a dyn Subscriber,
    ) -> Result<(), SubscribeError> {
        self.inner
            .lock(|registry| registry.borrow_mut().add(kind, subscriber))
    }

    pub(crate) fn reset(&self) {
        self.inner.lock(|registry| registry.borrow_mut().clear());
    }

    /// Returns a snapshot of the subscribers for `kind`.
    pub(crate) fn subscribers(&self, kind: EventKind) -> Subscribers<'a> {
        self.inner
            .lock(|registry| registry.borrow().slots[kind.index()].clone())
    }

    /// Hands `event` to each of its subscribers in turn, passing `bus` along for any follow-up events.
    pub(crate) fn dispatch(&self, event: &Event, bus: &dyn Publish) {
        let subscribers = self.subscribers(event.kind());
        for subscriber in subscribers.iter().flatten() {
            subscriber.notify(event, bus);
        }
    }
}
