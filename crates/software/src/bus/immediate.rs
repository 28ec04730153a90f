use super::{EventBus, Publish, PublishError, SharedRegistry, SubscribeError, Subscriber};
use crate::event::{Event, EventKind};
use crate::log::Log;
use core::cell::Cell;
use embassy_sync::blocking_mutex::{Mutex, raw::CriticalSectionRawMutex};

/// How many synchronous deliveries may be in progress at once before further events are refused.
pub const MAX_DEPTH: u8 = 16;

const TAG: &str = "bus";

/// Delivers every event before [`publish`](Publish::publish) returns.
///
/// Events published by a subscriber are delivered depth-first, ahead of the remaining subscribers of the event that
/// caused them. Depth is counted across all contexts sharing the bus.
pub struct SyncBus<'a> {
    registry: SharedRegistry<'a>,
    depth: Mutex<CriticalSectionRawMutex, Cell<u8>>,
    log: &'a dyn Log,
}

impl<'a> SyncBus<'a> {
    /// Creates a bus with no subscribers.
    pub fn new(log: &'a dyn Log) -> Self {
        Self {
            registry: SharedRegistry::new(),
            depth: Mutex::new(Cell::new(0)),
            log,
        }
    }

    fn enter(&self) -> bool {
        self.depth.lock(|depth| {
            let current = depth.get();
            if current >= MAX_DEPTH {
                false
            } else {
                depth.set(current + 1);
                true
            }
        })
    }

    fn leave(&self) {
        self.depth
            .lock(|depth| depth.set(depth.get().saturating_sub(1)));
    }
}

impl Publish for SyncBus<'_> {
    fn publish(&self, event: Event) -> Result<(), PublishError> {
        if !self.enter() {
            let error = PublishError::TooDeep(event.kind());
            self.log.error(TAG, format_args!("{error}"));
            return Err(error);
        }

        self.registry.dispatch(&event, self);
        self.leave();
        Ok(())
    }
}

impl<'a> EventBus<'a> for SyncBus<'a> {
    fn subscribe(&self, kind: EventKind, subscriber: &'a dyn Subscriber) -> Result<(), SubscribeError> {
        self.registry.subscribe(kind, subscriber)
    }

    fn reset(&self) {
        self.registry.reset();
    }
}
