use super::{EventBus, MAX_DEPTH, Publish, PublishError, SharedRegistry, SubscribeError, Subscriber};
use crate::event::{Event, EventKind};
use crate::log::Log;
use core::cell::Cell;
use embassy_sync::{blocking_mutex::raw::CriticalSectionRawMutex, channel::Channel};
use embassy_time::{Duration, with_timeout};

/// How many events [`QueuedBus`] holds before refusing new ones.
pub const QUEUE_CAPACITY: usize = 20;

/// A sensible timeout for [`QueuedBus::publish_within`] when publishing from a task.
pub const PUBLISH_TIMEOUT: Duration = Duration::from_millis(10);

const TAG: &str = "bus";

/// Defers delivery to a single dispatching task.
///
/// [`publish`](Publish::publish) only enqueues, so it is safe to call from interrupt handlers and never runs
/// subscriber code on the caller's stack. Events are delivered in FIFO order by [`run`](Self::run) or
/// [`process_pending`](Self::process_pending). Events published by a subscriber during delivery never touch the
/// queue: they are delivered depth-first, exactly as [`SyncBus`](super::SyncBus) would, before the next queued event.
pub struct QueuedBus<'a> {
    registry: SharedRegistry<'a>,
    queue: Channel<CriticalSectionRawMutex, Event, QUEUE_CAPACITY>,
    log: &'a dyn Log,
}

impl<'a> QueuedBus<'a> {
    /// Creates a bus with no subscribers and an empty queue.
    pub fn new(log: &'a dyn Log) -> Self {
        Self {
            registry: SharedRegistry::new(),
            queue: Channel::new(),
            log,
        }
    }

    /// Enqueues `event`, waiting up to `timeout` for room if the queue is full.
    pub async fn publish_within(&self, event: Event, timeout: Duration) -> Result<(), PublishError> {
        with_timeout(timeout, self.queue.send(event))
            .await
            .map_err(|_| self.dropped(event))
    }

    /// Delivers every queued event and returns how many were taken off the queue.
    pub fn process_pending(&self) -> usize {
        let mut delivered = 0;
        while let Ok(event) = self.queue.try_receive() {
            self.deliver(event);
            delivered += 1;
        }
        delivered
    }

    /// The number of events waiting for delivery.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Delivers events as they arrive, forever.
    pub async fn run(&self) -> ! {
        loop {
            let event = self.queue.receive().await;
            self.deliver(event);
        }
    }

    fn deliver(&self, event: Event) {
        let nested = Nested {
            bus: self,
            depth: Cell::new(0),
        };
        let _ = nested.publish(event);
    }

    fn dropped(&self, event: Event) -> PublishError {
        let error = PublishError::QueueFull(event.kind());
        self.log.warn(TAG, format_args!("{error}"));
        error
    }
}

impl Publish for QueuedBus<'_> {
    fn publish(&self, event: Event) -> Result<(), PublishError> {
        self.queue.try_send(event).map_err(|_| self.dropped(event))
    }
}

/// The publisher subscribers see while a queued event is being delivered.
struct Nested<'b, 'a> {
    bus: &'b QueuedBus<'a>,
    depth: Cell<u8>,
}

impl Publish for Nested<'_, '_> {
    fn publish(&self, event: Event) -> Result<(), PublishError> {
        let depth = self.depth.get();
        if depth >= MAX_DEPTH {
            let error = PublishError::TooDeep(event.kind());
            self.bus.log.error(TAG, format_args!("{error}"));
            return Err(error);
        }

        self.depth.set(depth + 1);
        self.bus.registry.dispatch(&event, self);
        self.depth.set(depth);
        Ok(())
    }
}

impl<'a> EventBus<'a> for QueuedBus<'a> {
    fn subscribe(&self, kind: EventKind, subscriber: &'a dyn Subscriber) -> Result<(), SubscribeError> {
        self.registry.subscribe(kind, subscriber)
    }

    fn reset(&self) {
        self.registry.reset();
    }
}
