use core::fmt;
use ringbuf::StaticRb;
use ringbuf::traits::{Consumer, Observer, Producer};

/// The longest window any sensor can keep, in samples.
pub const MAX_WINDOW: usize = 256;

/// The most recent readings from one sensor, oldest first.
///
/// Storage is fixed at [`MAX_WINDOW`]; the usable capacity is chosen at construction so that the window spans about a
/// second at the configured sample rate.
pub struct Window {
    samples: StaticRb<u16, MAX_WINDOW>,
    capacity: usize,
}

impl Window {
    /// Creates an empty window holding up to `capacity` samples, clamped to `1..=MAX_WINDOW`.
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: StaticRb::default(),
            capacity: capacity.clamp(1, MAX_WINDOW),
        }
    }

    /// Sized to one second of samples.
    pub fn for_sample_rate(hz: u16) -> Self {
        Self::new(usize::from(hz))
    }

    /// Appends `value`, evicting the oldest sample once full.
    pub fn push(&mut self, value: u16) {
        while self.samples.occupied_len() >= self.capacity {
            self.samples.try_pop();
        }
        // cannot fail, there is room below the capacity
        let _ = self.samples.try_push(value);
    }

    /// The number of samples held.
    pub fn len(&self) -> usize {
        self.samples.occupied_len()
    }

    /// Returns `true` if no samples are held.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// The most samples this window will hold.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns `true` once at least half the capacity is filled.
    pub fn is_half_full(&self) -> bool {
        self.len() * 2 >= self.capacity
    }

    /// Drops every sample.
    pub fn clear(&mut self) {
        self.samples.clear();
    }

    /// Iterates over the held samples, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = u16> + '_ {
        self.samples.iter().copied()
    }
}

impl fmt::Debug for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Window")
            .field("len", &self.len())
            .field("capacity", &self.capacity)
            .finish()
    }
}
