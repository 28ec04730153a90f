//! Turns raw touch readings into musical gestures.

mod vibrato;
pub use vibrato::*;

mod window;
pub use window::*;

use crate::component::{Outbox, React};
use crate::configuration::{Role, SensorMap, Settings};
use crate::event::{Event, EventKind, MASK_WIDTH, Mask, SensorId};
use crate::log::Log;

const TAG: &str = "classifier";

/// How much of a hole is covered.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HoleState {
    /// Not covered.
    #[default]
    Open,
    /// Partly covered; engages the hole's mask bit and may select an alternate note.
    Half,
    /// Fully covered.
    Closed,
}

impl HoleState {
    /// Returns `true` if the hole counts toward the mask.
    pub fn is_engaged(self) -> bool {
        self != HoleState::Open
    }
}

/// The readings and classification of one hole sensor.
#[derive(Debug)]
pub struct SensorContext {
    /// The latest classification.
    pub state: HoleState,
    /// Recent readings, for vibrato detection.
    pub window: Window,
}

impl SensorContext {
    fn new(sample_rate_hz: u16) -> Self {
        Self {
            state: HoleState::Open,
            window: Window::for_sample_rate(sample_rate_hz),
        }
    }
}

/// Classifies [`Event::SensorValue`] samples into mask, half-hole, vibrato and mute events.
pub struct Classifier<'a> {
    sensors: SensorMap,
    mute_threshold: u16,
    half_threshold: u16,
    closed_threshold: u16,
    vibrato: VibratoDetector,
    contexts: [SensorContext; MASK_WIDTH],
    muted: bool,
    mask: Mask,
    log: &'a dyn Log,
}

impl<'a> Classifier<'a> {
    /// Creates a classifier with every hole open and the mute pad released.
    pub fn new(settings: &Settings, log: &'a dyn Log) -> Self {
        if settings.half_hole_threshold >= settings.hole_closed_threshold {
            log.warn(
                TAG,
                format_args!(
                    "half-hole threshold {} is not below closed threshold {}, half holes will never be detected",
                    settings.half_hole_threshold, settings.hole_closed_threshold
                ),
            );
        }

        if usize::from(settings.sample_rate_hz) > MAX_WINDOW {
            log.warn(
                TAG,
                format_args!(
                    "sample rate {} Hz needs a longer window than {MAX_WINDOW} samples, vibrato sees less than a second",
                    settings.sample_rate_hz
                ),
            );
        }

        Self {
            sensors: SensorMap::new(settings, log),
            mute_threshold: settings.mute_threshold,
            half_threshold: settings.half_hole_threshold,
            closed_threshold: settings.hole_closed_threshold,
            vibrato: VibratoDetector::new(settings.vibrato, settings.sample_rate_hz),
            contexts: core::array::from_fn(|_| SensorContext::new(settings.sample_rate_hz)),
            muted: false,
            mask: Mask::OPEN,
            log,
        }
    }

    /// Returns every hole to open with an empty window, releases the mute pad and forgets the last mask.
    ///
    /// No events are published.
    pub fn reset(&mut self) {
        for context in &mut self.contexts {
            context.state = HoleState::Open;
            context.window.clear();
        }
        self.muted = false;
        self.mask = Mask::OPEN;
    }

    /// The last published mask.
    pub fn mask(&self) -> Mask {
        self.mask
    }

    /// Returns `true` if the mute pad is engaged.
    pub fn is_muted(&self) -> bool {
        self.muted
    }

    /// The context of the hole at `bit`, if one is configured.
    pub fn context(&self, bit: usize) -> Option<&SensorContext> {
        self.contexts[..self.sensors.holes().len()].get(bit)
    }

    /// Classifies one reading, pushing any resulting events into `outbox`.
    pub fn sample(&mut self, sensor: SensorId, value: u16, outbox: &mut Outbox) {
        match self.sensors.role(sensor) {
            Some(Role::Mute) => self.sample_mute(value, outbox),
            Some(Role::Hole { bit }) => self.sample_hole(sensor, usize::from(bit), value, outbox),
            None => self
                .log
                .debug(TAG, format_args!("ignoring reading from unmapped sensor {sensor}")),
        }
    }

    fn sample_mute(&mut self, value: u16, outbox: &mut Outbox) {
        let muted = value > self.mute_threshold;
        if muted != self.muted {
            self.muted = muted;
            outbox.push(if muted {
                Event::MuteEnabled
            } else {
                Event::MuteDisabled
            });
        }
    }

    fn sample_hole(&mut self, sensor: SensorId, bit: usize, value: u16, outbox: &mut Outbox) {
        let state = self.classify(value);
        let Some(context) = self.contexts.get_mut(bit) else {
            return;
        };

        context.window.push(value);
        if context.window.is_half_full() {
            let depth = self.vibrato.depth(&context.window);
            if depth > 0.0 {
                outbox.push(Event::VibratoDetected { sensor, depth });
            }
        }

        let previous = context.state;
        if state == previous {
            return;
        }
        context.state = state;
        self.log
            .debug(TAG, format_args!("sensor {sensor} is now {state:?}"));

        let mask = self.compute_mask();
        if mask != self.mask {
            self.mask = mask;
            outbox.push(Event::MaskChanged(mask));
        }

        if state == HoleState::Half {
            outbox.push(Event::HalfHoleDetected(sensor));
        } else if previous == HoleState::Half {
            outbox.push(Event::HalfHoleReleased(sensor));
        }
    }

    fn classify(&self, value: u16) -> HoleState {
        if value > self.closed_threshold {
            HoleState::Closed
        } else if value > self.half_threshold {
            HoleState::Half
        } else {
            HoleState::Open
        }
    }

    fn compute_mask(&self) -> Mask {
        self.contexts
            .iter()
            .take(self.sensors.holes().len())
            .enumerate()
            .filter(|(_, context)| context.state.is_engaged())
            .fold(Mask::OPEN, |mask, (bit, _)| mask.with_engaged(bit))
    }
}

impl React for Classifier<'_> {
    const SUBSCRIPTIONS: &'static [EventKind] = &[EventKind::SensorValue];

    fn react(&mut self, event: &Event, outbox: &mut Outbox) {
        if let Event::SensorValue { sensor, value } = *event {
            self.sample(sensor, value, outbox);
        }
    }
}
