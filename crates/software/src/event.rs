use core::fmt;
use num_derive::{FromPrimitive, ToPrimitive};
use wmidi::Note;

/// The number of physical sensor ids the device can address; valid ids are `0..MAX_SENSORS`.
pub const MAX_SENSORS: usize = 16;

/// The number of hole sensors that fit in a [`Mask`].
pub const MASK_WIDTH: usize = 8;

/// Identifies a physical touch sensor, exactly as reported by the sensor driver.
///
/// Nothing about a `SensorId` guarantees it is configured or even in range; see
/// [`SensorMap`][crate::configuration::SensorMap] for the validated view.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SensorId(pub u8);

impl fmt::Display for SensorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which holes are engaged (closed or half-closed). Bit `i` belongs to the `i`th configured hole sensor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Mask(pub u8);

impl Mask {
    /// A mask with every hole open.
    pub const OPEN: Mask = Mask(0);

    /// Returns `true` if the hole at `bit` is engaged. Bits past [`MASK_WIDTH`] are never engaged.
    pub fn is_engaged(&self, bit: usize) -> bool {
        bit < MASK_WIDTH && self.0 & (1 << bit) != 0
    }

    /// Returns a copy of this mask with the hole at `bit` engaged. Bits past [`MASK_WIDTH`] are ignored.
    pub fn with_engaged(self, bit: usize) -> Self {
        if bit < MASK_WIDTH {
            Mask(self.0 | (1 << bit))
        } else {
            self
        }
    }
}

impl fmt::Display for Mask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010b}", self.0)
    }
}

/// Something that happened somewhere in the device.
///
/// Each variant carries exactly the data that belongs to it, so a subscriber can never read a payload that doesn't
/// match the event's kind. Events are small `Copy` values and are always passed by value.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Event {
    /// A raw reading from a touch sensor.
    SensorValue {
        /// The sensor that produced the reading.
        sensor: SensorId,
        /// The raw capacitance reading; higher means more covered.
        value: u16,
    },
    /// A MIDI client connected to the wireless link.
    LinkConnected,
    /// The MIDI client went away.
    LinkDisconnected,
    /// The set of engaged holes changed.
    MaskChanged(Mask),
    /// A hole sensor entered the half-covered state.
    HalfHoleDetected(SensorId),
    /// A hole sensor left the half-covered state.
    HalfHoleReleased(SensorId),
    /// A periodic oscillation was detected on a hole sensor.
    VibratoDetected {
        /// The sensor on which the oscillation was detected.
        sensor: SensorId,
        /// How pronounced the vibrato is, from 0.0 (none) to 1.0.
        depth: f32,
    },
    /// The mute pad was covered.
    MuteEnabled,
    /// The mute pad was released.
    MuteDisabled,
    /// The fingering resolved to a new note; `None` means silence.
    NoteSelected(Option<Note>),
    /// Nothing musical has happened for the configured auto-off period.
    IdleTimeout,
}

impl Event {
    /// Returns the [`EventKind`] of this event.
    pub fn kind(&self) -> EventKind {
        match self {
            Event::SensorValue { .. } => EventKind::SensorValue,
            Event::LinkConnected => EventKind::LinkConnected,
            Event::LinkDisconnected => EventKind::LinkDisconnected,
            Event::MaskChanged(_) => EventKind::MaskChanged,
            Event::HalfHoleDetected(_) => EventKind::HalfHoleDetected,
            Event::HalfHoleReleased(_) => EventKind::HalfHoleReleased,
            Event::VibratoDetected { .. } => EventKind::VibratoDetected,
            Event::MuteEnabled => EventKind::MuteEnabled,
            Event::MuteDisabled => EventKind::MuteDisabled,
            Event::NoteSelected(_) => EventKind::NoteSelected,
            Event::IdleTimeout => EventKind::IdleTimeout,
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Event {
    fn format(&self, fmt: defmt::Formatter) {
        match *self {
            Event::SensorValue { sensor, value } => {
                defmt::write!(fmt, "SensorValue {{ sensor: {}, value: {} }}", sensor.0, value)
            }
            Event::MaskChanged(mask) => defmt::write!(fmt, "MaskChanged({=u8:#b})", mask.0),
            Event::HalfHoleDetected(sensor) => defmt::write!(fmt, "HalfHoleDetected({})", sensor.0),
            Event::HalfHoleReleased(sensor) => defmt::write!(fmt, "HalfHoleReleased({})", sensor.0),
            Event::VibratoDetected { sensor, depth } => {
                defmt::write!(fmt, "VibratoDetected {{ sensor: {}, depth: {} }}", sensor.0, depth)
            }
            Event::NoteSelected(Some(note)) => {
                defmt::write!(fmt, "NoteSelected({} ({}))", note.to_str(), u8::from(note))
            }
            Event::NoteSelected(None) => defmt::write!(fmt, "NoteSelected(silence)"),
            other => defmt::write!(fmt, "{}", other.kind()),
        }
    }
}

/// The fieldless discriminant of an [`Event`], used to key subscriptions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, ToPrimitive, FromPrimitive)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EventKind {
    /// See [`Event::SensorValue`].
    SensorValue,
    /// See [`Event::LinkConnected`].
    LinkConnected,
    /// See [`Event::LinkDisconnected`].
    LinkDisconnected,
    /// See [`Event::MaskChanged`].
    MaskChanged,
    /// See [`Event::HalfHoleDetected`].
    HalfHoleDetected,
    /// See [`Event::HalfHoleReleased`].
    HalfHoleReleased,
    /// See [`Event::VibratoDetected`].
    VibratoDetected,
    /// See [`Event::MuteEnabled`].
    MuteEnabled,
    /// See [`Event::MuteDisabled`].
    MuteDisabled,
    /// See [`Event::NoteSelected`].
    NoteSelected,
    /// See [`Event::IdleTimeout`].
    IdleTimeout,
}

impl EventKind {
    /// How many kinds exist.
    pub const COUNT: usize = 11;

    /// A dense index in `0..COUNT`.
    pub fn index(self) -> usize {
        self as usize
    }
}
