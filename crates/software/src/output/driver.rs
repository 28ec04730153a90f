use super::{Indicator, MidiOut};
use crate::component::{Outbox, React};
use crate::event::{Event, EventKind};
use crate::log::Log;
use num_traits::Float;
use wmidi::Note;

const TAG: &str = "output";

/// The pitch of A4 the synth is assumed to be tuned to.
pub const STANDARD_PITCH_HZ: f32 = 440.0;

/// Base pitches within this many Hz of [`STANDARD_PITCH_HZ`] need no tuning message.
pub const TUNING_TOLERANCE_HZ: f32 = 0.01;

/// Whether, and what, the instrument is sounding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputState {
    /// Nothing is sounding.
    Silent,
    /// `Note` is sounding.
    Sounding(Note),
    /// The mute pad is engaged; nothing sounds until it is released and a new note is selected.
    Muted,
}

#[cfg(feature = "defmt")]
impl defmt::Format for OutputState {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            OutputState::Silent => defmt::write!(fmt, "Silent"),
            OutputState::Sounding(note) => {
                defmt::write!(fmt, "Sounding({} ({}))", note.to_str(), u8::from(*note))
            }
            OutputState::Muted => defmt::write!(fmt, "Muted"),
        }
    }
}

/// Turns note, vibrato and mute events into calls on a [`MidiOut`] and an [`Indicator`].
///
/// At most one note sounds at a time, and a note is always stopped before the next one starts.
pub struct NoteOutput<'a, O, I> {
    midi: O,
    indicator: I,
    base_pitch_hz: f32,
    current: Option<Note>,
    muted: bool,
    log: &'a dyn Log,
}

impl<'a, O: MidiOut, I: Indicator> NoteOutput<'a, O, I> {
    /// Creates a silent, unmuted output. `base_pitch_hz` is sent as a tuning change whenever a link connects.
    pub fn new(midi: O, indicator: I, base_pitch_hz: f32, log: &'a dyn Log) -> Self {
        Self {
            midi,
            indicator,
            base_pitch_hz,
            current: None,
            muted: false,
            log,
        }
    }

    /// The current state.
    pub fn state(&self) -> OutputState {
        match (self.muted, self.current) {
            (true, _) => OutputState::Muted,
            (false, Some(note)) => OutputState::Sounding(note),
            (false, None) => OutputState::Silent,
        }
    }

    /// The MIDI driver.
    pub fn midi(&self) -> &O {
        &self.midi
    }

    /// The indicator driver.
    pub fn indicator(&self) -> &I {
        &self.indicator
    }

    /// Plays `note`, or falls silent for `None`.
    pub fn select(&mut self, note: Option<Note>) {
        if note == self.current {
            return;
        }
        if self.muted {
            self.log.debug(TAG, format_args!("muted, ignoring note change"));
            return;
        }

        if let Some(previous) = self.current.take() {
            self.midi.note_off(previous);
        }
        if let Some(next) = note {
            self.midi.note_on(next);
            self.indicator.pulse();
        }
        self.current = note;
    }

    /// Stops any sounding note and silences the synth.
    pub fn mute(&mut self) {
        self.muted = true;
        if let Some(previous) = self.current.take() {
            self.midi.note_off(previous);
        }
        self.midi.all_notes_off();
    }

    /// Releases the mute. Nothing sounds until the next [`select`](Self::select).
    pub fn unmute(&mut self) {
        self.muted = false;
    }

    /// Bends pitch by `depth`, unless muted.
    pub fn vibrato(&mut self, depth: f32) {
        if !self.muted {
            self.midi.pitch_bend(depth);
        }
    }

    /// Sends the base pitch to a newly connected synth if it differs from standard pitch.
    pub fn connected(&mut self) {
        if Float::abs(self.base_pitch_hz - STANDARD_PITCH_HZ) > TUNING_TOLERANCE_HZ {
            self.log
                .info(TAG, format_args!("tuning synth to {} Hz", self.base_pitch_hz));
            self.midi.tuning(self.base_pitch_hz);
        }
    }
}

impl<O: MidiOut, I: Indicator> React for NoteOutput<'_, O, I> {
    const SUBSCRIPTIONS: &'static [EventKind] = &[
        EventKind::NoteSelected,
        EventKind::MuteEnabled,
        EventKind::MuteDisabled,
        EventKind::VibratoDetected,
        EventKind::LinkConnected,
    ];

    fn react(&mut self, event: &Event, _outbox: &mut Outbox) {
        match *event {
            Event::NoteSelected(note) => self.select(note),
            Event::MuteEnabled => self.mute(),
            Event::MuteDisabled => self.unmute(),
            Event::VibratoDetected { depth, .. } => self.vibrato(depth),
            Event::LinkConnected => self.connected(),
            _ => {}
        }
    }
}
