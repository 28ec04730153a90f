//! Everything between a selected note and the performer's ears.

mod driver;
pub use driver::*;

mod encoder;
pub use encoder::*;

use wmidi::Note;

/// Sends musical gestures to a synth, typically over a wireless MIDI link.
pub trait MidiOut {
    /// Starts `note`.
    fn note_on(&mut self, note: Note);

    /// Stops `note`.
    fn note_off(&mut self, note: Note);

    /// Bends pitch, where 0.0 is fully down, 0.5 is centred and 1.0 is fully up.
    fn pitch_bend(&mut self, bend: f32);

    /// Silences every note on the synth.
    fn all_notes_off(&mut self);

    /// Retunes the synth so that A4 sounds at `base_pitch_hz`.
    fn tuning(&mut self, base_pitch_hz: f32);
}

/// A status light that can be briefly flashed.
pub trait Indicator {
    /// Flashes once.
    fn pulse(&mut self);
}
