use super::{MidiOut, STANDARD_PITCH_HZ};
use num_traits::Float;
use wmidi::{Channel, ControlFunction, MidiMessage, Note, U7, U14};

/// The channel every message is sent on.
pub const CHANNEL: Channel = Channel::Ch1;

/// Note-on velocity. The instrument is not velocity sensitive.
pub const VELOCITY: u8 = 127;

const ALL_NOTES_OFF: u8 = 123;
const RPN_MSB: u8 = 101;
const RPN_LSB: u8 = 100;
const DATA_ENTRY_MSB: u8 = 6;
const DATA_ENTRY_LSB: u8 = 38;
const RPN_FINE_TUNING: u8 = 1;
const RPN_COARSE_TUNING: u8 = 2;
const RPN_NULL: u8 = 127;

/// The centre of every 14-bit MIDI range.
const CENTRE: f32 = 8192.0;

/// Anything that can carry encoded MIDI messages, such as a BLE-MIDI characteristic.
pub trait MidiSink {
    /// Sends one message.
    fn send(&mut self, message: MidiMessage<'static>);
}

/// A [`MidiOut`] that encodes each call as standard MIDI channel messages.
#[derive(Debug, Default, Clone)]
pub struct MessageEncoder<S> {
    sink: S,
}

impl<S: MidiSink> MessageEncoder<S> {
    /// Encodes onto `sink`.
    pub fn new(sink: S) -> Self {
        Self { sink }
    }

    /// The wrapped sink.
    pub fn sink(&self) -> &S {
        &self.sink
    }

    fn control_change(&mut self, function: u8, value: u8) {
        self.sink.send(MidiMessage::ControlChange(
            CHANNEL,
            ControlFunction(U7::from_u8_lossy(function)),
            U7::from_u8_lossy(value),
        ));
    }

    fn registered_parameter(&mut self, parameter: u8, msb: u8, lsb: u8) {
        self.control_change(RPN_MSB, 0);
        self.control_change(RPN_LSB, parameter);
        self.control_change(DATA_ENTRY_MSB, msb);
        self.control_change(DATA_ENTRY_LSB, lsb);
    }
}

/// Splits the offset of `base_pitch_hz` from A440 into coarse (semitones, centred on 64) and fine (14-bit, centred
/// on 8192, ±100 cents) tuning values.
pub fn tuning_values(base_pitch_hz: f32) -> (u8, u16) {
    let cents = 1200.0 * Float::log2(base_pitch_hz / STANDARD_PITCH_HZ);
    let semitones = Float::round(cents / 100.0).clamp(-64.0, 63.0);
    let remainder = cents - semitones * 100.0;
    let fine = Float::round(CENTRE + remainder / 100.0 * CENTRE).clamp(0.0, 16383.0);
    ((64.0 + semitones) as u8, fine as u16)
}

impl<S: MidiSink> MidiOut for MessageEncoder<S> {
    fn note_on(&mut self, note: Note) {
        self.sink
            .send(MidiMessage::NoteOn(CHANNEL, note, U7::from_u8_lossy(VELOCITY)));
    }

    fn note_off(&mut self, note: Note) {
        self.sink
            .send(MidiMessage::NoteOff(CHANNEL, note, U7::from_u8_lossy(0)));
    }

    fn pitch_bend(&mut self, bend: f32) {
        let value = Float::round(bend.clamp(0.0, 1.0) * 16383.0) as u16;
        let value = U14::try_from(value).unwrap_or(U14::MAX);
        self.sink.send(MidiMessage::PitchBendChange(CHANNEL, value));
    }

    fn all_notes_off(&mut self) {
        self.control_change(ALL_NOTES_OFF, 0);
    }

    fn tuning(&mut self, base_pitch_hz: f32) {
        if !base_pitch_hz.is_finite() || base_pitch_hz <= 0.0 {
            return;
        }
        let (coarse, fine) = tuning_values(base_pitch_hz);
        self.registered_parameter(RPN_COARSE_TUNING, coarse, 0);
        self.registered_parameter(RPN_FINE_TUNING, (fine >> 7) as u8, (fine & 0x7F) as u8);
        self.control_change(RPN_MSB, RPN_NULL);
        self.control_change(RPN_LSB, RPN_NULL);
    }
}
