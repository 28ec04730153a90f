//! Mocks shared by the unit tests.

use crate::bus::{Publish, Subscriber};
use crate::event::Event;
use crate::log::{Level, Log};
use crate::output::{Indicator, MidiOut, MidiSink};
use crate::storage::{Storage, StorageError};
use core::fmt;
use std::collections::HashMap;
use std::string::{String, ToString};
use std::sync::Mutex;
use std::vec::Vec;
use wmidi::{MidiMessage, Note};

/// Keeps every message, formatted as `[tag] message`.
#[derive(Default)]
pub struct RecordingLog {
    entries: Mutex<Vec<(Level, String)>>,
}

impl RecordingLog {
    pub fn entries(&self) -> Vec<(Level, String)> {
        self.entries.lock().unwrap().clone()
    }
}

impl Log for RecordingLog {
    fn log(&self, level: Level, tag: &str, message: fmt::Arguments<'_>) {
        self.entries
            .lock()
            .unwrap()
            .push((level, std::format!("[{tag}] {message}")));
    }
}

/// Keeps every event it is notified of.
#[derive(Default)]
pub struct EventSpy {
    events: Mutex<Vec<Event>>,
}

impl EventSpy {
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }
}

impl Subscriber for EventSpy {
    fn notify(&self, event: &Event, _bus: &dyn Publish) {
        self.events.lock().unwrap().push(*event);
    }
}

/// A single [`MidiOut`] call.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    NoteOn(Note),
    NoteOff(Note),
    PitchBend(f32),
    AllNotesOff,
    Tuning(f32),
}

#[derive(Debug, Default)]
pub struct RecordingMidi {
    pub calls: Vec<Call>,
}

impl MidiOut for RecordingMidi {
    fn note_on(&mut self, note: Note) {
        self.calls.push(Call::NoteOn(note));
    }

    fn note_off(&mut self, note: Note) {
        self.calls.push(Call::NoteOff(note));
    }

    fn pitch_bend(&mut self, bend: f32) {
        self.calls.push(Call::PitchBend(bend));
    }

    fn all_notes_off(&mut self) {
        self.calls.push(Call::AllNotesOff);
    }

    fn tuning(&mut self, base_pitch_hz: f32) {
        self.calls.push(Call::Tuning(base_pitch_hz));
    }
}

#[derive(Debug, Default)]
pub struct CountingIndicator {
    pub pulses: usize,
}

impl Indicator for CountingIndicator {
    fn pulse(&mut self) {
        self.pulses += 1;
    }
}

#[derive(Debug, Default)]
pub struct RecordingSink {
    pub messages: Vec<MidiMessage<'static>>,
}

impl MidiSink for RecordingSink {
    fn send(&mut self, message: MidiMessage<'static>) {
        self.messages.push(message);
    }
}

/// Files held in memory.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    files: HashMap<String, Vec<u8>>,
    failing: bool,
}

impl MemoryStorage {
    /// Makes every subsequent read fail with [`StorageError::Io`].
    pub fn fail_reads(&mut self) {
        self.failing = true;
    }
}

impl Storage for MemoryStorage {
    fn exists(&self, path: &str) -> bool {
        self.files.contains_key(path)
    }

    fn read(&self, path: &str, buffer: &mut [u8]) -> Result<usize, StorageError> {
        if self.failing {
            return Err(StorageError::Io);
        }
        let contents = self.files.get(path).ok_or(StorageError::NotFound)?;
        let target = buffer
            .get_mut(..contents.len())
            .ok_or(StorageError::BufferTooSmall)?;
        target.copy_from_slice(contents);
        Ok(contents.len())
    }

    fn write(&mut self, path: &str, contents: &[u8]) -> Result<(), StorageError> {
        self.files.insert(path.to_string(), contents.to_vec());
        Ok(())
    }
}
