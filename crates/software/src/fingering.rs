//! Fingering tables and the resolver that turns the current mask into a note.

mod parse;
pub use parse::*;

mod table;
pub use table::*;

use crate::component::{Outbox, React};
use crate::event::{Event, EventKind, Mask, SensorId};
use crate::log::Log;
use crate::storage::{Storage, StorageError};
use wmidi::Note;

const TAG: &str = "fingering";

/// Where the fingering table is stored.
pub const FINGERING_FILE: &str = "/fingering.cfg";

/// The largest fingering file that can be loaded, in bytes.
pub const MAX_FILE_SIZE: usize = 8192;

/// Why a fingering file could not be loaded at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LoadError {
    /// There is no fingering file.
    #[error("/fingering.cfg does not exist")]
    Missing,
    /// The file exists but could not be read.
    #[error("failed to read /fingering.cfg: {0}")]
    Storage(#[from] StorageError),
    /// The file is larger than [`MAX_FILE_SIZE`].
    #[error("/fingering.cfg is too large")]
    TooLarge,
    /// The file is not valid UTF-8.
    #[error("/fingering.cfg is not valid text")]
    NotUtf8,
}

/// Reads and parses [`FINGERING_FILE`].
///
/// Individual bad lines do not fail the load; they are logged and counted in the [`LoadReport`].
pub fn load(storage: &dyn Storage, log: &dyn Log) -> Result<(FingeringTable, LoadReport), LoadError> {
    if !storage.exists(FINGERING_FILE) {
        log.error(TAG, format_args!("{}", LoadError::Missing));
        return Err(LoadError::Missing);
    }

    let mut buffer = [0u8; MAX_FILE_SIZE];
    let len = storage.read(FINGERING_FILE, &mut buffer).map_err(|error| match error {
        StorageError::NotFound => LoadError::Missing,
        StorageError::BufferTooSmall => LoadError::TooLarge,
        other => LoadError::from(other),
    })?;
    let text = buffer
        .get(..len)
        .ok_or(LoadError::TooLarge)
        .and_then(|bytes| core::str::from_utf8(bytes).map_err(|_| LoadError::NotUtf8))?;

    Ok(FingeringTable::parse(text, log))
}

/// Resolves the current mask, and any half-hole gesture, to a note.
///
/// A mask change always clears the half-hole gesture; the classifier publishes the gesture after the mask it
/// belongs to, so the two arrive in that order. [`Event::NoteSelected`] is only published when the resolved note
/// differs from the last one published.
pub struct Resolver<'a> {
    table: FingeringTable,
    mask: Mask,
    half_hole: Option<SensorId>,
    last: Option<Note>,
    log: &'a dyn Log,
}

impl<'a> Resolver<'a> {
    /// Creates a resolver for `table`, starting with every hole open and silence published.
    pub fn new(table: FingeringTable, log: &'a dyn Log) -> Self {
        Self {
            table,
            mask: Mask::OPEN,
            half_hole: None,
            last: None,
            log,
        }
    }

    /// The current mask.
    pub fn mask(&self) -> Mask {
        self.mask
    }

    /// The active half-hole sensor, if any.
    pub fn half_hole(&self) -> Option<SensorId> {
        self.half_hole
    }

    /// The last published note.
    pub fn last(&self) -> Option<Note> {
        self.last
    }

    /// Swaps in a new table and re-resolves the current fingering against it.
    pub fn reload(&mut self, table: FingeringTable, outbox: &mut Outbox) {
        self.table = table;
        self.log.info(TAG, format_args!("table reloaded"));
        self.update(outbox);
    }

    /// Applies a new mask, clearing any half-hole gesture.
    pub fn mask_changed(&mut self, mask: Mask, outbox: &mut Outbox) {
        self.mask = mask;
        self.half_hole = None;
        self.update(outbox);
    }

    /// Activates the half-hole alternate for `sensor`.
    pub fn half_hole_detected(&mut self, sensor: SensorId, outbox: &mut Outbox) {
        self.half_hole = Some(sensor);
        self.update(outbox);
    }

    /// Deactivates the half-hole gesture if `sensor` is the one that is active.
    pub fn half_hole_released(&mut self, sensor: SensorId, outbox: &mut Outbox) {
        if self.half_hole == Some(sensor) {
            self.half_hole = None;
            self.update(outbox);
        }
    }

    fn update(&mut self, outbox: &mut Outbox) {
        let note = self.table.resolve(self.mask, self.half_hole);
        if note == self.last {
            return;
        }
        self.last = note;
        match note {
            Some(note) => self.log.debug(
                TAG,
                format_args!("mask {} plays {}", self.mask, note.to_str()),
            ),
            None => self
                .log
                .debug(TAG, format_args!("mask {} is silent", self.mask)),
        }
        outbox.push(Event::NoteSelected(note));
    }
}

impl React for Resolver<'_> {
    const SUBSCRIPTIONS: &'static [EventKind] = &[
        EventKind::MaskChanged,
        EventKind::HalfHoleDetected,
        EventKind::HalfHoleReleased,
    ];

    fn react(&mut self, event: &Event, outbox: &mut Outbox) {
        match *event {
            Event::MaskChanged(mask) => self.mask_changed(mask, outbox),
            Event::HalfHoleDetected(sensor) => self.half_hole_detected(sensor, outbox),
            Event::HalfHoleReleased(sensor) => self.half_hole_released(sensor, outbox),
            _ => {}
        }
    }
}
