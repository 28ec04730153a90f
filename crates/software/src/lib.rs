//! This crate contains the architecture-agnostic core of a capacitive-touch wind controller. Raw readings from the
//! touch pads under the performer's fingers are classified into open, half-covered and closed holes, the resulting
//! fingering is looked up in a user-editable table, and the chosen note is played over
//! [MIDI](https://midi.org/midi-1-0), along with pitch bend for vibrato and a mute control.
//!
//! Everything is wired together through an event [bus]. The pieces, from raw input to MIDI output:
//! - [`sensing::Classifier`] turns samples into mask, half-hole, vibrato and mute events,
//! - [`fingering::Resolver`] maps the mask (and any half-hole gesture) to a note,
//! - [`output::NoteOutput`] turns note, vibrato and mute events into ordered driver calls.
//!
//! Hardware drivers and the code that wires them up at boot live elsewhere; this crate only defines the traits they
//! must implement.

#![deny(missing_docs)]
#![no_std]

#[cfg(test)]
extern crate std;

/// Typed publish/subscribe routing with synchronous and queued backends.
pub mod bus;

pub mod component;
pub mod configuration;

/// The events that flow through the [bus] and the small value types they carry.
pub mod event;

pub mod fingering;
pub mod log;
pub mod output;
pub mod pipeline;
pub mod power;
pub mod sensing;
pub mod storage;

#[cfg(test)]
mod testing;
