use super::FingeringTable;
use crate::event::{MAX_SENSORS, Mask, SensorId};
use crate::log::Log;
use wmidi::{Note, U7};

const TAG: &str = "fingering";

/// Why a line of a fingering file was skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParseError {
    /// A rule has two fields, or four with a half-hole alternate.
    #[error("expected 2 or 4 fields, found {0}")]
    FieldCount(usize),
    /// A field is not a decimal, `0x` hex or `0b` binary number.
    #[error("field {0} is not a number")]
    InvalidNumber(usize),
    /// Masks are a single byte.
    #[error("mask {0} is larger than 255")]
    MaskOutOfRange(u32),
    /// MIDI notes stop at 127.
    #[error("note {0} is larger than 127")]
    NoteOutOfRange(u32),
    /// The half-hole sensor is not a valid sensor id.
    #[error("sensor {0} is out of range")]
    SensorOutOfRange(u32),
}

/// A successfully parsed line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Line {
    /// The mask the line applies to.
    pub mask: Mask,
    /// The main note; `None` is silence.
    pub note: Option<Note>,
    /// An optional half-hole sensor and the note it selects.
    pub half_hole: Option<(SensorId, Option<Note>)>,
}

/// The outcome of parsing a whole fingering file.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LoadReport {
    /// Lines that produced or updated a rule.
    pub rules: usize,
    /// Lines that could not be parsed.
    pub skipped: usize,
}

/// Parses a number written in decimal, or in hex or binary with a `0x` or `0b` prefix.
fn parse_number(field: &str) -> Option<u32> {
    let (digits, radix) = if let Some(hex) = field.strip_prefix("0x").or_else(|| field.strip_prefix("0X")) {
        (hex, 16)
    } else if let Some(binary) = field.strip_prefix("0b").or_else(|| field.strip_prefix("0B")) {
        (binary, 2)
    } else {
        (field, 10)
    };
    // from_str_radix also takes a leading sign
    if !digits.chars().all(|c| c.is_digit(radix)) {
        return None;
    }
    u32::from_str_radix(digits, radix).ok()
}

fn parse_note(value: u32) -> Result<Option<Note>, ParseError> {
    match value {
        0 => Ok(None),
        1..=127 => Ok(Some(Note::from(U7::from_u8_lossy(value as u8)))),
        _ => Err(ParseError::NoteOutOfRange(value)),
    }
}

/// Parses one line of a fingering file.
///
/// The grammar is `<mask> <note> [<half-hole sensor> <half-hole note>]`, separated by whitespace. Everything after
/// a `#` is a comment. Note 0 is silence. Returns `Ok(None)` for lines with nothing but whitespace or comments.
pub fn parse_line(line: &str) -> Result<Option<Line>, ParseError> {
    let content = line.split('#').next().unwrap_or_default();

    let mut numbers = [0u32; 4];
    let mut count = 0;
    for (index, field) in content.split_whitespace().enumerate() {
        if let Some(slot) = numbers.get_mut(index) {
            *slot = parse_number(field).ok_or(ParseError::InvalidNumber(index + 1))?;
        }
        count += 1;
    }

    match count {
        0 => return Ok(None),
        2 | 4 => {}
        other => return Err(ParseError::FieldCount(other)),
    }

    let [mask, note, sensor, half_note] = numbers;
    let mask = u8::try_from(mask).map_err(|_| ParseError::MaskOutOfRange(mask))?;
    let note = parse_note(note)?;
    let half_hole = if count == 4 {
        if sensor as usize >= MAX_SENSORS {
            return Err(ParseError::SensorOutOfRange(sensor));
        }
        Some((SensorId(sensor as u8), parse_note(half_note)?))
    } else {
        None
    };

    Ok(Some(Line {
        mask: Mask(mask),
        note,
        half_hole,
    }))
}

impl FingeringTable {
    /// Builds a table from the text of a fingering file.
    ///
    /// Bad lines are logged with their line number and skipped; the rest of the file still loads. Later lines
    /// overwrite earlier ones for the same mask, or the same mask and half-hole sensor.
    pub fn parse(text: &str, log: &dyn Log) -> (Self, LoadReport) {
        let mut table = Self::new();
        let mut report = LoadReport::default();

        for (index, line) in text.lines().enumerate() {
            match parse_line(line) {
                Ok(Some(Line {
                    mask,
                    note,
                    half_hole,
                })) => {
                    table.set_main(mask, note);
                    if let Some((sensor, half_note)) = half_hole {
                        table.set_half_hole(mask, sensor, half_note);
                    }
                    report.rules += 1;
                }
                Ok(None) => {}
                Err(error) => {
                    log.warn(TAG, format_args!("skipping line {}: {error}", index + 1));
                    report.skipped += 1;
                }
            }
        }

        log.info(
            TAG,
            format_args!("loaded {} rules, skipped {} lines", report.rules, report.skipped),
        );
        (table, report)
    }
}
