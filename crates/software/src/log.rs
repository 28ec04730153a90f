//! Logging as a capability: every component receives a [`Log`] at construction instead of reaching for a global.
//!
//! On the device, [`Defmt`] forwards to [`defmt`](https://defmt.ferrous-systems.com); wrapping it in [`Filtered`]
//! applies the level configured in [`Settings`][crate::configuration::Settings].

use core::fmt;
use num_derive::{FromPrimitive, ToPrimitive};

/// Severity of a log message. Levels are ordered, so filtering is a simple comparison.
///
/// The numeric values match the `log_level` setting (0 = debug through 4 = off).
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ToPrimitive, FromPrimitive)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Level {
    /// Chatty detail, useful when tuning thresholds.
    Debug,
    /// Normal operation worth knowing about.
    Info,
    /// Something was dropped or ignored.
    #[default]
    Warn,
    /// Something the performer will notice.
    Error,
    /// Used only as a threshold, to silence everything.
    Off,
}

/// A sink for log messages, tagged with the name of the component that produced them.
pub trait Log: Sync {
    /// Records a message.
    fn log(&self, level: Level, tag: &str, message: fmt::Arguments<'_>);

    /// Records a [`Level::Debug`] message.
    fn debug(&self, tag: &str, message: fmt::Arguments<'_>) {
        self.log(Level::Debug, tag, message)
    }

    /// Records a [`Level::Info`] message.
    fn info(&self, tag: &str, message: fmt::Arguments<'_>) {
        self.log(Level::Info, tag, message)
    }

    /// Records a [`Level::Warn`] message.
    fn warn(&self, tag: &str, message: fmt::Arguments<'_>) {
        self.log(Level::Warn, tag, message)
    }

    /// Records a [`Level::Error`] message.
    fn error(&self, tag: &str, message: fmt::Arguments<'_>) {
        self.log(Level::Error, tag, message)
    }
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct Silent;

impl Log for Silent {
    fn log(&self, _level: Level, _tag: &str, _message: fmt::Arguments<'_>) {}
}

/// Passes on messages at or above `threshold` and drops the rest.
#[derive(Debug, Clone, Copy)]
pub struct Filtered<L> {
    threshold: Level,
    inner: L,
}

impl<L: Log> Filtered<L> {
    /// Wraps `inner`, keeping only messages at or above `threshold`.
    pub fn new(threshold: Level, inner: L) -> Self {
        Self { threshold, inner }
    }

    /// Returns `true` if a message at `level` would be passed on.
    pub fn enabled(&self, level: Level) -> bool {
        level != Level::Off && level >= self.threshold
    }
}

impl<L: Log> Log for Filtered<L> {
    fn log(&self, level: Level, tag: &str, message: fmt::Arguments<'_>) {
        if self.enabled(level) {
            self.inner.log(level, tag, message);
        }
    }
}

/// Forwards messages to the `defmt` logger.
#[cfg(feature = "defmt")]
#[derive(Debug, Default, Clone, Copy)]
pub struct Defmt;

#[cfg(feature = "defmt")]
impl Log for Defmt {
    fn log(&self, level: Level, tag: &str, message: fmt::Arguments<'_>) {
        let message = defmt::Display2Format(&message);
        match level {
            Level::Debug => defmt::debug!("[{=str}] {}", tag, message),
            Level::Info => defmt::info!("[{=str}] {}", tag, message),
            Level::Warn => defmt::warn!("[{=str}] {}", tag, message),
            Level::Error => defmt::error!("[{=str}] {}", tag, message),
            Level::Off => {}
        }
    }
}
