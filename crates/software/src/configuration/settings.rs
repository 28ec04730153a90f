use crate::event::{MAX_SENSORS, SensorId};
use crate::log::Level;
use embassy_time::Duration;
use tinyvec::ArrayVec;

/// The oscillation accepted as vibrato.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct VibratoBand {
    /// Slowest accepted oscillation, in Hz.
    pub min_hz: f32,
    /// Fastest accepted oscillation, in Hz.
    pub max_hz: f32,
    /// Smallest peak-to-peak swing, in raw sensor units, that counts as vibrato rather than noise.
    pub min_amplitude: u16,
}

impl Default for VibratoBand {
    fn default() -> Self {
        Self {
            min_hz: 2.0,
            max_hz: 6.0,
            min_amplitude: 50,
        }
    }
}

impl VibratoBand {
    /// Returns `true` if `hz` lies within the band, inclusive.
    pub fn contains(&self, hz: f32) -> bool {
        (self.min_hz..=self.max_hz).contains(&hz)
    }
}

/// Everything the core can be configured with.
///
/// Thresholds are compared against raw sensor readings, where higher means more of the pad is covered.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Messages below this level are not logged.
    pub log_level: Level,
    /// The concert pitch of A4, in Hz. Anything other than 440 is sent to the synth as a tuning change.
    pub base_pitch_hz: f32,
    /// How many samples per second each sensor delivers. Also sets the length of the vibrato window.
    pub sample_rate_hz: u16,
    /// The mute pad is engaged above this reading.
    pub mute_threshold: u16,
    /// A hole is closed above this reading.
    pub hole_closed_threshold: u16,
    /// A hole is half-covered above this reading (and at or below [`hole_closed_threshold`](Self::hole_closed_threshold)).
    pub half_hole_threshold: u16,
    /// The sensor used as the mute pad.
    pub mute_sensor: SensorId,
    /// The hole sensors, in mask bit order.
    pub hole_sensors: ArrayVec<[SensorId; MAX_SENSORS]>,
    /// What counts as vibrato.
    pub vibrato: VibratoBand,
    /// How long the instrument may sit unplayed before an [`IdleTimeout`](crate::event::Event::IdleTimeout).
    pub idle_timeout: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: Level::Warn,
            base_pitch_hz: 440.0,
            sample_rate_hz: 50,
            mute_threshold: 500,
            hole_closed_threshold: 400,
            half_hole_threshold: 300,
            mute_sensor: SensorId(8),
            hole_sensors: (0..8).map(SensorId).collect(),
            vibrato: VibratoBand::default(),
            idle_timeout: Duration::from_secs(10 * 60),
        }
    }
}

impl Settings {
    /// Sets [`log_level`](Self::log_level).
    pub fn with_log_level(mut self, level: Level) -> Self {
        self.log_level = level;
        self
    }

    /// Sets [`base_pitch_hz`](Self::base_pitch_hz).
    pub fn with_base_pitch(mut self, hz: f32) -> Self {
        self.base_pitch_hz = hz;
        self
    }

    /// Sets [`sample_rate_hz`](Self::sample_rate_hz).
    pub fn with_sample_rate(mut self, hz: u16) -> Self {
        self.sample_rate_hz = hz;
        self
    }

    /// Sets [`mute_threshold`](Self::mute_threshold).
    pub fn with_mute_threshold(mut self, threshold: u16) -> Self {
        self.mute_threshold = threshold;
        self
    }

    /// Sets the closed and half-covered hole thresholds.
    pub fn with_hole_thresholds(mut self, half: u16, closed: u16) -> Self {
        self.half_hole_threshold = half;
        self.hole_closed_threshold = closed;
        self
    }

    /// Sets [`mute_sensor`](Self::mute_sensor).
    pub fn with_mute_sensor(mut self, sensor: SensorId) -> Self {
        self.mute_sensor = sensor;
        self
    }

    /// Replaces [`hole_sensors`](Self::hole_sensors). Ids past [`MAX_SENSORS`] are dropped.
    pub fn with_hole_sensors(mut self, sensors: &[SensorId]) -> Self {
        self.hole_sensors = sensors.iter().copied().take(MAX_SENSORS).collect();
        self
    }

    /// Sets [`vibrato`](Self::vibrato).
    pub fn with_vibrato(mut self, band: VibratoBand) -> Self {
        self.vibrato = band;
        self
    }

    /// Sets [`idle_timeout`](Self::idle_timeout).
    pub fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }
}
