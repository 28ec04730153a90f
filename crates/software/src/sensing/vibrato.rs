use super::Window;
use crate::configuration::VibratoBand;

/// Windows shorter than this, in seconds, are too short to estimate a frequency from.
const MIN_DURATION_S: f32 = 0.1;

/// Peak-to-peak swing, in raw sensor units, that counts as full-depth vibrato.
const FULL_DEPTH_AMPLITUDE: f32 = 500.0;

/// Spots periodic finger rocking in a sensor's recent readings.
///
/// This is a zero-crossing estimate, not a spectral analysis: the number of times the signal crosses its own mean is
/// taken as twice the number of cycles in the window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VibratoDetector {
    band: VibratoBand,
    sample_rate_hz: u16,
}

impl VibratoDetector {
    /// Creates a detector for readings arriving at `sample_rate_hz`. A rate of 0 disables detection.
    pub fn new(band: VibratoBand, sample_rate_hz: u16) -> Self {
        Self { band, sample_rate_hz }
    }

    /// Returns the vibrato depth in `window`, from 0.0 (none) to 1.0.
    pub fn depth(&self, window: &Window) -> f32 {
        if self.sample_rate_hz == 0 || window.is_empty() {
            return 0.0;
        }

        let (min, max, sum) = window
            .iter()
            .fold((u16::MAX, u16::MIN, 0u32), |(min, max, sum), value| {
                (min.min(value), max.max(value), sum + u32::from(value))
            });
        let amplitude = max - min;
        if amplitude < self.band.min_amplitude {
            return 0.0;
        }

        let len = window.len() as f32;
        let duration = len / f32::from(self.sample_rate_hz);
        if duration < MIN_DURATION_S {
            return 0.0;
        }

        let mean = sum as f32 / len;
        let mut crossings = 0u32;
        let mut above = None;
        for value in window.iter() {
            let now_above = f32::from(value) > mean;
            if above.is_some_and(|was_above| was_above != now_above) {
                crossings += 1;
            }
            above = Some(now_above);
        }

        let frequency = crossings as f32 / 2.0 / duration;
        if self.band.contains(frequency) {
            (f32::from(amplitude) / FULL_DEPTH_AMPLITUDE).min(1.0)
        } else {
            0.0
        }
    }
}
