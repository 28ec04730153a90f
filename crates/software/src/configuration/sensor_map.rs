use super::Settings;
use crate::event::{MASK_WIDTH, MAX_SENSORS, SensorId};
use crate::log::Log;
use tinyvec::ArrayVec;

const TAG: &str = "sensors";

/// What a configured sensor is used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Role {
    /// The mute pad.
    Mute,
    /// A finger hole, reported at `bit` of the mask.
    Hole {
        /// Position in the mask, and in [`SensorMap::holes`].
        bit: u8,
    },
}

/// A configured sensor id that could not be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SensorMapError {
    /// The id is not below [`MAX_SENSORS`].
    #[error("sensor {0} is out of range")]
    OutOfRange(SensorId),
    /// The id was already assigned a role.
    #[error("sensor {0} is configured twice")]
    Duplicate(SensorId),
    /// The mask already has a bit for every hole it can hold.
    #[error("sensor {0} does not fit in the mask")]
    TooManyHoles(SensorId),
}

/// The validated mapping from raw [`SensorId`]s to their [`Role`]s.
///
/// Built once from [`Settings`]. Lookups never panic; an id without a role is simply `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorMap {
    roles: [Option<Role>; MAX_SENSORS],
    holes: ArrayVec<[SensorId; MASK_WIDTH]>,
}

impl SensorMap {
    /// Builds the map from `settings`, logging and skipping every id that can't be used.
    pub fn new(settings: &Settings, log: &dyn Log) -> Self {
        Self::build(settings.mute_sensor, &settings.hole_sensors, |error| {
            log.warn(TAG, format_args!("{error}, ignoring it"))
        })
    }

    /// Builds the map, reporting every rejected id to `on_error`.
    ///
    /// The mute sensor is assigned first. Accepted hole sensors take consecutive mask bits in the order given.
    pub fn build(mute: SensorId, holes: &[SensorId], mut on_error: impl FnMut(SensorMapError)) -> Self {
        let mut map = Self {
            roles: [None; MAX_SENSORS],
            holes: ArrayVec::new(),
        };

        if let Err(error) = map.assign(mute, Role::Mute) {
            on_error(error);
        }

        for &sensor in holes {
            let bit = map.holes.len();
            let result = if bit >= MASK_WIDTH {
                Err(SensorMapError::TooManyHoles(sensor))
            } else {
                map.assign(sensor, Role::Hole { bit: bit as u8 })
            };
            match result {
                Ok(()) => map.holes.push(sensor),
                Err(error) => on_error(error),
            }
        }

        map
    }

    fn assign(&mut self, sensor: SensorId, role: Role) -> Result<(), SensorMapError> {
        match self.roles.get_mut(usize::from(sensor.0)) {
            None => Err(SensorMapError::OutOfRange(sensor)),
            Some(Some(_)) => Err(SensorMapError::Duplicate(sensor)),
            Some(slot) => {
                *slot = Some(role);
                Ok(())
            }
        }
    }

    /// Returns the role of `sensor`, if it has one.
    pub fn role(&self, sensor: SensorId) -> Option<Role> {
        self.roles.get(usize::from(sensor.0)).copied().flatten()
    }

    /// The accepted hole sensors, in mask bit order.
    pub fn holes(&self) -> &[SensorId] {
        &self.holes
    }

    /// The mute sensor, if it was accepted.
    pub fn mute(&self) -> Option<SensorId> {
        (0..MAX_SENSORS as u8)
            .map(SensorId)
            .find(|&sensor| self.role(sensor) == Some(Role::Mute))
    }
}
