use crate::event::{MAX_SENSORS, Mask, SensorId};
use tinyvec::ArrayVec;
use wmidi::Note;

/// What a single mask plays. `None` notes are silence.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct FingeringRule {
    main: Option<Note>,
    half_holes: ArrayVec<[(SensorId, Option<Note>); MAX_SENSORS]>,
}

impl FingeringRule {
    /// A rule playing `main` with no half-hole alternates.
    pub fn new(main: Option<Note>) -> Self {
        Self {
            main,
            half_holes: ArrayVec::new(),
        }
    }

    /// The note played when no half-hole alternate applies.
    pub fn main(&self) -> Option<Note> {
        self.main
    }

    /// Replaces the main note.
    pub fn set_main(&mut self, note: Option<Note>) {
        self.main = note;
    }

    /// Plays `note` instead of the main note while `sensor` is half-covered, replacing any earlier alternate for
    /// that sensor.
    pub fn set_half_hole(&mut self, sensor: SensorId, note: Option<Note>) {
        match self.half_holes.iter_mut().find(|(s, _)| *s == sensor) {
            Some(entry) => entry.1 = note,
            None => {
                // at most one entry per sensor, so there is always room for ids below MAX_SENSORS
                let _ = self.half_holes.try_push((sensor, note));
            }
        }
    }

    /// The alternate for `sensor`, if one was configured.
    pub fn half_hole(&self, sensor: SensorId) -> Option<Option<Note>> {
        self.half_holes
            .iter()
            .find(|(s, _)| *s == sensor)
            .map(|&(_, note)| note)
    }

    /// The note to play given the active half-hole sensor, if any.
    pub fn resolve(&self, half_hole: Option<SensorId>) -> Option<Note> {
        half_hole
            .and_then(|sensor| self.half_hole(sensor))
            .unwrap_or(self.main)
    }
}

/// Maps every possible [`Mask`] to the [`FingeringRule`] it plays, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct FingeringTable {
    rules: [Option<FingeringRule>; 256],
}

impl Default for FingeringTable {
    fn default() -> Self {
        Self {
            rules: core::array::from_fn(|_| None),
        }
    }
}

impl FingeringTable {
    /// An empty table; every mask is silent.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the main note for `mask`, creating its rule if needed.
    pub fn set_main(&mut self, mask: Mask, note: Option<Note>) {
        self.rule_mut(mask).set_main(note);
    }

    /// Sets the half-hole alternate for `sensor` under `mask`, creating the rule if needed.
    ///
    /// A rule created this way has no main note until one is set.
    pub fn set_half_hole(&mut self, mask: Mask, sensor: SensorId, note: Option<Note>) {
        self.rule_mut(mask).set_half_hole(sensor, note);
    }

    fn rule_mut(&mut self, mask: Mask) -> &mut FingeringRule {
        self.rules[usize::from(mask.0)].get_or_insert_with(FingeringRule::default)
    }

    /// The rule for `mask`, if there is one.
    pub fn rule(&self, mask: Mask) -> Option<&FingeringRule> {
        self.rules[usize::from(mask.0)].as_ref()
    }

    /// The note `mask` plays with `half_hole` active. Masks without a rule are silent.
    pub fn resolve(&self, mask: Mask, half_hole: Option<SensorId>) -> Option<Note> {
        self.rule(mask).and_then(|rule| rule.resolve(half_hole))
    }

    /// How many masks have a rule.
    pub fn len(&self) -> usize {
        self.rules.iter().filter(|rule| rule.is_some()).count()
    }

    /// Returns `true` if no mask has a rule.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
