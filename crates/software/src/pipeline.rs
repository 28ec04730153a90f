//! The classifier, resolver and output stage, wired together.

use crate::bus::{EventBus, Publish, SubscribeError};
use crate::component::Component;
use crate::configuration::ProvideSettings;
use crate::fingering::{FingeringTable, Resolver};
use crate::log::Log;
use crate::output::{Indicator, MidiOut, NoteOutput};
use crate::sensing::Classifier;

/// Everything between a raw sensor reading and a MIDI driver call.
///
/// Each stage sits behind its own lock, so the pipeline can be shared with a bus of either kind. Readings go in as
/// [`Event::SensorValue`](crate::event::Event::SensorValue)s; driver calls come out of `O` and `I`.
pub struct Pipeline<'a, O, I> {
    /// Sensor readings to gestures.
    pub classifier: Component<Classifier<'a>>,
    /// Gestures to notes.
    pub resolver: Component<Resolver<'a>>,
    /// Notes to driver calls.
    pub output: Component<NoteOutput<'a, O, I>>,
}

impl<'a, O, I> Pipeline<'a, O, I>
where
    O: MidiOut + Send,
    I: Indicator + Send,
{
    /// Builds every stage from a snapshot of `settings` and from `table`.
    pub fn new(
        settings: &dyn ProvideSettings,
        table: FingeringTable,
        midi: O,
        indicator: I,
        log: &'a dyn Log,
    ) -> Self {
        let settings = settings.settings();
        Self {
            classifier: Component::new(Classifier::new(&settings, log)),
            resolver: Component::new(Resolver::new(table, log)),
            output: Component::new(NoteOutput::new(midi, indicator, settings.base_pitch_hz, log)),
        }
    }

    /// Subscribes each stage to the events it handles.
    pub fn attach(&'a self, bus: &dyn EventBus<'a>) -> Result<(), SubscribeError> {
        self.classifier.attach(bus)?;
        self.resolver.attach(bus)?;
        self.output.attach(bus)
    }

    /// Swaps in a new fingering table, publishing the re-resolved note if it changed.
    pub fn reload(&self, table: FingeringTable, bus: &dyn Publish) {
        self.resolver
            .run(bus, |resolver, outbox| resolver.reload(table, outbox));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::{QueuedBus, SyncBus};
    use crate::configuration::Settings;
    use crate::event::{Event, EventKind, Mask, SensorId};
    use crate::log::Silent;
    use crate::output::OutputState;
    use crate::testing::{Call, CountingIndicator, EventSpy, RecordingMidi};
    use core::f32::consts::PI;
    use num_traits::Float;
    use wmidi::Note;

    const FINGERINGS: &str = "\
        # all closed\n\
        0b11111111 60\n\
        0b11111110 62\n\
        0b11111100 64\n\
        0b10000000 60 7 61\n";

    type TestPipeline<'a> = Pipeline<'a, RecordingMidi, CountingIndicator>;

    fn pipeline<'a>(settings: &Settings, log: &'a Silent) -> TestPipeline<'a> {
        Pipeline::new(
            settings,
            FingeringTable::parse(FINGERINGS, log).0,
            RecordingMidi::default(),
            CountingIndicator::default(),
            log,
        )
    }

    fn sample(sensor: u8, value: u16) -> Event {
        Event::SensorValue {
            sensor: SensorId(sensor),
            value,
        }
    }

    fn calls(pipeline: &TestPipeline) -> std::vec::Vec<Call> {
        pipeline.output.with(|output| output.midi().calls.clone())
    }

    fn close_all(bus: &dyn Publish) {
        for sensor in 0..8 {
            bus.publish(sample(sensor, 450)).unwrap();
        }
    }

    #[test]
    fn scenario_a_simple_note() {
        let log = Silent;
        let pipeline = pipeline(&Settings::default(), &log);
        let bus = SyncBus::new(&log);
        pipeline.attach(&bus).unwrap();

        close_all(&bus);
        // the intermediate masks have no rule
        assert_eq!(std::vec![Call::NoteOn(Note::C4)], calls(&pipeline), "Expected left but got right");
        assert_eq!(1, pipeline.output.with(|o| o.indicator().pulses), "Expected left but got right");

        bus.publish(sample(0, 100)).unwrap();
        assert_eq!(
            std::vec![
                Call::NoteOn(Note::C4),
                Call::NoteOff(Note::C4),
                Call::NoteOn(Note::D4)
            ],
            calls(&pipeline),
            "Expected left but got right"
        );
    }

    #[test]
    fn half_hole_selects_the_alternate() {
        let log = Silent;
        let pipeline = pipeline(&Settings::default(), &log);
        let bus = SyncBus::new(&log);
        pipeline.attach(&bus).unwrap();

        bus.publish(sample(7, 350)).unwrap();
        assert_eq!(
            Some(Note::Db4),
            pipeline.resolver.with(|r| r.last()),
            "Mask first, then the gesture; expected left but got right"
        );

        bus.publish(sample(7, 450)).unwrap();
        assert_eq!(
            std::vec![
                Call::NoteOn(Note::C4),
                Call::NoteOff(Note::C4),
                Call::NoteOn(Note::Db4),
                Call::NoteOff(Note::Db4),
                Call::NoteOn(Note::C4),
            ],
            calls(&pipeline),
            "Closing the half hole releases the alternate; expected left but got right"
        );
    }

    #[test]
    fn mute_holds_until_a_new_note() {
        let log = Silent;
        let pipeline = pipeline(&Settings::default(), &log);
        let bus = SyncBus::new(&log);
        pipeline.attach(&bus).unwrap();

        close_all(&bus);
        bus.publish(sample(8, 600)).unwrap();
        bus.publish(sample(0, 100)).unwrap();

        assert_eq!(
            std::vec![Call::NoteOn(Note::C4), Call::NoteOff(Note::C4), Call::AllNotesOff],
            calls(&pipeline),
            "No note-on while muted; expected left but got right"
        );
        assert_eq!(
            OutputState::Muted,
            pipeline.output.with(|o| o.state()),
            "Expected left but got right"
        );

        bus.publish(sample(8, 0)).unwrap();
        bus.publish(sample(1, 100)).unwrap();
        assert_eq!(
            Some(&Call::NoteOn(Note::E4)),
            calls(&pipeline).last(),
            "The next new note sounds after unmuting; expected left but got right"
        );
    }

    #[test]
    fn vibrato_bends_without_retriggering() {
        let log = Silent;
        let pipeline = pipeline(&Settings::default(), &log);
        let bus = SyncBus::new(&log);
        pipeline.attach(&bus).unwrap();

        close_all(&bus);
        for n in 0..50 {
            let phase = 2.0 * PI * 4.0 * n as f32 / 50.0;
            let value = (600.0 + 100.0 * Float::sin(phase)) as u16;
            bus.publish(sample(3, value)).unwrap();
        }

        let bends: std::vec::Vec<f32> = calls(&pipeline)
            .into_iter()
            .filter_map(|call| match call {
                Call::PitchBend(depth) => Some(depth),
                _ => None,
            })
            .collect();
        assert!(!bends.is_empty(), "Expected at least one pitch bend");
        assert!(bends.iter().all(|&depth| depth > 0.0 && depth <= 1.0));
        assert_eq!(
            1,
            calls(&pipeline)
                .iter()
                .filter(|call| matches!(call, Call::NoteOn(_)))
                .count(),
            "Vibrato should not retrigger the note; expected left but got right"
        );
    }

    fn spied<'a>(bus: &SyncBus<'a>, spy: &'a EventSpy, kinds: &[EventKind]) {
        for kind in kinds {
            bus.subscribe(*kind, spy).unwrap();
        }
    }

    #[test]
    fn scenario_b_half_hole() {
        let log = Silent;
        let pipeline = Pipeline::new(
            &Settings::default(),
            FingeringTable::parse("0b11111110 62 1 63", &log).0,
            RecordingMidi::default(),
            CountingIndicator::default(),
            &log,
        );
        let bus = SyncBus::new(&log);
        pipeline.attach(&bus).unwrap();

        for sensor in 1..8 {
            bus.publish(sample(sensor, 450)).unwrap();
        }
        assert_eq!(Some(Note::D4), pipeline.resolver.with(|r| r.last()), "Expected left but got right");

        // still engaged, so the mask is unchanged and only the gesture is new
        bus.publish(sample(1, 350)).unwrap();
        assert_eq!(
            std::vec![Call::NoteOn(Note::D4), Call::NoteOff(Note::D4), Call::NoteOn(Note::Eb4)],
            calls(&pipeline),
            "Expected left but got right"
        );
    }

    #[test]
    fn scenario_c_closed_hole_plays() {
        let log = Silent;
        let settings = Settings::default().with_hole_thresholds(300, 400);
        let pipeline = Pipeline::new(
            &settings,
            FingeringTable::parse("0b00000001 60", &log).0,
            RecordingMidi::default(),
            CountingIndicator::default(),
            &log,
        );
        let spy = EventSpy::default();
        let bus = SyncBus::new(&log);
        spied(&bus, &spy, &[EventKind::MaskChanged]);
        pipeline.attach(&bus).unwrap();

        bus.publish(sample(0, 500)).unwrap();

        assert_eq!(
            std::vec![Event::MaskChanged(Mask(0b00000001))],
            spy.events(),
            "Expected left but got right"
        );
        assert_eq!(std::vec![Call::NoteOn(Note::C4)], calls(&pipeline), "Expected left but got right");
    }

    #[test]
    fn scenario_d_mute_pad() {
        let log = Silent;
        let settings = Settings::default().with_mute_sensor(SensorId(8)).with_mute_threshold(500);
        let pipeline = pipeline(&settings, &log);
        let spy = EventSpy::default();
        let bus = SyncBus::new(&log);
        spied(&bus, &spy, &[EventKind::MuteEnabled, EventKind::MuteDisabled]);
        pipeline.attach(&bus).unwrap();

        bus.publish(sample(8, 600)).unwrap();
        assert_eq!(std::vec![Event::MuteEnabled], spy.events(), "Expected left but got right");
        assert_eq!(std::vec![Call::AllNotesOff], calls(&pipeline), "Expected left but got right");

        bus.publish(sample(8, 400)).unwrap();
        assert_eq!(
            std::vec![Event::MuteEnabled, Event::MuteDisabled],
            spy.events(),
            "Expected left but got right"
        );
        assert_eq!(std::vec![Call::AllNotesOff], calls(&pipeline), "Expected left but got right");
    }

    #[test]
    fn mask_is_published_before_the_gesture() {
        let log = Silent;
        let pipeline = pipeline(&Settings::default(), &log);
        let spy = EventSpy::default();
        let bus = SyncBus::new(&log);
        bus.subscribe(EventKind::MaskChanged, &spy).unwrap();
        bus.subscribe(EventKind::HalfHoleDetected, &spy).unwrap();
        bus.subscribe(EventKind::HalfHoleReleased, &spy).unwrap();
        bus.subscribe(EventKind::NoteSelected, &spy).unwrap();
        pipeline.attach(&bus).unwrap();

        bus.publish(sample(7, 350)).unwrap();
        bus.publish(sample(7, 450)).unwrap();

        assert_eq!(
            std::vec![
                Event::MaskChanged(Mask(0x80)),
                Event::NoteSelected(Some(Note::C4)),
                Event::HalfHoleDetected(SensorId(7)),
                Event::NoteSelected(Some(Note::Db4)),
                Event::HalfHoleReleased(SensorId(7)),
                Event::NoteSelected(Some(Note::C4)),
            ],
            spy.events(),
            "Expected left but got right"
        );
    }

    #[test]
    fn no_stale_alternate_after_opening_a_half_hole() {
        let log = Silent;
        let pipeline = pipeline(&Settings::default(), &log);
        let bus = SyncBus::new(&log);
        pipeline.attach(&bus).unwrap();

        bus.publish(sample(7, 350)).unwrap();
        bus.publish(sample(7, 100)).unwrap();

        assert_eq!(None, pipeline.resolver.with(|r| r.half_hole()), "Expected left but got right");
        assert_eq!(
            OutputState::Silent,
            pipeline.output.with(|o| o.state()),
            "Expected left but got right"
        );
    }

    #[test]
    fn link_connect_tunes_off_standard_pitch() {
        let log = Silent;
        let pipeline = pipeline(&Settings::default().with_base_pitch(442.0), &log);
        let bus = SyncBus::new(&log);
        pipeline.attach(&bus).unwrap();

        bus.publish(Event::LinkConnected).unwrap();
        bus.publish(Event::LinkDisconnected).unwrap();
        assert_eq!(std::vec![Call::Tuning(442.0)], calls(&pipeline), "Expected left but got right");
    }

    #[test]
    fn reload_re_resolves_the_current_fingering() {
        let log = Silent;
        let pipeline = pipeline(&Settings::default(), &log);
        let bus = SyncBus::new(&log);
        pipeline.attach(&bus).unwrap();
        close_all(&bus);

        pipeline.reload(FingeringTable::parse("0xFF 72", &log).0, &bus);

        assert_eq!(
            Some(&Call::NoteOn(Note::C5)),
            calls(&pipeline).last(),
            "Expected left but got right"
        );
    }

    #[test]
    fn both_buses_drive_the_same_calls() {
        let script = [
            sample(0, 450),
            sample(1, 450),
            sample(0, 350),
            sample(0, 100),
            sample(8, 600),
            sample(1, 0),
            sample(8, 0),
            sample(0, 450),
            sample(0, 320),
            Event::LinkConnected,
        ];
        let settings = Settings::default().with_base_pitch(415.0);
        let log = Silent;

        let sync_pipeline = pipeline(&settings, &log);
        let sync_bus = SyncBus::new(&log);
        sync_pipeline.attach(&sync_bus).unwrap();
        close_all(&sync_bus);
        for event in script {
            sync_bus.publish(event).unwrap();
        }

        let queued_pipeline = pipeline(&settings, &log);
        let queued_bus = QueuedBus::new(&log);
        queued_pipeline.attach(&queued_bus).unwrap();
        close_all(&queued_bus);
        queued_bus.process_pending();
        for event in script {
            queued_bus.publish(event).unwrap();
            queued_bus.process_pending();
        }

        assert!(!calls(&sync_pipeline).is_empty());
        assert_eq!(
            calls(&sync_pipeline),
            calls(&queued_pipeline),
            "Expected left but got right"
        );
    }

    #[test]
    fn a_burst_of_samples_keeps_notes_ahead_of_the_mute() {
        const TABLE: &str = "0x80 60 7 61\n0x81 62\n0x01 64";
        let script = [
            sample(7, 350),
            sample(0, 450),
            sample(7, 100),
            sample(8, 600),
            sample(0, 100),
            sample(8, 0),
            sample(0, 450),
        ];
        let settings = Settings::default();
        let log = Silent;
        let build = || {
            Pipeline::new(
                &settings,
                FingeringTable::parse(TABLE, &log).0,
                RecordingMidi::default(),
                CountingIndicator::default(),
                &log,
            )
        };

        let sync_pipeline = build();
        let sync_bus = SyncBus::new(&log);
        sync_pipeline.attach(&sync_bus).unwrap();
        for event in script {
            sync_bus.publish(event).unwrap();
        }

        let queued_pipeline = build();
        let queued_bus = QueuedBus::new(&log);
        queued_pipeline.attach(&queued_bus).unwrap();
        for event in script {
            queued_bus.publish(event).unwrap();
        }
        assert_eq!(script.len(), queued_bus.process_pending(), "Expected left but got right");

        let expected = std::vec![
            Call::NoteOn(Note::C4),
            Call::NoteOff(Note::C4),
            Call::NoteOn(Note::Db4),
            Call::NoteOff(Note::Db4),
            Call::NoteOn(Note::D4),
            Call::NoteOff(Note::D4),
            Call::NoteOn(Note::E4),
            Call::NoteOff(Note::E4),
            Call::AllNotesOff,
            Call::NoteOn(Note::E4),
        ];
        assert_eq!(expected, calls(&sync_pipeline), "Expected left but got right");
        assert_eq!(expected, calls(&queued_pipeline), "Expected left but got right");
    }
}
