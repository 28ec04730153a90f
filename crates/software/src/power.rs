//! Auto-off: notices when the instrument has been left alone.

use crate::bus::Publish;
use crate::component::{Component, Outbox, React};
use crate::event::{Event, EventKind};
use crate::log::Log;
use embassy_time::{Duration, Instant, Timer};

const TAG: &str = "power";

/// Publishes a single [`Event::IdleTimeout`] once nothing musical has happened for the configured period.
///
/// Any note change, mute change or new link counts as activity and re-arms the monitor.
pub struct IdleMonitor<'a> {
    timeout: Duration,
    last_activity: Instant,
    fired: bool,
    log: &'a dyn Log,
}

impl<'a> IdleMonitor<'a> {
    /// Creates a monitor that fires `timeout` after `now` unless there is activity first.
    pub fn new(timeout: Duration, now: Instant, log: &'a dyn Log) -> Self {
        Self {
            timeout,
            last_activity: now,
            fired: false,
            log,
        }
    }

    /// Records activity at `now`, re-arming the monitor.
    pub fn activity(&mut self, now: Instant) {
        self.last_activity = now;
        self.fired = false;
    }

    /// When the monitor will next fire, or `None` if it already has and is waiting for activity.
    pub fn deadline(&self) -> Option<Instant> {
        (!self.fired).then(|| self.last_activity + self.timeout)
    }

    /// Pushes [`Event::IdleTimeout`] into `outbox` if the deadline has passed and it hasn't fired since the last
    /// activity.
    pub fn check(&mut self, now: Instant, outbox: &mut Outbox) {
        match self.deadline() {
            Some(deadline) if now >= deadline => {
                self.fired = true;
                self.log.info(
                    TAG,
                    format_args!("idle for {} s", (now - self.last_activity).as_secs()),
                );
                outbox.push(Event::IdleTimeout);
            }
            _ => {}
        }
    }
}

impl React for IdleMonitor<'_> {
    const SUBSCRIPTIONS: &'static [EventKind] = &[
        EventKind::NoteSelected,
        EventKind::MuteEnabled,
        EventKind::MuteDisabled,
        EventKind::LinkConnected,
    ];

    fn react(&mut self, _event: &Event, _outbox: &mut Outbox) {
        self.activity(Instant::now());
    }
}

/// Checks `monitor` whenever its deadline passes, publishing the timeout on `bus`. Never returns.
pub async fn watch(monitor: &Component<IdleMonitor<'_>>, bus: &dyn Publish) -> ! {
    // how long to wait before looking again once the monitor has fired
    const RECHECK: Duration = Duration::from_secs(1);

    loop {
        let wake = monitor
            .with(|monitor| monitor.deadline())
            .unwrap_or_else(|| Instant::now() + RECHECK);
        Timer::at(wake).await;
        monitor.run(bus, |monitor, outbox| monitor.check(Instant::now(), outbox));
    }
}
