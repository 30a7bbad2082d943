//! Cooperative dispatcher for the badge
//!
//! A single loop drives everything: each [`Runtime::poll`] drains pending
//! events in arrival order, fires the reminder when its interval has
//! elapsed, then runs one pass of the monitor. Handlers never interrupt each
//! other, so the shared state needs no lock; a blocking tone simply delays
//! whatever is still queued.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Receiver;
use embassy_time::{Duration, Instant};
use embedded_hal::digital::OutputPin;
use log::{error, info};

use crate::app_state::BadgeError;
use crate::audio::AudioOutput;
use crate::badge::{Badge, MonitorReport};
use crate::display::TextDisplay;
use crate::events::{BadgeEvent, EVENT_QUEUE_DEPTH, EventChannel};
use crate::radio::RadioLink;
use crate::sensors::TemperatureSensor;

/// Fixed-period timer polled from the main loop.
///
/// The first deadline is one full period after `start`. Each fire moves the
/// deadline forward by exactly one period, so a late poll does not shift
/// later deadlines, and each poll fires at most once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntervalTimer {
    period: Duration,
    next_due: Instant,
}

impl IntervalTimer {
    pub fn new(start: Instant, period: Duration) -> Self {
        Self {
            period,
            next_due: start + period,
        }
    }

    /// Returns `true` if the deadline has passed, and arms the next one.
    pub fn poll(&mut self, now: Instant) -> bool {
        if now >= self.next_due {
            self.next_due += self.period;
            true
        } else {
            false
        }
    }

    pub fn next_due(&self) -> Instant {
        self.next_due
    }

    pub fn period(&self) -> Duration {
        self.period
    }
}

/// Summary of one [`Runtime::poll`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CycleReport {
    pub events_handled: usize,
    pub reminder_fired: bool,
    /// `None` if the monitor pass failed
    pub monitor: Option<MonitorReport>,
    pub errors: usize,
    /// Time the cycle spent in blocking playback
    pub blocked: Duration,
}

impl CycleReport {
    fn new() -> Self {
        Self {
            events_handled: 0,
            reminder_fired: false,
            monitor: None,
            errors: 0,
            blocked: Duration::from_ticks(0),
        }
    }
}

type EventReceiver<'a> = Receiver<'a, CriticalSectionRawMutex, BadgeEvent, EVENT_QUEUE_DEPTH>;

pub struct Runtime<'a, S, D, A, P, R> {
    badge: Badge<S, D, A, P, R>,
    events: EventReceiver<'a>,
    reminder: IntervalTimer,
    startup_error: Option<BadgeError>,
}

impl<'a, S, D, A, P, R> Runtime<'a, S, D, A, P, R>
where
    S: TemperatureSensor,
    D: TextDisplay,
    A: AudioOutput,
    P: OutputPin,
    R: RadioLink,
{
    /// Start the badge and arm the reminder relative to `now`.
    ///
    /// A failed startup step is logged and kept in
    /// [`Runtime::startup_error`]; the runtime is armed either way.
    pub fn start(
        mut badge: Badge<S, D, A, P, R>,
        events: &'a EventChannel,
        now: Instant,
    ) -> Self {
        let startup_error = badge.start().err();
        if let Some(e) = startup_error {
            error!("Badge startup incomplete: {}", e);
        }

        let period = Duration::from_millis(badge.config().reminder_interval_ms);
        let reminder = IntervalTimer::new(now, period);
        info!(
            "Runtime started, first reminder at {} ms",
            reminder.next_due().as_millis()
        );
        Self {
            badge,
            events: events.receiver(),
            reminder,
            startup_error,
        }
    }

    /// Run one cycle of the loop.
    pub fn poll(&mut self, now: Instant) -> CycleReport {
        let mut report = CycleReport::new();

        // Bounded so a producer that keeps posting cannot starve the monitor
        for _ in 0..EVENT_QUEUE_DEPTH {
            let Ok(event) = self.events.try_receive() else {
                break;
            };
            report.events_handled += 1;
            self.dispatch(event, &mut report);
        }

        if self.reminder.poll(now) {
            report.reminder_fired = true;
            self.dispatch(BadgeEvent::TimerTick, &mut report);
        }

        match self.badge.on_forever() {
            Ok(monitor) => {
                report.blocked += monitor.blocked;
                report.monitor = Some(monitor);
            }
            Err(e) => {
                error!("Monitor pass failed: {}", e);
                report.errors += 1;
            }
        }

        report
    }

    fn dispatch(&mut self, event: BadgeEvent, report: &mut CycleReport) {
        if let Err(e) = self.badge.handle(event) {
            error!("Handling {:?} failed: {}", event, e);
            report.errors += 1;
        }
    }
}

impl<S, D, A, P, R> Runtime<'_, S, D, A, P, R> {
    pub fn badge(&self) -> &Badge<S, D, A, P, R> {
        &self.badge
    }

    pub fn badge_mut(&mut self) -> &mut Badge<S, D, A, P, R> {
        &mut self.badge
    }

    pub fn next_reminder(&self) -> Instant {
        self.reminder.next_due()
    }

    pub fn startup_error(&self) -> Option<BadgeError> {
        self.startup_error
    }
}
