//! The badge: shared state plus the event handlers that act on it
//!
//! Each handler runs to completion. The only blocking call is the alert
//! tone in [`Badge::on_forever`], which holds up every other handler until
//! it has finished playing.

use core::fmt::Debug;

use embassy_time::Duration;
use embedded_hal::digital::{OutputPin, PinState};
use log::{debug, info, warn};

use crate::app_state::{BadgeError, BadgeState, Mode};
use crate::audio::{AudioOutput, Playable, PlaybackMode};
use crate::config::BadgeConfig;
use crate::display::{DisplayMessage, TextDisplay};
use crate::events::BadgeEvent;
use crate::radio::{RadioLink, ValueMessage, allowed_name};
use crate::sensors::{Celsius, TemperatureSensor};

/// Which threshold a reading crossed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alert {
    TooHot,
    TooCold,
}

/// What one pass of the monitor loop observed and did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonitorReport {
    pub reading: Celsius,
    pub alert: Option<Alert>,
    pub pin: PinState,
    /// Time spent in blocking playback
    pub blocked: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DiscardReason {
    UnknownName(u8),
    ZeroValue,
    MissingValue,
}

/// Result of handing a value message to the badge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RadioOutcome {
    /// The message was added to the accumulator
    Accumulated { added: f64, total: f64 },
    /// The message was dropped without any visible effect
    Discarded(DiscardReason),
    /// The badge is in receive mode; the warning was shown and the message dropped
    RejectedByMode,
}

pub struct Badge<S, D, A, P, R> {
    sensor: S,
    display: D,
    audio: A,
    pin: P,
    radio: R,
    state: BadgeState,
    config: BadgeConfig,
}

/// Log a port's own error and reduce it to the failed operation.
fn port_error<E: Debug>(
    kind: fn(&'static str) -> BadgeError,
    operation: &'static str,
) -> impl FnOnce(E) -> BadgeError {
    move |e| {
        warn!("Port failure during {}: {:?}", operation, e);
        kind(operation)
    }
}

impl<S, D, A, P, R> Badge<S, D, A, P, R>
where
    S: TemperatureSensor,
    D: TextDisplay,
    A: AudioOutput,
    P: OutputPin,
    R: RadioLink,
{
    /// Assemble a badge in its power-on state. Call [`Badge::start`] before
    /// dispatching events.
    pub fn new(sensor: S, display: D, audio: A, pin: P, radio: R, config: BadgeConfig) -> Self {
        Self {
            sensor,
            display,
            audio,
            pin,
            radio,
            state: BadgeState::new(),
            config,
        }
    }

    /// Join the configured radio group and broadcast the current reading once.
    ///
    /// Both steps are attempted even if the first fails; the first failure
    /// is returned.
    pub fn start(&mut self) -> Result<(), BadgeError> {
        let group = self.config.radio_group;
        let joined = self
            .radio
            .set_group(group)
            .map_err(port_error(BadgeError::Radio, "set group"));

        let reading = self.read_temperature();
        let broadcast = self
            .radio
            .send_number(f64::from(reading))
            .map_err(port_error(BadgeError::Radio, "startup broadcast"));

        info!(
            "Badge started on radio group {} ({:?} mode), broadcast {}°C",
            group,
            self.state.mode(),
            reading
        );
        joined.and(broadcast)
    }

    pub fn read_temperature(&mut self) -> Celsius {
        self.sensor.read_temperature()
    }

    /// Button A: show the live reading.
    pub fn on_button_a(&mut self) -> Result<Celsius, BadgeError> {
        let reading = self.read_temperature();
        debug!("Button A: showing reading {}", reading);
        self.show(DisplayMessage::Number(f64::from(reading)), "button A")?;
        Ok(reading)
    }

    /// Button B: show the accumulator.
    pub fn on_button_b(&mut self) -> Result<f64, BadgeError> {
        let total = self.state.avg_temp();
        debug!("Button B: showing accumulator {}", total);
        self.show(DisplayMessage::Number(total), "button B")?;
        Ok(total)
    }

    /// Radio receive: add `reading + value / 2` to the accumulator for a
    /// known name with a non-zero value, otherwise drop the message.
    pub fn on_received_value(
        &mut self,
        message: ValueMessage,
    ) -> Result<RadioOutcome, BadgeError> {
        // Nothing switches a running badge out of Send; only tests get here
        if self.state.mode() == Mode::Receive {
            debug!("Rejecting {:?} in receive mode", message);
            let text = self.config.invalid_values_text.clone();
            self.show(DisplayMessage::Text(text.as_str()), "invalid values warning")?;
            return Ok(RadioOutcome::RejectedByMode);
        }

        let Some(name) = allowed_name(message.name) else {
            debug!("Discarding value for unknown name index {}", message.name);
            return Ok(RadioOutcome::Discarded(DiscardReason::UnknownName(message.name)));
        };

        let value = match message.value {
            None => {
                debug!("Discarding {} without a value", name);
                return Ok(RadioOutcome::Discarded(DiscardReason::MissingValue));
            }
            Some(v) if v == 0.0 => {
                debug!("Discarding zero {}", name);
                return Ok(RadioOutcome::Discarded(DiscardReason::ZeroValue));
            }
            Some(v) => v,
        };

        let added = f64::from(self.read_temperature()) + value / 2.0;
        let total = self.state.accumulate(added);
        debug!("Accumulated {} = {} from {}, total {}", name, added, value, total);
        Ok(RadioOutcome::Accumulated { added, total })
    }

    /// One pass of the monitor loop.
    ///
    /// Out-of-range readings show the alert text, play the alert tone to
    /// completion and drive the pin high. In-range readings drive it low.
    /// The pin is written on every pass.
    pub fn on_forever(&mut self) -> Result<MonitorReport, BadgeError> {
        let reading = self.read_temperature();

        let alert = if reading > self.config.upper_limit {
            Some(Alert::TooHot)
        } else if reading < self.config.lower_limit {
            Some(Alert::TooCold)
        } else {
            None
        };

        let mut blocked = Duration::from_ticks(0);
        let pin = match alert {
            Some(alert) => {
                debug!("{:?}: reading {}", alert, reading);
                let text = self.config.alert_text.clone();
                self.show(DisplayMessage::Text(text.as_str()), "alert text")?;

                let tone = Playable::Tone(self.config.alert_tone);
                self.audio
                    .play(tone, PlaybackMode::UntilDone)
                    .map_err(port_error(BadgeError::Audio, "alert tone"))?;
                blocked = tone.duration(self.config.tempo_bpm);

                self.pin
                    .set_high()
                    .map_err(port_error(BadgeError::Pin, "alert pin high"))?;
                PinState::High
            }
            None => {
                self.pin
                    .set_low()
                    .map_err(port_error(BadgeError::Pin, "alert pin low"))?;
                PinState::Low
            }
        };

        Ok(MonitorReport {
            reading,
            alert,
            pin,
            blocked,
        })
    }

    /// Reminder: queue the melody in the background and show the reminder
    /// text, repeated back to back. Playback is not awaited between repeats.
    pub fn on_every_interval(&mut self) -> Result<(), BadgeError> {
        info!("Reminder: {}", self.config.reminder_text);
        let melody = Playable::Melody(self.config.reminder_melody);
        let text = self.config.reminder_text.clone();
        for _ in 0..self.config.reminder_repeats {
            self.audio
                .play(melody, PlaybackMode::InBackground)
                .map_err(port_error(BadgeError::Audio, "reminder melody"))?;
            self.show(DisplayMessage::Text(text.as_str()), "reminder text")?;
        }
        Ok(())
    }

    /// Dispatch one event to its handler.
    pub fn handle(&mut self, event: BadgeEvent) -> Result<(), BadgeError> {
        match event {
            BadgeEvent::ButtonA => self.on_button_a().map(|_| ()),
            BadgeEvent::ButtonB => self.on_button_b().map(|_| ()),
            BadgeEvent::Radio(message) => self.on_received_value(message).map(|_| ()),
            BadgeEvent::TimerTick => self.on_every_interval(),
        }
    }

    fn show(
        &mut self,
        message: DisplayMessage<'_>,
        operation: &'static str,
    ) -> Result<(), BadgeError> {
        self.display
            .show(message)
            .map_err(port_error(BadgeError::Display, operation))
    }
}

impl<S, D, A, P, R> Badge<S, D, A, P, R> {
    pub fn state(&self) -> &BadgeState {
        &self.state
    }

    pub fn config(&self) -> &BadgeConfig {
        &self.config
    }

    pub fn sensor(&self) -> &S {
        &self.sensor
    }

    pub fn sensor_mut(&mut self) -> &mut S {
        &mut self.sensor
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    pub fn audio(&self) -> &A {
        &self.audio
    }

    pub fn pin(&self) -> &P {
        &self.pin
    }

    pub fn radio(&self) -> &R {
        &self.radio
    }

    #[cfg(test)]
    pub(crate) fn state_mut(&mut self) -> &mut BadgeState {
        &mut self.state
    }

    #[cfg(test)]
    pub(crate) fn display_mut(&mut self) -> &mut D {
        &mut self.display
    }

    #[cfg(test)]
    pub(crate) fn radio_mut(&mut self) -> &mut R {
        &mut self.radio
    }
}
