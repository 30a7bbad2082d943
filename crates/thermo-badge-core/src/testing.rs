//! Recording fakes for the hardware ports

use core::convert::Infallible;

use embedded_hal::digital::{ErrorType, OutputPin, PinState};

use crate::audio::{AudioOutput, Playable, PlaybackMode};
use crate::display::{DisplayMessage, TextDisplay};
use crate::radio::RadioLink;
use crate::sensors::{Celsius, TemperatureSensor};

pub struct FakeSensor {
    pub celsius: Celsius,
    pub reads: usize,
}

impl FakeSensor {
    pub fn new(celsius: Celsius) -> Self {
        Self { celsius, reads: 0 }
    }
}

impl TemperatureSensor for FakeSensor {
    fn read_temperature(&mut self) -> Celsius {
        self.reads += 1;
        self.celsius
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Shown {
    Number(f64),
    Text(String),
}

#[derive(Default)]
pub struct RecordingDisplay {
    pub shown: Vec<Shown>,
    pub fail: bool,
}

impl TextDisplay for RecordingDisplay {
    type Error = &'static str;

    fn show(&mut self, message: DisplayMessage<'_>) -> Result<(), Self::Error> {
        if self.fail {
            return Err("display unplugged");
        }
        self.shown.push(match message {
            DisplayMessage::Number(n) => Shown::Number(n),
            DisplayMessage::Text(t) => Shown::Text(t.to_string()),
        });
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingAudio {
    pub played: Vec<(Playable, PlaybackMode)>,
}

impl AudioOutput for RecordingAudio {
    type Error = Infallible;

    fn play(&mut self, playable: Playable, mode: PlaybackMode) -> Result<(), Self::Error> {
        self.played.push((playable, mode));
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingPin {
    pub writes: Vec<PinState>,
}

impl RecordingPin {
    pub fn last(&self) -> Option<PinState> {
        self.writes.last().copied()
    }
}

impl ErrorType for RecordingPin {
    type Error = Infallible;
}

impl OutputPin for RecordingPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.writes.push(PinState::Low);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.writes.push(PinState::High);
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RadioCall {
    SetGroup(u8),
    SendNumber(f64),
}

/// Records every call, including those it then fails when `fail` is set.
#[derive(Default)]
pub struct RecordingRadio {
    pub calls: Vec<RadioCall>,
    pub fail: bool,
}

impl RecordingRadio {
    fn record(&mut self, call: RadioCall) -> Result<(), &'static str> {
        self.calls.push(call);
        if self.fail {
            Err("radio off")
        } else {
            Ok(())
        }
    }
}

impl RadioLink for RecordingRadio {
    type Error = &'static str;

    fn set_group(&mut self, group: u8) -> Result<(), Self::Error> {
        self.record(RadioCall::SetGroup(group))
    }

    fn send_number(&mut self, value: f64) -> Result<(), Self::Error> {
        self.record(RadioCall::SendNumber(value))
    }
}

pub type TestBadge =
    crate::Badge<FakeSensor, RecordingDisplay, RecordingAudio, RecordingPin, RecordingRadio>;

/// A started badge on the default configuration reading `celsius`.
pub fn started_badge(celsius: Celsius) -> TestBadge {
    let mut badge = crate::Badge::new(
        FakeSensor::new(celsius),
        RecordingDisplay::default(),
        RecordingAudio::default(),
        RecordingPin::default(),
        RecordingRadio::default(),
        crate::BadgeConfig::default(),
    );
    badge.start().unwrap();
    badge
}
