//! Simulated badge hardware.
//!
//! Every port logs what a person holding the badge would notice. The display
//! and pin only log changes; the monitor loop rewrites them on every pass.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::convert::Infallible;
use std::rc::Rc;

use embedded_hal::digital::{ErrorType, OutputPin, PinState};
use log::{debug, info};

use thermo_badge_core::display::format_number;
use thermo_badge_core::radio::{FrameError, MAX_FRAME_LEN};
use thermo_badge_core::{
    AudioOutput, Celsius, DisplayMessage, Playable, PlaybackMode, RadioFrame, RadioLink,
    RadioPacket, TemperatureSensor, TextDisplay,
};

// ---------------------------------------------------------------------------
// Radio medium
// ---------------------------------------------------------------------------

/// A frame in flight, tagged with the badge that sent it (`None` for frames
/// injected from the prompt).
#[derive(Debug, Clone)]
pub struct AirFrame {
    pub sender: Option<usize>,
    pub bytes: heapless::Vec<u8, MAX_FRAME_LEN>,
}

/// Shared broadcast medium. Frames carry their group; filtering is up to
/// the receivers.
pub type Ether = Rc<RefCell<VecDeque<AirFrame>>>;

// ---------------------------------------------------------------------------
// Ports
// ---------------------------------------------------------------------------

pub struct SimSensor {
    pub celsius: Celsius,
}

impl TemperatureSensor for SimSensor {
    fn read_temperature(&mut self) -> Celsius {
        self.celsius
    }
}

pub struct SimDisplay {
    label: String,
    current: Option<String>,
}

impl SimDisplay {
    pub fn new(label: &str) -> Self {
        Self {
            label: label.to_string(),
            current: None,
        }
    }

    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }
}

impl TextDisplay for SimDisplay {
    type Error = Infallible;

    fn show(&mut self, message: DisplayMessage<'_>) -> Result<(), Self::Error> {
        let text = match message {
            DisplayMessage::Number(n) => format_number(n).as_str().to_string(),
            DisplayMessage::Text(t) => t.to_string(),
        };
        if self.current.as_deref() != Some(text.as_str()) {
            info!("[{}] display: {}", self.label, text);
        }
        self.current = Some(text);
        Ok(())
    }
}

pub struct SimAudio {
    label: String,
    tempo_bpm: u16,
}

impl SimAudio {
    pub fn new(label: &str, tempo_bpm: u16) -> Self {
        Self {
            label: label.to_string(),
            tempo_bpm,
        }
    }
}

impl AudioOutput for SimAudio {
    type Error = Infallible;

    fn play(&mut self, playable: Playable, mode: PlaybackMode) -> Result<(), Self::Error> {
        // Virtual time: the runtime reports blocked time, nothing sleeps here
        debug!(
            "[{}] audio: {:?} {:?} ({} ms)",
            self.label,
            playable,
            mode,
            playable.duration(self.tempo_bpm).as_millis()
        );
        Ok(())
    }
}

pub struct SimPin {
    label: String,
    level: Option<PinState>,
}

impl SimPin {
    pub fn new(label: &str) -> Self {
        Self {
            label: label.to_string(),
            level: None,
        }
    }

    pub fn level(&self) -> Option<PinState> {
        self.level
    }

    fn write(&mut self, level: PinState) {
        if self.level != Some(level) {
            info!("[{}] P1 -> {:?}", self.label, level);
        }
        self.level = Some(level);
    }
}

impl ErrorType for SimPin {
    type Error = Infallible;
}

impl OutputPin for SimPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.write(PinState::Low);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.write(PinState::High);
        Ok(())
    }
}

pub struct SimRadio {
    index: usize,
    group: Option<u8>,
    ether: Ether,
}

impl SimRadio {
    pub fn new(index: usize, ether: Ether) -> Self {
        Self {
            index,
            group: None,
            ether,
        }
    }

    pub fn group(&self) -> Option<u8> {
        self.group
    }
}

impl RadioLink for SimRadio {
    type Error = FrameError;

    fn set_group(&mut self, group: u8) -> Result<(), Self::Error> {
        self.group = Some(group);
        Ok(())
    }

    fn send_number(&mut self, value: f64) -> Result<(), Self::Error> {
        let group = self.group.unwrap_or_default();
        let bytes = RadioFrame::new(group, RadioPacket::Number(value)).to_vec()?;
        debug!("badge {} sends {} on group {}", self.index, value, group);
        self.ether.borrow_mut().push_back(AirFrame {
            sender: Some(self.index),
            bytes,
        });
        Ok(())
    }
}
