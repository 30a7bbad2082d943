//! Hardware-independent core library for thermo-badge
//!
//! This crate contains all platform-agnostic logic for the temperature
//! monitoring badge: the hardware ports (traits), the shared badge state,
//! the event handlers, the radio frame codec, the audio model and the
//! cooperative event dispatcher.
//!
//! It is `#![no_std]` so it compiles on both embedded targets (ESP32-S3)
//! and desktop hosts (for the simulator and tests).

#![cfg_attr(not(test), no_std)]

pub mod app_state;
pub mod audio;
pub mod badge;
pub mod config;
pub mod display;
pub mod events;
pub mod radio;
pub mod runtime;
pub mod sensors;

#[cfg(test)]
mod testing;

pub use app_state::{BadgeError, BadgeState, Mode};
pub use audio::{AudioOutput, BeatFraction, Melody, Playable, PlaybackMode, SquareWave, Tone};
pub use badge::{Alert, Badge, DiscardReason, MonitorReport, RadioOutcome};
pub use config::{BadgeConfig, ConfigError};
pub use display::{DisplayMessage, TextDisplay};
pub use events::{BadgeEvent, EventChannel};
pub use radio::{RadioFrame, RadioLink, RadioPacket, ValueMessage};
pub use runtime::{CycleReport, IntervalTimer, Runtime};
pub use sensors::{Celsius, TemperatureSensor};
