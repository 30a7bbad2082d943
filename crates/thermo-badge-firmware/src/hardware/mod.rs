//! Port implementations backed by ESP32-S3 peripherals

pub mod buzzer;
pub mod display;
pub mod radio;
pub mod sensor;

pub use buzzer::{BuzzerAudio, BuzzerError};
pub use display::LcdDisplay;
pub use radio::{EspNowLink, RadioError};
pub use sensor::Sht40Sensor;
