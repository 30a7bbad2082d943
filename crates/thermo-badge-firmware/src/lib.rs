//! ESP32-S3 adapters for the thermo badge
//!
//! Everything here touches real peripherals: the SHT40 on the internal I2C
//! bus, the ILI9342C panel, a bit-banged piezo buzzer and the ESP-NOW radio.
//! Badge behaviour itself lives in `thermo_badge_core`.

#![no_std]

pub mod build_config;
pub mod hardware;
