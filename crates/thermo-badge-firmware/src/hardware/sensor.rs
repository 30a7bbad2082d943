use embedded_hal::i2c::I2c;
use sht4x::Sht4x;

use thermo_badge_core::sensors::round_celsius;
use thermo_badge_core::{Celsius, TemperatureSensor};

/// SHT40 on the internal I2C bus, rounded to whole degrees.
///
/// The badge API has no failing reads, so a failed measurement logs and
/// repeats the last good value.
pub struct Sht40Sensor<I> {
    sensor: Sht4x<I, embassy_time::Delay>,
    last: Celsius,
}

impl<I: I2c> Sht40Sensor<I> {
    pub fn new(i2c: I, initial: Celsius) -> Self {
        Self {
            sensor: Sht4x::<I, embassy_time::Delay>::new(i2c),
            last: initial,
        }
    }
}

impl<I: I2c> TemperatureSensor for Sht40Sensor<I> {
    fn read_temperature(&mut self) -> Celsius {
        match self
            .sensor
            .measure(sht4x::Precision::Low, &mut embassy_time::Delay)
        {
            Ok(measurement) => {
                self.last = round_celsius(measurement.temperature_celsius().to_num::<f32>());
            }
            Err(e) => {
                log::error!("SHT40 measurement failed: {:?}", e);
            }
        }
        self.last
    }
}
