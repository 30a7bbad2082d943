//! Temperature sensor port

/// Temperature in whole degrees Celsius, the sensor's native unit.
pub type Celsius = i32;

/// Trait for the badge's ambient temperature sensor.
///
/// Reads are infallible at this boundary: adapters for buses that can fail
/// are expected to log the failure and report their last good reading.
pub trait TemperatureSensor {
    /// Read the current ambient temperature.
    fn read_temperature(&mut self) -> Celsius;
}

impl<T: TemperatureSensor + ?Sized> TemperatureSensor for &mut T {
    fn read_temperature(&mut self) -> Celsius {
        (**self).read_temperature()
    }
}

/// Converts a fractional reading to the sensor's whole-degree unit,
/// rounding half away from zero.
pub fn round_celsius(value: f32) -> Celsius {
    if value >= 0.0 {
        (value + 0.5) as Celsius
    } else {
        (value - 0.5) as Celsius
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_celsius() {
        assert_eq!(round_celsius(21.4), 21);
        assert_eq!(round_celsius(21.5), 22);
        assert_eq!(round_celsius(-2.5), -3);
        assert_eq!(round_celsius(-0.2), 0);
    }
}
