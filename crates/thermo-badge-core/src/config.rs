//! Badge configuration
//!
//! All values have compiled-in defaults. Nothing is persisted; a device
//! starts from [`BadgeConfig::default`] unless the firmware image carries an
//! encoded override (see [`BadgeConfig::from_postcard`]).

use serde::{Deserialize, Serialize};
use thiserror_no_std::Error;

use crate::audio::{BeatFraction, DEFAULT_TEMPO_BPM, Melody, Tone};
use crate::sensors::Celsius;

/// Capacity of configurable display strings.
pub const MESSAGE_LEN: usize = 32;

pub type MessageText = heapless::String<MESSAGE_LEN>;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct BadgeConfig {
    /// Radio group shared by all badges that should hear each other
    pub radio_group: u8,
    /// Readings strictly above this raise the alert
    pub upper_limit: Celsius,
    /// Readings strictly below this raise the alert
    pub lower_limit: Celsius,
    pub reminder_interval_ms: u64,
    /// Melody/text pairs issued per reminder
    pub reminder_repeats: u8,
    pub alert_text: MessageText,
    pub reminder_text: MessageText,
    pub invalid_values_text: MessageText,
    pub alert_tone: Tone,
    pub reminder_melody: Melody,
    pub tempo_bpm: u16,
}

impl Default for BadgeConfig {
    fn default() -> Self {
        Self {
            radio_group: 21,
            upper_limit: 30,
            lower_limit: 3,
            reminder_interval_ms: 3_600_000, // 1 hour
            reminder_repeats: 3,
            alert_text: message("!!!"),
            reminder_text: message("DrinkWater"),
            invalid_values_text: message("Invalid values received!"),
            alert_tone: Tone::new(294, BeatFraction::Whole),
            reminder_melody: Melody::BaDing,
            tempo_bpm: DEFAULT_TEMPO_BPM,
        }
    }
}

fn message(text: &str) -> MessageText {
    let mut out = MessageText::new();
    for c in text.chars() {
        if out.push(c).is_err() {
            break;
        }
    }
    out
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("lower limit {lower} must be below upper limit {upper}")]
    ThresholdsInverted { lower: Celsius, upper: Celsius },
    #[error("reminder interval must be non-zero")]
    ZeroInterval,
    #[error("reminder must repeat at least once")]
    ZeroRepeats,
    #[error("tempo must be non-zero")]
    ZeroTempo,
    #[error("{0} must not be empty")]
    EmptyText(&'static str),
    #[error("could not decode configuration")]
    Decode,
}

impl BadgeConfig {
    /// Check the configuration for values the handlers cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.lower_limit >= self.upper_limit {
            return Err(ConfigError::ThresholdsInverted {
                lower: self.lower_limit,
                upper: self.upper_limit,
            });
        }
        if self.reminder_interval_ms == 0 {
            return Err(ConfigError::ZeroInterval);
        }
        if self.reminder_repeats == 0 {
            return Err(ConfigError::ZeroRepeats);
        }
        if self.tempo_bpm == 0 {
            return Err(ConfigError::ZeroTempo);
        }
        for (field, text) in [
            ("alert_text", &self.alert_text),
            ("reminder_text", &self.reminder_text),
            ("invalid_values_text", &self.invalid_values_text),
        ] {
            if text.is_empty() {
                return Err(ConfigError::EmptyText(field));
            }
        }
        Ok(())
    }

    /// Decode and validate a postcard-encoded configuration.
    pub fn from_postcard(bytes: &[u8]) -> Result<Self, ConfigError> {
        let config: Self = postcard::from_bytes(bytes).map_err(|e| {
            log::warn!("Config decode failed: {:?}", e);
            ConfigError::Decode
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Returns a copy with new alert thresholds.
    pub fn with_limits(mut self, lower_limit: Celsius, upper_limit: Celsius) -> Self {
        self.lower_limit = lower_limit;
        self.upper_limit = upper_limit;
        self
    }

    /// Returns a copy on a different radio group.
    pub fn with_radio_group(mut self, radio_group: u8) -> Self {
        self.radio_group = radio_group;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = BadgeConfig::default();
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(config.radio_group, 21);
        assert_eq!(config.upper_limit, 30);
        assert_eq!(config.lower_limit, 3);
        assert_eq!(config.reminder_interval_ms, 3_600_000);
        assert_eq!(config.reminder_repeats, 3);
        assert_eq!(config.reminder_text.as_str(), "DrinkWater");
    }

    #[test]
    fn test_inverted_thresholds_rejected() {
        let config = BadgeConfig::default().with_limits(30, 30);
        assert_eq!(
            config.validate(),
            Err(ConfigError::ThresholdsInverted {
                lower: 30,
                upper: 30
            })
        );
    }

    #[test]
    fn test_zero_values_rejected() {
        let mut config = BadgeConfig::default();
        config.reminder_interval_ms = 0;
        assert_eq!(config.validate(), Err(ConfigError::ZeroInterval));

        let mut config = BadgeConfig::default();
        config.reminder_repeats = 0;
        assert_eq!(config.validate(), Err(ConfigError::ZeroRepeats));

        let mut config = BadgeConfig::default();
        config.reminder_text.clear();
        assert_eq!(
            config.validate(),
            Err(ConfigError::EmptyText("reminder_text"))
        );
    }

    #[test]
    fn test_from_postcard_validates() {
        let config = BadgeConfig::default().with_limits(10, 5);
        let mut buf = [0u8; 256];
        let bytes = postcard::to_slice(&config, &mut buf).unwrap();
        assert!(matches!(
            BadgeConfig::from_postcard(bytes),
            Err(ConfigError::ThresholdsInverted { .. })
        ));
    }

    #[test]
    fn test_from_postcard_accepts_override() {
        let config = BadgeConfig::default().with_radio_group(7);
        let mut buf = [0u8; 256];
        let bytes = postcard::to_slice(&config, &mut buf).unwrap();
        assert_eq!(BadgeConfig::from_postcard(bytes), Ok(config));
    }

    #[test]
    fn test_from_postcard_garbage() {
        assert_eq!(BadgeConfig::from_postcard(&[0xff]), Err(ConfigError::Decode));
    }
}
